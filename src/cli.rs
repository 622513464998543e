//! Thin CLI: schema JSON → (artifacts | closure | key paths)
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::config::{CodegenConfig, Dialect, RootFieldFilter};
use crate::schema::{SchemaDocument, SchemaGraph};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate client-side artifact descriptors from a GraphQL schema graph
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run a full generation and print the artifact descriptors
    Generate(GenerateOut),
    /// print the input and enum types reachable from the selected root fields
    Closure(ClosureOut),
    /// parse `@key(fields: ...)` expressions and print the merged key map
    Keys(KeysOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// One or more schema-definition JSON files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    schema: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// codegen config (.json)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// overrides `targetNamespace`
    #[arg(long)]
    namespace: Option<String>,

    /// overrides `dialect`
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ClosureOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// selected `Query` fields
    #[arg(long = "query")]
    queries: Vec<String>,

    /// selected `Mutation` fields
    #[arg(long = "mutation")]
    mutations: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct KeysOut {
    /// key expressions, e.g. "id owner { id }"
    #[arg(required = true)]
    expressions: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    /// Reads every matched file and merges the definitions into one graph.
    fn load_graph(&self) -> Result<SchemaGraph> {
        let source_paths = resolve_file_path_patterns(&self.schema)
            .context("failed to resolve schema file paths")?;
        let mut merged = SchemaDocument::default();
        for source_path in source_paths {
            let bytes = std::fs::read(&source_path)
                .with_context(|| format!("failed to read schema file {}", source_path.display()))?;
            let doc = crate::path_de::schema_document(&bytes)
                .with_context(|| format!("failed to parse schema file {}", source_path.display()))?;
            tracing::debug!(
                path = %source_path.display(),
                definitions = doc.definitions.len(),
                "schema file"
            );
            merged.definitions.extend(doc.definitions);
        }
        Ok(SchemaGraph::from_document(merged))
    }
}

impl GenerateOut {
    fn load_config(&self) -> Result<CodegenConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                crate::path_de::codegen_config(&src)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => CodegenConfig::default(),
        };
        if let Some(namespace) = self.namespace.as_ref() {
            config.target_namespace = namespace.clone();
        }
        if let Some(dialect) = self.dialect {
            config.dialect = dialect;
        }
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        let level = if self.verbose { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(format!("typegraph_codegen={level}"))
                    }),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let graph = target.schema_settings.load_graph()?;
                let config = target.load_config()?;
                tracing::info!(
                    types = graph.len(),
                    namespace = %config.target_namespace,
                    "generating"
                );

                let mut cg = crate::codegen::Codegen::new(&graph, &config);
                cg.emit()?;
                let output = cg.into_output();
                let output_src = serde_json::to_string_pretty(&output)?;
                write_output(target.out.as_ref(), &output_src)
            }
            Command::Closure(target) => {
                let graph = target.schema_settings.load_graph()?;
                let filter = RootFieldFilter {
                    queries: target.queries.iter().cloned().collect(),
                    mutations: target.mutations.iter().cloned().collect(),
                };
                let closure = crate::closure::RequiredTypeClosure::new(&graph).for_filter(&filter);
                println!("{}", serde_json::to_string_pretty(&closure)?);
                Ok(())
            }
            Command::Keys(target) => {
                let keys = crate::keys::parse_key_paths(&target.expressions)?;
                println!("{}", serde_json::to_string_pretty(&keys)?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&PathBuf>, src: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{src}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flags_override_the_config() {
        let cli = CommandLineInterface::parse_from([
            "typegraph-codegen",
            "generate",
            "--schema",
            "schema.json",
            "--namespace",
            "com.acme",
            "--dialect",
            "kotlin",
        ]);
        let Command::Generate(target) = &cli.cmd else {
            panic!("expected generate");
        };
        let config = target.load_config().unwrap();
        assert_eq!(config.target_namespace, "com.acme");
        assert_eq!(config.dialect, Dialect::Kotlin);
        assert_eq!(target.schema_settings.schema, ["schema.json"]);
    }

    #[test]
    fn closure_collects_repeated_flags() {
        let cli = CommandLineInterface::parse_from([
            "typegraph-codegen",
            "closure",
            "-s",
            "a.json",
            "--query",
            "persons",
            "--query",
            "shows",
            "--mutation",
            "addShow",
            "--verbose",
        ]);
        assert!(cli.verbose);
        let Command::Closure(target) = &cli.cmd else {
            panic!("expected closure");
        };
        assert_eq!(target.queries, ["persons", "shows"]);
        assert_eq!(target.mutations, ["addShow"]);
    }

    #[test]
    fn literal_paths_pass_through_and_empty_globs_fail() {
        let paths = resolve_file_path_patterns(["schema.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("schema.json")]);
        assert!(resolve_file_path_patterns(["/nonexistent-typegraph-dir/*.json"]).is_err());
    }
}

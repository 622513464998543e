//! One generation run: schema graph + config in, artifact descriptors out.
//!
//! ```ignore
//! let mut cg = Codegen::new(&graph, &config);
//! cg.emit()?;
//! let output = cg.into_output();
//! ```

use indexmap::IndexSet;
use serde::Serialize;

use crate::closure::RequiredTypeClosure;
use crate::config::CodegenConfig;
use crate::error::Result;
use crate::ir::{ArtifactDescriptor, OperationKind};
use crate::keys::RepresentationBuilder;
use crate::literal::LiteralSerializer;
use crate::lower::Lowering;
use crate::projection::ProjectionGraphBuilder;
use crate::projection::guard::{Claim, NameRegistry};
use crate::projection::naming::NamingPolicy;
use crate::resolve::TypeResolver;
use crate::schema::SchemaGraph;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Mutable state of one run. Created fresh by [`Codegen::new`] and never
/// shared between runs.
#[derive(Debug, Default)]
pub struct GenerationContext {
    /// Qualified artifact name → source type.
    artifacts: NameRegistry,
    representations: IndexSet<String>,
    operation_names: IndexSet<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOutput {
    pub required_types: Vec<String>,
    pub artifacts: Vec<ArtifactDescriptor>,
}

pub struct Codegen<'a> {
    graph: &'a SchemaGraph,
    config: &'a CodegenConfig,
    context: GenerationContext,
    output: CodegenOutput,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'a> Codegen<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a CodegenConfig) -> Self {
        Self {
            graph,
            config,
            context: GenerationContext::default(),
            output: CodegenOutput::default(),
        }
    }

    pub fn emit(&mut self) -> Result<()> {
        let graph = self.graph;
        let config = self.config;
        let resolver = TypeResolver::new(graph, config);
        let literals = LiteralSerializer::new(graph);
        let lowering = Lowering::new(graph, config, &resolver, &literals);

        let closure = RequiredTypeClosure::new(graph).for_filter(&config.root_field_filter);
        self.output.required_types = closure.iter().cloned().collect();

        for ty in graph.types().filter(|ty| lowering.includes(ty, &closure)) {
            if let Some(artifact) = lowering.lower_type(ty)? {
                self.push(artifact)?;
            }
        }
        self.push(lowering.constants())?;

        if !config.generate_client_api {
            return Ok(());
        }

        let naming = NamingPolicy::from_config(config);
        let mut projections = ProjectionGraphBuilder::new(graph, &resolver, &literals, naming)
            .with_max_depth(config.max_projection_depth);
        for kind in OperationKind::ALL {
            let Some(operation_type) = graph.get(kind.type_name()) else {
                continue;
            };
            let filter = match kind {
                OperationKind::Query => Some(&config.root_field_filter.queries),
                OperationKind::Mutation => Some(&config.root_field_filter.mutations),
                OperationKind::Subscription => None,
            };
            for field in operation_type.active_fields() {
                if filter.is_some_and(|names| !names.is_empty() && !names.contains(&field.name)) {
                    continue;
                }
                let root = projections.build_operation_root(kind.type_name(), field)?;
                let artifact =
                    lowering.operation(kind, field, root, &mut self.context.operation_names)?;
                self.push(artifact)?;
            }
        }
        if !config.skip_entity_queries {
            projections.build_entities_root()?;
        }
        let projections = projections.finish();
        tracing::debug!(
            nodes = projections.nodes().count(),
            roots = projections.roots().count(),
            "projection graph"
        );
        for node in projections.nodes() {
            self.push(lowering.projection(node))?;
        }

        if !config.skip_entity_queries {
            let representations =
                RepresentationBuilder::new(graph, &resolver, config.client_namespace())
                    .build_all(&mut self.context.representations)?;
            for artifact in representations {
                self.push(artifact)?;
            }
        }
        Ok(())
    }

    pub fn into_output(self) -> CodegenOutput {
        tracing::info!(artifacts = self.output.artifacts.len(), "generation finished");
        self.output
    }

    fn push(&mut self, artifact: ArtifactDescriptor) -> Result<()> {
        match self.context.artifacts.claim(&artifact.qualified_name(), &artifact.source_type)? {
            Claim::Fresh => self.output.artifacts.push(artifact),
            Claim::Existing => tracing::trace!(name = %artifact.name, "artifact already emitted"),
        }
        Ok(())
    }
}

/// Convenience for a single run.
pub fn generate(graph: &SchemaGraph, config: &CodegenConfig) -> Result<CodegenOutput> {
    let mut cg = Codegen::new(graph, config);
    cg.emit()?;
    Ok(cg.into_output())
}

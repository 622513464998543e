//! Federation entity keys.
//!
//! `@key(fields: "movie { id } actors { name }")` is parsed into a nested
//! [`KeyPaths`] tree, which then drives the `{Type}Representation` artifacts
//! used to address entities across services.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::{CodegenError, KeyPathError, Result};
use crate::ir::{ArtifactBody, ArtifactCategory, ArtifactDescriptor, RepresentationField};
use crate::resolve::TypeResolver;
use crate::schema::{KEY_DIRECTIVE, SchemaGraph, SchemaType, TypeKind};

// ————————————————————————————————————————————————————————————————————————————
// KEY PATHS
// ————————————————————————————————————————————————————————————————————————————

/// Key field name → nested selection, or `None` for a leaf key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyPaths(IndexMap<String, Option<KeyPaths>>);

impl KeyPaths {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The nested selection under `key`, if it has one.
    pub fn nested(&self, key: &str) -> Option<&KeyPaths> {
        self.0.get(key).and_then(Option::as_ref)
    }
}

/// Parses every expression into one merged tree. Re-inserting a key is a
/// no-op, so repeated `@key` occurrences merge.
pub fn parse_key_paths<S: AsRef<str>>(
    expressions: &[S],
) -> std::result::Result<KeyPaths, KeyPathError> {
    let mut paths = KeyPaths::default();
    for expression in expressions {
        let expression = expression.as_ref();
        let tokens = tokenize(expression);
        let mut cursor = 0;
        parse_level(expression, &tokens, &mut cursor, &mut paths, 0)?;
    }
    Ok(paths)
}

/// Braces are tokens of their own even without surrounding whitespace.
fn tokenize(expression: &str) -> Vec<String> {
    expression
        .replace('{', " { ")
        .replace('}', " } ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_level(
    expression: &str,
    tokens: &[String],
    cursor: &mut usize,
    target: &mut KeyPaths,
    depth: usize,
) -> std::result::Result<(), KeyPathError> {
    let mut last: Option<&str> = None;
    while let Some(token) = tokens.get(*cursor) {
        let position = *cursor;
        *cursor += 1;
        match token.as_str() {
            "{" => {
                let Some(key) = last.take() else {
                    return Err(KeyPathError::DanglingOpen {
                        expression: expression.to_string(),
                        position,
                    });
                };
                let slot = target.0.entry(key.to_string()).or_insert(None);
                let child = slot.get_or_insert_with(KeyPaths::default);
                parse_level(expression, tokens, cursor, child, depth + 1)?;
            }
            "}" => {
                if depth == 0 {
                    return Err(KeyPathError::UnmatchedClose {
                        expression: expression.to_string(),
                        position,
                    });
                }
                return Ok(());
            }
            name => {
                target.0.entry(name.to_string()).or_insert(None);
                last = Some(name);
            }
        }
    }
    if depth > 0 {
        return Err(KeyPathError::Unclosed { expression: expression.to_string() });
    }
    Ok(())
}

/// All `@key(fields:)` expressions of an entity, merged.
pub fn entity_key_paths(entity: &SchemaType) -> Result<KeyPaths> {
    let expressions: Vec<&str> = entity
        .directives_named(KEY_DIRECTIVE)
        .filter_map(|d| d.string_argument("fields"))
        .collect();
    parse_key_paths(&expressions).map_err(|source| CodegenError::KeyDirective {
        type_name: entity.name.clone(),
        source,
    })
}

// ————————————————————————————————————————————————————————————————————————————
// REPRESENTATIONS
// ————————————————————————————————————————————————————————————————————————————

pub fn representation_name(type_name: &str) -> String {
    format!("{type_name}Representation")
}

pub struct RepresentationBuilder<'a> {
    graph: &'a SchemaGraph,
    resolver: &'a TypeResolver<'a>,
    namespace: String,
}

impl<'a> RepresentationBuilder<'a> {
    pub fn new(
        graph: &'a SchemaGraph,
        resolver: &'a TypeResolver<'a>,
        namespace: impl Into<String>,
    ) -> Self {
        Self { graph, resolver, namespace: namespace.into() }
    }

    /// One representation per entity plus one per nested key type. Names
    /// already in `generated` are not produced again.
    pub fn build_all(&self, generated: &mut IndexSet<String>) -> Result<Vec<ArtifactDescriptor>> {
        let mut out = Vec::new();
        for entity in self.graph.entities() {
            let keys = entity_key_paths(entity)?;
            self.represent(entity, &keys, generated, &mut out)?;
        }
        Ok(out)
    }

    fn represent(
        &self,
        ty: &SchemaType,
        keys: &KeyPaths,
        generated: &mut IndexSet<String>,
        out: &mut Vec<ArtifactDescriptor>,
    ) -> Result<()> {
        let name = representation_name(&ty.name);
        if !generated.insert(name.clone()) {
            tracing::trace!(%name, "representation already generated");
            return Ok(());
        }
        // nested representations land after this one
        let slot = out.len();
        let mut fields = Vec::new();
        for field in ty.active_fields().filter(|f| keys.contains(&f.name)) {
            let inner = field.ty.inner_name();
            let resolved = self.resolver.resolve(&field.ty)?;
            let nested = self
                .graph
                .get(inner)
                .filter(|t| matches!(t.kind, TypeKind::Object | TypeKind::Interface));
            let field_ty = match nested {
                Some(nested) => {
                    let empty = KeyPaths::default();
                    let sub_keys = keys.nested(&field.name).unwrap_or(&empty);
                    self.represent(nested, sub_keys, generated, out)?;
                    resolved.map_innermost(|_| {
                        format!("{}.{}", self.namespace, representation_name(inner))
                    })
                }
                None => resolved,
            };
            fields.push(RepresentationField {
                name: field.name.clone(),
                ty: field_ty,
                default_value: None,
            });
        }
        fields.push(RepresentationField {
            name: "__typename".to_string(),
            ty: self.resolver.resolve_named("String")?,
            default_value: Some(ty.name.clone()),
        });

        tracing::debug!(%name, fields = fields.len(), "entity representation");
        out.insert(
            slot,
            ArtifactDescriptor {
                name,
                namespace: self.namespace.clone(),
                category: ArtifactCategory::EntityRepresentation,
                source_type: ty.name.clone(),
                body: ArtifactBody::EntityRepresentation { fields },
            },
        );
        Ok(())
    }
}

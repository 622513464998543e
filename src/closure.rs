//! Required-type closure: the input and enum types a chosen set of root
//! operation fields depends on.

use indexmap::IndexSet;

use crate::config::RootFieldFilter;
use crate::schema::{FieldDescriptor, MUTATION_TYPE, QUERY_TYPE, SchemaGraph, TypeKind};

pub struct RequiredTypeClosure<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> RequiredTypeClosure<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }

    /// `Query` fields named in `filter.queries` followed by `Mutation` fields
    /// named in `filter.mutations`. Skipped fields never count.
    pub fn root_fields(&self, filter: &RootFieldFilter) -> Vec<&'a FieldDescriptor> {
        let pick = |type_name: &str, names: &IndexSet<String>| -> Vec<&'a FieldDescriptor> {
            self.graph
                .get(type_name)
                .map(|ty| ty.active_fields().filter(|f| names.contains(&f.name)).collect())
                .unwrap_or_default()
        };
        let mut roots = pick(QUERY_TYPE, &filter.queries);
        roots.extend(pick(MUTATION_TYPE, &filter.mutations));
        roots
    }

    pub fn for_filter(&self, filter: &RootFieldFilter) -> IndexSet<String> {
        self.compute(&self.root_fields(filter))
    }

    /// Types come out in first-discovery order. Each named type is expanded
    /// at most once, whatever cycles the schema contains.
    pub fn compute(&self, roots: &[&FieldDescriptor]) -> IndexSet<String> {
        let mut closure = IndexSet::new();
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut pending: Vec<&str> = Vec::new();

        for root in roots.iter().rev() {
            pending.push(root.ty.inner_name());
            pending.extend(root.arguments.iter().rev().map(|a| a.ty.inner_name()));
        }

        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            let Some(ty) = self.graph.get(name) else {
                continue;
            };
            // children are pushed reversed so they pop in declaration order
            let mut children: Vec<&str> = Vec::new();
            match ty.kind {
                TypeKind::Enum => {
                    closure.insert(name.to_string());
                }
                TypeKind::Input => {
                    closure.insert(name.to_string());
                    children.extend(ty.active_fields().map(|f| f.ty.inner_name()));
                }
                TypeKind::Object | TypeKind::Interface => {
                    for field in ty.active_fields() {
                        children.extend(field.arguments.iter().map(|a| a.ty.inner_name()));
                        children.push(field.ty.inner_name());
                    }
                }
                TypeKind::Union => {
                    children.extend(ty.union_members.iter().map(String::as_str));
                }
                TypeKind::Scalar => {}
            }
            pending.extend(children.into_iter().rev());
        }

        tracing::debug!(types = closure.len(), "required type closure computed");
        closure
    }
}

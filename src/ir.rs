// Strongly-typed output IR handed to an emission backend. Schema types are
// referenced by name only; no `SchemaGraph` borrows leak out of a run.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

// ————————————————————————————————————————————————————————————————————————————
// TYPE DESCRIPTORS
// ————————————————————————————————————————————————————————————————————————————

/// A resolved target-language type: `java.util.List<com.acme.types.Person>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub target_name: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Non-nullable, no type arguments.
    pub fn named(target_name: impl Into<String>) -> Self {
        Self { target_name: target_name.into(), nullable: false, type_arguments: Vec::new() }
    }

    pub fn generic(target_name: impl Into<String>, type_arguments: Vec<TypeDescriptor>) -> Self {
        Self { target_name: target_name.into(), nullable: false, type_arguments }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Rewrites the innermost named type, keeping every wrapper.
    pub fn map_innermost(mut self, rename: impl FnOnce(&str) -> String) -> Self {
        match self.type_arguments.as_mut_slice() {
            [only] => {
                let inner = std::mem::replace(only, TypeDescriptor::named(""));
                *only = inner.map_innermost(rename);
            }
            _ => self.target_name = rename(&self.target_name),
        }
        self
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target_name)?;
        if !self.type_arguments.is_empty() {
            f.write_str("<")?;
            for (ix, arg) in self.type_arguments.iter().enumerate() {
                if ix > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ARTIFACTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactCategory {
    Data,
    Interface,
    Enum,
    Union,
    Input,
    ProjectionRoot,
    Projection,
    ProjectionFragment,
    EntityRepresentation,
    Operation,
    Constants,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub name: String,
    pub namespace: String,
    pub category: ArtifactCategory,
    /// The schema type this artifact was generated from; `Query.persons`
    /// for an operation.
    pub source_type: String,
    pub body: ArtifactBody,
}

impl ArtifactDescriptor {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ArtifactBody {
    Data { fields: Vec<DataField>, interfaces: Vec<String> },
    Interface { fields: Vec<DataField>, implementors: Vec<String> },
    Enum { values: Vec<String> },
    Union { members: Vec<String> },
    Input { fields: Vec<InputField> },
    Projection(ProjectionNode),
    EntityRepresentation { fields: Vec<RepresentationField> },
    Operation(OperationDescriptor),
    #[serde(rename_all = "camelCase")]
    Constants { operation_types: Vec<Constant>, types: Vec<TypeConstants> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    /// Declared by an implemented interface as well.
    pub inherited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_literal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Query => crate::schema::QUERY_TYPE,
            Self::Mutation => crate::schema::MUTATION_TYPE,
            Self::Subscription => crate::schema::SUBSCRIPTION_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub operation: OperationKind,
    pub field_name: String,
    pub arguments: Vec<ArgumentSpec>,
    pub return_type: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_root: Option<String>,
    /// `name: literal, ...` for arguments with a schema default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_literal: Option<String>,
}

/// `Persons = "persons"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    pub name: String,
    pub value: String,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Name constants of one object, input or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConstants {
    pub type_name: String,
    /// Nested holder name, e.g. `PERSON_FILTER`.
    pub name: String,
    pub constants: Vec<Constant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_arguments: Vec<ArgumentConstants>,
}

/// Argument names of one field, held as `{FIELD}_INPUT_ARGUMENT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentConstants {
    pub name: String,
    pub field_name: String,
    pub constants: Vec<Constant>,
}

// ————————————————————————————————————————————————————————————————————————————
// PROJECTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    Root,
    Field,
    Fragment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionNode {
    pub name: String,
    pub backing_type: String,
    pub role: NodeRole,
    /// Naming context only; the graph owns every node.
    pub parent: Option<String>,
    pub root: String,
    pub prefix: String,
    pub depth: usize,
    pub default_fields: Vec<String>,
    pub fields: Vec<ProjectionField>,
    pub fragments: Vec<FragmentAccessor>,
}

/// A selectable field. Leaves have no `child`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionField {
    pub name: String,
    pub accessor: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentAccessor {
    pub accessor: String,
    pub type_name: String,
    pub child: String,
}

/// Every projection node of one run, keyed by generated name in creation
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectionGraph {
    nodes: IndexMap<String, ProjectionNode>,
}

impl ProjectionGraph {
    pub fn get(&self, name: &str) -> Option<&ProjectionNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProjectionNode> {
        self.nodes.values()
    }

    pub fn roots(&self) -> impl Iterator<Item = &ProjectionNode> {
        self.nodes.values().filter(|n| n.role == NodeRole::Root)
    }

    pub(crate) fn insert(&mut self, node: ProjectionNode) {
        self.nodes.insert(node.name.clone(), node);
    }
}

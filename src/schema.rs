//! The schema graph consumed by every generation stage.
//!
//! Parsing schema text is someone else's job: definitions arrive already
//! parsed (usually as JSON, see [`SchemaDocument`]) and are merged here by
//! name. After [`SchemaGraph::from_definitions`] the graph is immutable.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodegenError;

// ————————————————————————————————————————————————————————————————————————————
// WELL-KNOWN NAMES
// ————————————————————————————————————————————————————————————————————————————

pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";
pub const SUBSCRIPTION_TYPE: &str = "Subscription";

/// Fields and types carrying this directive are excluded from generation.
pub const SKIP_DIRECTIVE: &str = "skipcodegen";
/// Federation entity identity: `@key(fields: "id")`.
pub const KEY_DIRECTIVE: &str = "key";
/// Custom scalar mapping: `scalar Money @javaType(name: "java.math.BigDecimal")`.
pub const JAVA_TYPE_DIRECTIVE: &str = "javaType";

pub fn is_operation_type(name: &str) -> bool {
    matches!(name, QUERY_TYPE | MUTATION_TYPE | SUBSCRIPTION_TYPE)
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE REFERENCES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Input,
    Scalar,
}

/// `Named`, `List` and `NonNull` wrappers. A reference is a finite tree even
/// when the named types it points at form cycles.
///
/// The textual form is the schema one: `Person`, `[Person!]!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeReference {
    Named(String),
    List(Box<TypeReference>),
    NonNull(Box<TypeReference>),
}

impl TypeReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
    pub fn list(inner: TypeReference) -> Self {
        Self::List(Box::new(inner))
    }
    pub fn non_null(inner: TypeReference) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// The named type at the bottom of the wrappers.
    pub fn inner_name(&self) -> &str {
        let mut current = self;
        loop {
            match current {
                Self::Named(name) => return name,
                Self::List(inner) | Self::NonNull(inner) => current = inner,
            }
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl FromStr for TypeReference {
    type Err = CodegenError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let trimmed = src.trim();
        if let Some(rest) = trimmed.strip_suffix('!') {
            let inner = rest.parse::<TypeReference>()?;
            if inner.is_non_null() {
                return Err(CodegenError::TypeReference(src.to_string()));
            }
            return Ok(Self::non_null(inner));
        }
        if let Some(rest) = trimmed.strip_prefix('[') {
            let Some(inner) = rest.strip_suffix(']') else {
                return Err(CodegenError::TypeReference(src.to_string()));
            };
            return Ok(Self::list(inner.parse()?));
        }
        let is_name = !trimmed.is_empty()
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !trimmed.starts_with(|c: char| c.is_ascii_digit());
        if is_name {
            Ok(Self::named(trimmed))
        } else {
            Err(CodegenError::TypeReference(src.to_string()))
        }
    }
}

impl TryFrom<String> for TypeReference {
    type Error = CodegenError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeReference> for String {
    fn from(value: TypeReference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFINITIONS (INPUT FORM)
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub arguments: IndexMap<String, Value>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), arguments: IndexMap::new() }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ArgumentDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeReference) -> Self {
        Self { name: name.into(), ty, default_value: None }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A field of an object, interface or input type. Input fields use the
/// same shape; their default value lives in `default_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub arguments: Vec<ArgumentDescriptor>,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Set from `@skipcodegen` while the graph is built.
    #[serde(default)]
    pub skip: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeReference) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            directives: Vec::new(),
            default_value: None,
            skip: false,
        }
    }

    pub fn with_argument(mut self, argument: ArgumentDescriptor) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }
}

/// One definition or extension fragment, as handed over by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub extension: bool,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            implements: Vec::new(),
            members: Vec::new(),
            values: Vec::new(),
            directives: Vec::new(),
            extension: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn union(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Union)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Input)
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Scalar)
    }

    pub fn as_extension(mut self) -> Self {
        self.extension = true;
        self
    }

    pub fn field(self, name: impl Into<String>, ty: TypeReference) -> Self {
        self.with_field(FieldDescriptor::new(name, ty))
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn implements<S: AsRef<str>>(mut self, interfaces: &[S]) -> Self {
        self.implements.extend(interfaces.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn members<S: AsRef<str>>(mut self, members: &[S]) -> Self {
        self.members.extend(members.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn values<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.values.extend(values.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

/// A whole schema document in its JSON form: `{ "definitions": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub definitions: Vec<TypeDefinition>,
}

// ————————————————————————————————————————————————————————————————————————————
// MERGED GRAPH
// ————————————————————————————————————————————————————————————————————————————

/// A type after all of its extension fragments were folded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<FieldDescriptor>,
    pub implemented_interfaces: Vec<String>,
    pub union_members: Vec<String>,
    pub enum_values: Vec<String>,
    pub directives: Vec<Directive>,
}

impl SchemaType {
    fn from_definition(def: TypeDefinition) -> Self {
        let mut out = Self {
            name: def.name,
            kind: def.kind,
            fields: Vec::new(),
            implemented_interfaces: Vec::new(),
            union_members: Vec::new(),
            enum_values: Vec::new(),
            directives: Vec::new(),
        };
        out.absorb(def.fields, def.implements, def.members, def.values, def.directives);
        out
    }

    fn absorb(
        &mut self,
        fields: Vec<FieldDescriptor>,
        implements: Vec<String>,
        members: Vec<String>,
        values: Vec<String>,
        directives: Vec<Directive>,
    ) {
        for mut field in fields {
            if self.fields.iter().any(|f| f.name == field.name) {
                continue;
            }
            field.skip = field.skip || field.has_directive(SKIP_DIRECTIVE);
            self.fields.push(field);
        }
        push_unique(&mut self.implemented_interfaces, implements);
        push_unique(&mut self.union_members, members);
        push_unique(&mut self.enum_values, values);
        for directive in directives {
            // repeatable directives (`@key`) keep every occurrence
            if !self.directives.contains(&directive) {
                self.directives.push(directive);
            }
        }
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }

    pub fn directives_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Directive> + 'a {
        self.directives.iter().filter(move |d| d.name == name)
    }

    pub fn is_skipped(&self) -> bool {
        self.has_directive(SKIP_DIRECTIVE)
    }

    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Object && self.has_directive(KEY_DIRECTIVE)
    }

    /// Fields that take part in generation.
    pub fn active_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.skip)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn push_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    types: IndexMap<String, SchemaType>,
    implementors: IndexMap<String, Vec<String>>,
    capabilities: IndexMap<String, IndexSet<String>>,
}

impl SchemaGraph {
    pub fn from_document(doc: SchemaDocument) -> Self {
        Self::from_definitions(doc.definitions)
    }

    /// Merge definitions and extension fragments by name.
    ///
    /// Extensions are applied after every base definition is known, so an
    /// extension may precede its base in the input.
    pub fn from_definitions(definitions: Vec<TypeDefinition>) -> Self {
        let (bases, extensions): (Vec<_>, Vec<_>) =
            definitions.into_iter().partition(|d| !d.extension);

        let mut types: IndexMap<String, SchemaType> = IndexMap::new();
        for def in bases {
            match types.get_mut(&def.name) {
                Some(existing) => existing.absorb(
                    def.fields,
                    def.implements,
                    def.members,
                    def.values,
                    def.directives,
                ),
                None => {
                    types.insert(def.name.clone(), SchemaType::from_definition(def));
                }
            }
        }
        for ext in extensions {
            match types.get_mut(&ext.name) {
                Some(existing) => existing.absorb(
                    ext.fields,
                    ext.implements,
                    ext.members,
                    ext.values,
                    ext.directives,
                ),
                None => {
                    tracing::debug!(name = %ext.name, "extension without base definition");
                    types.insert(ext.name.clone(), SchemaType::from_definition(ext));
                }
            }
        }

        let mut implementors: IndexMap<String, Vec<String>> = IndexMap::new();
        for ty in types.values().filter(|t| t.kind == TypeKind::Object) {
            for iface in &ty.implemented_interfaces {
                implementors.entry(iface.clone()).or_default().push(ty.name.clone());
            }
        }

        let mut graph = Self { types, implementors, capabilities: IndexMap::new() };
        graph.capabilities = graph
            .types
            .keys()
            .map(|name| (name.clone(), graph.collect_capabilities(name)))
            .collect();
        graph
    }

    fn collect_capabilities(&self, name: &str) -> IndexSet<String> {
        let mut out = IndexSet::new();
        let mut visited = IndexSet::new();
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(ty) = self.types.get(&current) else { continue };
            out.extend(ty.active_fields().map(|f| f.name.clone()));
            pending.extend(ty.implemented_interfaces.iter().rev().cloned());
        }
        out
    }

    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.types.get(name).map(|t| t.kind)
    }

    /// All types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    pub fn types_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &SchemaType> {
        self.types.values().filter(move |t| t.kind == kind)
    }

    /// Object types listing `interface` among their interfaces.
    pub fn implementors(&self, interface: &str) -> &[String] {
        self.implementors.get(interface).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flattened set of field names a type must expose: its own fields plus
    /// the fields of every interface it implements, transitively.
    pub fn capabilities(&self, name: &str) -> Option<&IndexSet<String>> {
        self.capabilities.get(name)
    }

    /// Object types carrying `@key`, in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values().filter(|t| t.is_entity())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ------------------------------- Tests ------------------------------------ //

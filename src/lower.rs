//! Lowering of schema types into artifact descriptors.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::ir::{
    ArgumentConstants, ArgumentSpec, ArtifactBody, ArtifactCategory, ArtifactDescriptor, Constant,
    DataField, InputField, NodeRole, OperationDescriptor, OperationKind, ProjectionNode,
    TypeConstants,
};
use crate::literal::{DefaultsAccumulator, InputValue, LiteralSerializer, Slot};
use crate::projection::naming::capitalize;
use crate::resolve::TypeResolver;
use crate::schema::{
    ArgumentDescriptor, FieldDescriptor, SchemaGraph, SchemaType, TypeKind, TypeReference,
    is_operation_type,
};

/// Name of the schema-wide constants artifact.
pub const CONSTANTS_ARTIFACT: &str = "GraphQLConstants";

// ------------------------------- Helpers ---------------------------------- //

/// Renders a JSON default value as a literal of the declared type.
pub fn default_literal(
    value: Option<&Value>,
    ty: &TypeReference,
    literals: &LiteralSerializer,
    graph: &SchemaGraph,
) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = InputValue::from_json(value, ty, graph)?;
    literals.serialize(&value).map(Some)
}

pub fn argument_specs(
    arguments: &[ArgumentDescriptor],
    resolver: &TypeResolver<'_>,
    literals: &LiteralSerializer,
    graph: &SchemaGraph,
) -> Result<Vec<ArgumentSpec>> {
    arguments
        .iter()
        .map(|arg| {
            Ok(ArgumentSpec {
                name: arg.name.clone(),
                ty: resolver.resolve(&arg.ty)?,
                default_literal: default_literal(
                    arg.default_value.as_ref(),
                    &arg.ty,
                    literals,
                    graph,
                )?,
            })
        })
        .collect()
}

/// `PersonFilter` → `PERSON_FILTER`, `XMLHttp` → `XML_HTTP`.
pub fn screaming_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (ix, &c) in chars.iter().enumerate() {
        if ix > 0 && c.is_uppercase() {
            let prev = chars[ix - 1];
            let starts_word = chars.get(ix + 1).is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && starts_word)
            {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Keeps the first constant of a given name.
fn push_constant(constants: &mut IndexMap<String, String>, name: String, value: &str) {
    constants.entry(name).or_insert_with(|| value.to_string());
}

fn into_constants(constants: IndexMap<String, String>) -> Vec<Constant> {
    constants.into_iter().map(|(name, value)| Constant::new(name, value)).collect()
}

pub fn projection_category(role: NodeRole) -> ArtifactCategory {
    match role {
        NodeRole::Root => ArtifactCategory::ProjectionRoot,
        NodeRole::Field => ArtifactCategory::Projection,
        NodeRole::Fragment => ArtifactCategory::ProjectionFragment,
    }
}

// ------------------------------- Lowering --------------------------------- //

pub struct Lowering<'a> {
    graph: &'a SchemaGraph,
    config: &'a CodegenConfig,
    resolver: &'a TypeResolver<'a>,
    literals: &'a LiteralSerializer,
    types_namespace: String,
    client_namespace: String,
}

impl<'a> Lowering<'a> {
    pub fn new(
        graph: &'a SchemaGraph,
        config: &'a CodegenConfig,
        resolver: &'a TypeResolver<'a>,
        literals: &'a LiteralSerializer,
    ) -> Self {
        Self {
            graph,
            config,
            resolver,
            literals,
            types_namespace: config.types_namespace(),
            client_namespace: config.client_namespace(),
        }
    }

    /// Operation types, scalars, skipped and mapped types never get a type
    /// artifact. Otherwise `generateAllTypes` or closure membership decides.
    pub fn includes(&self, ty: &SchemaType, closure: &IndexSet<String>) -> bool {
        if is_operation_type(&ty.name)
            || ty.kind == TypeKind::Scalar
            || ty.is_skipped()
            || self.config.is_mapped(&ty.name)
        {
            return false;
        }
        self.config.generate_all_types || closure.contains(&ty.name)
    }

    pub fn lower_type(&self, ty: &SchemaType) -> Result<Option<ArtifactDescriptor>> {
        let (category, body) = match ty.kind {
            TypeKind::Object => (
                ArtifactCategory::Data,
                ArtifactBody::Data {
                    fields: self.data_fields(ty)?,
                    interfaces: ty.implemented_interfaces.clone(),
                },
            ),
            TypeKind::Interface => (
                ArtifactCategory::Interface,
                ArtifactBody::Interface {
                    fields: self.data_fields(ty)?,
                    implementors: self.graph.implementors(&ty.name).to_vec(),
                },
            ),
            TypeKind::Enum => (
                ArtifactCategory::Enum,
                ArtifactBody::Enum { values: ty.enum_values.clone() },
            ),
            TypeKind::Union => (
                ArtifactCategory::Union,
                ArtifactBody::Union { members: ty.union_members.clone() },
            ),
            TypeKind::Input => (
                ArtifactCategory::Input,
                ArtifactBody::Input { fields: self.input_fields(ty)? },
            ),
            TypeKind::Scalar => return Ok(None),
        };
        tracing::debug!(name = %ty.name, ?category, "type artifact");
        Ok(Some(ArtifactDescriptor {
            name: ty.name.clone(),
            namespace: self.types_namespace.clone(),
            category,
            source_type: ty.name.clone(),
            body,
        }))
    }

    fn data_fields(&self, ty: &SchemaType) -> Result<Vec<DataField>> {
        let inherited = |name: &str| {
            ty.implemented_interfaces
                .iter()
                .filter_map(|iface| self.graph.capabilities(iface))
                .any(|caps| caps.contains(name))
        };
        ty.active_fields()
            .map(|field| {
                Ok(DataField {
                    name: field.name.clone(),
                    ty: self.resolver.resolve(&field.ty)?,
                    inherited: inherited(&field.name),
                })
            })
            .collect()
    }

    fn input_fields(&self, ty: &SchemaType) -> Result<Vec<InputField>> {
        ty.active_fields()
            .map(|field| {
                Ok(InputField {
                    name: field.name.clone(),
                    ty: self.resolver.resolve(&field.ty)?,
                    default_literal: default_literal(
                        field.default_value.as_ref(),
                        &field.ty,
                        self.literals,
                        self.graph,
                    )?,
                })
            })
            .collect()
    }

    /// `{Field}GraphQLQuery`; a mutation or subscription whose name is
    /// already taken gets `GraphQLMutation` / `GraphQLSubscription`.
    pub fn operation(
        &self,
        kind: OperationKind,
        field: &FieldDescriptor,
        projection_root: Option<String>,
        used_names: &mut IndexSet<String>,
    ) -> Result<ArtifactDescriptor> {
        let base = capitalize(&field.name);
        let name = match kind {
            OperationKind::Mutation if used_names.contains(&base) => {
                format!("{base}GraphQLMutation")
            }
            OperationKind::Subscription if used_names.contains(&base) => {
                format!("{base}GraphQLSubscription")
            }
            _ => {
                let name = format!("{base}GraphQLQuery");
                used_names.insert(base);
                name
            }
        };

        let defaults = field
            .arguments
            .iter()
            .map(|arg| {
                let slot = match &arg.default_value {
                    Some(value) => Slot::Given(InputValue::from_json(value, &arg.ty, self.graph)?),
                    None => Slot::Unspecified,
                };
                Ok((arg.name.clone(), slot))
            })
            .collect::<Result<Vec<_>>>()?;
        let (default_arguments, unspecified) =
            self.literals.format_args(&defaults, DefaultsAccumulator::new())?;
        for argument in unspecified.names() {
            tracing::trace!(%name, %argument, "argument has no default");
        }

        tracing::debug!(%name, operation = ?kind, field = %field.name, "operation");
        Ok(ArtifactDescriptor {
            name,
            namespace: self.client_namespace.clone(),
            category: ArtifactCategory::Operation,
            source_type: format!("{}.{}", kind.type_name(), field.name),
            body: ArtifactBody::Operation(OperationDescriptor {
                operation: kind,
                field_name: field.name.clone(),
                arguments: argument_specs(
                    &field.arguments,
                    self.resolver,
                    self.literals,
                    self.graph,
                )?,
                return_type: self.resolver.resolve(&field.ty)?,
                projection_root,
                default_arguments: Some(default_arguments).filter(|s| !s.is_empty()),
            }),
        })
    }

    /// Field and argument names of every object, input and interface type,
    /// operation types included. Generated for the whole schema regardless
    /// of the root field filter.
    pub fn constants(&self) -> ArtifactDescriptor {
        let operation_types = OperationKind::ALL
            .iter()
            .map(|kind| kind.type_name())
            .filter(|name| self.graph.kind_of(name) == Some(TypeKind::Object))
            .map(|name| Constant::new(format!("{}_TYPE", name.to_uppercase()), name))
            .collect();

        let mut types = Vec::new();
        for kind in [TypeKind::Object, TypeKind::Input, TypeKind::Interface] {
            for ty in self.graph.types_of_kind(kind).filter(|ty| !ty.is_skipped()) {
                types.push(self.type_constants(ty));
            }
        }

        tracing::debug!(types = types.len(), "schema constants");
        ArtifactDescriptor {
            name: CONSTANTS_ARTIFACT.to_string(),
            namespace: self.config.target_namespace.clone(),
            category: ArtifactCategory::Constants,
            source_type: "schema".to_string(),
            body: ArtifactBody::Constants { operation_types, types },
        }
    }

    fn type_constants(&self, ty: &SchemaType) -> TypeConstants {
        let mut constants = IndexMap::new();
        push_constant(&mut constants, "TYPE_NAME".to_string(), &ty.name);
        let mut input_arguments: Vec<ArgumentConstants> = Vec::new();

        for field in ty.active_fields() {
            push_constant(&mut constants, self.constant_name(&field.name), &field.name);
            if ty.kind != TypeKind::Object || field.arguments.is_empty() {
                continue;
            }
            let name = format!("{}_INPUT_ARGUMENT", self.holder_name(&field.name));
            if input_arguments.iter().any(|group| group.name == name) {
                continue;
            }
            let mut arguments = IndexMap::new();
            for arg in &field.arguments {
                push_constant(&mut arguments, self.constant_name(&arg.name), &arg.name);
            }
            input_arguments.push(ArgumentConstants {
                name,
                field_name: field.name.clone(),
                constants: into_constants(arguments),
            });
        }

        TypeConstants {
            type_name: ty.name.clone(),
            name: self.holder_name(&ty.name),
            constants: into_constants(constants),
            input_arguments,
        }
    }

    fn holder_name(&self, name: &str) -> String {
        if self.config.snake_case_constant_names {
            screaming_snake_case(name)
        } else {
            name.to_uppercase()
        }
    }

    fn constant_name(&self, name: &str) -> String {
        self.resolver.accessor_name(&capitalize(name))
    }

    pub fn projection(&self, node: &ProjectionNode) -> ArtifactDescriptor {
        ArtifactDescriptor {
            name: node.name.clone(),
            namespace: self.client_namespace.clone(),
            category: projection_category(node.role),
            source_type: node.backing_type.clone(),
            body: ArtifactBody::Projection(node.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Directive, SKIP_DIRECTIVE, TypeDefinition};
    use crate::testing::t;
    use serde_json::json;
    use test_case::test_case;

    fn schema() -> SchemaGraph {
        SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").with_field(
                FieldDescriptor::new("persons", t("[Person!]!"))
                    .with_argument(
                        ArgumentDescriptor::new("first", t("Int")).with_default(json!(10)),
                    )
                    .with_argument(ArgumentDescriptor::new("filter", t("PersonFilter"))),
            ),
            TypeDefinition::object("Mutation")
                .field("persons", t("Int"))
                .field("rename", t("Person")),
            TypeDefinition::object("Subscription").field("persons", t("Person")),
            TypeDefinition::interface("Named").field("name", t("String")),
            TypeDefinition::object("Person")
                .implements(&["Named"])
                .field("name", t("String"))
                .field("age", t("Int")),
            TypeDefinition::input("PersonFilter")
                .with_field(FieldDescriptor::new("genre", t("Genre")).with_default(json!("DRAMA")))
                .field("limit", t("Int")),
            TypeDefinition::enumeration("Genre").values(&["DRAMA"]),
            TypeDefinition::scalar("Money"),
            TypeDefinition::object("Hidden").with_directive(Directive::new(SKIP_DIRECTIVE)),
            TypeDefinition::object("Mapped").field("id", t("ID")),
        ])
    }

    fn config() -> CodegenConfig {
        let mut config = CodegenConfig {
            target_namespace: "com.acme".into(),
            ..CodegenConfig::default()
        };
        config.type_mapping.insert("Mapped".into(), "com.acme.External".into());
        config
    }

    #[test]
    fn inclusion_rules() {
        let graph = schema();
        let config = config();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let closure = IndexSet::new();
        let included: Vec<_> = graph
            .types()
            .filter(|t| lowering.includes(t, &closure))
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(included, ["Named", "Person", "PersonFilter", "Genre"]);

        let only_closure = CodegenConfig { generate_all_types: false, ..config.clone() };
        let lowering = Lowering::new(&graph, &only_closure, &resolver, &literals);
        let closure: IndexSet<String> = ["Genre".to_string()].into_iter().collect();
        let included: Vec<_> = graph
            .types()
            .filter(|t| lowering.includes(t, &closure))
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(included, ["Genre"]);
    }

    #[test]
    fn data_fields_mark_inherited() {
        let graph = schema();
        let config = config();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let person = lowering.lower_type(graph.get("Person").unwrap()).unwrap().unwrap();
        assert_eq!(person.category, ArtifactCategory::Data);
        assert_eq!(person.qualified_name(), "com.acme.types.Person");
        let ArtifactBody::Data { fields, interfaces } = person.body else {
            panic!("unexpected body");
        };
        assert_eq!(interfaces, ["Named"]);
        assert!(fields[0].inherited);
        assert!(!fields[1].inherited);

        let named = lowering.lower_type(graph.get("Named").unwrap()).unwrap().unwrap();
        let ArtifactBody::Interface { implementors, .. } = named.body else {
            panic!("unexpected body");
        };
        assert_eq!(implementors, ["Person"]);
    }

    #[test]
    fn input_defaults_are_rendered() {
        let graph = schema();
        let config = config();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let filter = lowering.lower_type(graph.get("PersonFilter").unwrap()).unwrap().unwrap();
        let ArtifactBody::Input { fields } = filter.body else {
            panic!("unexpected body");
        };
        assert_eq!(fields[0].default_literal.as_deref(), Some("DRAMA"));
        assert_eq!(fields[1].default_literal, None);
        assert_eq!(lowering.lower_type(graph.get("Money").unwrap()).unwrap(), None);
    }

    #[test]
    fn operation_names_avoid_collisions() {
        let graph = schema();
        let config = config();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let mut used = IndexSet::new();

        let mut lower = |kind: OperationKind, field: &str, root: Option<&str>| {
            let field = graph.get(kind.type_name()).unwrap().field(field).unwrap();
            lowering.operation(kind, field, root.map(str::to_string), &mut used).unwrap()
        };
        let query = lower(OperationKind::Query, "persons", Some("PersonsProjectionRoot"));
        let mutation = lower(OperationKind::Mutation, "persons", None);
        let rename = lower(OperationKind::Mutation, "rename", None);
        let sub = lower(OperationKind::Subscription, "persons", None);

        assert_eq!(query.name, "PersonsGraphQLQuery");
        assert_eq!(mutation.name, "PersonsGraphQLMutation");
        assert_eq!(rename.name, "RenameGraphQLQuery");
        assert_eq!(sub.name, "PersonsGraphQLSubscription");

        let ArtifactBody::Operation(op) = query.body else {
            panic!("unexpected body");
        };
        assert_eq!(op.return_type.to_string(), "java.util.List<com.acme.types.Person>");
        assert_eq!(op.arguments.len(), 2);
        assert_eq!(op.default_arguments.as_deref(), Some("first: 10"));
        assert_eq!(op.projection_root.as_deref(), Some("PersonsProjectionRoot"));
    }

    #[test]
    fn constants_holders_in_kind_order() {
        let graph = schema();
        let config = CodegenConfig { snake_case_constant_names: true, ..config() };
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let artifact = lowering.constants();
        assert_eq!(artifact.qualified_name(), "com.acme.GraphQLConstants");
        assert_eq!(artifact.category, ArtifactCategory::Constants);
        let ArtifactBody::Constants { operation_types, types } = artifact.body else {
            panic!("unexpected body");
        };

        let operation_types: Vec<_> = operation_types.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(operation_types, ["QUERY_TYPE", "MUTATION_TYPE", "SUBSCRIPTION_TYPE"]);
        let holders: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            holders,
            ["QUERY", "MUTATION", "SUBSCRIPTION", "PERSON", "MAPPED", "PERSON_FILTER", "NAMED"]
        );

        let query = &types[0];
        assert_eq!(query.constants[1], Constant::new("Persons", "persons"));
        assert_eq!(query.input_arguments.len(), 1);
        assert_eq!(query.input_arguments[0].name, "PERSONS_INPUT_ARGUMENT");
        let arguments: Vec<_> =
            query.input_arguments[0].constants.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(arguments, ["first", "filter"]);

        let filter = &types[5];
        assert_eq!(filter.constants[0], Constant::new("TYPE_NAME", "PersonFilter"));
        assert!(filter.input_arguments.is_empty());
    }

    #[test]
    fn constant_names_dedupe_after_capitalizing() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Node").field("class", t("String")).field("Class", t("String")),
        ]);
        let config = config();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let lowering = Lowering::new(&graph, &config, &resolver, &literals);
        let ArtifactBody::Constants { types, .. } = lowering.constants().body else {
            panic!("unexpected body");
        };
        assert_eq!(types[0].name, "NODE");
        // both fields capitalize to `Class`; the first one keeps the name
        assert_eq!(
            types[0].constants,
            [Constant::new("TYPE_NAME", "Node"), Constant::new("Class", "class")]
        );
    }

    #[test_case("PersonFilter", "PERSON_FILTER")]
    #[test_case("XMLHttpRequest", "XML_HTTP_REQUEST")]
    #[test_case("persons", "PERSONS")]
    #[test_case("ID", "ID")]
    #[test_case("v2Show", "V2_SHOW")]
    fn snake_case_holder_names(name: &str, expected: &str) {
        assert_eq!(screaming_snake_case(name), expected);
    }
}

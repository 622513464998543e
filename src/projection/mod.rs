//! Projection builders: fluent selection-set descriptors that mirror the
//! schema's type graph, cycles included.
//!
//! Every node is named `prefix + BackingType + "Projection"`, where the
//! prefix accumulates the capitalized field names traversed from the root.
//! A name produced twice for the same backing type is shared, not rebuilt.
//! Recursion along an edge `(field type, enclosing type)` stops once the
//! edge was taken [`guard::MAX_VISITS`] times on the current branch.
pub mod guard;
pub mod naming;

use crate::error::Result;
use crate::ir::{FragmentAccessor, NodeRole, ProjectionField, ProjectionGraph, ProjectionNode};
use crate::literal::LiteralSerializer;
use crate::lower::argument_specs;
use crate::resolve::{Selection, TypeResolver};
use crate::schema::{FieldDescriptor, SUBSCRIPTION_TYPE, SchemaGraph, SchemaType, TypeKind};

use guard::{Claim, NameRegistry, VisitGuard};
use naming::NamingPolicy;

pub const TYPENAME_FIELD: &str = "__typename";
pub const ENTITIES_ROOT: &str = "EntitiesProjectionRoot";
const ENTITY_UNION: &str = "_Entity";

/// Everything a node needs besides its backing type.
struct NodePlan {
    name: String,
    role: NodeRole,
    parent: Option<String>,
    root: String,
    prefix: String,
    depth: usize,
    default_fields: Vec<String>,
}

/// Builds the projection graph of one generation run. Holds the run's name
/// registry; create a fresh builder per run.
pub struct ProjectionGraphBuilder<'a> {
    graph: &'a SchemaGraph,
    resolver: &'a TypeResolver<'a>,
    literals: &'a LiteralSerializer,
    naming: NamingPolicy,
    max_depth: Option<usize>,
    names: NameRegistry,
    output: ProjectionGraph,
}

impl<'a> ProjectionGraphBuilder<'a> {
    pub fn new(
        graph: &'a SchemaGraph,
        resolver: &'a TypeResolver<'a>,
        literals: &'a LiteralSerializer,
        naming: NamingPolicy,
    ) -> Self {
        Self {
            graph,
            resolver,
            literals,
            naming,
            max_depth: None,
            names: NameRegistry::new(),
            output: ProjectionGraph::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Root projection `{prefix}ProjectionRoot` for `root_type`. Returns the
    /// root's name; building an already registered root is a no-op.
    pub fn build(&mut self, root_type: &SchemaType, prefix: &str) -> Result<String> {
        self.build_root(root_type, prefix, vec![TYPENAME_FIELD.to_string()])
    }

    /// Root projection for an operation field, or `None` when the field does
    /// not return a composite type. Subscription roots get no `__typename`.
    pub fn build_operation_root(
        &mut self,
        operation: &str,
        field: &FieldDescriptor,
    ) -> Result<Option<String>> {
        let type_name = field.ty.inner_name();
        if self.resolver.selection(type_name) != Some(Selection::Composite) {
            return Ok(None);
        }
        let Some(root_type) = self.graph.get(type_name) else {
            return Ok(None);
        };
        let default_fields = if operation == SUBSCRIPTION_TYPE {
            Vec::new()
        } else {
            vec![TYPENAME_FIELD.to_string()]
        };
        let prefix = self.naming.root_prefix(&field.name);
        self.build_root(root_type, &prefix, default_fields).map(Some)
    }

    /// `EntitiesProjectionRoot` with one `on{Type}` fragment per entity, or
    /// `None` when the schema has no entities.
    pub fn build_entities_root(&mut self) -> Result<Option<String>> {
        let entities: Vec<&'a SchemaType> = self.graph.entities().collect();
        if entities.is_empty() {
            return Ok(None);
        }
        let root = ENTITIES_ROOT.to_string();
        if self.names.claim(&root, ENTITY_UNION)? == Claim::Existing {
            return Ok(Some(root));
        }
        let mut fragments = Vec::new();
        for entity in entities {
            let prefix = format!("Entities{}Key", naming::capitalize(&entity.name));
            let plan = NodePlan {
                name: format!("{prefix}Projection"),
                role: NodeRole::Fragment,
                parent: Some(root.clone()),
                root: root.clone(),
                prefix,
                depth: 0,
                default_fields: Vec::new(),
            };
            let child = self.build_node(entity, plan, &VisitGuard::new())?;
            fragments.push(FragmentAccessor {
                accessor: format!("on{}", entity.name),
                type_name: entity.name.clone(),
                child,
            });
        }
        self.output.insert(ProjectionNode {
            name: root.clone(),
            backing_type: ENTITY_UNION.to_string(),
            role: NodeRole::Root,
            parent: None,
            root: root.clone(),
            prefix: "Entities".to_string(),
            depth: 0,
            default_fields: vec![TYPENAME_FIELD.to_string()],
            fields: Vec::new(),
            fragments,
        });
        tracing::debug!(name = %root, "entities projection root");
        Ok(Some(root))
    }

    pub fn finish(self) -> ProjectionGraph {
        self.output
    }

    fn build_root(
        &mut self,
        root_type: &SchemaType,
        prefix: &str,
        default_fields: Vec<String>,
    ) -> Result<String> {
        let name = self.naming.root_name(prefix);
        let plan = NodePlan {
            name: name.clone(),
            role: NodeRole::Root,
            parent: None,
            root: name,
            prefix: prefix.to_string(),
            depth: 0,
            default_fields,
        };
        self.build_node(root_type, plan, &VisitGuard::new())
    }

    fn build_node(
        &mut self,
        backing: &SchemaType,
        plan: NodePlan,
        guard: &VisitGuard,
    ) -> Result<String> {
        if self.names.claim(&plan.name, &backing.name)? == Claim::Existing {
            tracing::trace!(name = %plan.name, "projection already generated");
            return Ok(plan.name);
        }

        let mut fields = Vec::new();
        for field in backing.active_fields() {
            let type_name = field.ty.inner_name();
            let selection = match self.resolver.selection(type_name) {
                Some(selection) => selection,
                None => {
                    tracing::warn!(
                        field = %field.name,
                        parent = %backing.name,
                        ty = %type_name,
                        "undefined type, field left out of projection"
                    );
                    continue;
                }
            };
            let arguments =
                argument_specs(&field.arguments, self.resolver, self.literals, self.graph)?;
            let accessor = self.resolver.accessor_name(&field.name);
            let child = match selection {
                Selection::Leaf => None,
                Selection::Composite => {
                    match self.build_field_child(backing, field, &plan, guard)? {
                        Some(child) => Some(child),
                        None => continue,
                    }
                }
            };
            fields.push(ProjectionField { name: field.name.clone(), accessor, arguments, child });
        }

        let members: &[String] = match backing.kind {
            TypeKind::Interface => self.graph.implementors(&backing.name),
            TypeKind::Union => &backing.union_members,
            _ => &[],
        };
        let mut fragments = Vec::new();
        for member in members {
            let Some(member_type) = self.graph.get(member).filter(|t| t.kind == TypeKind::Object)
            else {
                tracing::warn!(
                    member = %member,
                    parent = %backing.name,
                    "fragment target is not an object type"
                );
                continue;
            };
            let child_plan = NodePlan {
                name: self.naming.node_name(&plan.prefix, &member_type.name),
                role: NodeRole::Fragment,
                parent: Some(plan.name.clone()),
                root: plan.root.clone(),
                prefix: self.naming.fragment_prefix(&plan.prefix, &member_type.name),
                depth: plan.depth,
                default_fields: vec![TYPENAME_FIELD.to_string()],
            };
            // fragments narrow the same selection, so the guard carries over
            let child = self.build_node(member_type, child_plan, guard)?;
            fragments.push(FragmentAccessor {
                accessor: format!("on{}", member_type.name),
                type_name: member_type.name.clone(),
                child,
            });
        }

        tracing::debug!(
            name = %plan.name,
            backing = %backing.name,
            fields = fields.len(),
            fragments = fragments.len(),
            "projection node"
        );
        let name = plan.name.clone();
        self.output.insert(ProjectionNode {
            name: plan.name,
            backing_type: backing.name.clone(),
            role: plan.role,
            parent: plan.parent,
            root: plan.root,
            prefix: plan.prefix,
            depth: plan.depth,
            default_fields: plan.default_fields,
            fields,
            fragments,
        });
        Ok(name)
    }

    /// The child node behind a composite field, or `None` when the branch
    /// ends here.
    fn build_field_child(
        &mut self,
        backing: &SchemaType,
        field: &FieldDescriptor,
        plan: &NodePlan,
        guard: &VisitGuard,
    ) -> Result<Option<String>> {
        let type_name = field.ty.inner_name();
        if self.max_depth.is_some_and(|max| plan.depth + 1 > max) {
            tracing::trace!(
                field = %field.name,
                parent = %plan.name,
                "projection depth limit reached"
            );
            return Ok(None);
        }
        let Some(child_guard) = guard.descend(type_name, &backing.name) else {
            tracing::trace!(field = %field.name, parent = %plan.name, "cycle cut off");
            return Ok(None);
        };
        let Some(child_type) = self.graph.get(type_name) else {
            return Ok(None);
        };
        let prefix = self.naming.field_prefix(&plan.prefix, &field.name);
        let child_plan = NodePlan {
            name: self.naming.node_name(&prefix, &child_type.name),
            role: NodeRole::Field,
            parent: Some(plan.name.clone()),
            root: plan.root.clone(),
            prefix,
            depth: plan.depth + 1,
            default_fields: vec![TYPENAME_FIELD.to_string()],
        };
        self.build_node(child_type, child_plan, &child_guard).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenConfig;
    use crate::error::CodegenError;
    use crate::schema::{ArgumentDescriptor, Directive, KEY_DIRECTIVE, QUERY_TYPE, TypeDefinition};
    use crate::testing::{person_schema, t, video_schema};

    fn node_field<'a>(node: &'a ProjectionNode, name: &str) -> Option<&'a ProjectionField> {
        node.fields.iter().find(|f| f.name == name)
    }

    fn node_fragment<'a>(
        node: &'a ProjectionNode,
        type_name: &str,
    ) -> Option<&'a FragmentAccessor> {
        node.fragments.iter().find(|f| f.type_name == type_name)
    }

    /// Follows a chain of field accessors from `start`.
    fn walk<'a>(
        out: &'a ProjectionGraph,
        start: &str,
        path: &[&str],
    ) -> Option<&'a ProjectionNode> {
        let mut node = out.get(start)?;
        for step in path {
            let child = node_field(node, step)?.child.as_deref()?;
            node = out.get(child)?;
        }
        Some(node)
    }

    fn build_with<F>(graph: &SchemaGraph, config: &CodegenConfig, f: F) -> ProjectionGraph
    where
        F: FnOnce(&mut ProjectionGraphBuilder<'_>),
    {
        let resolver = TypeResolver::new(graph, config);
        let literals = LiteralSerializer::new(graph);
        let naming = NamingPolicy::from_config(config);
        let mut builder = ProjectionGraphBuilder::new(graph, &resolver, &literals, naming)
            .with_max_depth(config.max_projection_depth);
        f(&mut builder);
        builder.finish()
    }

    fn query_roots(graph: &SchemaGraph, config: &CodegenConfig) -> ProjectionGraph {
        build_with(graph, config, |builder| {
            for field in graph.get(QUERY_TYPE).unwrap().active_fields() {
                builder.build_operation_root(QUERY_TYPE, field).unwrap();
            }
        })
    }

    fn field_names(node: &ProjectionNode) -> Vec<&str> {
        node.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn self_reference_stops_at_the_third_level() {
        let graph = person_schema();
        let out = query_roots(&graph, &CodegenConfig::default());

        let root = out.get("PersonsProjectionRoot").unwrap();
        assert_eq!(out.roots().count(), 1);
        assert_eq!(root.backing_type, "Person");
        assert_eq!(root.default_fields, ["__typename"]);
        assert!(node_field(root, "name").unwrap().child.is_none());
        assert_eq!(
            node_field(root, "friends").unwrap().child.as_deref(),
            Some("PersonsFriendsPersonProjection")
        );

        let child = walk(&out, "PersonsProjectionRoot", &["friends"]).unwrap();
        assert_eq!(child.parent.as_deref(), Some("PersonsProjectionRoot"));
        assert!(node_field(child, "friends").is_some());

        let grandchild = walk(&out, "PersonsProjectionRoot", &["friends", "friends"]).unwrap();
        assert_eq!(grandchild.name, "PersonsFriendsFriendsPersonProjection");
        assert_eq!(field_names(grandchild), ["name"]);
        assert_eq!(out.nodes().count(), 3);
    }

    #[test]
    fn union_members_become_fragments() {
        let graph = video_schema();
        let out = query_roots(&graph, &CodegenConfig::default());

        let root = out.get("SearchProjectionRoot").unwrap();
        assert!(root.fields.is_empty());
        let accessors: Vec<_> = root.fragments.iter().map(|f| f.accessor.as_str()).collect();
        assert_eq!(accessors, ["onShow", "onMovie"]);

        let show = out.get(&node_fragment(root, "Show").unwrap().child).unwrap();
        assert_eq!(show.role, NodeRole::Fragment);
        assert_eq!(field_names(show), ["title", "episodes"]);
        let movie = out.get(&node_fragment(root, "Movie").unwrap().child).unwrap();
        assert_eq!(movie.name, "SearchMovieProjection");
        assert_eq!(field_names(movie), ["title", "duration"]);
    }

    #[test]
    fn interface_implementors_become_fragments() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("pets", t("[Pet]")),
            TypeDefinition::interface("Pet").field("name", t("String")).field("owner", t("Owner")),
            TypeDefinition::object("Dog")
                .implements(&["Pet"])
                .field("name", t("String"))
                .field("barks", t("Boolean")),
            TypeDefinition::object("Cat")
                .implements(&["Pet"])
                .field("name", t("String"))
                .field("owner", t("Owner")),
            TypeDefinition::object("Owner").field("pets", t("[Pet]")),
        ]);
        let out = query_roots(&graph, &CodegenConfig::default());
        let root = out.get("PetsProjectionRoot").unwrap();
        assert_eq!(root.fragments.len(), 2);
        assert_eq!(
            node_field(root, "owner").unwrap().child.as_deref(),
            Some("PetsOwnerOwnerProjection")
        );
        let cat = out.get("PetsCatProjection").unwrap();
        assert_eq!(
            node_field(cat, "owner").unwrap().child.as_deref(),
            Some("PetsCatOwnerOwnerProjection")
        );
    }

    #[test]
    fn mutual_recursion_terminates() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("a", t("A")),
            TypeDefinition::object("A").field("b", t("B")).field("id", t("ID")),
            TypeDefinition::object("B").field("a", t("A")).field("self", t("B")),
        ]);
        let out = query_roots(&graph, &CodegenConfig::default());
        // each (type, parent) edge appears at most twice on a branch
        let max_depth = out.nodes().map(|n| n.depth).max().unwrap();
        assert!(max_depth <= 2 * 3, "depth {max_depth}");
        assert!(walk(&out, "AProjectionRoot", &["b", "a", "b", "a"]).is_some());
        assert!(walk(&out, "AProjectionRoot", &["b", "a", "b", "a", "b"]).is_none());
    }

    #[test]
    fn rebuilding_a_registered_root_is_a_no_op() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("shop", t("Shop")),
            TypeDefinition::object("Shop").field("item", t("Item")),
            TypeDefinition::object("Item").field("sku", t("String")),
        ]);
        let config = CodegenConfig::default();
        let out = build_with(&graph, &config, |builder| {
            let shop = graph.get("Shop").unwrap();
            let first = builder.build(shop, "Shop").unwrap();
            let second = builder.build(shop, "Shop").unwrap();
            assert_eq!(first, second);
        });
        assert_eq!(out.nodes().count(), 2);
        assert_eq!(out.get("ShopItemItemProjection").unwrap().backing_type, "Item");
    }

    #[test]
    fn conflicting_names_are_reported() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("x", t("T")),
            TypeDefinition::object("T").field("fooBar", t("Baz")).field("foo", t("BarBaz")),
            TypeDefinition::object("Baz").field("id", t("ID")),
            TypeDefinition::object("BarBaz").field("id", t("ID")),
        ]);
        let config = CodegenConfig::default();
        let resolver = TypeResolver::new(&graph, &config);
        let literals = LiteralSerializer::new(&graph);
        let naming = NamingPolicy::from_config(&config);
        let mut builder = ProjectionGraphBuilder::new(&graph, &resolver, &literals, naming);
        let field = graph.get(QUERY_TYPE).unwrap().field("x").unwrap();
        let err = builder.build_operation_root(QUERY_TYPE, field).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::DuplicateArtifact { ref name, .. } if name == "XFooBarBazProjection"
        ));
    }

    #[test]
    fn subscription_roots_have_no_default_field() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Subscription").field("ticks", t("Tick")),
            TypeDefinition::object("Tick").field("at", t("String")).field("next", t("Tick")),
        ]);
        let config = CodegenConfig::default();
        let out = build_with(&graph, &config, |builder| {
            let field = graph.get(SUBSCRIPTION_TYPE).unwrap().field("ticks").unwrap();
            builder.build_operation_root(SUBSCRIPTION_TYPE, field).unwrap();
        });
        let root = out.get("TicksProjectionRoot").unwrap();
        assert!(root.default_fields.is_empty());
        assert_eq!(
            walk(&out, "TicksProjectionRoot", &["next"]).unwrap().default_fields,
            ["__typename"]
        );
    }

    #[test]
    fn scalar_root_fields_get_no_projection() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("count", t("Int")),
        ]);
        let config = CodegenConfig::default();
        let out = build_with(&graph, &config, |builder| {
            let field = graph.get(QUERY_TYPE).unwrap().field("count").unwrap();
            assert_eq!(builder.build_operation_root(QUERY_TYPE, field).unwrap(), None);
        });
        assert_eq!(out.nodes().count(), 0);
    }

    #[test]
    fn undefined_and_skipped_fields_are_left_out() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("me", t("User")),
            TypeDefinition::object("User")
                .field("name", t("String"))
                .field("ghost", t("Ghost"))
                .with_field(
                    crate::schema::FieldDescriptor::new("secret", t("String"))
                        .with_directive(Directive::new(crate::schema::SKIP_DIRECTIVE)),
                ),
        ]);
        let out = query_roots(&graph, &CodegenConfig::default());
        assert_eq!(field_names(out.get("MeProjectionRoot").unwrap()), ["name"]);
    }

    #[test]
    fn arguments_and_reserved_accessors() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Query").field("me", t("User")),
            TypeDefinition::object("User")
                .field("import", t("String"))
                .with_field(
                    crate::schema::FieldDescriptor::new("avatar", t("String")).with_argument(
                        ArgumentDescriptor::new("size", t("Int"))
                            .with_default(serde_json::json!(64)),
                    ),
                ),
        ]);
        let out = query_roots(&graph, &CodegenConfig::default());
        let root = out.get("MeProjectionRoot").unwrap();
        assert_eq!(node_field(root, "import").unwrap().accessor, "_import");
        let avatar = node_field(root, "avatar").unwrap();
        assert_eq!(avatar.arguments[0].name, "size");
        assert_eq!(avatar.arguments[0].ty.to_string(), "java.lang.Integer?");
        assert_eq!(avatar.arguments[0].default_literal.as_deref(), Some("64"));
    }

    #[test]
    fn long_prefixes_are_shortened() {
        let graph = person_schema();
        let config = CodegenConfig {
            shorten_long_names: true,
            max_prefix_length: 16,
            ..CodegenConfig::default()
        };
        let out = query_roots(&graph, &config);
        assert!(out.get("PersonsFriendsPersonProjection").is_some());
        // "PersonsFriendsFriends" is over the limit
        assert!(out.get("PeFrFrPersonProjection").is_some());
    }

    #[test]
    fn depth_limit_applies_before_the_guard() {
        let graph = person_schema();
        let config = CodegenConfig { max_projection_depth: Some(1), ..CodegenConfig::default() };
        let out = query_roots(&graph, &config);
        assert_eq!(out.nodes().count(), 2);
        let friends = walk(&out, "PersonsProjectionRoot", &["friends"]).unwrap();
        assert!(node_field(friends, "friends").is_none());
    }

    #[test]
    fn entities_root_has_one_fragment_per_entity() {
        let graph = SchemaGraph::from_definitions(vec![
            TypeDefinition::object("Movie")
                .with_directive(Directive::new(KEY_DIRECTIVE).with_argument("fields", "id"))
                .field("id", t("ID"))
                .field("sequel", t("Movie")),
            TypeDefinition::object("Review")
                .with_directive(Directive::new(KEY_DIRECTIVE).with_argument("fields", "id"))
                .field("id", t("ID")),
            TypeDefinition::object("Plain").field("id", t("ID")),
        ]);
        let config = CodegenConfig::default();
        let out = build_with(&graph, &config, |builder| {
            assert_eq!(builder.build_entities_root().unwrap().as_deref(), Some(ENTITIES_ROOT));
        });
        let root = out.get(ENTITIES_ROOT).unwrap();
        let accessors: Vec<_> = root.fragments.iter().map(|f| f.accessor.as_str()).collect();
        assert_eq!(accessors, ["onMovie", "onReview"]);
        let movie = out.get("EntitiesMovieKeyProjection").unwrap();
        assert!(movie.default_fields.is_empty());
        assert_eq!(
            node_field(movie, "sequel").unwrap().child.as_deref(),
            Some("EntitiesMovieKeySequelMovieProjection")
        );
    }
}

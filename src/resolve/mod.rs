//! Schema type references → target-language type descriptors.
//!
//! Named types are looked up in this order: the configured `typeMapping`,
//! a scalar's `@javaType`, the dialect's built-in scalars, well-known JVM
//! scalars, and finally a reference to the generated type.
pub mod keywords;
pub mod mapped;

use crate::config::{CodegenConfig, Dialect};
use crate::error::{CodegenError, Result};
use crate::ir::TypeDescriptor;
use crate::schema::{JAVA_TYPE_DIRECTIVE, SchemaGraph, TypeKind, TypeReference};

pub use mapped::parse_mapped_type;

// ------------------------------- Tables ----------------------------------- //

const BUILTIN_SCALARS: [&str; 5] = ["String", "ID", "Int", "Float", "Boolean"];

fn builtin_scalar(name: &str, dialect: Dialect) -> Option<&'static str> {
    let target = match (dialect, name) {
        (Dialect::Java, "String" | "ID") => "java.lang.String",
        (Dialect::Java, "Int") => "java.lang.Integer",
        (Dialect::Java, "Float") => "java.lang.Double",
        (Dialect::Java, "Boolean") => "java.lang.Boolean",
        (Dialect::Kotlin, "String" | "ID") => "kotlin.String",
        (Dialect::Kotlin, "Int") => "kotlin.Int",
        (Dialect::Kotlin, "Float") => "kotlin.Double",
        (Dialect::Kotlin, "Boolean") => "kotlin.Boolean",
        _ => return None,
    };
    Some(target)
}

fn common_scalar(name: &str, dialect: Dialect) -> Option<&'static str> {
    let target = match name {
        "LocalTime" => "java.time.LocalTime",
        "LocalDate" | "Date" => "java.time.LocalDate",
        "LocalDateTime" => "java.time.LocalDateTime",
        "DateTime" => "java.time.OffsetDateTime",
        "Instant" => "java.time.Instant",
        "Currency" => "java.util.Currency",
        "TimeZone" => return builtin_scalar("String", dialect),
        "PageInfo" | "RelayPageInfo" => "graphql.relay.PageInfo",
        "Upload" => "org.springframework.web.multipart.MultipartFile",
        _ => return None,
    };
    Some(target)
}

pub fn list_type(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Java => "java.util.List",
        Dialect::Kotlin => "kotlin.collections.List",
    }
}

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// How a named type takes part in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Selected as a plain field.
    Leaf,
    /// Needs its own sub-projection.
    Composite,
}

// ------------------------------- Resolver --------------------------------- //

#[derive(Debug, Clone)]
pub struct TypeResolver<'a> {
    graph: &'a SchemaGraph,
    config: &'a CodegenConfig,
    types_namespace: String,
}

impl<'a> TypeResolver<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a CodegenConfig) -> Self {
        Self { graph, config, types_namespace: config.types_namespace() }
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Unwraps `List`/`NonNull` outside-in. Only a `NonNull` wrapper makes
    /// its immediate child non-nullable.
    pub fn resolve(&self, ty: &TypeReference) -> Result<TypeDescriptor> {
        self.resolve_wrapped(ty, true)
    }

    fn resolve_wrapped(&self, ty: &TypeReference, nullable: bool) -> Result<TypeDescriptor> {
        match ty {
            TypeReference::NonNull(inner) => self.resolve_wrapped(inner, false),
            TypeReference::List(inner) => {
                let item = self.resolve_wrapped(inner, true)?;
                let list = TypeDescriptor::generic(list_type(self.dialect()), vec![item]);
                Ok(list.with_nullable(nullable))
            }
            TypeReference::Named(name) => Ok(self.resolve_named(name)?.with_nullable(nullable)),
        }
    }

    /// Resolves a bare type name, non-nullable.
    pub fn resolve_named(&self, name: &str) -> Result<TypeDescriptor> {
        if let Some(mapping) = self.config.type_mapping.get(name) {
            return Ok(parse_mapped_type(mapping)?);
        }
        if let Some(mapping) = self.scalar_directive_mapping(name)? {
            return Ok(parse_mapped_type(mapping)?);
        }
        if let Some(target) = builtin_scalar(name, self.dialect()) {
            return Ok(TypeDescriptor::named(target));
        }
        let declared_composite = matches!(
            self.graph.kind_of(name),
            Some(
                TypeKind::Object
                    | TypeKind::Interface
                    | TypeKind::Union
                    | TypeKind::Enum
                    | TypeKind::Input
            )
        );
        if !declared_composite {
            if let Some(target) = common_scalar(name, self.dialect()) {
                return Ok(TypeDescriptor::named(target));
            }
        }
        Ok(TypeDescriptor::named(self.generated_name(name)))
    }

    /// `{namespace}.types.{Name}`
    pub fn generated_name(&self, name: &str) -> String {
        format!("{}.{name}", self.types_namespace)
    }

    fn scalar_directive_mapping(&self, name: &str) -> Result<Option<&'a str>> {
        let Some(scalar) = self.graph.get(name).filter(|t| t.kind == TypeKind::Scalar) else {
            return Ok(None);
        };
        let mut found = scalar.directives_named(JAVA_TYPE_DIRECTIVE);
        let Some(directive) = found.next() else {
            return Ok(None);
        };
        if found.next().is_some() {
            return Err(CodegenError::SchemaTypeMapping {
                scalar: name.to_string(),
                reason: format!("more than one @{JAVA_TYPE_DIRECTIVE} directive"),
            });
        }
        match directive.string_argument("name") {
            Some(target) => Ok(Some(target)),
            None => Err(CodegenError::SchemaTypeMapping {
                scalar: name.to_string(),
                reason: format!("@{JAVA_TYPE_DIRECTIVE} requires a string `name` argument"),
            }),
        }
    }

    /// `None` for names the schema does not define and nothing maps.
    pub fn selection(&self, name: &str) -> Option<Selection> {
        if is_builtin_scalar(name) {
            return Some(Selection::Leaf);
        }
        match self.graph.kind_of(name) {
            Some(TypeKind::Object | TypeKind::Interface | TypeKind::Union) => {
                Some(Selection::Composite)
            }
            Some(TypeKind::Scalar | TypeKind::Enum | TypeKind::Input) => Some(Selection::Leaf),
            None if self.config.is_mapped(name)
                || common_scalar(name, self.dialect()).is_some() =>
            {
                Some(Selection::Leaf)
            }
            None => None,
        }
    }

    pub fn accessor_name(&self, field_name: &str) -> String {
        keywords::sanitize(field_name, self.dialect())
    }
}

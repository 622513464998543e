//! Error types for a generation run.
//!
//! Every failure is synchronous and deterministic: inputs are text, so
//! nothing here is retried. A failure aborts the run for the affected type.

use thiserror::Error;

/// Malformed generic type-mapping string, e.g. `Box<Item`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed mapped type `{mapping}` at {position}: {reason} (near `{fragment}`)")]
pub struct MappedTypeError {
    pub mapping: String,
    pub position: usize,
    pub fragment: String,
    pub reason: &'static str,
}

/// Malformed `@key(fields: ...)` expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    #[error("unmatched `}}` at token {position} in `{expression}`")]
    UnmatchedClose { expression: String, position: usize },

    #[error("`{{` at token {position} has no preceding field in `{expression}`")]
    DanglingOpen { expression: String, position: usize },

    #[error("unclosed `{{` in `{expression}`")]
    Unclosed { expression: String },
}

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error(transparent)]
    MappedType(#[from] MappedTypeError),

    #[error("generated name `{name}` is claimed by both `{first}` and `{second}`")]
    DuplicateArtifact {
        name: String,
        first: String,
        second: String,
    },

    #[error("entity `{type_name}` has a malformed @key directive: {source}")]
    KeyDirective {
        type_name: String,
        #[source]
        source: KeyPathError,
    },

    #[error("scalar `{scalar}`: {reason}")]
    SchemaTypeMapping { scalar: String, reason: String },

    #[error("input type `{type_name}` has no field `{field}`")]
    UnknownInputField { type_name: String, field: String },

    #[error("invalid type reference `{0}`")]
    TypeReference(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

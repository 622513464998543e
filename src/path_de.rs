use serde::de::DeserializeOwned;

use crate::config::CodegenConfig;
use crate::schema::SchemaDocument;

/// Deserialization failure located by JSON path (`definitions[2].fields[0].type`).
#[derive(thiserror::Error, Debug)]
#[error("at JSON path {path} → {source}")]
pub struct JsonPathError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, JsonPathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| JsonPathError {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, JsonPathError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| JsonPathError {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

pub fn schema_document(bytes: &[u8]) -> Result<SchemaDocument, JsonPathError> {
    from_slice_with_path(bytes)
}

pub fn codegen_config(src: &str) -> Result<CodegenConfig, JsonPathError> {
    from_str_with_path(src)
}

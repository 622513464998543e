//! Generation options. Every key is optional in the JSON form.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Java,
    Kotlin,
}

/// Root operation fields to generate for. An empty set selects every field
/// of that operation type for operations, and none for the closure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootFieldFilter {
    pub queries: IndexSet<String>,
    pub mutations: IndexSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenConfig {
    pub target_namespace: String,
    pub root_field_filter: RootFieldFilter,
    /// Schema type name to target type, e.g. `"Money": "java.math.BigDecimal"`
    /// or a generic form such as `"Page": "com.acme.Page<com.acme.Item>"`.
    pub type_mapping: IndexMap<String, String>,
    pub generate_all_types: bool,
    pub shorten_long_names: bool,
    pub max_prefix_length: usize,
    pub dialect: Dialect,
    pub max_projection_depth: Option<usize>,
    pub skip_entity_queries: bool,
    pub generate_client_api: bool,
    /// `PERSON_FILTER` instead of `PERSONFILTER` for constant holder names.
    pub snake_case_constant_names: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            target_namespace: "com.example.generated".to_string(),
            root_field_filter: RootFieldFilter::default(),
            type_mapping: IndexMap::new(),
            generate_all_types: true,
            shorten_long_names: false,
            max_prefix_length: 40,
            dialect: Dialect::Java,
            max_projection_depth: None,
            skip_entity_queries: false,
            generate_client_api: true,
            snake_case_constant_names: false,
        }
    }
}

impl CodegenConfig {
    pub fn types_namespace(&self) -> String {
        format!("{}.types", self.target_namespace)
    }

    pub fn client_namespace(&self) -> String {
        format!("{}.client", self.target_namespace)
    }

    pub fn is_mapped(&self, type_name: &str) -> bool {
        self.type_mapping.contains_key(type_name)
    }
}

//! Test fixtures shared across modules.

use crate::schema::{SchemaGraph, TypeDefinition, TypeReference};

pub fn t(src: &str) -> TypeReference {
    src.parse().unwrap()
}

/// `type Person { name: String, friends: [Person] }` behind `persons`.
pub fn person_schema() -> SchemaGraph {
    SchemaGraph::from_definitions(vec![
        TypeDefinition::object("Query").field("persons", t("[Person]")),
        TypeDefinition::object("Person").field("name", t("String")).field("friends", t("[Person]")),
    ])
}

/// `union Video = Show | Movie` behind `search`.
pub fn video_schema() -> SchemaGraph {
    SchemaGraph::from_definitions(vec![
        TypeDefinition::object("Query").field("search", t("[Video]")),
        TypeDefinition::union("Video").members(&["Show", "Movie"]),
        TypeDefinition::object("Show").field("title", t("String")).field("episodes", t("Int")),
        TypeDefinition::object("Movie").field("title", t("String")).field("duration", t("Int")),
    ])
}

//! Reserved identifiers per dialect. Accessor names that collide get a `_`
//! prefix.

use crate::config::Dialect;

const PREFIX: char = '_';

const JAVA: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native",
    "new", "package", "private", "protected", "public", "return", "short", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while", "true", "false", "null", "_",
    // clash with projection builder members
    "root", "parent",
];

const KOTLIN: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while", "_",
    "root", "parent",
];

pub fn is_reserved(name: &str, dialect: Dialect) -> bool {
    let table = match dialect {
        Dialect::Java => JAVA,
        Dialect::Kotlin => KOTLIN,
    };
    table.contains(&name)
}

pub fn sanitize(name: &str, dialect: Dialect) -> String {
    if is_reserved(name, dialect) {
        format!("{PREFIX}{name}")
    } else {
        name.to_string()
    }
}

//! Client-side code-generation core for GraphQL schemas: type resolution,
//! required-type closure, entity key paths and cycle-safe projection graphs.
pub mod cli;
pub mod closure;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod keys;
pub mod literal;
pub mod lower;
pub mod path_de;
pub mod projection;
pub mod resolve;
pub mod schema;

#[cfg(test)]
mod testing;

pub use codegen::{Codegen, CodegenOutput, generate};
pub use config::{CodegenConfig, Dialect, RootFieldFilter};
pub use error::{CodegenError, Result};
pub use schema::{SchemaDocument, SchemaGraph};

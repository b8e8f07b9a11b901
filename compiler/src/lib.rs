//! pierogi-compiler
//!
//! This crate implements:
//!  1) A tokenizer for `.pie` schema files (`SchemaLexer`),
//!  2) A recursive descent parser producing a `Schema` of enums, structs and messages,
//!  3) Deferred type reference resolution and attribute verification,
//!  4) A JSON export of the schema graph for code generators, and
//!  5) Error types (`PierogiError`) pointing at the offending source span.
//!
//! ```
//! use pierogi_compiler::{compile_schema, types::AggregateKind};
//!
//! let schema = compile_schema("message M { 1 -> string s; 2 -> bool b; }", "Example").unwrap();
//! let m = schema.definition("M").unwrap();
//! assert_eq!(m.kind, AggregateKind::Message);
//! assert_eq!(m.fields[1].index_or_value, 2);
//! ```

pub mod error;
pub mod span;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod verifier;
pub mod compiler;

pub use compiler::compile_schema;
pub use compiler::compile_schema_files;
pub use compiler::schema_to_json;
pub use error::PierogiError;
pub use parser::SchemaParser;

use std::path::PathBuf;

use tracing::info;

use crate::{
    error::PierogiError,
    parser::SchemaParser,
    types::Schema,
    verifier::verify_attributes,
};

/// Compile a textual schema into a validated `Schema`.
/// Returns `Err(PierogiError)` if tokenization, parsing or verification fails.
pub fn compile_schema(text: &str, namespace: &str) -> Result<Schema, PierogiError> {
    compile(SchemaParser::from_textual_schema(text, namespace))
}

/// Compile one or more schema files as a single schema. Definitions from
/// every file share one namespace and may reference each other.
pub fn compile_schema_files<I, P>(paths: I, namespace: &str) -> Result<Schema, PierogiError>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    compile(SchemaParser::from_schema_paths(paths, namespace))
}

/// Run a parser to completion and verify attribute payloads.
pub fn compile(mut parser: SchemaParser) -> Result<Schema, PierogiError> {
    let schema = parser.evaluate()?;
    verify_attributes(&schema)?;
    info!(namespace = %schema.namespace, definitions = schema.definitions.len(), "compiled schema");
    Ok(schema)
}

/// Pretty-printed JSON of the schema graph, definitions in declaration order.
pub fn schema_to_json(schema: &Schema) -> Result<String, PierogiError> {
    Ok(serde_json::to_string_pretty(schema)?)
}

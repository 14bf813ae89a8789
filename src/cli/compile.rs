//! Compile searches to SQL for a schema read from JSON

use super::CliError;
use crate::{
    config::Config,
    field::{FieldOptions, Schema},
    sql::{Compiler, Query, Statement},
};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub query: Query,
    /// Schema as JSON
    pub schema: String,
    /// Option groups to opt into
    pub options: Vec<String>,
}

/// Compile a select for the given schema
pub fn execute_compile(options: &CompileOptions, config: &Config) -> Result<Statement, CliError> {
    if options.schema.trim().is_empty() {
        return Err(CliError::NoInput);
    }
    let schema: Schema = serde_json::from_str(&options.schema)?;
    let field_options: FieldOptions = options.options.iter().map(String::as_str).collect();

    let compiler = Compiler::new(&schema, &field_options, config);
    Ok(compiler.select(&options.query)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "table": "account",
        "fields": [
            {"name": "name", "type": "string", "primary": true},
            {"name": "score", "type": "int"},
            {"name": "tags", "type": "array"}
        ]
    }"#;

    #[test]
    fn test_compile_from_json_schema() {
        let options = CompileOptions {
            query: Query {
                search: "and(gte(score:5),tags:red)".to_string(),
                size: Some(10),
                ..Query::default()
            },
            schema: SCHEMA.to_string(),
            options: Vec::new(),
        };
        let stmt = execute_compile(&options, &Config::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT name, score, tags FROM account WHERE (score >= $1 AND $2 = ANY(tags)) ORDER BY name LIMIT 11 OFFSET 0"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_unknown_field_is_reported() {
        let options = CompileOptions {
            query: Query {
                search: "owner:bob".to_string(),
                ..Query::default()
            },
            schema: SCHEMA.to_string(),
            options: Vec::new(),
        };
        let err = execute_compile(&options, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Query(crate::Error::Config(_))));
    }
}

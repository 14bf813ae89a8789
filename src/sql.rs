//! Compiles parsed searches and mutation requests into parameterized
//! PostgreSQL.
//!
//! User input only ever reaches the statement as a `$n` parameter. Identifiers
//! come from the [`Schema`], which the caller owns and trusts.
//!
//! # Examples
//!
//! ```
//! use tagql::{Config, Field, FieldOptions, FieldType, Schema};
//! use tagql::sql::{Compiler, Query};
//!
//! let schema = Schema::new(
//!     "account",
//!     vec![
//!         Field::new("name", FieldType::String).primary(),
//!         Field::new("score", FieldType::Int),
//!     ],
//! );
//! let options = FieldOptions::new();
//! let config = Config::default();
//! let compiler = Compiler::new(&schema, &options, &config);
//!
//! let query = Query {
//!     search: "gt(score:10)".to_string(),
//!     size: Some(20),
//!     ..Query::default()
//! };
//! let stmt = compiler.select(&query).unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT name, score FROM account WHERE score > $1 ORDER BY name LIMIT 21 OFFSET 0"
//! );
//! ```

mod mutate;
mod predicate;
mod select;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    ast::{QueryTree, TokenKind},
    config::Config,
    error::{Error, Result},
    field::{Field, FieldOptions, SURROGATE_KEY, Schema},
    lexer::{ScanOptions, Scanner},
    parser::parse_with,
    value::Param,
};

/// A compiled statement and its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    #[serde(serialize_with = "serialize_params")]
    pub params: Vec<Param>,
}

fn serialize_params<S>(params: &[Param], s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.collect_seq(params.iter().map(Param::to_json))
}

/// A search request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Search expression, empty for "everything".
    pub search: String,
    /// Page size; the configured default when unset.
    pub size: Option<u64>,
    pub skip: u64,
    /// Comma separated field names, `-` prefix for descending.
    pub sort: String,
    /// Comma separated grouping fields; switches to a grouped count.
    pub summary: String,
}

/// Compiles statements for one schema and one set of opted-in options.
pub struct Compiler<'a> {
    schema: &'a Schema,
    options: &'a FieldOptions,
    config: &'a Config,
}

impl<'a> Compiler<'a> {
    pub fn new(schema: &'a Schema, options: &'a FieldOptions, config: &'a Config) -> Self {
        Compiler {
            schema,
            options,
            config,
        }
    }

    /// Category bare search terms bind to.
    pub fn primary(&self) -> &str {
        self.schema
            .primary()
            .map_or(self.config.primary_fallback.as_str(), |f| f.name.as_str())
    }

    /// Parses a search with this schema's primary field and the configured
    /// base64 handling.
    pub fn parse(&self, search: &str) -> Result<QueryTree> {
        let options = ScanOptions {
            decode_base64: self.config.decode_base64,
            categories: false,
        };
        Ok(parse_with(search, self.primary(), options)?)
    }

    /// Splits a `sort` or `summary` list into its names.
    fn names(&self, list: &str) -> Result<Vec<String>> {
        let options = ScanOptions {
            decode_base64: false,
            categories: true,
        };
        let mut names = Vec::new();
        for token in Scanner::with_options(list, options) {
            match token.kind {
                TokenKind::TagCategory => names.push(token.literal),
                TokenKind::Comma | TokenKind::Whitespace => {}
                _ => {
                    return Err(Error::InvalidRequest(format!(
                        "unexpected {:?} in field list {:?}",
                        token.literal, list
                    )));
                }
            }
        }
        Ok(names)
    }

    fn frame(&self) -> Frame<'a> {
        Frame {
            schema: self.schema,
            qualify: !self.schema.joins.is_empty(),
            params: Vec::new(),
            tables: BTreeSet::new(),
        }
    }
}

/// Per-statement compile state: bound parameters and the joined tables the
/// statement touches.
pub(crate) struct Frame<'a> {
    schema: &'a Schema,
    /// Prefix base columns with the table name, needed once joins may appear.
    qualify: bool,
    params: Vec<Param>,
    tables: BTreeSet<String>,
}

impl<'a> Frame<'a> {
    fn bind(&mut self, param: Param) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    /// Expression reading `field` in a select. A field on another table needs
    /// a `Join` for that table.
    fn column(&mut self, field: &Field) -> Result<String> {
        let base = self.schema.table.as_str();
        Ok(match (&field.table, &field.key) {
            (Some(table), Some(key)) => format!(
                "(SELECT {t}.{c} FROM {t} WHERE {t}.{id} = {base}.{key})",
                t = table,
                c = field.column_name(),
                id = SURROGATE_KEY,
            ),
            (Some(table), None) if table != base => {
                if !self.schema.joins.iter().any(|j| &j.table == table) {
                    return Err(Error::Config(format!(
                        "field {:?} is read from {} but {} declares no join for it",
                        field.name, table, base
                    )));
                }
                self.tables.insert(table.clone());
                format!("{}.{}", table, field.column_name())
            }
            _ if self.qualify => format!("{}.{}", base, field.column_name()),
            _ => field.column_name().to_string(),
        })
    }

    /// Base-table column a write to `field` lands in.
    fn stored_column(&self, field: &Field) -> Result<String> {
        if !self.schema.is_base(field) {
            return Err(Error::Config(format!(
                "field {:?} is read from {} and cannot be written",
                field.name,
                field.table.as_deref().unwrap_or_default()
            )));
        }
        Ok(field.key.as_deref().unwrap_or(field.column_name()).to_string())
    }

    /// Expression binding `param` as the stored value of `field`: reference
    /// fields resolve the business key to the surrogate key.
    fn stored_value(&mut self, field: &Field, param: Param) -> String {
        let placeholder = self.bind(param);
        match (&field.table, &field.key) {
            (Some(table), Some(_)) => format!(
                "(SELECT {t}.{id} FROM {t} WHERE {t}.{c} = {p})",
                t = table,
                id = SURROGATE_KEY,
                c = field.column_name(),
                p = placeholder,
            ),
            _ => placeholder,
        }
    }

    /// Projection of the visible fields in declaration order.
    fn projection(&mut self, options: &FieldOptions) -> Result<String> {
        let schema = self.schema;
        let columns = schema
            .visible(options)
            .map(|field| {
                let expr = self.column(field)?;
                Ok(if field.is_reference() || field.column_name() != field.name {
                    format!("{} AS {}", expr, field.name)
                } else {
                    expr
                })
            })
            .collect::<Result<Vec<String>>>()?;

        if columns.is_empty() {
            return Err(Error::Config(format!(
                "no visible fields on {}",
                schema.table
            )));
        }
        Ok(columns.join(", "))
    }

    /// `LEFT JOIN` clauses for enabled joins and joins the statement touches.
    fn joins(&self, options: &FieldOptions) -> String {
        self.schema
            .joins
            .iter()
            .filter(|j| options.enables(j.option.as_deref()) || self.tables.contains(&j.table))
            .map(|j| format!(" LEFT JOIN {} ON {}", j.table, j.on))
            .collect()
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// `(a AND b)` for several parts, the part itself for one.
fn join_parts(mut parts: Vec<String>, separator: &str) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!("({})", parts.join(separator))),
    }
}

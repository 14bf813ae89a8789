//! Declarative field metadata.
//!
//! Each domain entity describes its queryable columns once and passes the
//! [`Schema`] by reference into every compile call. The engine trusts it as
//! the authoritative schema and never inspects the database.
//!
//! # Examples
//!
//! ```
//! use tagql::{Field, FieldType, Join, Schema};
//!
//! let schema = Schema::new(
//!     "account",
//!     vec![
//!         Field::new("name", FieldType::String).primary(),
//!         Field::new("score", FieldType::Int),
//!         Field::new("data", FieldType::Json),
//!         Field::new("tags", FieldType::Array),
//!         Field::new("secret", FieldType::String).hidden(),
//!         Field::new("created_by", FieldType::String)
//!             .reference("\"user\"", "user_id", "created_by")
//!             .option("audit"),
//!         Field::new("plan", FieldType::String).table("billing"),
//!     ],
//! )
//! .join(Join::new("billing", "billing.account = account.id"));
//!
//! assert_eq!(schema.primary_name(), "name");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    exec::Row,
    parser::DEFAULT_PRIMARY,
    value::FieldValue,
};

/// Surrogate key column of every relation a reference field resolves through.
pub const SURROGATE_KEY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Time,
    Json,
    Array,
    Duration,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Time => "time",
            FieldType::Json => "json",
            FieldType::Array => "array",
            FieldType::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// One queryable column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Name used in searches, sort and summary lists, and as the output column.
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldType,

    /// Relation owning the column; the schema's base table when unset.
    #[serde(default)]
    pub table: Option<String>,

    /// Column name when it differs from `name`.
    #[serde(default)]
    pub column: Option<String>,

    /// Base-table column holding the surrogate key of `table`.
    ///
    /// Set for reference fields: the value users see and write is the business
    /// key `table.column`, the base table stores `table.id`.
    #[serde(default)]
    pub key: Option<String>,

    /// Bare search terms target this field.
    #[serde(default)]
    pub primary: bool,

    /// Searchable but never projected.
    #[serde(default)]
    pub hidden: bool,

    /// Only projected when the caller opts into this option group.
    #[serde(default)]
    pub option: Option<String>,
}

impl Field {
    pub fn new(name: &str, kind: FieldType) -> Self {
        Field {
            name: name.to_string(),
            kind,
            table: None,
            column: None,
            key: None,
            primary: false,
            hidden: false,
            option: None,
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// Resolves through `table.column`, stored in the base table as `key`.
    pub fn reference(mut self, table: &str, column: &str, key: &str) -> Self {
        self.table = Some(table.to_string());
        self.column = Some(column.to_string());
        self.key = Some(key.to_string());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn option(mut self, option: &str) -> Self {
        self.option = Some(option.to_string());
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn is_reference(&self) -> bool {
        self.key.is_some()
    }
}

/// Option groups the caller has opted into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions(BTreeSet<String>);

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: &str) -> Self {
        self.0.insert(option.to_string());
        self
    }

    pub fn contains(&self, option: &str) -> bool {
        self.0.contains(option)
    }

    /// Whether an item gated by `option` is active.
    pub fn enables(&self, option: Option<&str>) -> bool {
        option.is_none_or(|o| self.contains(o))
    }
}

impl<S: Into<String>> FromIterator<S> for FieldOptions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldOptions(iter.into_iter().map(Into::into).collect())
    }
}

/// `LEFT JOIN table ON on`, emitted when its option is enabled or one of its
/// fields is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub table: String,
    pub on: String,
    #[serde(default)]
    pub option: Option<String>,
}

impl Join {
    pub fn new(table: &str, on: &str) -> Self {
        Join {
            table: table.to_string(),
            on: on.to_string(),
            option: None,
        }
    }

    pub fn option(mut self, option: &str) -> Self {
        self.option = Some(option.to_string());
        self
    }
}

/// `ON CONFLICT (target) DO UPDATE SET update = EXCLUDED.update` for inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upsert {
    pub target: Vec<String>,
    pub update: Vec<String>,
}

/// Field metadata for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Base relation, quoted by the caller when it is a reserved word.
    pub table: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub upsert: Option<Upsert>,
}

impl Schema {
    pub fn new(table: &str, fields: Vec<Field>) -> Self {
        Schema {
            table: table.to_string(),
            fields,
            joins: Vec::new(),
            upsert: None,
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn upsert(mut self, target: &[&str], update: &[&str]) -> Self {
        self.upsert = Some(Upsert {
            target: target.iter().map(|s| s.to_string()).collect(),
            update: update.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up `name`, treating an unknown name as a configuration error.
    pub fn require(&self, name: &str) -> Result<&Field> {
        self.field(name).ok_or_else(|| {
            Error::Config(format!("unknown field {:?} on {}", name, self.table))
        })
    }

    pub fn primary(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.primary)
    }

    /// Category bare search terms bind to.
    pub fn primary_name(&self) -> &str {
        self.primary().map_or(DEFAULT_PRIMARY, |f| f.name.as_str())
    }

    /// Projected fields in declaration order.
    pub fn visible<'a>(&'a self, options: &'a FieldOptions) -> impl Iterator<Item = &'a Field> {
        self.fields
            .iter()
            .filter(move |f| !f.hidden && options.enables(f.option.as_deref()))
    }

    /// Whether a field lives in the base relation (or is stored there as a key).
    pub fn is_base(&self, field: &Field) -> bool {
        field.is_reference() || field.table.as_deref().is_none_or(|t| t == self.table)
    }

    /// Translates a returned row into typed values keyed by field name.
    ///
    /// Columns the schema does not describe are ignored.
    pub fn decode(&self, row: &Row) -> Result<BTreeMap<String, FieldValue>> {
        let mut out = BTreeMap::new();
        for (column, param) in row.iter() {
            if let Some(field) = self.field(column) {
                out.insert(field.name.clone(), FieldValue::from_param(field.kind, param)?);
            }
        }
        Ok(out)
    }
}

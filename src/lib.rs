pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod exec;
pub mod field;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod sql;
pub mod value;

pub use ast::{Op, QueryNode, QueryTree, Term, Token, TokenKind};
pub use config::Config;
pub use error::{Error, Result};
pub use evaluator::{eval, matches};
pub use exec::{Context, Db, Pool, Row, Transaction};
pub use field::{Field, FieldOptions, FieldType, Join, Schema};
pub use lexer::{ScanOptions, Scanner};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse, parse_with};
pub use sql::{Compiler, Query, Statement};
pub use value::{FieldValue, Param, Value};

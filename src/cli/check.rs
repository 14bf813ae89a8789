//! Check searches and match them against JSON documents

use super::CliError;
use crate::{
    evaluator,
    lexer::ScanOptions,
    output::to_json,
    parser::{DEFAULT_PRIMARY, parse_with},
};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The search to check
    pub query: String,
    /// JSON document to match the search against
    pub input: Option<String>,
    /// Field bare terms bind to
    pub primary: String,
    /// Keep `b"..."` literals encoded
    pub raw_base64: bool,
    /// Only validate syntax, don't match
    pub syntax_only: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            query: String::new(),
            input: None,
            primary: DEFAULT_PRIMARY.to_string(),
            raw_base64: false,
            syntax_only: false,
        }
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax is valid; carries the canonical form and the tree as JSON
    SyntaxValid {
        canonical: String,
        tree: serde_json::Value,
    },
    /// Whether the document matched
    Matched(bool),
}

/// Execute a tagql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let scan = ScanOptions {
        decode_base64: !options.raw_base64,
        categories: false,
    };
    let tree = parse_with(&options.query, &options.primary, scan)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid {
            canonical: tree.to_string(),
            tree: serde_json::from_str(&to_json(&tree))?,
        });
    }

    let input = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document: serde_json::Value = serde_json::from_str(input)?;
    Ok(CheckResult::Matched(evaluator::matches(&tree, &document)?))
}

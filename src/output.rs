//! Canonical text and JSON output for parsed queries.
//!
//! The canonical form re-parses to a structurally equal tree:
//!
//! - every leaf is written as `category:value` (bare terms gain their primary
//!   category), or `category:` when no value was given
//! - groups are written as `keyword(child,child)`, the implicit root `and` is
//!   written as a plain comma separated list
//! - only the characters that would otherwise change meaning are quoted
//!
//! # Examples
//!
//! ```
//! use tagql::parser::parse;
//!
//! let tree = parse("and(status:active, \"two words\")").unwrap();
//! assert_eq!(tree.to_string(), "and(status:active,id:two\" \"words)");
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use crate::{
    ast::{QueryNode, QueryTree, Term},
    lexer::{QUOTED_QUESTION, QUOTED_STAR},
};

impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_children(f, &self.root.children)
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            if let Some(category) = &self.category {
                write_term(f, category)?;
            }
            f.write_str(":")?;
            if let Some(value) = &self.value {
                write_term(f, value)?;
            }
            Ok(())
        } else {
            write!(f, "{}(", self.op.keyword())?;
            write_children(f, &self.children)?;
            f.write_str(")")
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[QueryNode]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term) -> fmt::Result {
    match term {
        // an inner `/` or a trailing `\` would end a bare `/.../` segment
        // early, the url-safe alphabet has no `/`
        Term::Pattern(p) if p.contains('/') || p.ends_with('\\') => {
            write!(f, "b[url]/{}/", URL_SAFE.encode(p))
        }
        Term::Pattern(p) => write!(f, "/{}/", p),
        Term::Literal(s) => f.write_str(&quote_literal(s)),
    }
}

fn needs_quote(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '(' | ')' | ',' | ':' | '"' | QUOTED_STAR | QUOTED_QUESTION
        )
}

/// Writes `text` so that scanning it back yields `text`.
///
/// Bare `*`/`?` stay outside quotes so they remain wildcards, backslashes stay
/// outside quotes because only `\"` escapes inside them, and a `b` that could
/// open a base64 literal is quoted.
pub fn quote_literal(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 2);
    let mut quoted = false;
    let mut literal_start = true;

    for (i, &ch) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let quote = match ch {
            '*' | '?' | '\\' => false,
            'b' => {
                literal_start
                    && next.is_some_and(|n| matches!(n, '/' | '[') || needs_quote(n))
            }
            '/' => i == 0,
            ch => needs_quote(ch),
        };

        if quote != quoted {
            out.push('"');
            quoted = quote;
        }
        match ch {
            '"' => out.push_str("\\\""),
            QUOTED_STAR => out.push('*'),
            QUOTED_QUESTION => out.push('?'),
            ch => out.push(ch),
        }
        literal_start = matches!(ch, '*' | '?');
    }

    if quoted {
        out.push('"');
    }
    out
}

/// Compact JSON form of a tree.
pub fn to_json(tree: &QueryTree) -> String {
    serde_json::to_string(tree).unwrap_or_default()
}

/// Pretty-printed JSON form of a tree, 2-space indentation.
pub fn to_json_pretty(tree: &QueryTree) -> String {
    serde_json::to_string_pretty(tree).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("plain"), "plain");
        assert_eq!(quote_literal("a b"), "a\" \"b");
        assert_eq!(quote_literal("val*"), "val*");
        assert_eq!(quote_literal("x\u{E000}"), "x\"*\"");
        assert_eq!(quote_literal("say \"hi\""), "say\" \\\"\"hi\"\\\"\"");
        assert_eq!(quote_literal(""), "\"\"");
        assert_eq!(quote_literal("/usr/bin"), "\"/\"usr/bin");
        assert_eq!(quote_literal("b/x"), "\"b\"/x");
        assert_eq!(quote_literal("bob"), "bob");
    }

    #[test]
    fn test_pattern_with_slash_is_encoded() {
        let tree = crate::parser::parse("path:b/YS9i/").unwrap();
        assert_eq!(tree.to_string(), "path:b[url]/YS9i/");
    }
}

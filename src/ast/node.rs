use serde::Serialize;

use crate::{
    ast::Op,
    lexer::{QUOTED_SLASH, restore_quoted},
};

/// A category or value as written in the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Term {
    /// Plain text. Wildcards that were quoted are stored as the placeholder runes
    /// [`QUOTED_STAR`](crate::lexer::QUOTED_STAR) and
    /// [`QUOTED_QUESTION`](crate::lexer::QUOTED_QUESTION). Slashes are stored
    /// as written, quoted or not.
    Literal(String),

    /// A `/.../` pattern, stored without its delimiters.
    Pattern(String),
}

impl Term {
    /// Lift `/.../` text into a pattern, anything else stays literal.
    ///
    /// Only unquoted delimiters count: the scanner hands over quoted slashes,
    /// including those decoded from `b"..."`, as
    /// [`QUOTED_SLASH`](crate::lexer::QUOTED_SLASH). Quoting only protects a
    /// pattern's characters from the scanner, so quoted wildcards go back to
    /// plain `*` and `?` inside patterns.
    pub fn from_literal(text: String) -> Term {
        if text.len() >= 2 && text.starts_with('/') && text.ends_with('/') {
            Term::Pattern(restore_quoted(&text[1..text.len() - 1]))
        } else if text.contains(QUOTED_SLASH) {
            Term::Literal(text.replace(QUOTED_SLASH, "/"))
        } else {
            Term::Literal(text)
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Term::Literal(s) | Term::Pattern(s) => s,
        }
    }
}

/// A node of the query tree.
///
/// Leaves (`op == Op::Match`) carry a category and an optional value and no
/// children. Groups carry children and neither category nor value; a
/// `match(...)` group shares the leaf op, so tell them apart with
/// [`is_leaf`](Self::is_leaf). `comp` is
/// the comparison a leaf applies, inherited through boolean groups so that
/// `gt(a:1,or(b:2,c:3))` compares all three leaves with `>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryNode {
    pub op: Op,
    pub comp: Op,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Term>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<QueryNode>,
}

impl QueryNode {
    pub fn group(op: Op, comp: Op) -> Self {
        QueryNode {
            op,
            comp,
            category: None,
            value: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(comp: Op, category: Term, value: Option<Term>) -> Self {
        QueryNode {
            op: Op::Match,
            comp,
            category: Some(category),
            value,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.category.is_some()
    }

    /// Category text of a leaf, empty for groups.
    pub fn category_text(&self) -> &str {
        self.category.as_ref().map(Term::text).unwrap_or("")
    }

    /// Value text of a leaf, empty for groups and category-only leaves.
    pub fn value_text(&self) -> &str {
        self.value.as_ref().map(Term::text).unwrap_or("")
    }
}

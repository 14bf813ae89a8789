use serde::Serialize;

/// Group and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    // Leaf / comparison
    /// Equality or wildcard match (`match(...)`, and the default for leaves)
    Match,
    /// Greater than (`gt(...)`)
    Gt,
    /// Greater than or equal (`gte(...)`)
    Gte,
    /// Less than (`lt(...)`)
    Lt,
    /// Less than or equal (`lte(...)`)
    Lte,

    // Boolean
    /// All children hold (`and(...)`)
    And,
    /// Any child holds (`or(...)`)
    Or,
    /// Negation of a single child (`not(...)`)
    Not,
}

impl Op {
    pub const KEYWORDS: [Op; 8] = [
        Op::And,
        Op::Or,
        Op::Not,
        Op::Gte,
        Op::Gt,
        Op::Lte,
        Op::Lt,
        Op::Match,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Op::Match => "match",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Op> {
        Op::KEYWORDS.into_iter().find(|op| op.keyword() == s)
    }

    /// True for operators that scope the comparison of the leaves below them.
    pub fn is_comparison(self) -> bool {
        matches!(self, Op::Match | Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// SQL operator for a non-wildcard comparison.
    pub fn sql(self) -> &'static str {
        match self {
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            _ => "=",
        }
    }
}

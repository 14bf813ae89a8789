use serde::Serialize;

use crate::ast::{Op, QueryNode};

/// A parsed search.
///
/// Immutable once built; share it by reference across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTree {
    pub root: QueryNode,
}

impl QueryTree {
    pub fn new(root: QueryNode) -> Self {
        QueryTree { root }
    }

    /// The tree of an empty search: an `and` root with no children.
    pub fn empty() -> Self {
        QueryTree {
            root: QueryNode::group(Op::And, Op::Match),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

impl Default for QueryTree {
    fn default() -> Self {
        QueryTree::empty()
    }
}

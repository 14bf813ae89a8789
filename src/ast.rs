//! # Tag Query Language - Abstract Syntax Tree
//!
//! The search grammar is a comma separated list of tags, optionally grouped
//! under boolean or comparison keywords:
//!
//! ```text
//! and(status:active,or(kind:user,kind:service),not(name:test*))
//! ```
//!
//! ## Submodules
//!
//! - **[tokens]** - Tokens produced by the scanner
//! - **[operators]** - Group and comparison operators
//! - **[node]** - Tree nodes and the literal/pattern terms they carry
//! - **[query]** - The parsed tree
//!
//! ## Leaves
//!
//! | Text | Category | Value |
//! |------|----------|-------|
//! | `status:active` | `status` | `active` |
//! | `active` | primary field | `active` |
//! | `status:` | `status` | none (field is present) |
//! | `status:""` | `status` | empty (field is null) |
//! | `name:/^a.*z$/` | `name` | pattern `^a.*z$` |
//!
//! ## Comparison scoping
//!
//! `gt`, `gte`, `lt`, `lte` and `match` set the comparison used by every leaf
//! below them; `and`, `or` and `not` pass the comparison of their parent down:
//!
//! ```text
//! gte(score:10,or(rank:2,rank:3))   // score >= 10 AND (rank >= 2 OR rank >= 3)
//! ```
pub mod node;
pub mod operators;
pub mod query;
pub mod tokens;

pub use node::{QueryNode, Term};
pub use operators::Op;
pub use query::QueryTree;
pub use tokens::{Token, TokenKind};

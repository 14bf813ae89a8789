use thiserror::Error;

use crate::value::Param;

/// Failure reported by a pool or transaction implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// The connection broke (reset, EOF, timeout talking to the server).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A unique index rejected the row; carries the constraint name.
    #[error("unique violation on {0}")]
    UniqueViolation(String),

    #[error("{message}")]
    Database {
        code: Option<String>,
        message: String,
    },

    #[error("pool is closed")]
    Closed,
}

impl DbError {
    /// Transport-level failure signatures, the only ones worth a reconnect.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Transport(_) | DbError::Closed)
    }
}

/// One returned row: column names with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Param>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: Param) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &str, value: Param) {
        self.columns.push(column.to_string());
        self.values.push(value);
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub open: u32,
    pub in_use: u32,
    pub idle: u32,
}

/// A bounded, shared connection pool.
///
/// Implementations guard their own state; the engine only ever holds one
/// transaction per call.
pub trait Pool: Send + Sync {
    fn begin(&self) -> Result<Box<dyn Transaction>, DbError>;

    /// Drops every pooled connection and dials fresh ones.
    fn reconnect(&self) -> Result<(), DbError>;

    fn ping(&self) -> Result<(), DbError>;

    fn stat(&self) -> PoolStats;

    fn close(&self);
}

/// An open transaction on one pooled connection.
///
/// A transaction has at most one open cursor, opened by [`query`](Self::query)
/// and advanced with [`next_row`](Self::next_row).
pub trait Transaction: Send {
    fn exec(&mut self, sql: &str, params: &[Param]) -> Result<u64, DbError>;

    fn query(&mut self, sql: &str, params: &[Param]) -> Result<(), DbError>;

    fn next_row(&mut self) -> Result<Option<Row>, DbError>;

    fn commit(self: Box<Self>) -> Result<(), DbError>;

    fn rollback(self: Box<Self>) -> Result<(), DbError>;
}

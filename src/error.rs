use thiserror::Error;

use crate::exec::DbError;
use crate::parser::ParseError;

/// Errors surfaced by the query engine.
///
/// Syntax and configuration errors are raised before any statement reaches the
/// store. Transport errors are retried once by the execution layer before they
/// show up here.
#[derive(Error, Debug)]
pub enum Error {
    /// The search string could not be parsed.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// Field metadata does not describe what the caller asked for.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request is well formed but cannot be compiled or executed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A unique constraint rejected the statement.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Zero rows where exactly one was required.
    #[error("not found")]
    NotFound,

    /// Connection or network failure that survived the reconnect attempt.
    #[error("transport error: {0}")]
    Transport(String),

    /// The tenant binding statement was rejected.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The caller cancelled the operation or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure reported by the store.
    #[error("database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Message safe to show to end users.
    ///
    /// Storage failures are flattened so that driver messages, table names and
    /// constraint names never leak past the service boundary.
    pub fn public_message(&self) -> String {
        match self {
            Error::Transport(_) | Error::Database(_) => "service unavailable".to_string(),
            Error::Config(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the error belongs to the transport class.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Transport(msg) => Error::Transport(msg),
            DbError::Closed => Error::Transport("connection pool is closed".to_string()),
            DbError::UniqueViolation(constraint) => Error::Conflict(constraint),
            DbError::Database { code, message } => match code {
                Some(code) => Error::Database(format!("{message} (sqlstate {code})")),
                None => Error::Database(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_storage_details() {
        let e = Error::Database("relation \"account\" does not exist".into());
        assert_eq!(e.public_message(), "service unavailable");

        let e = Error::Transport("connection reset by peer".into());
        assert_eq!(e.public_message(), "service unavailable");

        let e = Error::InvalidRequest("delete requires at least one key".into());
        assert_eq!(e.public_message(), "invalid request: delete requires at least one key");
    }

    #[test]
    fn test_db_error_mapping() {
        assert!(matches!(
            Error::from(DbError::UniqueViolation("account_name_key".into())),
            Error::Conflict(c) if c == "account_name_key"
        ));
        assert!(Error::from(DbError::Transport("eof".into())).is_transient());
        assert!(Error::from(DbError::Closed).is_transient());
        assert!(!Error::from(DbError::Database { code: None, message: "boom".into() }).is_transient());
    }
}

//! Transactional execution against a pooled store.
//!
//! Every call runs inside its own transaction on one pooled connection. When
//! the [`Context`] carries a tenant id, the first statement of the transaction
//! binds it to the session setting named by [`Config::tenant_setting`], scoped
//! to that transaction, so row level security in the store sees it and no
//! other transaction on the same connection does.
//!
//! A transport failure during the tenant bind or the statement triggers one
//! pool reconnect and one retry of the whole sequence. Nothing else retries.

mod context;
mod observe;
mod pool;

pub use context::{CancelHandle, Context};
pub use observe::Observer;
pub use pool::{DbError, Pool, PoolStats, Row, Transaction};

use std::sync::Arc;

use tracing::{trace, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    sql::Statement,
    value::Param,
};
use observe::Span;

/// `is_local = true`: the setting ends with the transaction.
const TENANT_BIND: &str = "SELECT set_config($1, $2, true)";

/// Stage at which an attempt failed.
enum Failure {
    Begin(DbError),
    Bind(DbError),
    Statement(DbError),
    Other(Error),
}

impl Failure {
    fn is_transient(&self) -> bool {
        match self {
            Failure::Bind(e) | Failure::Statement(e) => e.is_transient(),
            Failure::Begin(_) | Failure::Other(_) => false,
        }
    }

    fn into_error(self) -> Error {
        match self {
            Failure::Bind(e) if !e.is_transient() => {
                Error::Forbidden(format!("tenant binding rejected: {e}"))
            }
            Failure::Begin(e) | Failure::Bind(e) | Failure::Statement(e) => Error::from(e),
            Failure::Other(e) => e,
        }
    }
}

type Attempt<T> = std::result::Result<(Box<dyn Transaction>, T), Failure>;

/// Runs compiled statements with tenant binding and transaction management.
pub struct Db {
    pool: Arc<dyn Pool>,
    observer: Option<Arc<dyn Observer>>,
    config: Config,
}

impl Db {
    pub fn new(pool: Arc<dyn Pool>, observer: Option<Arc<dyn Observer>>, config: Config) -> Self {
        Db {
            pool,
            observer,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a statement that returns no rows and commits it.
    ///
    /// Returns the number of affected rows.
    pub fn exec(&self, ctx: &Context, stmt: &Statement) -> Result<u64> {
        let mut span = Span::start("exec", self.observer.clone());
        let result = self.exec_inner(ctx, stmt, &span);
        span.finish(result.is_err());
        result
    }

    fn exec_inner(&self, ctx: &Context, stmt: &Statement, span: &Span) -> Result<u64> {
        let (tx, affected) = self.run(ctx, stmt, span, |tx| tx.exec(&stmt.sql, &stmt.params))?;
        tx.commit()?;
        Ok(affected)
    }

    /// Opens a cursor over the statement's rows.
    ///
    /// The transaction stays open until the returned [`Rows`] is drained,
    /// closed or dropped.
    pub fn query(&self, ctx: &Context, stmt: &Statement) -> Result<Rows> {
        let mut span = Span::start("query", self.observer.clone());
        match self.run(ctx, stmt, &span, |tx| tx.query(&stmt.sql, &stmt.params)) {
            Ok((tx, ())) => Ok(Rows {
                tx: Some(tx),
                ctx: ctx.clone(),
                span,
            }),
            Err(e) => {
                span.finish(true);
                Err(e)
            }
        }
    }

    /// Runs a statement expected to produce exactly one row.
    ///
    /// Zero rows is [`Error::NotFound`]; rows after the first are ignored.
    pub fn query_row(&self, ctx: &Context, stmt: &Statement) -> Result<Row> {
        let mut rows = self.query(ctx, stmt)?;
        match rows.next() {
            Some(Ok(row)) => {
                rows.close()?;
                Ok(row)
            }
            Some(Err(e)) => Err(e),
            None => Err(Error::NotFound),
        }
    }

    pub fn ping(&self) -> Result<()> {
        Ok(self.pool.ping()?)
    }

    pub fn stat(&self) -> PoolStats {
        self.pool.stat()
    }

    pub fn close(&self) {
        self.pool.close();
    }

    fn run<T, F>(
        &self,
        ctx: &Context,
        stmt: &Statement,
        span: &Span,
        op: F,
    ) -> Result<(Box<dyn Transaction>, T)>
    where
        F: Fn(&mut dyn Transaction) -> std::result::Result<T, DbError>,
    {
        let _entered = span.tracing().enter();
        trace!(sql = %stmt.sql, params = stmt.params.len(), "running statement");

        match self.attempt(ctx, &op) {
            Ok(done) => Ok(done),
            Err(failure) if failure.is_transient() && self.config.retry_transient => {
                warn!(error = %failure_message(&failure), "transport failure, reconnecting");
                span.incr("reconnects");
                self.pool.reconnect()?;
                self.attempt(ctx, &op).map_err(Failure::into_error)
            }
            Err(failure) => Err(failure.into_error()),
        }
    }

    fn attempt<T, F>(&self, ctx: &Context, op: &F) -> Attempt<T>
    where
        F: Fn(&mut dyn Transaction) -> std::result::Result<T, DbError>,
    {
        ctx.check().map_err(Failure::Other)?;
        let mut tx = self.pool.begin().map_err(Failure::Begin)?;

        if let Some(tenant) = ctx.tenant() {
            let params = [
                Param::Text(self.config.tenant_setting.clone()),
                Param::Text(tenant.to_string()),
            ];
            if let Err(e) = tx.exec(TENANT_BIND, &params) {
                abandon(tx);
                return Err(Failure::Bind(e));
            }
        }

        if let Err(e) = ctx.check() {
            abandon(tx);
            return Err(Failure::Other(e));
        }

        match op(tx.as_mut()) {
            Ok(value) => Ok((tx, value)),
            Err(e) => {
                abandon(tx);
                Err(Failure::Statement(e))
            }
        }
    }
}

fn failure_message(failure: &Failure) -> String {
    match failure {
        Failure::Begin(e) | Failure::Bind(e) | Failure::Statement(e) => e.to_string(),
        Failure::Other(e) => e.to_string(),
    }
}

fn abandon(tx: Box<dyn Transaction>) {
    if let Err(e) = tx.rollback() {
        trace!(error = %e, "rollback failed");
    }
}

/// Cursor over a query's rows, owning its transaction.
///
/// The transaction commits once the rows are exhausted or [`close`](Rows::close)
/// is called, and rolls back on any error, on cancellation, or when the
/// cursor is dropped early.
pub struct Rows {
    tx: Option<Box<dyn Transaction>>,
    ctx: Context,
    span: Span,
}

impl Rows {
    /// Ends the scan early and commits.
    pub fn close(mut self) -> Result<()> {
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        let result = tx.commit().map_err(Error::from);
        self.span.finish(result.is_err());
        result
    }

    fn abort(&mut self) {
        if let Some(tx) = self.tx.take() {
            abandon(tx);
            self.span.finish(true);
        }
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let tx = self.tx.as_mut()?;
        let step = match self.ctx.check() {
            Ok(()) => tx.next_row().map_err(Error::from),
            Err(e) => Err(e),
        };

        match step {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => self.commit().err().map(Err),
            Err(e) => {
                self.abort();
                Some(Err(e))
            }
        }
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        self.abort();
    }
}

//! Scripted in-memory pool for execution tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tagql::exec::{DbError, Observer, Pool, PoolStats, Row, Transaction};
use tagql::value::Param;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Begin(u32),
    Exec(u32, String, Vec<Param>),
    Query(u32, String, Vec<Param>),
    Fetch(u32),
    Commit(u32),
    Rollback(u32),
    Reconnect,
}

/// A failure injected into the next statements whose SQL starts with `prefix`.
struct Fault {
    prefix: String,
    error: DbError,
    remaining: usize,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    faults: Vec<Fault>,
    rows: Vec<Row>,
    next_tx: u32,
    closed: bool,
}

#[derive(Clone, Default)]
pub struct FakePool {
    state: Arc<Mutex<State>>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Rows every query returns.
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.lock().rows = rows;
        self
    }

    /// Fails the next `times` statements starting with `prefix`.
    pub fn fail(self, prefix: &str, error: DbError, times: usize) -> Self {
        self.lock().faults.push(Fault {
            prefix: prefix.to_string(),
            error,
            remaining: times,
        });
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Exec(_, sql, _) | Event::Query(_, sql, _) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| wanted(e)).count()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

fn take_fault(state: &mut State, sql: &str) -> Option<DbError> {
    let fault = state
        .faults
        .iter_mut()
        .find(|f| f.remaining > 0 && sql.starts_with(&f.prefix))?;
    fault.remaining -= 1;
    Some(fault.error.clone())
}

impl Pool for FakePool {
    fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        let mut state = self.lock();
        if state.closed {
            return Err(DbError::Closed);
        }
        state.next_tx += 1;
        let id = state.next_tx;
        state.events.push(Event::Begin(id));
        Ok(Box::new(FakeTx {
            id,
            state: self.state.clone(),
            cursor: VecDeque::new(),
        }))
    }

    fn reconnect(&self) -> Result<(), DbError> {
        self.lock().events.push(Event::Reconnect);
        Ok(())
    }

    fn ping(&self) -> Result<(), DbError> {
        if self.lock().closed {
            return Err(DbError::Closed);
        }
        Ok(())
    }

    fn stat(&self) -> PoolStats {
        PoolStats {
            open: 1,
            in_use: 0,
            idle: 1,
        }
    }

    fn close(&self) {
        self.lock().closed = true;
    }
}

struct FakeTx {
    id: u32,
    state: Arc<Mutex<State>>,
    cursor: VecDeque<Row>,
}

impl Transaction for FakeTx {
    fn exec(&mut self, sql: &str, params: &[Param]) -> Result<u64, DbError> {
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push(Event::Exec(self.id, sql.to_string(), params.to_vec()));
        match take_fault(&mut state, sql) {
            Some(e) => Err(e),
            None => Ok(1),
        }
    }

    fn query(&mut self, sql: &str, params: &[Param]) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push(Event::Query(self.id, sql.to_string(), params.to_vec()));
        if let Some(e) = take_fault(&mut state, sql) {
            return Err(e);
        }
        self.cursor = state.rows.iter().cloned().collect();
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        self.state.lock().unwrap().events.push(Event::Fetch(self.id));
        Ok(self.cursor.pop_front())
    }

    fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.state.lock().unwrap().events.push(Event::Commit(self.id));
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), DbError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Rollback(self.id));
        Ok(())
    }
}

/// Records finished spans and counters.
#[derive(Default)]
pub struct RecordingObserver {
    pub spans: Mutex<Vec<(&'static str, bool)>>,
    pub counters: Mutex<Vec<(&'static str, u64)>>,
}

impl Observer for RecordingObserver {
    fn finish_span(&self, name: &'static str, _elapsed: Duration, failed: bool) {
        self.spans.lock().unwrap().push((name, failed));
    }

    fn incr(&self, counter: &'static str, by: u64) {
        self.counters.lock().unwrap().push((counter, by));
    }
}

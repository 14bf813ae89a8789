use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Receives timings and counters from the execution layer.
///
/// Optional: a [`Db`](crate::exec::Db) built without one still traces through
/// `tracing`, which is inert until a subscriber is installed.
pub trait Observer: Send + Sync {
    fn finish_span(&self, name: &'static str, elapsed: Duration, failed: bool);

    fn incr(&self, _counter: &'static str, _by: u64) {}
}

pub(crate) struct Span {
    name: &'static str,
    start: Instant,
    span: tracing::Span,
    observer: Option<Arc<dyn Observer>>,
    finished: bool,
}

impl Span {
    pub(crate) fn start(name: &'static str, observer: Option<Arc<dyn Observer>>) -> Self {
        Span {
            name,
            start: Instant::now(),
            span: tracing::debug_span!("tagql", op = name),
            observer,
            finished: false,
        }
    }

    pub(crate) fn tracing(&self) -> &tracing::Span {
        &self.span
    }

    pub(crate) fn incr(&self, counter: &'static str) {
        if let Some(observer) = &self.observer {
            observer.incr(counter, 1);
        }
    }

    pub(crate) fn finish(&mut self, failed: bool) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed = self.start.elapsed();
        debug!(
            parent: &self.span,
            elapsed_ms = elapsed.as_millis() as u64,
            failed,
            "{} finished",
            self.name
        );
        if let Some(observer) = &self.observer {
            observer.finish_span(self.name, elapsed, failed);
        }
    }
}

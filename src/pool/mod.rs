//! Worker pools for running crawl tasks on OS threads
//!
//! Both pools hand work to their workers over a rendezvous channel: a
//! submission only returns once a worker has taken the task, so a producer
//! can never run ahead of the pool's capacity.
//!
//! - `FixedPool`: a constant number of workers started at construction
//! - `ElasticPool`: a worker count that a resize policy can change after
//!   every finished task

mod elastic;
mod fixed;
mod worker;

pub use elastic::{ElasticPool, ResizePolicy};
pub use fixed::FixedPool;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// A unit of work accepted by a pool
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// A labelled action waiting to be claimed by a worker
pub(crate) struct Task {
    label: String,
    action: Action,
}

impl Task {
    pub(crate) fn new(label: String, action: Action) -> Self {
        Self { label, action }
    }

    /// Runs the action, containing a panic to the action itself
    ///
    /// Hands back the label for post-task hooks and, if the action panicked,
    /// the panic message.
    pub(crate) fn run(self) -> (String, Option<String>) {
        let Task { label, action } = self;
        let panic = panic::catch_unwind(AssertUnwindSafe(action))
            .err()
            .map(|payload| panic_message(payload.as_ref()).to_string());
        (label, panic)
    }

    /// Runs the action on a thread that is not a worker
    pub(crate) fn run_on_caller(self) {
        let (label, panic) = self.run();
        if let Some(message) = panic {
            error!(task = %label, panic = %message, "Task panicked on the calling thread");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Common interface of the worker pools
///
/// Errors raised inside an action are the action's business; a pool runs
/// every accepted action exactly once. A panicking action is logged and
/// does not take its worker down.
pub trait WorkerPool: Send + Sync {
    /// Hands `action` to a worker, blocking until one is free to take it
    ///
    /// Returns as soon as the action has been handed off, not when it has
    /// finished running.
    fn submit<F>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + 'static;

    /// Number of workers currently accepting tasks
    fn capacity(&self) -> usize;

    /// Stops the pool
    ///
    /// Runs any task still waiting to be claimed on the calling thread, then
    /// lets every worker finish its current task and joins all worker
    /// threads. Consuming the pool makes submitting after `stop` impossible.
    fn stop(self);
}

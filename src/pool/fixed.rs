//! Fixed-capacity worker pool

use crate::pool::worker::WorkerHandle;
use crate::pool::{Task, WorkerPool};
use crate::PoolError;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error};

/// Pool with a constant number of worker threads
///
/// All workers are started eagerly by [`FixedPool::new`] and run until
/// [`WorkerPool::stop`].
pub struct FixedPool {
    tasks_tx: Sender<Task>,

    /// Kept for draining unclaimed tasks on stop
    tasks_rx: Receiver<Task>,

    workers: Vec<WorkerHandle>,
}

impl FixedPool {
    /// Creates a pool and starts `capacity` worker threads
    ///
    /// # Returns
    ///
    /// * `Ok(FixedPool)` - All workers are running
    /// * `Err(PoolError::InvalidCapacity)` - `capacity` is zero
    /// * `Err(PoolError::Spawn)` - A worker thread could not be started; the
    ///   workers started so far are shut down again
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        if capacity < 1 {
            return Err(PoolError::InvalidCapacity(capacity));
        }

        let (tasks_tx, tasks_rx) = bounded(0);
        let mut workers = Vec::with_capacity(capacity);

        for id in 0..capacity {
            match WorkerHandle::spawn(id, tasks_rx.clone(), None) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    drop(tasks_tx);
                    for worker in workers {
                        worker.join();
                    }
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        debug!(capacity, "Fixed pool started");

        Ok(Self {
            tasks_tx,
            tasks_rx,
            workers,
        })
    }
}

impl WorkerPool for FixedPool {
    fn submit<F>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::new(label.into(), Box::new(action));
        // The pool owns a receiver until `stop`, so the queue cannot be closed here
        if let Err(rejected) = self.tasks_tx.send(task) {
            error!("Task queue closed, running task on the caller");
            rejected.into_inner().run_on_caller();
        }
    }

    fn capacity(&self) -> usize {
        self.workers.len()
    }

    fn stop(self) {
        let mut drained = 0usize;
        while let Ok(task) = self.tasks_rx.try_recv() {
            task.run_on_caller();
            drained += 1;
        }

        drop(self.tasks_tx);

        for worker in self.workers {
            worker.join();
        }

        debug!(drained, "Fixed pool stopped");
    }
}

//! Worker pool whose capacity can change while it runs

use crate::pool::worker::{join_worker, AfterTask, WorkerHandle};
use crate::pool::{Task, WorkerPool};
use crate::PoolError;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Decides, after each finished task, whether the pool should be resized
///
/// Receives the label of the finished task and returns the new capacity, or
/// `None` to leave the pool as it is.
pub type ResizePolicy = Box<dyn Fn(&str) -> Option<usize> + Send + Sync>;

/// Pool whose worker count follows an injected [`ResizePolicy`]
///
/// Growing starts new workers on the shared task queue. Shrinking signals the
/// excess workers to exit once their current task is done; running tasks are
/// never interrupted.
pub struct ElasticPool {
    tasks_tx: Sender<Task>,
    shared: Arc<Shared>,
}

struct Shared {
    tasks_rx: Receiver<Task>,
    policy: ResizePolicy,
    state: Mutex<Workers>,
}

#[derive(Default)]
struct Workers {
    active: Vec<WorkerHandle>,

    /// Workers told to stop; reaped on resize once exited, the rest joined
    /// when the pool stops
    retired: Vec<(usize, JoinHandle<()>)>,

    next_id: usize,
    stopping: bool,
}

impl Workers {
    /// Joins retired workers that have already exited
    fn reap_retired(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retired)
            .into_iter()
            .partition(|(_, thread)| thread.is_finished());
        self.retired = running;

        for (id, thread) in finished {
            join_worker(id, thread);
        }
    }
}

impl ElasticPool {
    /// Creates a pool with `initial_capacity` workers and a resize policy
    ///
    /// # Returns
    ///
    /// * `Ok(ElasticPool)` - All initial workers are running
    /// * `Err(PoolError::InvalidCapacity)` - `initial_capacity` is zero
    /// * `Err(PoolError::Spawn)` - A worker thread could not be started
    pub fn new<P>(initial_capacity: usize, policy: P) -> Result<Self, PoolError>
    where
        P: Fn(&str) -> Option<usize> + Send + Sync + 'static,
    {
        if initial_capacity < 1 {
            return Err(PoolError::InvalidCapacity(initial_capacity));
        }

        let (tasks_tx, tasks_rx) = bounded(0);
        let shared = Arc::new(Shared {
            tasks_rx,
            policy: Box::new(policy),
            state: Mutex::new(Workers::default()),
        });

        {
            let mut state = shared.state.lock();
            for _ in 0..initial_capacity {
                if let Err(e) = shared.spawn_worker(&mut state) {
                    let started = std::mem::take(&mut state.active);
                    drop(state);
                    drop(tasks_tx);
                    for worker in started {
                        worker.join();
                    }
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        debug!(capacity = initial_capacity, "Elastic pool started");

        Ok(Self { tasks_tx, shared })
    }
}

impl Shared {
    fn spawn_worker(self: &Arc<Self>, state: &mut Workers) -> std::io::Result<()> {
        let id = state.next_id;
        let shared = Arc::clone(self);
        let hook: AfterTask = Arc::new(move |label: &str| shared.task_finished(label));

        let worker = WorkerHandle::spawn(id, self.tasks_rx.clone(), Some(hook))?;
        state.next_id += 1;
        state.active.push(worker);
        Ok(())
    }

    fn task_finished(self: &Arc<Self>, label: &str) {
        if let Some(capacity) = (self.policy)(label) {
            self.resize(capacity);
        }
    }

    fn resize(self: &Arc<Self>, capacity: usize) {
        if capacity < 1 {
            warn!(capacity, "Ignoring request to resize pool below one worker");
            return;
        }

        let mut state = self.state.lock();
        if state.stopping {
            debug!(capacity, "Ignoring resize request, pool is stopping");
            return;
        }

        state.reap_retired();

        let current = state.active.len();
        match capacity.cmp(&current) {
            Ordering::Equal => {}
            Ordering::Less => {
                let excess = state.active.split_off(capacity);
                for worker in excess {
                    let retired = worker.retire();
                    state.retired.push(retired);
                }
                debug!(from = current, to = capacity, "Pool shrunk");
            }
            Ordering::Greater => {
                for _ in current..capacity {
                    if let Err(e) = self.spawn_worker(&mut state) {
                        warn!(error = %e, "Failed to grow pool, keeping current size");
                        break;
                    }
                }
                debug!(from = current, to = state.active.len(), "Pool grown");
            }
        }
    }
}

impl WorkerPool for ElasticPool {
    fn submit<F>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::new(label.into(), Box::new(action));
        if let Err(rejected) = self.tasks_tx.send(task) {
            warn!("Task queue closed, running task on the caller");
            rejected.into_inner().run_on_caller();
        }
    }

    fn capacity(&self) -> usize {
        self.shared.state.lock().active.len()
    }

    fn stop(self) {
        let mut drained = 0usize;
        while let Ok(task) = self.shared.tasks_rx.try_recv() {
            task.run_on_caller();
            drained += 1;
        }

        let (active, retired) = {
            let mut state = self.shared.state.lock();
            state.stopping = true;
            (
                std::mem::take(&mut state.active),
                std::mem::take(&mut state.retired),
            )
        };

        drop(self.tasks_tx);

        for worker in active {
            worker.join();
        }
        for (id, thread) in retired {
            join_worker(id, thread);
        }

        debug!(drained, "Elastic pool stopped");
    }
}

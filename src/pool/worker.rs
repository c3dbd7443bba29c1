//! Worker thread loop shared by both pool variants

use crate::pool::Task;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

/// Hook invoked on the worker thread with the label of every finished task
pub(crate) type AfterTask = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle to a running worker thread
pub(crate) struct WorkerHandle {
    id: usize,

    /// Control channel asking the worker to stop claiming tasks
    stop_tx: Sender<()>,

    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawns a worker consuming from `tasks`
    pub(crate) fn spawn(
        id: usize,
        tasks: Receiver<Task>,
        after_task: Option<AfterTask>,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name(format!("pool-worker-{}", id))
            .spawn(move || worker_loop(id, tasks, stop_rx, after_task))?;

        Ok(Self {
            id,
            stop_tx,
            thread,
        })
    }

    /// Asks the worker to exit once its current task (if any) is done
    ///
    /// Returns the thread handle so the caller can join it later.
    pub(crate) fn retire(self) -> (usize, JoinHandle<()>) {
        // Capacity 1 and a single signal per worker, so this never blocks
        let _ = self.stop_tx.try_send(());
        (self.id, self.thread)
    }

    /// Waits for the worker thread to exit
    pub(crate) fn join(self) {
        join_worker(self.id, self.thread);
    }
}

/// Joins a worker thread, reporting a worker that died from a panic
///
/// Task panics are contained by the worker loop; this only sees panics
/// raised by a post-task hook.
pub(crate) fn join_worker(id: usize, thread: JoinHandle<()>) {
    if thread.join().is_err() {
        error!(worker = id, "Worker thread panicked");
    }
}

fn worker_loop(
    id: usize,
    tasks: Receiver<Task>,
    stop_rx: Receiver<()>,
    after_task: Option<AfterTask>,
) {
    debug!(worker = id, "Worker started");

    loop {
        // A pending stop wins over any task offered at the same time
        if stop_rx.try_recv().is_ok() {
            break;
        }

        select! {
            recv(tasks) -> task => match task {
                Ok(task) => {
                    let (label, panic) = task.run();
                    match panic {
                        Some(message) => {
                            error!(worker = id, task = %label, panic = %message, "Task panicked");
                        }
                        None => trace!(worker = id, task = %label, "Task finished"),
                    }
                    if let Some(hook) = &after_task {
                        hook(&label);
                    }
                }
                // Task queue closed by `stop`
                Err(_) => break,
            },
            recv(stop_rx) -> _ => break,
        }
    }

    debug!(worker = id, "Worker exited");
}

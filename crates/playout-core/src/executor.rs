//! Single-writer command executor
//!
//! Each stage owns one worker thread through which every mutation of layer
//! state is serialized. Submissions carry one of two priorities: `Higher` is
//! reserved for the per-tick render pass, `High` for everything else. The
//! worker drains all pending `Higher` tasks before touching the `High` band;
//! within a band order is strict FIFO. `Higher` cannot starve `High` because
//! render passes arrive at most once per video period.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{StageError, StageResult};

/// Priority band for a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    /// External commands
    High,
    /// The render pass; drained ahead of all pending `High` tasks
    Higher,
}

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queues {
    higher: VecDeque<Task>,
    high: VecDeque<Task>,
    shutting_down: bool,
}

struct Shared {
    queues: Mutex<Queues>,
    work: Condvar,
}

/// Handle to a submitted task's eventual result.
///
/// Dropping the handle does not cancel the task; it still runs and its
/// result is discarded.
pub struct CompletionHandle<T> {
    rx: flume::Receiver<StageResult<T>>,
}

impl<T> CompletionHandle<T> {
    /// Block until the task has run and return its result
    pub fn wait(self) -> StageResult<T> {
        self.rx.recv().unwrap_or(Err(StageError::ExecutorShutdown))
    }

    /// Block up to `timeout`; `None` if the task has not completed by then
    pub fn wait_timeout(self, timeout: Duration) -> Option<StageResult<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(flume::RecvTimeoutError::Timeout) => None,
            Err(flume::RecvTimeoutError::Disconnected) => Some(Err(StageError::ExecutorShutdown)),
        }
    }

    /// A handle that is already resolved, for no-op commands
    pub(crate) fn ready(result: StageResult<T>) -> Self {
        let (tx, rx) = flume::bounded(1);
        let _ = tx.send(result);
        Self { rx }
    }
}

/// Single-worker FIFO executor with two priority bands
pub struct Executor {
    shared: Arc<Shared>,
    worker_id: thread::ThreadId,
    worker: Option<thread::JoinHandle<()>>,
}

impl Executor {
    /// Spawn the worker thread. `name` shows up in thread listings and
    /// panic messages, e.g. `stage-1`.
    pub fn new(name: impl Into<String>) -> Self {
        let shared = Arc::new(Shared {
            queues: Mutex::new(Queues::default()),
            work: Condvar::new(),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || worker_loop(worker_shared))
            .expect("failed to spawn executor worker");
        let worker_id = worker.thread().id();

        Self {
            shared,
            worker_id,
            worker: Some(worker),
        }
    }

    /// Enqueue a task without waiting for it
    pub fn submit<T, F>(&self, priority: TaskPriority, task: F) -> CompletionHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StageResult<T> + Send + 'static,
    {
        let (tx, rx) = flume::bounded(1);
        let task: Task = Box::new(move || {
            let _ = tx.send(task());
        });

        let mut queues = self.shared.queues.lock();
        if queues.shutting_down {
            // Dropping the task drops its sender; the handle resolves to
            // ExecutorShutdown.
            drop(queues);
            drop(task);
            return CompletionHandle { rx };
        }
        match priority {
            TaskPriority::Higher => queues.higher.push_back(task),
            TaskPriority::High => queues.high.push_back(task),
        }
        drop(queues);
        self.shared.work.notify_one();

        CompletionHandle { rx }
    }

    /// Enqueue a task and block until it completes. Called from the worker
    /// thread itself, the task runs inline instead, which keeps nested
    /// invocations from deadlocking the worker on its own queue.
    pub fn invoke<T, F>(&self, priority: TaskPriority, task: F) -> StageResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StageResult<T> + Send + 'static,
    {
        if thread::current().id() == self.worker_id {
            return task();
        }
        self.submit(priority, task).wait()
    }

    /// Whether the calling thread is this executor's worker
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        {
            let mut queues = self.shared.queues.lock();
            queues.shutting_down = true;
        }
        self.shared.work.notify_all();
        if let Some(worker) = self.worker.take() {
            // A task may own the last handle to the structure containing
            // this executor; joining from the worker itself would deadlock.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut queues = shared.queues.lock();
            loop {
                if let Some(task) = queues.higher.pop_front() {
                    break Some(task);
                }
                if let Some(task) = queues.high.pop_front() {
                    break Some(task);
                }
                // Pending work is drained before shutdown takes effect.
                if queues.shutting_down {
                    break None;
                }
                shared.work.wait(&mut queues);
            }
        };

        match task {
            Some(task) => task(),
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_submit_returns_value() {
        let executor = Executor::new("test-exec");
        let handle = executor.submit(TaskPriority::High, || Ok(41 + 1));
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn test_errors_propagate_through_handle() {
        let executor = Executor::new("test-exec");
        let handle = executor.submit(TaskPriority::High, || -> StageResult<()> {
            Err(StageError::Transform("bad".into()))
        });
        assert!(matches!(handle.wait(), Err(StageError::Transform(_))));
    }

    #[test]
    fn test_fifo_order_within_band() {
        let executor = Executor::new("test-exec");
        let order = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let order = order.clone();
                executor.submit(TaskPriority::High, move || {
                    order.lock().push(i);
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.wait().unwrap();
        }
        assert_eq!(*order.lock(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_higher_band_preempts_pending_high() {
        let executor = Executor::new("test-exec");
        let order = Arc::new(Mutex::new(Vec::new()));

        // Gate the worker so the queues fill deterministically.
        let (gate_tx, gate_rx) = flume::bounded::<()>(1);
        let gate = executor.submit(TaskPriority::High, move || {
            let _ = gate_rx.recv();
            Ok(())
        });

        let o = order.clone();
        let high = executor.submit(TaskPriority::High, move || {
            o.lock().push("high");
            Ok(())
        });
        let o = order.clone();
        let higher = executor.submit(TaskPriority::Higher, move || {
            o.lock().push("higher");
            Ok(())
        });

        gate_tx.send(()).unwrap();
        gate.wait().unwrap();
        high.wait().unwrap();
        higher.wait().unwrap();

        assert_eq!(*order.lock(), vec!["higher", "high"]);
    }

    #[test]
    fn test_invoke_from_worker_runs_inline() {
        let executor = Arc::new(Executor::new("test-exec"));
        let executor2 = executor.clone();
        let value = executor
            .submit(TaskPriority::High, move || {
                // Nested invoke on our own executor must not deadlock.
                executor2.invoke(TaskPriority::High, || Ok(7))
            })
            .wait()
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_shutdown_drains_pending_tasks() {
        let ran = Arc::new(AtomicUsize::new(0));
        {
            let executor = Executor::new("test-exec");
            let (gate_tx, gate_rx) = flume::bounded::<()>(1);
            executor.submit(TaskPriority::High, move || {
                let _ = gate_rx.recv();
                Ok(())
            });
            for _ in 0..8 {
                let ran = ran.clone();
                executor.submit(TaskPriority::High, move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            gate_tx.send(()).unwrap();
            // Drop joins the worker after the queue drains.
        }
        assert_eq!(ran.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_submit_after_shutdown_reports_error() {
        let executor = Executor::new("test-exec");
        {
            let mut queues = executor.shared.queues.lock();
            queues.shutting_down = true;
        }
        let handle = executor.submit(TaskPriority::High, || Ok(()));
        assert!(matches!(handle.wait(), Err(StageError::ExecutorShutdown)));
    }
}

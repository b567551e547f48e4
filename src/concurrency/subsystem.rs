use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::concurrency::task::Task;
use crate::foundation::error::{ClockworkError, ClockworkResult};

/// Environment override for the worker count when multi-threaded execution is enabled.
pub const THREADS_ENV: &str = "CLOCKWORK_THREADS";

struct Queued {
    priority: u64,
    sequence: u64,
    task: Box<dyn Task>,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: highest priority first, then earliest submission.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Shared {
    queue: Mutex<BinaryHeap<Queued>>,
    pending: Mutex<usize>,
    idle: Condvar,
    sequence: AtomicU64,
    completed: AtomicU64,
}

/// Marks one task as finished when dropped, including during a panic unwind.
struct CompletionGuard<'a>(&'a Shared);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.completed.fetch_add(1, Ordering::AcqRel);
        let mut pending = lock(&self.0.pending);
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.0.idle.notify_all();
        }
    }
}

impl Shared {
    fn run_next(&self) {
        let next = lock(&self.queue).pop();
        let Some(queued) = next else {
            return;
        };
        let _done = CompletionGuard(self);
        queued.task.run();
    }
}

fn build_thread_pool(threads: usize) -> ClockworkResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("clockwork-worker-{i}"))
        .panic_handler(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            tracing::error!(%message, "task panicked");
        })
        .build()
        .map_err(|e| ClockworkError::validation(format!("failed to build worker pool: {e}")))
}

fn env_threads() -> Option<usize> {
    std::env::var(THREADS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

fn hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Priority task scheduler over a worker pool.
///
/// Tasks submitted with [`submit_task`](Self::submit_task) run on the pool, highest priority
/// first and in submission order within one priority. [`wait`](Self::wait) blocks until every
/// submitted task has finished. With multi-threaded execution disabled the pool collapses to a
/// single worker and tasks run one after another.
pub struct ConcurrencySubsystem {
    pool: rayon::ThreadPool,
    shared: Arc<Shared>,
    multi_threaded: bool,
    threads: Option<usize>,
}

impl ConcurrencySubsystem {
    /// Create a scheduler.
    ///
    /// `threads` fixes the worker count for multi-threaded execution; without it the count comes
    /// from `CLOCKWORK_THREADS` or the available hardware parallelism.
    pub fn new(multi_threaded: bool, threads: Option<usize>) -> ClockworkResult<Self> {
        if threads == Some(0) {
            return Err(ClockworkError::validation(
                "worker count must be >= 1 when set",
            ));
        }
        let count = Self::worker_count(multi_threaded, threads);
        tracing::debug!(workers = count, multi_threaded, "starting worker pool");
        Ok(Self {
            pool: build_thread_pool(count)?,
            shared: Arc::new(Shared::default()),
            multi_threaded,
            threads,
        })
    }

    fn worker_count(multi_threaded: bool, threads: Option<usize>) -> usize {
        if !multi_threaded {
            return 1;
        }
        threads.or_else(env_threads).unwrap_or_else(hardware_threads)
    }

    /// Queue a task. `None` is ignored.
    pub fn submit_task(&self, task: Option<Box<dyn Task>>) {
        let Some(task) = task else {
            tracing::trace!("ignoring empty task submission");
            return;
        };
        *lock(&self.shared.pending) += 1;
        let queued = Queued {
            priority: task.priority(),
            sequence: self.shared.sequence.fetch_add(1, Ordering::AcqRel),
            task,
        };
        lock(&self.shared.queue).push(queued);

        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || shared.run_next());
    }

    pub fn submit<T: Task>(&self, task: T) {
        self.submit_task(Some(Box::new(task)));
    }

    /// Block until no submitted task is queued or running. Returns at once when idle.
    ///
    /// Must not be called from inside a task.
    pub fn wait(&self) {
        let mut pending = lock(&self.shared.pending);
        while *pending > 0 {
            pending = self
                .shared
                .idle
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Switch between a full worker pool and a single worker.
    ///
    /// Outstanding tasks are drained first. Rebuilding is skipped when the mode is unchanged.
    pub fn enable_multi_threaded_execution(&mut self, enabled: bool) -> ClockworkResult<()> {
        if enabled == self.multi_threaded {
            return Ok(());
        }
        self.wait();
        let count = Self::worker_count(enabled, self.threads);
        self.pool = build_thread_pool(count)?;
        self.multi_threaded = enabled;
        tracing::info!(workers = count, multi_threaded = enabled, "worker pool rebuilt");
        Ok(())
    }

    pub fn is_multi_threaded_execution_enabled(&self) -> bool {
        self.multi_threaded
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Tasks submitted but not yet finished.
    pub fn pending_task_count(&self) -> usize {
        *lock(&self.shared.pending)
    }

    /// Tasks finished since creation, panicked ones included.
    pub fn completed_task_count(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }
}

impl Drop for ConcurrencySubsystem {
    fn drop(&mut self) {
        self.wait();
    }
}

impl std::fmt::Debug for ConcurrencySubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencySubsystem")
            .field("multi_threaded", &self.multi_threaded)
            .field("threads", &self.thread_count())
            .field("pending", &self.pending_task_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/concurrency/subsystem.rs"]
mod tests;

//! ``src/tasks/worker_pool.rs``
//!
//! # `WorkerPool`: Fixed Background Threads
//!
//! Jobs run on named worker threads pulled from one FIFO channel. A job never
//! touches owner state directly: its result is handed back through the
//! owner's [`TaskQueue`] and applied when the owner pumps.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::tasks::task_queue::TaskQueue;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub panicked: AtomicU64,
}

impl PoolStats {
    /// Jobs accepted but not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        let done: u64 =
            self.completed.load(Ordering::Acquire) + self.panicked.load(Ordering::Acquire);
        self.submitted.load(Ordering::Acquire).saturating_sub(done)
    }
}

pub struct WorkerPool<C> {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue: Arc<TaskQueue<C>>,
    stats: Arc<PoolStats>,
}

impl<C: 'static> WorkerPool<C> {
    /// Spawn `threads` workers delivering into `queue`.
    pub fn new(threads: usize, queue: Arc<TaskQueue<C>>) -> CoreResult<Self> {
        let threads: usize = threads.max(1);
        let (sender, receiver): (Sender<Job>, Receiver<Job>) = channel::unbounded();
        let stats: Arc<PoolStats> = Arc::new(PoolStats::default());

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(threads);
        for id in 0..threads {
            let receiver: Receiver<Job> = receiver.clone();
            let stats_clone: Arc<PoolStats> = Arc::clone(&stats);

            let handle: JoinHandle<()> = thread::Builder::new()
                .name(format!("commander-worker-{id}"))
                .spawn(move || worker_loop(id, &receiver, &stats_clone))?;

            workers.push(handle);
        }

        info!(
            marker = "WORKER_POOL",
            operation_type = "pool_start",
            threads,
            "Worker pool started"
        );

        Ok(Self {
            sender: Some(sender),
            workers,
            queue,
            stats,
        })
    }

    /// Run `work` on a worker, then `deliver` its result on the owning thread
    /// at the next pump.
    ///
    /// A panicking job is logged and produces no delivery.
    pub fn submit<W, R, D>(&self, label: &'static str, work: W, deliver: D) -> CoreResult<()>
    where
        W: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
        D: FnOnce(&mut C, R) + Send + 'static,
    {
        let queue: Arc<TaskQueue<C>> = Arc::clone(&self.queue);

        let job: Job = Box::new(move || {
            let start_time: Instant = Instant::now();
            let result: R = work();
            let duration: Duration = start_time.elapsed();

            debug!(
                marker = "WORKER_POOL",
                operation_type = "job_done",
                job = label,
                duration_ms = duration.as_millis(),
                "Background job finished"
            );

            queue.push(move |ctx: &mut C| deliver(ctx, result));
        });

        let sender: &Sender<Job> = self.sender.as_ref().ok_or_else(|| {
            CoreError::Other("worker pool is shut down".into())
        })?;

        self.stats.submitted.fetch_add(1, Ordering::AcqRel);
        sender.send(job).map_err(|_| {
            self.stats.submitted.fetch_sub(1, Ordering::AcqRel);
            CoreError::Other(format!("worker pool rejected job '{label}'"))
        })
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

fn worker_loop(id: usize, receiver: &Receiver<Job>, stats: &PoolStats) {
    debug!(worker = id, "Worker started");

    // Ends once every sender is dropped and the channel is drained
    for job in receiver {
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                stats.completed.fetch_add(1, Ordering::AcqRel);
            }
            Err(_) => {
                stats.panicked.fetch_add(1, Ordering::AcqRel);
                error!(
                    marker = "WORKER_POOL",
                    operation_type = "job_panicked",
                    worker = id,
                    "Background job panicked"
                );
            }
        }
    }

    debug!(worker = id, "Worker stopped");
}

impl<C> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        drop(self.sender.take());

        for handle in self.workers.drain(..) {
            let name: String = handle.thread().name().unwrap_or("worker").to_owned();
            if handle.join().is_err() {
                warn!(worker = %name, "Worker thread exited abnormally");
            }
        }
    }
}

impl<C> std::fmt::Debug for WorkerPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::task_queue::DrainMode;

    fn wait_for<C: 'static>(pool: &WorkerPool<C>, queue: &TaskQueue<C>, ctx: &mut C, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut delivered = 0;
        while delivered < expected && Instant::now() < deadline {
            delivered += queue.pump(ctx, DrainMode::FirstBatch);
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(delivered, expected, "stats: {:?}", pool.stats());
    }

    #[test]
    fn results_are_delivered_on_the_pumping_thread() {
        let queue: Arc<TaskQueue<Vec<(u32, thread::ThreadId)>>> = Arc::new(TaskQueue::new());
        let pool = WorkerPool::new(4, Arc::clone(&queue)).unwrap();
        assert_eq!(pool.thread_count(), 4);

        for i in 0..8u32 {
            pool.submit(
                "square",
                move || i * i,
                |seen: &mut Vec<(u32, thread::ThreadId)>, r: u32| {
                    seen.push((r, thread::current().id()));
                },
            )
            .unwrap();
        }

        let mut seen = Vec::new();
        wait_for(&pool, &queue, &mut seen, 8);

        let me = thread::current().id();
        assert!(seen.iter().all(|(_, id)| *id == me));

        let mut values: Vec<u32> = seen.into_iter().map(|(v, _)| v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![0, 1, 4, 9, 16, 25, 36, 49]);
    }

    #[test]
    fn panicking_job_does_not_kill_the_pool() {
        let queue: Arc<TaskQueue<u32>> = Arc::new(TaskQueue::new());
        let pool = WorkerPool::new(1, Arc::clone(&queue)).unwrap();

        pool.submit("boom", || -> u32 { panic!("boom") }, |_: &mut u32, _: u32| {})
            .unwrap();
        pool.submit("ok", || 7u32, |total: &mut u32, r: u32| *total += r)
            .unwrap();

        let mut total = 0;
        wait_for(&pool, &queue, &mut total, 1);

        assert_eq!(total, 7);
        assert_eq!(pool.stats().panicked.load(Ordering::Acquire), 1);
    }
}

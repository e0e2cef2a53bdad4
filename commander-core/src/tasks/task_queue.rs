//! ``src/tasks/task_queue.rs``
//!
//! # `TaskQueue`: Thread-Safe Callback Mailbox
//!
//! Any thread may `push`; only the owning thread calls `pump`, so every
//! callback runs on the thread that owns the context `C`. Sequence numbers are
//! taken under the queue lock, which makes FIFO order equal to push order.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Callback delivered to the owning thread.
pub type Callback<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// How much of the queue one `pump` call drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainMode {
    /// Only callbacks queued before the pump started. Callbacks pushed while
    /// pumping wait for the next tick.
    #[default]
    FirstBatch,

    /// Keep draining until the queue is observed empty.
    ToEmpty,
}

struct Queued<C> {
    seq: u64,
    callback: Callback<C>,
}

struct Inner<C> {
    next_seq: u64,
    pending: VecDeque<Queued<C>>,
}

pub struct TaskQueue<C> {
    inner: Mutex<Inner<C>>,
}

impl<C> TaskQueue<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_seq: 0,
                pending: VecDeque::new(),
            }),
        }
    }

    /// Enqueue `callback`; returns its sequence number.
    pub fn push<F>(&self, callback: F) -> u64
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let seq: u64 = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.push_back(Queued {
            seq,
            callback: Box::new(callback),
        });

        seq
    }

    /// Run queued callbacks in FIFO order on the calling thread.
    ///
    /// The lock is never held while a callback runs, so callbacks may push.
    pub fn pump(&self, ctx: &mut C, mode: DrainMode) -> usize {
        let start_time: Instant = Instant::now();
        let mut executed: usize = 0;

        loop {
            let batch: VecDeque<Queued<C>> = std::mem::take(&mut self.inner.lock().pending);
            if batch.is_empty() {
                break;
            }

            for queued in batch {
                trace!(seq = queued.seq, "Running queued callback");
                (queued.callback)(ctx);
                executed += 1;
            }

            if mode == DrainMode::FirstBatch {
                break;
            }
        }

        if executed > 0 {
            let duration: Duration = start_time.elapsed();
            trace!(
                marker = "TASK_QUEUE_PUMP",
                operation_type = "pump",
                executed,
                duration_us = duration.as_micros(),
                "Task queue pumped"
            );
        }

        executed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, OnceLock};
    use std::thread;

    #[test]
    fn callbacks_run_in_push_order() {
        let queue: TaskQueue<Vec<u32>> = TaskQueue::new();
        for i in 0..5 {
            queue.push(move |seen: &mut Vec<u32>| seen.push(i));
        }

        let mut seen = Vec::new();
        assert_eq!(queue.pump(&mut seen, DrainMode::FirstBatch), 5);
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_pushes_keep_sequence_order() {
        let queue: Arc<TaskQueue<Vec<u64>>> = Arc::new(TaskQueue::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..100 {
                        // The callback learns its own sequence number after the push
                        let slot: Arc<OnceLock<u64>> = Arc::new(OnceLock::new());
                        let inner = Arc::clone(&slot);
                        let seq = queue.push(move |seen: &mut Vec<u64>| {
                            if let Some(seq) = inner.get() {
                                seen.push(*seq);
                            }
                        });
                        let _ = slot.set(seq);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = Vec::new();
        queue.pump(&mut seen, DrainMode::FirstBatch);

        assert_eq!(seen.len(), 400);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn first_batch_defers_callbacks_pushed_while_pumping() {
        struct Ctx {
            queue: Arc<TaskQueue<Ctx>>,
            runs: Vec<&'static str>,
        }

        let queue: Arc<TaskQueue<Ctx>> = Arc::new(TaskQueue::new());
        queue.push(|ctx: &mut Ctx| {
            ctx.runs.push("first");
            ctx.queue.push(|ctx: &mut Ctx| ctx.runs.push("nested"));
        });

        let mut ctx = Ctx {
            queue: Arc::clone(&queue),
            runs: Vec::new(),
        };

        assert_eq!(queue.pump(&mut ctx, DrainMode::FirstBatch), 1);
        assert_eq!(ctx.runs, vec!["first"]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pump(&mut ctx, DrainMode::FirstBatch), 1);
        assert_eq!(ctx.runs, vec!["first", "nested"]);
    }

    #[test]
    fn to_empty_drains_nested_callbacks() {
        struct Ctx {
            queue: Arc<TaskQueue<Ctx>>,
            runs: u32,
        }

        let queue: Arc<TaskQueue<Ctx>> = Arc::new(TaskQueue::new());
        queue.push(|ctx: &mut Ctx| {
            ctx.runs += 1;
            ctx.queue.push(|ctx: &mut Ctx| ctx.runs += 1);
        });

        let mut ctx = Ctx {
            queue: Arc::clone(&queue),
            runs: 0,
        };

        assert_eq!(queue.pump(&mut ctx, DrainMode::ToEmpty), 2);
        assert_eq!(ctx.runs, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_mode_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: DrainMode,
        }

        let parsed: Wrapper = toml::from_str("mode = \"to_empty\"").unwrap();
        assert_eq!(parsed.mode, DrainMode::ToEmpty);
    }
}

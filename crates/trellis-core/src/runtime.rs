//! The single-threaded task queue deferred work runs on.
//!
//! Patch application is synchronous and runs to completion; the only
//! asynchronous boundary in the runtime is work that must happen strictly
//! after a render/patch cycle (hook effect bodies). That work is enqueued
//! here and drained by whoever drives the runtime, in FIFO order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

type Task = Box<dyn FnOnce() + 'static>;

/// Notified when the queue goes from empty to non-empty, so a host loop can
/// wake up and drain.
pub trait Scheduler: Send + Sync {
    fn schedule(&self);
}

/// Scheduler for hosts that drain eagerly and need no wake-up signal.
#[derive(Default)]
pub struct DefaultScheduler;

impl Scheduler for DefaultScheduler {
    fn schedule(&self) {}
}

struct RuntimeInner {
    scheduler: Arc<dyn Scheduler>,
    pending: RefCell<VecDeque<Task>>,
}

impl RuntimeInner {
    fn enqueue(&self, task: Task) {
        let was_empty = {
            let mut pending = self.pending.borrow_mut();
            let was_empty = pending.is_empty();
            pending.push_back(task);
            was_empty
        };
        if was_empty {
            self.scheduler.schedule();
        }
    }

    fn drain(&self) {
        // Drain the current batch only; tasks enqueued while running land
        // in the next batch.
        let batch: Vec<Task> = self.pending.borrow_mut().drain(..).collect();
        for task in batch {
            task();
        }
    }

    fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

/// Owns the task queue. Keep this alive for as long as handles are in use;
/// a handle whose runtime is gone degrades gracefully.
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

/// A weak, clonable reference to the runtime.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Enqueues a task. If the runtime has been dropped the task runs
    /// immediately instead of being lost.
    pub fn spawn_task(&self, task: Task) {
        match self.0.upgrade() {
            Some(inner) => inner.enqueue(task),
            None => task(),
        }
    }

    /// Runs the currently queued batch of tasks.
    pub fn drain_tasks(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.drain();
        }
    }

    /// Drains repeatedly until no tasks remain, including tasks enqueued by
    /// earlier batches.
    pub fn run_until_idle(&self) {
        while self.has_pending_tasks() {
            self.drain_tasks();
        }
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_pending())
            .unwrap_or(false)
    }
}

//! Deferred work for the single-threaded event loop.
//!
//! Controllers mutate their sequence synchronously, but anything that must
//! observe the *settled* result of an update (direction inference, the
//! "active view changed" notification) is pushed onto the [`Scheduler`] and
//! runs once the current unit of work has returned to the loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// FIFO queue of tasks that run after the current unit of work.
///
/// Cloning a `Scheduler` yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` to run on the next call to [`run_until_idle`](Self::run_until_idle).
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Runs queued tasks, including tasks queued by the tasks themselves,
    /// until the queue is empty. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut count = 0;

        loop {
            let task = self.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                break;
            };

            task();
            count += 1;
        }

        if count > 0 {
            tracing::trace!(count, "scheduler drained");
        }

        count
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.len())
            .finish()
    }
}

//! A fixed-size worker pool executing a shared FIFO task queue.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    condvar: Condvar,
    stopping: Mutex<bool>,
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// The result side of a submitted task, handed back by [`ThreadPool::submit_task`].
///
/// Mirrors the original's `std::future<std::invoke_result_t<F, Args...>>`:
/// a submitted closure's return value is recoverable by whoever holds the
/// handle, rather than discarded once the worker finishes it.
struct Outcome<T> {
    value: Mutex<Option<T>>,
    condvar: Condvar,
}

pub struct TaskHandle<T> {
    outcome: Arc<Outcome<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task this handle was returned for has finished,
    /// then return its value. Panics if the task panicked instead of
    /// returning (mirrors `std::future::get()` rethrowing).
    pub fn join(self) -> T {
        let mut guard = self.outcome.value.lock().unwrap();
        while guard.is_none() {
            guard = self.outcome.condvar.wait(guard).unwrap();
        }
        guard.take().expect("outcome checked Some under the lock")
    }
}

impl ThreadPool {
    /// Spawn `max(requested, 2)` worker threads sharing one task queue.
    pub fn new(requested: usize) -> Self {
        let count = requested.max(2);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            stopping: Mutex::new(false),
        });

        let workers = (0..count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    /// Queue `task` for execution on the next free worker, returning a
    /// handle that yields the task's return value once it completes.
    /// Errors if the pool is shutting down.
    pub fn submit_task<F, T>(&self, task: F) -> Result<TaskHandle<T>, &'static str>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if *self.shared.stopping.lock().unwrap() {
            return Err("thread pool is stopping");
        }

        let outcome = Arc::new(Outcome { value: Mutex::new(None), condvar: Condvar::new() });
        let reporter = Arc::clone(&outcome);
        let job: Task = Box::new(move || {
            let value = task();
            *reporter.value.lock().unwrap() = Some(value);
            reporter.condvar.notify_one();
        });

        self.shared.queue.lock().unwrap().push_back(job);
        self.shared.condvar.notify_one();
        Ok(TaskHandle { outcome })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(shared: Arc<Shared>) {
    // Once stopping is set, queued-but-unstarted tasks are discarded;
    // a task already popped and running is allowed to finish.
    loop {
        let task = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if *shared.stopping.lock().unwrap() {
                    break None;
                }
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                queue = shared.condvar.wait(queue).unwrap();
            }
        };
        match task {
            Some(task) => task(),
            None => break,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        *self.shared.stopping.lock().unwrap() = true;
        self.shared.condvar.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

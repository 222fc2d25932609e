//! Fixed-size worker pool with a quiescence barrier.
//!
//! One shared FIFO queue guarded by a mutex, two condvars: one wakes idle
//! workers, one wakes callers blocked in [`ThreadPool::wait`]. A job runs to
//! completion once dequeued; there is no cooperative suspension and no
//! mid-batch cancellation.
//!
//! Shutdown is deliberately fail-fast: workers are told to stop and joined,
//! and any jobs still queued at that point are abandoned, not drained.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("job submitted after pool shutdown began")]
    ShutDown,
}

struct PoolState {
    queue: VecDeque<Job>,
    /// Workers currently executing a job. Incremented in the same critical
    /// section as the dequeue, so `wait` never observes the gap between a
    /// pop and the execution starting.
    active: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    all_idle: Condvar,
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `num_threads` workers. `num_threads` must be non-zero.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "thread pool needs at least one worker");

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                active: 0,
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            all_idle: Condvar::new(),
        });

        let workers = (0..num_threads)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(shared))
            })
            .collect();

        log::debug!("thread pool started with {num_threads} workers");

        Self { shared, workers }
    }

    /// Enqueue one unit of work and wake one idle worker.
    pub fn queue<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.shutdown {
                return Err(PoolError::ShutDown);
            }
            state.queue.push_back(Box::new(job));
        }
        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Block until the queue is empty and no worker is running.
    ///
    /// This is a full quiescence barrier over everything submitted so far,
    /// not a single-job wait. Returns immediately on an idle pool. Submitting
    /// concurrently with `wait` makes the barrier meaningless for that batch;
    /// callers own that discipline.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while !(state.queue.is_empty() && state.active == 0) {
            state = self.shared.all_idle.wait(state).unwrap();
        }
    }

    /// Stop all workers and join them. Queued jobs that have not started are
    /// abandoned. Runs automatically on drop.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.shared.work_ready.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked during shutdown");
            }
        }
        log::debug!("thread pool shut down");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.active += 1;
                    break job;
                }
                state = shared.work_ready.wait(state).unwrap();
            }
        };

        // A panicking job ends that job only; the worker loop and pool state
        // stay intact. Surfacing per-job failures is the submitter's problem.
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("pool job panicked; worker continues");
        }

        let mut state = shared.state.lock().unwrap();
        state.active -= 1;
        if state.queue.is_empty() && state.active == 0 {
            drop(state);
            shared.all_idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn run_counter_batch(jobs: usize) {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..jobs {
            let counter = Arc::clone(&counter);
            pool.queue(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::Relaxed), jobs);
    }

    #[test]
    fn test_no_lost_updates_zero_jobs() {
        run_counter_batch(0);
    }

    #[test]
    fn test_no_lost_updates_one_job() {
        run_counter_batch(1);
    }

    #[test]
    fn test_no_lost_updates_thousand_jobs() {
        run_counter_batch(1000);
    }

    #[test]
    fn test_wait_on_idle_pool_returns() {
        let pool = ThreadPool::new(2);
        pool.wait();
    }

    #[test]
    fn test_wait_is_reusable_across_batches() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for batch in 1..=3 {
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.queue(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            }
            pool.wait();
            assert_eq!(counter.load(Ordering::Relaxed), batch * 50);
        }
    }

    #[test]
    fn test_queue_after_shutdown_rejected() {
        let mut pool = ThreadPool::new(1);
        pool.shutdown();
        let result = pool.queue(|| {});
        assert_eq!(result, Err(PoolError::ShutDown));
    }

    #[test]
    fn test_panicking_job_does_not_poison_pool() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.queue(|| panic!("job failure")).unwrap();
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.queue(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }
}

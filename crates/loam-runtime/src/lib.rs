//! Background worker pool for chunk generation jobs.
#![forbid(unsafe_code)]

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use rayon::ThreadPoolBuildError;

/// Worker count for a pool sized to the machine, leaving one core free.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .saturating_sub(1)
        .max(1)
}

struct Counters {
    queued: AtomicUsize,
    inflight: AtomicUsize,
    idle_lock: Mutex<()>,
    idle_cv: Condvar,
}

impl Counters {
    fn busy(&self) -> bool {
        self.queued.load(Ordering::SeqCst) + self.inflight.load(Ordering::SeqCst) > 0
    }

    fn notify_if_idle(&self) {
        if !self.busy() {
            let _g = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.idle_cv.notify_all();
        }
    }
}

/// Fixed set of named threads draining one unbounded queue. Each worker
/// blocks on the channel; dropping the pool closes it and the workers exit
/// after the queue empties.
pub struct WorkerPool<J: Send + 'static> {
    name: String,
    workers: usize,
    tx: Sender<J>,
    _pool: Arc<ThreadPool>,
    counters: Arc<Counters>,
}

impl<J: Send + 'static> WorkerPool<J> {
    pub fn new<F>(name: &str, workers: usize, handler: F) -> Result<Self, ThreadPoolBuildError>
    where
        F: Fn(J) + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let (tx, rx) = unbounded::<J>();
        let thread_prefix = name.to_string();
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(move |i| format!("{thread_prefix}-{i}"))
                .build()?,
        );
        let counters = Arc::new(Counters {
            queued: AtomicUsize::new(0),
            inflight: AtomicUsize::new(0),
            idle_lock: Mutex::new(()),
            idle_cv: Condvar::new(),
        });
        let handler = Arc::new(handler);
        for _ in 0..workers {
            let rx = rx.clone();
            let counters = counters.clone();
            let handler = handler.clone();
            let pool_name = name.to_string();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    // inflight goes up before queued goes down so the pool never looks idle mid-handoff
                    counters.inflight.fetch_add(1, Ordering::SeqCst);
                    counters.queued.fetch_sub(1, Ordering::SeqCst);
                    if catch_unwind(AssertUnwindSafe(|| handler(job))).is_err() {
                        log::error!(target: "gen", "{pool_name}: job panicked; worker continues");
                    }
                    counters.inflight.fetch_sub(1, Ordering::SeqCst);
                    counters.notify_if_idle();
                }
                log::debug!(target: "gen", "{pool_name}: worker exiting");
            });
        }
        log::info!(target: "gen", "{name}: started {workers} worker(s)");
        Ok(Self {
            name: name.to_string(),
            workers,
            tx,
            _pool: pool,
            counters,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Enqueues `job`; false means the workers are gone and the job was not taken.
    pub fn submit(&self, job: J) -> bool {
        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::SeqCst);
            self.counters.notify_if_idle();
            return false;
        }
        true
    }

    /// `(queued, inflight)` snapshot.
    pub fn queue_counts(&self) -> (usize, usize) {
        (
            self.counters.queued.load(Ordering::Relaxed),
            self.counters.inflight.load(Ordering::Relaxed),
        )
    }

    pub fn is_idle(&self) -> bool {
        !self.counters.busy()
    }

    /// Blocks until nothing is queued or running.
    pub fn wait_idle(&self) {
        let c = &self.counters;
        let mut g = c.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while c.busy() {
            g = c.idle_cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) but gives up after `timeout`; returns whether the pool went idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let c = &self.counters;
        let deadline = Instant::now() + timeout;
        let mut g = c.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while c.busy() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            g = c
                .idle_cv
                .wait_timeout(g, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

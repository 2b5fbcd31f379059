//! Bounded worker pool
//!
//! Work units run on a private tokio runtime, one blocking task per unit,
//! with a semaphore capping how many run at once.
//! - `add_command` spawns a unit; it waits for a permit before running
//! - `join` blocks until every submitted unit has finished, successfully or not
//! - `get_completed_items` drains finished units for inspection
//!
//! There is no cancellation: a submitted unit always runs. A unit that
//! panics is handed back through [`WorkUnit::abandon`] and still counts as
//! finished, so `join` always releases. Dropping the pool joins first.
//!
//! The pool drives its own runtime, so `join` must not be called from
//! inside an async context.

use std::any::Any;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::observability::{Event, Logger};

/// A unit of work executed on a pool thread.
pub trait WorkUnit: Send + 'static {
    /// Do the work. Outcome is recorded on `self`.
    fn run(&mut self);

    /// Record that `run` panicked with `reason`.
    fn abandon(&mut self, reason: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pool running at most `num_workers` units concurrently.
pub struct WorkerPool<T: WorkUnit> {
    runtime: Runtime,
    permits: Arc<Semaphore>,
    num_workers: usize,
    tasks: Mutex<JoinSet<Option<T>>>,
    completed: Mutex<Vec<T>>,
    logger: Logger,
}

impl<T: WorkUnit> WorkerPool<T> {
    /// Start a pool for `num_workers` concurrent units (at least one).
    pub fn new(num_workers: usize, logger: Logger) -> io::Result<Self> {
        let num_workers = num_workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(num_workers)
            .thread_name("mirrorctl-worker")
            .build()?;

        Ok(Self {
            runtime,
            permits: Arc::new(Semaphore::new(num_workers)),
            num_workers,
            tasks: Mutex::new(JoinSet::new()),
            completed: Mutex::new(Vec::new()),
            logger,
        })
    }

    /// Concurrency cap.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Queue a unit for execution.
    pub fn add_command(&self, unit: T) {
        let permits = Arc::clone(&self.permits);
        let logger = self.logger.clone();
        lock(&self.tasks).spawn_on(run_unit(unit, permits, logger), self.runtime.handle());
    }

    /// Block until every submitted unit has finished.
    pub fn join(&self) {
        let mut tasks = std::mem::take(&mut *lock(&self.tasks));
        if tasks.is_empty() {
            return;
        }

        let finished = self.runtime.block_on(async {
            let mut finished = Vec::with_capacity(tasks.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Some(unit)) => finished.push(unit),
                    Ok(None) => {}
                    Err(e) => self.logger.debug(
                        Event::WorkerPanicked,
                        format!("Worker task ended without a result: {}", e),
                    ),
                }
            }
            finished
        });
        lock(&self.completed).extend(finished);
    }

    /// Take all units finished so far, in completion order.
    pub fn get_completed_items(&self) -> Vec<T> {
        std::mem::take(&mut *lock(&self.completed))
    }
}

impl<T: WorkUnit> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.join();
    }
}

async fn run_unit<T: WorkUnit>(unit: T, permits: Arc<Semaphore>, logger: Logger) -> Option<T> {
    // The semaphore is never closed; a failed acquire only means no cap.
    let _permit = permits.acquire_owned().await.ok();

    let cell = Arc::new(Mutex::new(Some(unit)));
    let worker = Arc::clone(&cell);
    let outcome = tokio::task::spawn_blocking(move || {
        if let Some(unit) = lock(&worker).as_mut() {
            unit.run();
        }
    })
    .await;

    let mut unit = lock(&cell).take()?;
    if let Err(e) = outcome {
        let reason = if e.is_panic() {
            panic_message(e.into_panic().as_ref())
        } else {
            e.to_string()
        };
        logger.debug(
            Event::WorkerPanicked,
            format!("Work unit panicked: {}", reason),
        );
        unit.abandon(&reason);
    }
    Some(unit)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

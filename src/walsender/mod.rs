//! Walsender Terminator
//!
//! Before a mirror is rebuilt, any walsender still serving the old mirror
//! must be gone from its primary. This module fans a kill command out to a
//! set of primaries with bounded concurrency.
//!
//! The pass is best-effort: a host that cannot be reached or whose command
//! fails is logged as a warning and reported, never raised, and nothing is
//! retried.

mod job;

pub use job::{kill_walsender_command, JobState, WalsenderKillJob};

use std::sync::Arc;

use crate::observability::{Event, LogRecord, Logger, Severity};
use crate::pool::{WorkUnit, WorkerPool};
use crate::remote::RemoteExecutor;

/// Pool size for `pairs` targets under a cap of `batch_size`.
pub fn pool_size(batch_size: usize, pairs: usize) -> usize {
    batch_size.max(1).min(pairs)
}

/// Outcome of one cleanup pass.
#[derive(Debug, Default)]
pub struct WalsenderKillReport {
    /// Worker threads used
    pub workers: usize,
    /// Every job, in completion order
    pub jobs: Vec<WalsenderKillJob>,
}

impl WalsenderKillReport {
    /// Jobs that succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &WalsenderKillJob> {
        self.jobs.iter().filter(|job| job.was_successful())
    }

    /// Jobs that failed.
    pub fn failed(&self) -> impl Iterator<Item = &WalsenderKillJob> {
        self.jobs.iter().filter(|job| !job.was_successful())
    }

    /// True iff every job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.jobs.iter().all(WalsenderKillJob::was_successful)
    }
}

/// Kills stale walsenders on primaries.
#[derive(Clone)]
pub struct WalsenderTerminator {
    executor: Arc<dyn RemoteExecutor>,
    logger: Logger,
}

impl WalsenderTerminator {
    /// Terminator running commands through `executor`.
    pub fn new(executor: Arc<dyn RemoteExecutor>, logger: Logger) -> Self {
        Self { executor, logger }
    }

    /// Kill existing walsenders on every `(host, port)` primary.
    ///
    /// Runs at most `batch_size` commands at once (a cap of 0 is treated as
    /// 1) and returns once every command has finished.
    pub fn kill_existing_walsenders<H: AsRef<str>>(
        &self,
        primaries: &[(H, u16)],
        batch_size: usize,
    ) -> WalsenderKillReport {
        if primaries.is_empty() {
            return WalsenderKillReport::default();
        }

        let jobs: Vec<WalsenderKillJob> = primaries
            .iter()
            .map(|(host, port)| {
                let host = host.as_ref();
                self.logger.log(
                    LogRecord::new(
                        Severity::Info,
                        Event::WalsenderKill,
                        format!(
                            "killing existing walsender process on primary {}:{}",
                            host, port
                        ),
                    )
                    .with_field("host", host)
                    .with_field("port", port),
                );
                WalsenderKillJob::new(host, *port, Arc::clone(&self.executor))
            })
            .collect();

        let (workers, jobs) =
            match WorkerPool::new(pool_size(batch_size, jobs.len()), self.logger.clone()) {
                Ok(pool) => {
                    for job in jobs {
                        pool.add_command(job);
                    }
                    pool.join();
                    (pool.num_workers(), pool.get_completed_items())
                }
                Err(e) => {
                    let reason = format!("failed to start worker pool: {}", e);
                    let jobs = jobs
                        .into_iter()
                        .map(|mut job| {
                            job.abandon(&reason);
                            job
                        })
                        .collect();
                    (0, jobs)
                }
            };
        for job in &jobs {
            if job.was_successful() {
                continue;
            }
            let reason = job
                .get_results()
                .map(|result| result.failure_summary())
                .unwrap_or_else(|| "no result recorded".to_string());
            self.logger.log(
                LogRecord::new(
                    Severity::Warn,
                    Event::WalsenderKillFailed,
                    format!(
                        "Unable to kill walsender on primary {}:{}: {}",
                        job.host(),
                        job.port(),
                        reason
                    ),
                )
                .with_field("host", job.host())
                .with_field("port", job.port())
                .with_field("job_id", job.id()),
            );
        }

        let report = WalsenderKillReport { workers, jobs };
        self.logger.debug(
            Event::WalsenderBatchComplete,
            format!(
                "Walsender cleanup finished: {} succeeded, {} failed, {} workers",
                report.succeeded().count(),
                report.failed().count(),
                report.workers
            ),
        );
        report
    }
}

impl std::fmt::Debug for WalsenderTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalsenderTerminator").finish_non_exhaustive()
    }
}

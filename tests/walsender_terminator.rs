//! Walsender Cleanup Tests
//!
//! Parallel walsender termination across primaries:
//! - Pool concurrency is min(batch size, number of primaries)
//! - A failing host never aborts the batch
//! - One info line per primary, one warning per failure
//! - Every job is terminal once the call returns

mod common;

use std::sync::Arc;

use common::{memory_logger, FakeExecutor};
use mirrorctl::observability::Severity;
use mirrorctl::walsender::{kill_walsender_command, JobState, WalsenderTerminator};

// =============================================================================
// Batch sizing
// =============================================================================

#[test]
fn test_pool_sized_to_pairs_under_cap() {
    let (logger, _) = memory_logger();
    let terminator = WalsenderTerminator::new(Arc::new(FakeExecutor::new()), logger);

    let report = terminator.kill_existing_walsenders(&[("sdw1", 20000), ("sdw2", 20001)], 5);
    assert_eq!(report.workers, 2);
}

#[test]
fn test_pool_sized_to_cap_under_pairs() {
    let (logger, _) = memory_logger();
    let terminator = WalsenderTerminator::new(Arc::new(FakeExecutor::new()), logger);

    let primaries: Vec<(String, u16)> = (0..6).map(|i| (format!("sdw{}", i), 20000 + i)).collect();
    let report = terminator.kill_existing_walsenders(&primaries, 2);
    assert_eq!(report.workers, 2);
    assert_eq!(report.jobs.len(), 6);
}

// =============================================================================
// Failure handling
// =============================================================================

#[test]
fn test_one_failure_completes_batch_with_one_warning() {
    let (logger, sink) = memory_logger();
    let executor = Arc::new(FakeExecutor::new().failing_on(20001));
    let terminator = WalsenderTerminator::new(executor.clone(), logger);

    let report = terminator.kill_existing_walsenders(&[("sdw1", 20000), ("sdw2", 20001)], 5);

    let warnings = sink.messages(Severity::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Unable to kill walsender on primary"));
    assert!(warnings[0].contains("sdw2:20001"));

    assert_eq!(
        sink.messages(Severity::Info),
        vec![
            "killing existing walsender process on primary sdw1:20000".to_string(),
            "killing existing walsender process on primary sdw2:20001".to_string(),
        ]
    );

    assert!(!report.all_succeeded());
    assert_eq!(report.succeeded().count(), 1);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].host(), "sdw2");
    assert_eq!(failed[0].state(), JobState::Failed);
    assert_eq!(executor.calls().len(), 2);
}

#[test]
fn test_all_hosts_failing_still_returns() {
    let (logger, sink) = memory_logger();
    let executor = FakeExecutor::new().failing_on(20000).failing_on(20001);
    let terminator = WalsenderTerminator::new(Arc::new(executor), logger);

    let report = terminator.kill_existing_walsenders(&[("sdw1", 20000), ("sdw2", 20001)], 1);

    assert_eq!(report.workers, 1);
    assert_eq!(report.failed().count(), 2);
    assert_eq!(sink.count(Severity::Warn), 2);
    assert_eq!(sink.count(Severity::Info), 2);
}

#[test]
fn test_panicking_executor_yields_one_warning() {
    let (logger, sink) = memory_logger();
    let executor = FakeExecutor::new().panicking_on(20001);
    let terminator = WalsenderTerminator::new(Arc::new(executor), logger);

    let report = terminator.kill_existing_walsenders(&[("sdw1", 20000), ("sdw1", 20001)], 2);

    assert_eq!(
        sink.messages(Severity::Warn),
        vec!["Unable to kill walsender on primary sdw1:20001: executor blew up".to_string()]
    );
    assert_eq!(sink.count(Severity::Info), 2);

    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].port(), 20001);
    assert_eq!(failed[0].state(), JobState::Failed);
    assert_eq!(report.succeeded().count(), 1);
}

// =============================================================================
// Job outcomes
// =============================================================================

#[test]
fn test_every_job_is_terminal_and_targets_its_port() {
    let (logger, _) = memory_logger();
    let executor = Arc::new(FakeExecutor::new());
    let terminator = WalsenderTerminator::new(executor.clone(), logger);

    let primaries = [("sdw1", 20000), ("sdw1", 20001), ("sdw2", 20000)];
    let report = terminator.kill_existing_walsenders(&primaries, 16);

    assert!(report.all_succeeded());
    assert!(report.jobs.iter().all(|job| job.state().is_terminal()));
    for job in &report.jobs {
        assert_eq!(job.command(), kill_walsender_command(job.port()));
        assert!(job.get_results().unwrap().was_successful());
    }

    let mut calls = executor.calls();
    calls.sort();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, "sdw1");
    assert_eq!(calls[2].0, "sdw2");
}

#[test]
fn test_no_primaries_runs_nothing() {
    let (logger, sink) = memory_logger();
    let executor = Arc::new(FakeExecutor::new());
    let terminator = WalsenderTerminator::new(executor.clone(), logger);

    let primaries: [(&str, u16); 0] = [];
    let report = terminator.kill_existing_walsenders(&primaries, 4);

    assert_eq!(report.workers, 0);
    assert!(report.all_succeeded());
    assert!(executor.calls().is_empty());
    assert!(sink.is_empty());
}

//! Enable/disable tasks
//!
//! Each task runs its work on a dedicated named worker thread and the
//! caller waits for it with a bound. When the bound expires the caller
//! gets a timeout error; the worker is left to finish on its own and its
//! late result is discarded.

mod disable;
mod enable;

pub use disable::{DisableSmartForwardingTask, DisableSummary};
pub use enable::EnableSmartForwardingTask;

use crate::bridge::{oneshot, WaitError};
use crate::errors::{Result, SmartFwdError};
use smartfwd_core_types::RunContext;
use std::thread;
use std::time::Duration;

/// Run `work` on a new thread and wait up to `timeout` for its value
///
/// The worker runs inside a span carrying the run id. A panic in `work`
/// drops the completer and is reported as `WorkerFailed`.
pub(crate) fn run_on_worker<T, F>(
    task: &'static str,
    ctx: &RunContext,
    timeout: Duration,
    work: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (completer, pending) = oneshot();
    let span = tracing::info_span!("task", task, run_id = %ctx.run_id, kind = ctx.kind.as_str());

    thread::Builder::new()
        .name(format!("smartfwd-{}", task))
        .spawn(move || {
            let _entered = span.enter();
            completer.complete(work());
        })
        .map_err(|e| SmartFwdError::WorkerFailed {
            task,
            reason: e.to_string(),
        })?;

    pending.wait(timeout).map_err(|e| match e {
        WaitError::TimedOut => SmartFwdError::TaskTimeout {
            task,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        },
        WaitError::Dropped => SmartFwdError::WorkerFailed {
            task,
            reason: "worker exited without a result".to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfwd_core_types::RunKind;

    #[test]
    fn test_worker_value_is_returned() {
        let ctx = RunContext::new(RunKind::Enable);
        let value = run_on_worker("test", &ctx, Duration::from_secs(5), || {
            thread::current().name().map(str::to_string)
        })
        .unwrap();
        assert_eq!(value.as_deref(), Some("smartfwd-test"));
    }

    #[test]
    fn test_slow_worker_times_out() {
        let ctx = RunContext::new(RunKind::Disable);
        let err = run_on_worker("slow", &ctx, Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
        })
        .unwrap_err();
        assert_eq!(
            err,
            SmartFwdError::TaskTimeout {
                task: "slow",
                timeout_ms: 20
            }
        );
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let ctx = RunContext::new(RunKind::Enable);
        let err = run_on_worker::<(), _>("boom", &ctx, Duration::from_secs(5), || {
            panic!("worker blew up")
        })
        .unwrap_err();
        assert!(matches!(err, SmartFwdError::WorkerFailed { task: "boom", .. }));
    }
}

use crate::backup::SlotBackup;
use crate::bridge::Pending;
use crate::commands::CommandContext;
use crate::config::SmartForwardingConfig;
use crate::errors::{FwdError, Result};
use crate::model::CallWaitingStatus;
use crate::task::run_on_worker;
use crate::telephony::{ForwardingUpdateResult, PlatformServices, SubId};
use crate::{log_op_end, log_op_error, log_op_start};
use smartfwd_core_types::{RunContext, RunId, RunKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

const OP: &str = "disable_smart_forwarding";

/// What a disable run did, for diagnostics only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisableSummary {
    /// Restores the platform confirmed
    pub applied: usize,
    /// Restores refused or lost
    pub failed: usize,
    /// Slots left untouched (no backup or no active SIM)
    pub skipped: usize,
}

/// Puts every slot back to its backed-up call settings
///
/// Each restore is independent and best effort: a failure is logged and
/// the task moves on. Nothing here returns an error to the caller except
/// the task bound itself.
#[derive(Debug)]
pub struct DisableSmartForwardingTask {
    services: PlatformServices,
    backups: Vec<Option<SlotBackup>>,
    config: SmartForwardingConfig,
    ctx: RunContext,
}

impl DisableSmartForwardingTask {
    /// `backups[i]` is the backup taken for slot `i` when forwarding was
    /// enabled
    pub fn new(
        services: PlatformServices,
        backups: Vec<Option<SlotBackup>>,
        config: SmartForwardingConfig,
    ) -> Self {
        Self {
            services,
            backups,
            config,
            ctx: RunContext::new(RunKind::Disable),
        }
    }

    pub fn with_context(mut self, ctx: RunContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.ctx.run_id
    }

    /// Restore every slot on the current thread
    ///
    /// All restores are issued before any answer is awaited; the answers
    /// are then collected against one deadline inside the run bound, so a
    /// restore that never answers is counted as failed without holding up
    /// the others.
    pub fn call(self) -> DisableSummary {
        let mut summary = DisableSummary::default();
        let (Some(telephony), Some(subscriptions)) =
            (&self.services.telephony, &self.services.subscriptions)
        else {
            tracing::warn!("platform services unavailable, nothing restored");
            summary.skipped = self.backups.len();
            return summary;
        };

        let wait_bound = self.config.restore_wait_bound();
        let mut in_flight = Vec::new();
        for slot in 0..subscriptions.active_modem_count() {
            let sub_id = subscriptions.subscription_id_for_slot(slot);
            let backup = self.backups.get(slot).and_then(Option::as_ref);
            let Some(backup) = backup.filter(|_| subscriptions.is_valid_subscription_id(sub_id))
            else {
                tracing::debug!(slot, sub_id = sub_id.raw(), "slot skipped");
                summary.skipped += 1;
                continue;
            };

            let ctx = CommandContext::new(Arc::clone(telephony), sub_id, slot, wait_bound);
            if let Some(enabled) = backup.call_waiting_enabled {
                let pending = ctx.issue_platform(|tm, done| {
                    tm.set_call_waiting_enabled(sub_id, enabled, done)
                });
                in_flight.push((ctx.clone(), Restore::CallWaiting { enabled, pending }));
            }
            if let Some(info) = backup.call_forwarding.clone() {
                let pending =
                    ctx.issue_platform(|tm, done| tm.set_call_forwarding(sub_id, info, done));
                in_flight.push((ctx, Restore::CallForwarding(pending)));
            }
        }

        let deadline = Instant::now() + wait_bound;
        for (ctx, restore) in in_flight {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let outcome = restore.collect(&ctx, remaining);
            tally(&mut summary, outcome, ctx.slot(), ctx.sub_id());
        }
        summary
    }

    /// Restore on a worker thread, bounded by the task timeout
    pub fn run(self) -> Result<DisableSummary> {
        let ctx = self.ctx.clone();
        let timeout = self.config.task_timeout();
        log_op_start!(OP, run_id = %ctx.run_id, backup_count = self.backups.len());
        let start = Instant::now();

        let summary = run_on_worker("disable", &ctx, timeout, move || self.call()).map_err(|e| {
            log_op_error!(
                OP,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                run_id = %ctx.run_id
            );
            e
        })?;

        log_op_end!(
            OP,
            duration_ms = start.elapsed().as_millis() as u64,
            run_id = %ctx.run_id,
            applied = summary.applied,
            failed = summary.failed,
            skipped = summary.skipped
        );
        Ok(summary)
    }
}

/// A restore issued to the platform and not yet answered
enum Restore {
    CallWaiting {
        enabled: bool,
        pending: Pending<CallWaitingStatus>,
    },
    CallForwarding(Pending<ForwardingUpdateResult>),
}

impl Restore {
    fn collect(self, ctx: &CommandContext, remaining: Duration) -> Result<bool> {
        match self {
            Restore::CallWaiting { enabled, pending } => {
                let status = pending
                    .wait(remaining)
                    .map_err(|e| ctx.callback_error("set_call_waiting_enabled", e))?;
                Ok(status.as_enabled() == Some(enabled))
            }
            Restore::CallForwarding(pending) => {
                let answer = pending
                    .wait(remaining)
                    .map_err(|e| ctx.callback_error("set_call_forwarding", e))?;
                Ok(answer.is_ok())
            }
        }
    }
}

fn tally(summary: &mut DisableSummary, outcome: Result<bool>, slot: usize, sub_id: SubId) {
    match outcome {
        Ok(true) => summary.applied += 1,
        Ok(false) => {
            summary.failed += 1;
            tracing::warn!(slot, sub_id = sub_id.raw(), "restore refused by platform");
        }
        Err(e) => {
            summary.failed += 1;
            let fwd = FwdError::from(e).with_slot(slot);
            tracing::warn!(err.code = fwd.code(), detail = %fwd, "restore failed");
        }
    }
}

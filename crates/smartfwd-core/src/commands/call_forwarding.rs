//! Call-forwarding query and update commands
//!
//! Both commands work on the "not reachable" rule: calls are forwarded to
//! the other SIM's number when this SIM can't be reached.

use crate::commands::{Command, CommandContext, Phase, RestoreOutcome, StepLabel, UpdateCommand};
use crate::errors::Result;
use crate::model::{CallForwardingInfo, CallForwardingReason, Captured};

const OP_GET: &str = "get_call_forwarding";
const OP_SET: &str = "set_call_forwarding";

/// Reads the current not-reachable forwarding rule of a slot
#[derive(Debug)]
pub struct QueryCallForwardingCommand {
    ctx: CommandContext,
    captured: Captured<CallForwardingInfo>,
}

impl QueryCallForwardingCommand {
    pub fn new(ctx: CommandContext, captured: Captured<CallForwardingInfo>) -> Self {
        Self { ctx, captured }
    }

    /// Last fetched rule, if the query succeeded
    pub fn result(&self) -> Option<CallForwardingInfo> {
        self.captured.get()
    }
}

impl Command for QueryCallForwardingCommand {
    fn label(&self) -> StepLabel {
        StepLabel::new(Phase::QueryCallForwarding, self.ctx.slot())
    }

    fn process(&mut self) -> Result<bool> {
        let sub_id = self.ctx.sub_id();
        let answer = self.ctx.await_platform(OP_GET, |tm, done| {
            tm.get_call_forwarding(sub_id, CallForwardingReason::NotReachable, done)
        })?;

        match answer {
            Ok(info) => {
                tracing::debug!(slot = self.ctx.slot(), sub_id = sub_id.raw(), enabled = info.enabled, "call forwarding queried");
                self.captured.record(info);
                Ok(true)
            }
            Err(code) => {
                tracing::debug!(slot = self.ctx.slot(), sub_id = sub_id.raw(), code = %code, "call forwarding query failed");
                Ok(false)
            }
        }
    }
}

/// Installs the forwarding rule for a slot
#[derive(Debug)]
pub struct UpdateCallForwardingCommand {
    ctx: CommandContext,
    prior: Captured<CallForwardingInfo>,
    target: CallForwardingInfo,
    undo: Option<CallForwardingInfo>,
}

impl UpdateCallForwardingCommand {
    /// `target` is the rule to install; `prior` is the paired query's handle
    pub fn new(
        ctx: CommandContext,
        prior: Captured<CallForwardingInfo>,
        target: CallForwardingInfo,
    ) -> Self {
        Self {
            ctx,
            prior,
            target,
            undo: None,
        }
    }

    fn set_rule(&self, info: CallForwardingInfo) -> Result<bool> {
        let sub_id = self.ctx.sub_id();
        let answer = self
            .ctx
            .await_platform(OP_SET, |tm, done| tm.set_call_forwarding(sub_id, info, done))?;
        if let Err(code) = answer {
            tracing::debug!(slot = self.ctx.slot(), sub_id = sub_id.raw(), code = %code, "call forwarding update refused");
            return Ok(false);
        }
        Ok(true)
    }
}

impl Command for UpdateCallForwardingCommand {
    fn label(&self) -> StepLabel {
        StepLabel::new(Phase::UpdateCallForwarding, self.ctx.slot())
    }

    fn process(&mut self) -> Result<bool> {
        let prior = self.prior.get();
        if !self.set_rule(self.target.clone())? {
            return Ok(false);
        }
        self.undo = prior;
        Ok(true)
    }
}

impl UpdateCommand for UpdateCallForwardingCommand {
    fn on_restore(&mut self) -> Result<RestoreOutcome> {
        let Some(previous) = self.undo.take() else {
            return Ok(RestoreOutcome::NothingToRestore);
        };
        if self.set_rule(previous)? {
            Ok(RestoreOutcome::Restored)
        } else {
            Ok(RestoreOutcome::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SmartFwdError;
    use crate::sim::{FaultKind, SimOp, SimulatedDevice};
    use crate::telephony::{SubId, TelephonyService};
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx(device: &Arc<SimulatedDevice>, slot: usize, wait: Duration) -> CommandContext {
        let telephony: Arc<dyn TelephonyService> = device.clone();
        CommandContext::new(telephony, SubId::new(slot as i32 + 1), slot, wait)
    }

    fn target() -> CallForwardingInfo {
        CallForwardingInfo::forward_to(CallForwardingReason::NotReachable, "+15550002222", 3)
    }

    #[test]
    fn test_query_captures_rule() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        let mut query =
            QueryCallForwardingCommand::new(ctx(&device, 0, Duration::from_secs(5)), Captured::new());

        assert!(query.process().unwrap());
        let info = query.result().unwrap();
        assert!(!info.enabled);
        assert_eq!(info.reason, CallForwardingReason::NotReachable);
    }

    #[test]
    fn test_query_error_callback_is_failure() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        device.inject(SimOp::GetCallForwarding, 0, FaultKind::Reject);
        let mut query =
            QueryCallForwardingCommand::new(ctx(&device, 0, Duration::from_secs(5)), Captured::new());

        assert!(!query.process().unwrap());
        assert!(query.result().is_none());
    }

    #[test]
    fn test_update_installs_and_restore_reverts() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        let captured = Captured::new();
        QueryCallForwardingCommand::new(ctx(&device, 0, Duration::from_secs(5)), captured.clone())
            .process()
            .unwrap();

        let mut update =
            UpdateCallForwardingCommand::new(ctx(&device, 0, Duration::from_secs(5)), captured, target());
        assert!(update.process().unwrap());
        let installed = device.slot(0).unwrap().call_forwarding;
        assert!(installed.enabled);
        assert_eq!(installed.number(), Some("+15550002222"));

        assert_eq!(update.on_restore().unwrap(), RestoreOutcome::Restored);
        assert!(!device.slot(0).unwrap().call_forwarding.enabled);
    }

    #[test]
    fn test_hanging_platform_times_out() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        device.inject(SimOp::SetCallForwarding, 0, FaultKind::Hang);
        let mut update = UpdateCallForwardingCommand::new(
            ctx(&device, 0, Duration::from_millis(50)),
            Captured::new(),
            target(),
        );

        let err = update.process().unwrap_err();
        assert!(matches!(
            err,
            SmartFwdError::CallbackTimeout {
                op: "set_call_forwarding",
                ..
            }
        ));
    }

    #[test]
    fn test_dropped_callback_is_error() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        device.inject(SimOp::GetCallForwarding, 0, FaultKind::DropCallback);
        let mut query =
            QueryCallForwardingCommand::new(ctx(&device, 0, Duration::from_secs(5)), Captured::new());

        assert!(matches!(
            query.process(),
            Err(SmartFwdError::CallbackDropped { .. })
        ));
    }
}

//! Call-waiting query and update commands

use crate::commands::{Command, CommandContext, Phase, RestoreOutcome, StepLabel, UpdateCommand};
use crate::errors::Result;
use crate::model::{CallWaitingStatus, Captured};

const OP_GET: &str = "get_call_waiting_status";
const OP_SET: &str = "set_call_waiting_enabled";

/// Reads the current call-waiting status of a slot
///
/// Succeeds only on a definite enabled/disabled answer; the answer is
/// recorded for the paired update's restore.
#[derive(Debug)]
pub struct QueryCallWaitingCommand {
    ctx: CommandContext,
    captured: Captured<CallWaitingStatus>,
}

impl QueryCallWaitingCommand {
    pub fn new(ctx: CommandContext, captured: Captured<CallWaitingStatus>) -> Self {
        Self { ctx, captured }
    }

    /// Last fetched status, if the query succeeded
    pub fn result(&self) -> Option<CallWaitingStatus> {
        self.captured.get()
    }
}

impl Command for QueryCallWaitingCommand {
    fn label(&self) -> StepLabel {
        StepLabel::new(Phase::QueryCallWaiting, self.ctx.slot())
    }

    fn process(&mut self) -> Result<bool> {
        let sub_id = self.ctx.sub_id();
        let status = self
            .ctx
            .await_platform(OP_GET, |tm, done| tm.get_call_waiting_status(sub_id, done))?;

        tracing::debug!(slot = self.ctx.slot(), sub_id = sub_id.raw(), status = ?status, "call waiting queried");
        if !status.is_definite() {
            return Ok(false);
        }
        self.captured.record(status);
        Ok(true)
    }
}

/// Turns call waiting on for a slot
#[derive(Debug)]
pub struct UpdateCallWaitingCommand {
    ctx: CommandContext,
    prior: Captured<CallWaitingStatus>,
    undo: Option<bool>,
}

impl UpdateCallWaitingCommand {
    /// `prior` is the handle the paired query records into
    pub fn new(ctx: CommandContext, prior: Captured<CallWaitingStatus>) -> Self {
        Self {
            ctx,
            prior,
            undo: None,
        }
    }

    fn set_enabled(&self, enabled: bool) -> Result<CallWaitingStatus> {
        let sub_id = self.ctx.sub_id();
        self.ctx.await_platform(OP_SET, |tm, done| {
            tm.set_call_waiting_enabled(sub_id, enabled, done)
        })
    }
}

impl Command for UpdateCallWaitingCommand {
    fn label(&self) -> StepLabel {
        StepLabel::new(Phase::UpdateCallWaiting, self.ctx.slot())
    }

    fn process(&mut self) -> Result<bool> {
        let prior = self.prior.get().and_then(|s| s.as_enabled());
        let status = self.set_enabled(true)?;
        if status != CallWaitingStatus::Enabled {
            tracing::debug!(slot = self.ctx.slot(), status = ?status, "call waiting not enabled");
            return Ok(false);
        }
        self.undo = prior;
        Ok(true)
    }
}

impl UpdateCommand for UpdateCallWaitingCommand {
    fn on_restore(&mut self) -> Result<RestoreOutcome> {
        let Some(enabled) = self.undo.take() else {
            return Ok(RestoreOutcome::NothingToRestore);
        };
        let status = self.set_enabled(enabled)?;
        if status.as_enabled() == Some(enabled) {
            Ok(RestoreOutcome::Restored)
        } else {
            Ok(RestoreOutcome::Rejected)
        }
    }
}

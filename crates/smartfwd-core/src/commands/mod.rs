//! Command abstractions for the forwarding flow
//!
//! A [`Command`] performs one platform call. Query commands only read and
//! have nothing to undo; [`UpdateCommand`]s change network state and can
//! push the previous value back during rollback.
//!
//! ## Outcome contract
//!
//! `process()` returns:
//! - `Ok(true)` when the platform confirmed the expected result
//! - `Ok(false)` on a recoverable platform refusal
//! - `Err(_)` when the call could not complete (timeout, dropped callback)
//!
//! The flow treats `Ok(false)` and `Err(_)` the same way; the error only
//! adds detail to the log.

pub mod call_forwarding;
pub mod call_waiting;

pub use call_forwarding::{QueryCallForwardingCommand, UpdateCallForwardingCommand};
pub use call_waiting::{QueryCallWaitingCommand, UpdateCallWaitingCommand};

use crate::bridge::{call_blocking, oneshot, Pending, WaitError};
use crate::errors::{Result, SmartFwdError};
use crate::telephony::{Completion, SubId, TelephonyService};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Phase of the flow a step belongs to, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    QueryCallWaiting,
    QueryCallForwarding,
    UpdateCallWaiting,
    UpdateCallForwarding,
}

impl Phase {
    /// All phases in the order the flow runs them
    pub const ORDER: [Phase; 4] = [
        Phase::QueryCallWaiting,
        Phase::QueryCallForwarding,
        Phase::UpdateCallWaiting,
        Phase::UpdateCallForwarding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::QueryCallWaiting => "query_call_waiting",
            Phase::QueryCallForwarding => "query_call_forwarding",
            Phase::UpdateCallWaiting => "update_call_waiting",
            Phase::UpdateCallForwarding => "update_call_forwarding",
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Phase::UpdateCallWaiting | Phase::UpdateCallForwarding)
    }
}

/// Identifies a step by phase and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepLabel {
    pub phase: Phase,
    pub slot: usize,
}

impl StepLabel {
    pub fn new(phase: Phase, slot: usize) -> Self {
        Self { phase, slot }
    }
}

impl fmt::Display for StepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[slot {}]", self.phase.as_str(), self.slot)
    }
}

/// A unit of work in the flow
pub trait Command: Send {
    fn label(&self) -> StepLabel;

    /// Run the command once
    fn process(&mut self) -> Result<bool>;
}

/// What a restore attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The previous value was pushed back and confirmed
    Restored,
    /// There was no captured value or the update never applied
    NothingToRestore,
    /// The platform refused the restore
    Rejected,
}

/// A command whose effect can be undone
pub trait UpdateCommand: Command {
    /// Push back the value captured before this command ran
    ///
    /// Only called during rollback, and only for commands that completed
    /// successfully.
    fn on_restore(&mut self) -> Result<RestoreOutcome>;
}

/// One entry of the flow's ordered step list
pub enum Step {
    Query(Box<dyn Command>),
    Update(Box<dyn UpdateCommand>),
}

impl Step {
    pub fn query(cmd: impl Command + 'static) -> Self {
        Step::Query(Box::new(cmd))
    }

    pub fn update(cmd: impl UpdateCommand + 'static) -> Self {
        Step::Update(Box::new(cmd))
    }

    pub fn label(&self) -> StepLabel {
        match self {
            Step::Query(cmd) => cmd.label(),
            Step::Update(cmd) => cmd.label(),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Step::Update(_))
    }

    pub fn process(&mut self) -> Result<bool> {
        match self {
            Step::Query(cmd) => cmd.process(),
            Step::Update(cmd) => cmd.process(),
        }
    }

    /// The restorable command, if this is an update step
    pub fn as_update_mut(&mut self) -> Option<&mut (dyn UpdateCommand + 'static)> {
        match self {
            Step::Query(_) => None,
            Step::Update(cmd) => Some(cmd.as_mut()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_update() { "Update" } else { "Query" };
        write!(f, "{}({})", kind, self.label())
    }
}

/// What a concrete command needs to reach the platform
#[derive(Clone)]
pub struct CommandContext {
    telephony: Arc<dyn TelephonyService>,
    sub_id: SubId,
    slot: usize,
    wait_bound: Duration,
}

impl CommandContext {
    pub fn new(
        telephony: Arc<dyn TelephonyService>,
        sub_id: SubId,
        slot: usize,
        wait_bound: Duration,
    ) -> Self {
        Self {
            telephony,
            sub_id,
            slot,
            wait_bound,
        }
    }

    pub fn sub_id(&self) -> SubId {
        self.sub_id
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Issue one platform call and block on its completion
    pub(crate) fn await_platform<T, F>(&self, op: &'static str, issue: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TelephonyService, Completion<T>),
    {
        let telephony = self.telephony.as_ref();
        call_blocking(self.wait_bound, |done| issue(telephony, done))
            .map_err(|e| self.callback_error(op, e))
    }

    /// Issue one platform call and hand back its pending answer
    pub(crate) fn issue_platform<T, F>(&self, issue: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TelephonyService, Completion<T>),
    {
        let (completer, pending) = oneshot();
        issue(self.telephony.as_ref(), completer.into_callback());
        pending
    }

    pub(crate) fn callback_error(&self, op: &'static str, err: WaitError) -> SmartFwdError {
        match err {
            WaitError::TimedOut => SmartFwdError::CallbackTimeout {
                op,
                sub_id: self.sub_id,
                timeout_ms: u64::try_from(self.wait_bound.as_millis()).unwrap_or(u64::MAX),
            },
            WaitError::Dropped => SmartFwdError::CallbackDropped {
                op,
                sub_id: self.sub_id,
            },
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("sub_id", &self.sub_id)
            .field("slot", &self.slot)
            .field("wait_bound", &self.wait_bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(StepLabel);

    impl Command for Noop {
        fn label(&self) -> StepLabel {
            self.0
        }

        fn process(&mut self) -> Result<bool> {
            Ok(true)
        }
    }

    impl UpdateCommand for Noop {
        fn on_restore(&mut self) -> Result<RestoreOutcome> {
            Ok(RestoreOutcome::NothingToRestore)
        }
    }

    #[test]
    fn test_phase_order_puts_queries_first() {
        let first_update = Phase::ORDER.iter().position(|p| p.is_update()).unwrap();
        assert_eq!(first_update, 2);
        assert!(Phase::ORDER[..first_update].iter().all(|p| !p.is_update()));
    }

    #[test]
    fn test_step_label_display() {
        let label = StepLabel::new(Phase::UpdateCallForwarding, 1);
        assert_eq!(label.to_string(), "update_call_forwarding[slot 1]");
    }

    #[test]
    fn test_only_update_steps_expose_restore() {
        let mut query = Step::query(Noop(StepLabel::new(Phase::QueryCallWaiting, 0)));
        let mut update = Step::update(Noop(StepLabel::new(Phase::UpdateCallWaiting, 0)));

        assert!(query.as_update_mut().is_none());
        assert!(update.as_update_mut().is_some());
        assert_eq!(format!("{:?}", update), "Update(update_call_waiting[slot 0])");
    }
}

//! Flow controller
//!
//! Builds the ordered step list for an enable run, executes it on the
//! current thread, and rolls back applied updates when a step fails.
//!
//! ## Step order
//!
//! For `n` active modems the list is
//! `QCW(0..n), QCF(0..n), UCW(0..n), UCF(0..n)`: every query runs before
//! any update, so each update's paired query has already captured the
//! slot's prior state.
//!
//! ## Rollback
//!
//! When step `k` fails, steps `k-1` down to `0` are visited in that order
//! and `on_restore()` is called on the update steps among them. Nothing at
//! or after `k` is touched. Restore failures are logged and counted in the
//! [`RollbackReport`]; they never change the run's result.

use crate::commands::{
    CommandContext, Phase, QueryCallForwardingCommand, QueryCallWaitingCommand,
    RestoreOutcome, Step, StepLabel, UpdateCallForwardingCommand, UpdateCallWaitingCommand,
};
use crate::config::SmartForwardingConfig;
use crate::errors::{FwdError, Result, SmartFwdError};
use crate::model::{
    CallForwardingInfo, CallForwardingReason, FailureReason, FeatureResult, SlotUtData,
};
use crate::telephony::{PlatformServices, SubId, TelephonyService};
use crate::{log_op_end, log_op_start};
use smartfwd_core_types::schema::{EVENT_RESTORE, EVENT_STEP_FAILED};
use std::sync::Arc;
use std::time::Instant;

/// Counts from one rollback pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Update steps whose previous value was pushed back
    pub restored: usize,
    /// Update steps with nothing captured to restore
    pub skipped: usize,
    /// Update steps whose restore was refused or errored
    pub failed: usize,
}

impl RollbackReport {
    /// Number of update steps visited
    pub fn visited(&self) -> usize {
        self.restored + self.skipped + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// How a pass over the step list ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { steps: usize },
    Failed { index: usize, rollback: RollbackReport },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

/// Run `steps` in order, stopping at the first failure
///
/// A step fails when `process()` returns `Ok(false)` or `Err(_)`. On
/// failure the prefix before it is rolled back with [`restore_prefix`].
pub fn run_steps(steps: &mut [Step]) -> RunOutcome {
    let count = steps.len();
    for index in 0..count {
        let step = &mut steps[index];
        let label = step.label();
        tracing::debug!(step_index = index, step = %label, step_count = count, "running step");

        let failure = match step.process() {
            Ok(true) => None,
            Ok(false) => Some("platform refused".to_string()),
            Err(e) => {
                let fwd: FwdError = e.into();
                Some(fwd.to_string())
            }
        };

        if let Some(detail) = failure {
            tracing::warn!(
                event = EVENT_STEP_FAILED,
                step_index = index,
                step = %label,
                slot = label.slot,
                detail = %detail,
                "step failed, rolling back"
            );
            let rollback = restore_prefix(steps, index);
            return RunOutcome::Failed { index, rollback };
        }
    }
    RunOutcome::Completed { steps: count }
}

/// Undo the update steps in `steps[0..failed_index)`, last first
///
/// Queries are passed over. An index past the end is clamped.
pub fn restore_prefix(steps: &mut [Step], failed_index: usize) -> RollbackReport {
    let end = failed_index.min(steps.len());
    log_op_start!("rollback", failed_index = failed_index);
    let start = Instant::now();
    let mut report = RollbackReport::default();

    for index in (0..end).rev() {
        let Some(cmd) = steps[index].as_update_mut() else {
            continue;
        };
        let label = cmd.label();
        match cmd.on_restore() {
            Ok(RestoreOutcome::Restored) => {
                report.restored += 1;
                tracing::debug!(event = EVENT_RESTORE, step_index = index, step = %label, "restored");
            }
            Ok(RestoreOutcome::NothingToRestore) => {
                report.skipped += 1;
                tracing::debug!(event = EVENT_RESTORE, step_index = index, step = %label, "nothing to restore");
            }
            Ok(RestoreOutcome::Rejected) => {
                report.failed += 1;
                tracing::warn!(event = EVENT_RESTORE, step_index = index, step = %label, "restore refused by platform");
            }
            Err(e) => {
                report.failed += 1;
                let fwd = FwdError::from(e).with_step_index(index);
                tracing::warn!(
                    event = EVENT_RESTORE,
                    step_index = index,
                    step = %label,
                    err.code = fwd.code(),
                    detail = %fwd,
                    "restore failed"
                );
            }
        }
    }

    log_op_end!(
        "rollback",
        duration_ms = start.elapsed().as_millis() as u64,
        restored = report.restored,
        skipped = report.skipped,
        failed = report.failed
    );
    report
}

enum FlowState {
    New,
    Ready(Arc<dyn TelephonyService>),
    Finished(FeatureResult),
}

/// Orchestrates one enable run
///
/// Single use: `init`, then `start_process` once. A second
/// `start_process` returns the stored result without touching the
/// platform.
pub struct FlowController {
    services: PlatformServices,
    config: SmartForwardingConfig,
    slots: Vec<SlotUtData>,
    steps: Vec<Step>,
    state: FlowState,
    last_rollback: Option<RollbackReport>,
}

impl FlowController {
    pub fn new(services: PlatformServices, config: SmartForwardingConfig) -> Self {
        Self {
            services,
            config,
            slots: Vec::new(),
            steps: Vec::new(),
            state: FlowState::New,
            last_rollback: None,
        }
    }

    /// Check preconditions and prepare the slots and steps
    ///
    /// `phone_numbers[i]` is the number slot `i` forwards to. Returns false
    /// on the first failed check; the failure becomes the run's result and
    /// no step will ever execute.
    pub fn init(&mut self, phone_numbers: &[String]) -> bool {
        if !matches!(self.state, FlowState::New) {
            tracing::warn!("flow already initialized");
            return false;
        }

        match self.check_preconditions(phone_numbers) {
            Ok((telephony, sub_ids)) => {
                self.slots = sub_ids
                    .into_iter()
                    .zip(phone_numbers)
                    .enumerate()
                    .map(|(slot, (sub_id, number))| SlotUtData::new(slot, sub_id, number.clone()))
                    .collect();
                self.state = FlowState::Ready(telephony);
                self.init_steps();
                tracing::debug!(
                    modem_count = self.slots.len(),
                    step_count = self.steps.len(),
                    "flow initialized"
                );
                true
            }
            Err(err) => {
                let reason = match err {
                    SmartFwdError::SimNotActive { .. } => Some(FailureReason::SimNotActive),
                    _ => None,
                };
                let fwd: FwdError = err.into();
                tracing::warn!(err.code = fwd.code(), detail = %fwd, "preconditions not met");
                self.state = FlowState::Finished(FeatureResult::failed(reason));
                false
            }
        }
    }

    fn check_preconditions(
        &self,
        phone_numbers: &[String],
    ) -> Result<(Arc<dyn TelephonyService>, Vec<SubId>)> {
        let telephony = self
            .services
            .telephony
            .clone()
            .ok_or(SmartFwdError::ServiceUnavailable {
                service: "telephony",
            })?;
        let subscriptions =
            self.services
                .subscriptions
                .as_ref()
                .ok_or(SmartFwdError::ServiceUnavailable {
                    service: "subscription",
                })?;

        let modem_count = subscriptions.active_modem_count();
        if phone_numbers.len() != modem_count {
            return Err(SmartFwdError::ModemCountMismatch {
                expected: modem_count,
                actual: phone_numbers.len(),
            });
        }

        let mut sub_ids = Vec::with_capacity(modem_count);
        for slot in 0..modem_count {
            let sub_id = subscriptions.subscription_id_for_slot(slot);
            if !subscriptions.is_valid_subscription_id(sub_id) {
                return Err(SmartFwdError::SimNotActive { slot, sub_id });
            }
            sub_ids.push(sub_id);
        }
        Ok((telephony, sub_ids))
    }

    /// Build the step list in phase order
    ///
    /// Does nothing unless `init` succeeded. Rebuilding replaces the list.
    pub fn init_steps(&mut self) {
        let FlowState::Ready(telephony) = &self.state else {
            return;
        };
        let wait_bound = self.config.task_timeout();
        let ctx = |slot: &SlotUtData| {
            CommandContext::new(telephony.clone(), slot.sub_id(), slot.slot_index(), wait_bound)
        };

        let mut steps = Vec::with_capacity(self.slots.len() * Phase::ORDER.len());
        for phase in Phase::ORDER {
            for slot in &self.slots {
                let step = match phase {
                    Phase::QueryCallWaiting => Step::query(QueryCallWaitingCommand::new(
                        ctx(slot),
                        slot.call_waiting_handle(),
                    )),
                    Phase::QueryCallForwarding => Step::query(QueryCallForwardingCommand::new(
                        ctx(slot),
                        slot.call_forwarding_handle(),
                    )),
                    Phase::UpdateCallWaiting => Step::update(UpdateCallWaitingCommand::new(
                        ctx(slot),
                        slot.call_waiting_handle(),
                    )),
                    Phase::UpdateCallForwarding => {
                        let target = CallForwardingInfo::forward_to(
                            CallForwardingReason::NotReachable,
                            slot.forwarding_number().expose().clone(),
                            self.config.forwarding_timeout_seconds,
                        );
                        Step::update(UpdateCallForwardingCommand::new(
                            ctx(slot),
                            slot.call_forwarding_handle(),
                            target,
                        ))
                    }
                };
                steps.push(step);
            }
        }
        self.steps = steps;
    }

    /// Execute the run and return its result
    pub fn start_process(&mut self) -> FeatureResult {
        match &self.state {
            FlowState::Finished(result) => return result.clone(),
            FlowState::New => {
                tracing::warn!("start_process called before init");
                return FeatureResult::failed(None);
            }
            FlowState::Ready(_) => {}
        }

        log_op_start!(
            "start_process",
            modem_count = self.slots.len(),
            step_count = self.steps.len()
        );
        let start = Instant::now();

        let result = match run_steps(&mut self.steps) {
            RunOutcome::Completed { .. } => {
                log_op_end!(
                    "start_process",
                    duration_ms = start.elapsed().as_millis() as u64,
                    success = true
                );
                FeatureResult::succeeded(self.slots.clone())
            }
            RunOutcome::Failed { index, rollback } => {
                self.last_rollback = Some(rollback);
                log_op_end!(
                    "start_process",
                    duration_ms = start.elapsed().as_millis() as u64,
                    success = false,
                    failed_index = index,
                    restore_failures = rollback.failed
                );
                FeatureResult::failed(Some(FailureReason::NetworkError))
            }
        };

        self.state = FlowState::Finished(result.clone());
        result
    }

    /// Roll back the update steps before `failed_index`
    pub fn restore_all_steps(&mut self, failed_index: usize) -> RollbackReport {
        let report = restore_prefix(&mut self.steps, failed_index);
        self.last_rollback = Some(report);
        report
    }

    pub fn slots(&self) -> &[SlotUtData] {
        &self.slots
    }

    /// Labels of the built steps, in execution order
    pub fn step_labels(&self) -> Vec<StepLabel> {
        self.steps.iter().map(Step::label).collect()
    }

    /// Report of the most recent rollback, if one ran
    pub fn last_rollback(&self) -> Option<RollbackReport> {
        self.last_rollback
    }
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            FlowState::New => "new",
            FlowState::Ready(_) => "ready",
            FlowState::Finished(_) => "finished",
        };
        f.debug_struct("FlowController")
            .field("state", &state)
            .field("slots", &self.slots.len())
            .field("steps", &self.steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, UpdateCommand};
    use crate::sim::{FaultKind, SimOp, SimulatedDevice};
    use std::sync::Mutex;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Fake {
        label: StepLabel,
        answer: Result<bool>,
        restore: RestoreOutcome,
        journal: Journal,
    }

    impl Command for Fake {
        fn label(&self) -> StepLabel {
            self.label
        }

        fn process(&mut self) -> Result<bool> {
            self.journal.lock().unwrap().push(format!("process {}", self.label));
            self.answer.clone()
        }
    }

    impl UpdateCommand for Fake {
        fn on_restore(&mut self) -> Result<RestoreOutcome> {
            self.journal.lock().unwrap().push(format!("restore {}", self.label));
            Ok(self.restore)
        }
    }

    fn fake(phase: Phase, slot: usize, answer: Result<bool>, journal: &Journal) -> Step {
        let cmd = Fake {
            label: StepLabel::new(phase, slot),
            answer,
            restore: RestoreOutcome::Restored,
            journal: journal.clone(),
        };
        if phase.is_update() {
            Step::update(cmd)
        } else {
            Step::query(cmd)
        }
    }

    fn numbers() -> Vec<String> {
        vec!["+15550001111".to_string(), "+15550002222".to_string()]
    }

    #[test]
    fn test_run_steps_completes() {
        let journal = Journal::default();
        let mut steps = vec![
            fake(Phase::QueryCallWaiting, 0, Ok(true), &journal),
            fake(Phase::UpdateCallWaiting, 0, Ok(true), &journal),
        ];
        assert_eq!(run_steps(&mut steps), RunOutcome::Completed { steps: 2 });
        assert!(journal.lock().unwrap().iter().all(|e| e.starts_with("process")));
    }

    #[test]
    fn test_error_counts_as_failure() {
        let journal = Journal::default();
        let mut steps = vec![
            fake(Phase::UpdateCallWaiting, 0, Ok(true), &journal),
            fake(
                Phase::UpdateCallForwarding,
                0,
                Err(SmartFwdError::CallbackDropped {
                    op: "set_call_forwarding",
                    sub_id: SubId::new(1),
                }),
                &journal,
            ),
            fake(Phase::UpdateCallForwarding, 1, Ok(true), &journal),
        ];

        let outcome = run_steps(&mut steps);
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                index: 1,
                rollback: RollbackReport {
                    restored: 1,
                    skipped: 0,
                    failed: 0
                }
            }
        );
        let journal = journal.lock().unwrap();
        assert_eq!(
            *journal,
            vec![
                "process update_call_waiting[slot 0]",
                "process update_call_forwarding[slot 0]",
                "restore update_call_waiting[slot 0]",
            ]
        );
    }

    #[test]
    fn test_restore_prefix_clamps_index() {
        let journal = Journal::default();
        let mut steps = vec![fake(Phase::UpdateCallWaiting, 0, Ok(true), &journal)];
        let report = restore_prefix(&mut steps, 10);
        assert_eq!(report.restored, 1);
    }

    #[test]
    fn test_step_list_is_phase_major() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        let mut flow = FlowController::new(
            PlatformServices::from_device(device),
            SmartForwardingConfig::default(),
        );
        assert!(flow.init(&numbers()));

        let labels = flow.step_labels();
        assert_eq!(labels.len(), 8);
        let expected: Vec<StepLabel> = Phase::ORDER
            .iter()
            .flat_map(|&phase| (0..2).map(move |slot| StepLabel::new(phase, slot)))
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_missing_service_fails_without_reason() {
        let mut flow =
            FlowController::new(PlatformServices::unavailable(), SmartForwardingConfig::default());
        assert!(!flow.init(&numbers()));

        let result = flow.start_process();
        assert!(!result.is_success());
        assert_eq!(result.reason(), None);
        assert!(flow.step_labels().is_empty());
    }

    #[test]
    fn test_number_count_mismatch() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        let mut flow = FlowController::new(
            PlatformServices::from_device(device.clone()),
            SmartForwardingConfig::default(),
        );
        assert!(!flow.init(&["+15550001111".to_string()]));
        assert_eq!(flow.start_process().reason(), None);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_inactive_sim_reason() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        device.deactivate_slot(1);
        let mut flow = FlowController::new(
            PlatformServices::from_device(device.clone()),
            SmartForwardingConfig::default(),
        );
        assert!(!flow.init(&numbers()));

        let result = flow.start_process();
        assert_eq!(result.reason(), Some(FailureReason::SimNotActive));
        assert!(result.slots().is_empty());
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_result_is_set_once() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        let mut flow = FlowController::new(
            PlatformServices::from_device(device.clone()),
            SmartForwardingConfig::default(),
        );
        assert!(flow.init(&["+15550002222".to_string()]));
        assert!(flow.start_process().is_success());
        let calls = device.calls().len();

        assert!(flow.start_process().is_success());
        assert_eq!(device.calls().len(), calls);
        assert!(!flow.init(&["+15550002222".to_string()]));
    }

    #[test]
    fn test_start_before_init_fails() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        let mut flow = FlowController::new(
            PlatformServices::from_device(device),
            SmartForwardingConfig::default(),
        );
        assert!(!flow.start_process().is_success());
    }

    #[test]
    fn test_forwarding_rule_uses_configured_timer() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        let config = SmartForwardingConfig {
            forwarding_timeout_seconds: 9,
            ..SmartForwardingConfig::default()
        };
        let mut flow = FlowController::new(PlatformServices::from_device(device.clone()), config);
        assert!(flow.init(&["+15550002222".to_string()]));
        assert!(flow.start_process().is_success());

        let rule = device.slot(0).unwrap().call_forwarding;
        assert_eq!(rule.timeout_seconds, 9);
        assert_eq!(rule.reason, CallForwardingReason::NotReachable);
    }

    #[test]
    fn test_failed_query_has_nothing_to_roll_back() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        device.inject(SimOp::GetCallForwarding, 1, FaultKind::Reject);
        let mut flow = FlowController::new(
            PlatformServices::from_device(device.clone()),
            SmartForwardingConfig::default(),
        );
        assert!(flow.init(&numbers()));

        let result = flow.start_process();
        assert_eq!(result.reason(), Some(FailureReason::NetworkError));
        assert!(device.mutations().is_empty());
        assert_eq!(flow.last_rollback().map(|r| r.visited()), Some(0));
    }
}

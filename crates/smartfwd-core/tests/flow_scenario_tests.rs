#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end flow scenarios against the simulated device

mod common;

use common::{dual_sim, services, two_numbers, SLOT0_TARGET, SLOT1_TARGET};
use smartfwd_core::commands::Phase;
use smartfwd_core::model::CallForwardingReason;
use smartfwd_core::sim::{FaultKind, FaultRule, SimCall, SimOp};
use smartfwd_core::{
    CallForwardingInfo, CallWaitingStatus, FailureReason, FlowController, SmartForwardingConfig,
    SubId,
};

#[test]
fn test_scenario_all_steps_succeed() {
    // GIVEN a dual-SIM device with call waiting off and no forwarding
    let device = dual_sim();
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());

    // WHEN the flow runs with one number per slot
    assert!(flow.init(&two_numbers()));
    let result = flow.start_process();

    // THEN it succeeds with one slot entry per modem
    assert!(result.is_success());
    assert_eq!(result.reason(), None);
    assert_eq!(result.slots().len(), 2);

    // AND the captured prior state is what the device had before
    for slot in result.slots() {
        assert_eq!(slot.call_waiting_before(), Some(CallWaitingStatus::Disabled));
        assert_eq!(
            slot.call_forwarding_before(),
            Some(CallForwardingInfo::disabled(CallForwardingReason::NotReachable))
        );
    }

    // AND each slot now forwards to its configured number
    assert_eq!(
        device.slot(0).unwrap().call_forwarding.number(),
        Some(SLOT0_TARGET)
    );
    assert_eq!(
        device.slot(1).unwrap().call_forwarding.number(),
        Some(SLOT1_TARGET)
    );
    assert_eq!(
        device.slot(1).unwrap().call_waiting,
        CallWaitingStatus::Enabled
    );
}

#[test]
fn test_scenario_steps_run_queries_before_updates() {
    let device = dual_sim();
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());
    assert!(flow.init(&two_numbers()));
    flow.start_process();

    let ops: Vec<(SimOp, SubId)> = device.calls().iter().map(|c| (c.op(), c.sub_id())).collect();
    assert_eq!(
        ops,
        vec![
            (SimOp::GetCallWaiting, SubId::new(1)),
            (SimOp::GetCallWaiting, SubId::new(2)),
            (SimOp::GetCallForwarding, SubId::new(1)),
            (SimOp::GetCallForwarding, SubId::new(2)),
            (SimOp::SetCallWaiting, SubId::new(1)),
            (SimOp::SetCallWaiting, SubId::new(2)),
            (SimOp::SetCallForwarding, SubId::new(1)),
            (SimOp::SetCallForwarding, SubId::new(2)),
        ]
    );
}

#[test]
fn test_scenario_forwarding_update_on_slot0_fails() {
    // GIVEN the network refuses the forwarding update on slot 0 (step 6)
    let device = dual_sim();
    device.inject(SimOp::SetCallForwarding, 0, FaultKind::Reject);
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());
    assert!(flow.init(&two_numbers()));
    assert_eq!(flow.step_labels()[6].phase, Phase::UpdateCallForwarding);
    assert_eq!(flow.step_labels()[6].slot, 0);

    // WHEN the flow runs
    let result = flow.start_process();

    // THEN the run fails with a network error and no slot data
    assert!(!result.is_success());
    assert_eq!(result.reason(), Some(FailureReason::NetworkError));
    assert!(result.slots().is_empty());

    // AND the two call-waiting updates are undone, slot 1 first
    let mutations = device.mutations();
    assert_eq!(
        mutations[3..],
        [
            SimCall::SetCallWaiting {
                sub_id: SubId::new(2),
                enabled: false
            },
            SimCall::SetCallWaiting {
                sub_id: SubId::new(1),
                enabled: false
            },
        ]
    );

    // AND nothing at or after the failed step was touched again
    let report = flow.last_rollback().unwrap();
    assert_eq!(report.restored, 2);
    assert_eq!(report.failed, 0);
    assert!(!device.slot(1).unwrap().call_forwarding.enabled);
    assert_eq!(
        device.slot(0).unwrap().call_waiting,
        CallWaitingStatus::Disabled
    );
}

#[test]
fn test_scenario_failed_restore_keeps_plain_failure() {
    // GIVEN slot 1's call-waiting restore will also be refused
    let device = dual_sim();
    device.inject(SimOp::SetCallForwarding, 1, FaultKind::Reject);
    device.inject_rule(FaultRule {
        op: SimOp::SetCallWaiting,
        slot: 1,
        kind: FaultKind::Reject,
        skip: 1,
    });
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());
    assert!(flow.init(&two_numbers()));

    // WHEN the flow fails on the last step
    let result = flow.start_process();

    // THEN the rollback continues past the refused restore
    assert_eq!(result.reason(), Some(FailureReason::NetworkError));
    let report = flow.last_rollback().unwrap();
    assert_eq!(report.restored, 2);
    assert_eq!(report.failed, 1);
    assert!(
        !device.slot(0).unwrap().call_forwarding.enabled,
        "slot 0 forwarding rule should be restored"
    );
}

#[test]
fn test_scenario_init_failure_runs_nothing() {
    let device = dual_sim();
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());

    assert!(!flow.init(&[SLOT0_TARGET.to_string()]));
    let result = flow.start_process();

    assert!(!result.is_success());
    assert!(result.slots().is_empty());
    assert!(device.calls().is_empty());
}

#[test]
fn test_scenario_pre_enabled_call_waiting_is_left_on_after_rollback() {
    // GIVEN slot 0 already had call waiting on
    let device = dual_sim();
    device.set_call_waiting(0, CallWaitingStatus::Enabled);
    device.inject(SimOp::SetCallForwarding, 1, FaultKind::Reject);
    let mut flow = FlowController::new(services(&device), SmartForwardingConfig::default());
    assert!(flow.init(&two_numbers()));

    // WHEN the run fails and rolls back
    assert!(!flow.start_process().is_success());

    // THEN slot 0 is put back to "on", not blindly switched off
    assert_eq!(
        device.slot(0).unwrap().call_waiting,
        CallWaitingStatus::Enabled
    );
    assert_eq!(
        device.slot(1).unwrap().call_waiting,
        CallWaitingStatus::Disabled
    );
}

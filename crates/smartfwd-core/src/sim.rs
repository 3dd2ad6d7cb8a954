//! Simulated multi-SIM device
//!
//! Implements both platform traits over an in-memory slot table. Callbacks
//! are delivered from a freshly spawned thread, like a platform executor
//! would. Faults can be injected per operation and slot to exercise the
//! failure and rollback paths.
//!
//! The device state is serde-serializable so the CLI can keep it in a
//! JSON file between invocations.

use crate::model::{CallForwardingInfo, CallForwardingReason, CallWaitingStatus};
use crate::telephony::{
    Completion, ForwardingQueryResult, ForwardingUpdateResult, SubId, SubscriptionService,
    TelephonyErrorCode, TelephonyService,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Mutex;
use std::thread;

/// Platform operation, used to target faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimOp {
    GetCallWaiting,
    SetCallWaiting,
    GetCallForwarding,
    SetCallForwarding,
}

impl SimOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get_call_waiting" | "query_cw" => Some(SimOp::GetCallWaiting),
            "set_call_waiting" | "update_cw" => Some(SimOp::SetCallWaiting),
            "get_call_forwarding" | "query_cf" => Some(SimOp::GetCallForwarding),
            "set_call_forwarding" | "update_cf" => Some(SimOp::SetCallForwarding),
            _ => None,
        }
    }
}

/// How a faulty operation misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Complete with an error answer
    Reject,
    /// Keep the callback forever without calling it
    Hang,
    /// Drop the callback without calling it
    DropCallback,
}

/// A fault bound to one operation on one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRule {
    pub op: SimOp,
    pub slot: usize,
    pub kind: FaultKind,
    /// Matching calls to let through before the fault starts firing
    #[serde(default)]
    pub skip: u32,
}

/// State of one SIM slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimSlot {
    pub sub_id: SubId,
    pub call_waiting: CallWaitingStatus,
    pub call_forwarding: CallForwardingInfo,
}

impl SimSlot {
    pub fn active(sub_id: SubId) -> Self {
        Self {
            sub_id,
            call_waiting: CallWaitingStatus::Disabled,
            call_forwarding: CallForwardingInfo::disabled(CallForwardingReason::NotReachable),
        }
    }
}

/// Serializable device state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub slots: Vec<SimSlot>,
    #[serde(default)]
    pub faults: Vec<FaultRule>,
}

/// A platform call as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    GetCallWaiting { sub_id: SubId },
    SetCallWaiting { sub_id: SubId, enabled: bool },
    GetCallForwarding { sub_id: SubId, reason: CallForwardingReason },
    SetCallForwarding { sub_id: SubId, info: CallForwardingInfo },
}

impl SimCall {
    pub fn op(&self) -> SimOp {
        match self {
            SimCall::GetCallWaiting { .. } => SimOp::GetCallWaiting,
            SimCall::SetCallWaiting { .. } => SimOp::SetCallWaiting,
            SimCall::GetCallForwarding { .. } => SimOp::GetCallForwarding,
            SimCall::SetCallForwarding { .. } => SimOp::SetCallForwarding,
        }
    }

    pub fn sub_id(&self) -> SubId {
        match self {
            SimCall::GetCallWaiting { sub_id }
            | SimCall::SetCallWaiting { sub_id, .. }
            | SimCall::GetCallForwarding { sub_id, .. }
            | SimCall::SetCallForwarding { sub_id, .. } => *sub_id,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            SimCall::SetCallWaiting { .. } | SimCall::SetCallForwarding { .. }
        )
    }
}

pub struct SimulatedDevice {
    state: Mutex<DeviceState>,
    calls: Mutex<Vec<SimCall>>,
    parked: Mutex<Vec<Box<dyn Any + Send>>>,
}

impl SimulatedDevice {
    /// Device with `count` active slots, sub ids `1..=count`, call waiting
    /// off and no forwarding
    pub fn with_slots(count: usize) -> Self {
        let slots = (0..count)
            .map(|i| SimSlot::active(SubId::new(i as i32 + 1)))
            .collect();
        Self::from_state(DeviceState {
            slots,
            faults: Vec::new(),
        })
    }

    pub fn from_state(state: DeviceState) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DeviceState {
        self.lock_state().clone()
    }

    pub fn slot(&self, slot: usize) -> Option<SimSlot> {
        self.lock_state().slots.get(slot).cloned()
    }

    pub fn inject(&self, op: SimOp, slot: usize, kind: FaultKind) {
        self.inject_rule(FaultRule {
            op,
            slot,
            kind,
            skip: 0,
        });
    }

    pub fn inject_rule(&self, rule: FaultRule) {
        self.lock_state().faults.push(rule);
    }

    pub fn clear_faults(&self) {
        self.lock_state().faults.clear();
    }

    /// Put a slot's SIM out of service
    pub fn deactivate_slot(&self, slot: usize) {
        if let Some(s) = self.lock_state().slots.get_mut(slot) {
            s.sub_id = SubId::INVALID;
        }
    }

    pub fn set_call_waiting(&self, slot: usize, status: CallWaitingStatus) {
        if let Some(s) = self.lock_state().slots.get_mut(slot) {
            s.call_waiting = status;
        }
    }

    pub fn set_forwarding_rule(&self, slot: usize, info: CallForwardingInfo) {
        if let Some(s) = self.lock_state().slots.get_mut(slot) {
            s.call_forwarding = info;
        }
    }

    /// Every platform call received, in order
    pub fn calls(&self) -> Vec<SimCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Only the state-changing calls, in order
    pub fn mutations(&self) -> Vec<SimCall> {
        self.calls().into_iter().filter(|c| c.is_mutation()).collect()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        // A poisoned lock only means a test thread panicked mid-update; the
        // state itself is plain data and still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: SimCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn slot_of(state: &DeviceState, sub_id: SubId) -> Option<usize> {
        state
            .slots
            .iter()
            .position(|s| s.sub_id == sub_id && sub_id.is_valid())
    }

    /// Fault that fires for this call, consuming one `skip` if present
    fn take_fault(state: &mut DeviceState, op: SimOp, slot: Option<usize>) -> Option<FaultKind> {
        let slot = slot?;
        let rule = state
            .faults
            .iter_mut()
            .find(|r| r.op == op && r.slot == slot)?;
        if rule.skip > 0 {
            rule.skip -= 1;
            return None;
        }
        Some(rule.kind)
    }

    /// Hand `value` to `done` according to the fault, from another thread
    fn deliver<T: Send + 'static>(&self, fault: Option<FaultKind>, done: Completion<T>, value: T) {
        match fault {
            Some(FaultKind::Hang) => {
                if let Ok(mut parked) = self.parked.lock() {
                    parked.push(Box::new(done));
                }
            }
            Some(FaultKind::DropCallback) => drop(done),
            Some(FaultKind::Reject) | None => {
                thread::spawn(move || done(value));
            }
        }
    }
}

impl TelephonyService for SimulatedDevice {
    fn get_call_waiting_status(&self, sub_id: SubId, done: Completion<CallWaitingStatus>) {
        self.record(SimCall::GetCallWaiting { sub_id });
        let (fault, answer) = {
            let mut state = self.lock_state();
            let slot = Self::slot_of(&state, sub_id);
            let fault = Self::take_fault(&mut state, SimOp::GetCallWaiting, slot);
            let answer = match (fault, slot) {
                (Some(FaultKind::Reject), _) | (_, None) => CallWaitingStatus::UnknownError,
                (_, Some(i)) => state.slots[i].call_waiting,
            };
            (fault, answer)
        };
        self.deliver(fault, done, answer);
    }

    fn set_call_waiting_enabled(
        &self,
        sub_id: SubId,
        enabled: bool,
        done: Completion<CallWaitingStatus>,
    ) {
        self.record(SimCall::SetCallWaiting { sub_id, enabled });
        let (fault, answer) = {
            let mut state = self.lock_state();
            let slot = Self::slot_of(&state, sub_id);
            let fault = Self::take_fault(&mut state, SimOp::SetCallWaiting, slot);
            let answer = match (fault, slot) {
                (Some(FaultKind::Reject), _) | (_, None) => CallWaitingStatus::UnknownError,
                (_, Some(i)) => {
                    let status = if enabled {
                        CallWaitingStatus::Enabled
                    } else {
                        CallWaitingStatus::Disabled
                    };
                    state.slots[i].call_waiting = status;
                    status
                }
            };
            (fault, answer)
        };
        self.deliver(fault, done, answer);
    }

    fn get_call_forwarding(
        &self,
        sub_id: SubId,
        reason: CallForwardingReason,
        done: Completion<ForwardingQueryResult>,
    ) {
        self.record(SimCall::GetCallForwarding { sub_id, reason });
        let (fault, answer) = {
            let mut state = self.lock_state();
            let slot = Self::slot_of(&state, sub_id);
            let fault = Self::take_fault(&mut state, SimOp::GetCallForwarding, slot);
            let answer = match (fault, slot) {
                (Some(FaultKind::Reject), _) | (_, None) => Err(TelephonyErrorCode::Unknown),
                (_, Some(i)) => {
                    let rule = &state.slots[i].call_forwarding;
                    if rule.reason == reason {
                        Ok(rule.clone())
                    } else {
                        Ok(CallForwardingInfo::disabled(reason))
                    }
                }
            };
            (fault, answer)
        };
        self.deliver(fault, done, answer);
    }

    fn set_call_forwarding(
        &self,
        sub_id: SubId,
        info: CallForwardingInfo,
        done: Completion<ForwardingUpdateResult>,
    ) {
        self.record(SimCall::SetCallForwarding {
            sub_id,
            info: info.clone(),
        });
        let (fault, answer) = {
            let mut state = self.lock_state();
            let slot = Self::slot_of(&state, sub_id);
            let fault = Self::take_fault(&mut state, SimOp::SetCallForwarding, slot);
            let answer = match (fault, slot) {
                (Some(FaultKind::Reject), _) | (_, None) => Err(TelephonyErrorCode::Unknown),
                (_, Some(i)) => {
                    state.slots[i].call_forwarding = info;
                    Ok(())
                }
            };
            (fault, answer)
        };
        self.deliver(fault, done, answer);
    }
}

impl SubscriptionService for SimulatedDevice {
    fn active_modem_count(&self) -> usize {
        self.lock_state().slots.len()
    }

    fn subscription_id_for_slot(&self, slot: usize) -> SubId {
        self.lock_state()
            .slots
            .get(slot)
            .map(|s| s.sub_id)
            .unwrap_or(SubId::INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{call_blocking, WaitError};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_with_slots_assigns_sub_ids() {
        let device = SimulatedDevice::with_slots(2);
        assert_eq!(device.active_modem_count(), 2);
        assert_eq!(device.subscription_id_for_slot(0), SubId::new(1));
        assert_eq!(device.subscription_id_for_slot(1), SubId::new(2));
        assert_eq!(device.subscription_id_for_slot(2), SubId::INVALID);
    }

    #[test]
    fn test_set_call_waiting_updates_state() {
        let device = SimulatedDevice::with_slots(1);
        let status = call_blocking(WAIT, |done| {
            device.set_call_waiting_enabled(SubId::new(1), true, done)
        })
        .unwrap();
        assert_eq!(status, CallWaitingStatus::Enabled);
        assert_eq!(device.slot(0).unwrap().call_waiting, CallWaitingStatus::Enabled);
        assert_eq!(device.mutations().len(), 1);
    }

    #[test]
    fn test_skip_lets_first_call_through() {
        let device = SimulatedDevice::with_slots(1);
        device.inject_rule(FaultRule {
            op: SimOp::SetCallWaiting,
            slot: 0,
            kind: FaultKind::Reject,
            skip: 1,
        });

        let first = call_blocking(WAIT, |done| {
            device.set_call_waiting_enabled(SubId::new(1), true, done)
        })
        .unwrap();
        let second = call_blocking(WAIT, |done| {
            device.set_call_waiting_enabled(SubId::new(1), false, done)
        })
        .unwrap();

        assert_eq!(first, CallWaitingStatus::Enabled);
        assert_eq!(second, CallWaitingStatus::UnknownError);
        // The rejected call left the state alone
        assert_eq!(device.slot(0).unwrap().call_waiting, CallWaitingStatus::Enabled);
    }

    #[test]
    fn test_unknown_subscription_is_rejected() {
        let device = SimulatedDevice::with_slots(1);
        let answer = call_blocking(WAIT, |done| {
            device.get_call_forwarding(SubId::new(9), CallForwardingReason::NotReachable, done)
        })
        .unwrap();
        assert_eq!(answer, Err(TelephonyErrorCode::Unknown));
    }

    #[test]
    fn test_drop_fault_disconnects_waiter() {
        let device = SimulatedDevice::with_slots(1);
        device.inject(SimOp::GetCallWaiting, 0, FaultKind::DropCallback);
        let result = call_blocking(WAIT, |done| {
            device.get_call_waiting_status(SubId::new(1), done)
        });
        assert_eq!(result, Err(WaitError::Dropped));
    }

    #[test]
    fn test_state_serializes() {
        let device = SimulatedDevice::with_slots(2);
        device.inject(SimOp::SetCallForwarding, 1, FaultKind::Reject);
        let json = serde_json::to_string(&device.snapshot()).unwrap();
        let back: DeviceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, device.snapshot());
    }

    #[test]
    fn test_op_parse() {
        assert_eq!(SimOp::parse("update_cf"), Some(SimOp::SetCallForwarding));
        assert_eq!(SimOp::parse("get_call_waiting"), Some(SimOp::GetCallWaiting));
        assert_eq!(SimOp::parse("reboot"), None);
    }
}

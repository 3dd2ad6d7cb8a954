use crate::model::{CallForwardingInfo, CallWaitingStatus, Captured};
use crate::telephony::SubId;
use smartfwd_core_types::Sensitive;

/// Per-slot data of one enable run
///
/// Created once per active modem when the flow is initialized. The two
/// captured handles are filled by the slot's query commands; after a
/// successful run they hold the state the slot had before forwarding was
/// switched on, which is what the caller backs up.
#[derive(Debug, Clone)]
pub struct SlotUtData {
    slot_index: usize,
    sub_id: SubId,
    forwarding_number: Sensitive<String>,
    call_waiting_before: Captured<CallWaitingStatus>,
    call_forwarding_before: Captured<CallForwardingInfo>,
}

impl SlotUtData {
    pub fn new(slot_index: usize, sub_id: SubId, forwarding_number: impl Into<String>) -> Self {
        Self {
            slot_index,
            sub_id,
            forwarding_number: Sensitive::new(forwarding_number.into()),
            call_waiting_before: Captured::new(),
            call_forwarding_before: Captured::new(),
        }
    }

    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    pub fn sub_id(&self) -> SubId {
        self.sub_id
    }

    /// Number calls on this slot are forwarded to when unreachable
    pub fn forwarding_number(&self) -> &Sensitive<String> {
        &self.forwarding_number
    }

    /// Call-waiting status read before any update ran
    pub fn call_waiting_before(&self) -> Option<CallWaitingStatus> {
        self.call_waiting_before.get()
    }

    /// Forwarding rule read before any update ran
    pub fn call_forwarding_before(&self) -> Option<CallForwardingInfo> {
        self.call_forwarding_before.get()
    }

    pub(crate) fn call_waiting_handle(&self) -> Captured<CallWaitingStatus> {
        self.call_waiting_before.clone()
    }

    pub(crate) fn call_forwarding_handle(&self) -> Captured<CallForwardingInfo> {
        self.call_forwarding_before.clone()
    }
}

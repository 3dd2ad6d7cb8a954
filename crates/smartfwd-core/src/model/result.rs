use crate::model::SlotUtData;
use serde::{Deserialize, Serialize};

/// Why an enable run failed, when the cause is user-actionable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A query or update step failed on the network
    NetworkError,
    /// A slot has no active subscription
    SimNotActive,
}

/// Final outcome of one enable run
///
/// On success `slots` holds one entry per active modem with the captured
/// prior state; on failure it is empty.
#[derive(Debug, Clone)]
pub struct FeatureResult {
    success: bool,
    reason: Option<FailureReason>,
    slots: Vec<SlotUtData>,
}

impl FeatureResult {
    pub fn succeeded(slots: Vec<SlotUtData>) -> Self {
        Self {
            success: true,
            reason: None,
            slots,
        }
    }

    pub fn failed(reason: Option<FailureReason>) -> Self {
        Self {
            success: false,
            reason,
            slots: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn reason(&self) -> Option<FailureReason> {
        self.reason
    }

    pub fn slots(&self) -> &[SlotUtData] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<SlotUtData> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telephony::SubId;

    #[test]
    fn test_failed_result_has_no_slots() {
        let result = FeatureResult::failed(Some(FailureReason::SimNotActive));
        assert!(!result.is_success());
        assert_eq!(result.reason(), Some(FailureReason::SimNotActive));
        assert!(result.slots().is_empty());
    }

    #[test]
    fn test_succeeded_result_keeps_slots() {
        let slots = vec![
            SlotUtData::new(0, SubId::new(1), "+15550002222"),
            SlotUtData::new(1, SubId::new(2), "+15550001111"),
        ];
        let result = FeatureResult::succeeded(slots);
        assert!(result.is_success());
        assert_eq!(result.reason(), None);
        assert_eq!(result.into_slots().len(), 2);
    }
}

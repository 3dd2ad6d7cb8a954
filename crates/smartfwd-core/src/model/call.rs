use serde::{Deserialize, Serialize};
use smartfwd_core_types::Sensitive;

/// Call-waiting status as reported by the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallWaitingStatus {
    Enabled,
    Disabled,
    UnknownError,
    NotSupported,
    FdnCheckFailure,
}

impl CallWaitingStatus {
    /// Platform integer code
    pub fn code(&self) -> i32 {
        match self {
            CallWaitingStatus::Enabled => 1,
            CallWaitingStatus::Disabled => 2,
            CallWaitingStatus::UnknownError => 3,
            CallWaitingStatus::NotSupported => 4,
            CallWaitingStatus::FdnCheckFailure => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(CallWaitingStatus::Enabled),
            2 => Some(CallWaitingStatus::Disabled),
            3 => Some(CallWaitingStatus::UnknownError),
            4 => Some(CallWaitingStatus::NotSupported),
            5 => Some(CallWaitingStatus::FdnCheckFailure),
            _ => None,
        }
    }

    /// Whether the status describes a real on/off state rather than an error
    pub fn is_definite(&self) -> bool {
        matches!(
            self,
            CallWaitingStatus::Enabled | CallWaitingStatus::Disabled
        )
    }

    /// `Some(on)` for a definite status, `None` for an error status
    pub fn as_enabled(&self) -> Option<bool> {
        match self {
            CallWaitingStatus::Enabled => Some(true),
            CallWaitingStatus::Disabled => Some(false),
            _ => None,
        }
    }
}

/// Condition under which a forwarding rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallForwardingReason {
    Unconditional,
    Busy,
    NoReply,
    NotReachable,
    All,
    AllConditional,
}

impl CallForwardingReason {
    /// Platform integer code
    pub fn code(&self) -> i32 {
        match self {
            CallForwardingReason::Unconditional => 0,
            CallForwardingReason::Busy => 1,
            CallForwardingReason::NoReply => 2,
            CallForwardingReason::NotReachable => 3,
            CallForwardingReason::All => 4,
            CallForwardingReason::AllConditional => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(CallForwardingReason::Unconditional),
            1 => Some(CallForwardingReason::Busy),
            2 => Some(CallForwardingReason::NoReply),
            3 => Some(CallForwardingReason::NotReachable),
            4 => Some(CallForwardingReason::All),
            5 => Some(CallForwardingReason::AllConditional),
            _ => None,
        }
    }
}

/// A forwarding rule for one reason
///
/// The target number is wrapped in [`Sensitive`] so that logging a rule
/// never prints the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallForwardingInfo {
    pub enabled: bool,
    pub reason: CallForwardingReason,
    #[serde(default)]
    pub number: Option<Sensitive<String>>,
    pub timeout_seconds: u32,
}

impl CallForwardingInfo {
    /// An enabled rule forwarding to `number`
    pub fn forward_to(
        reason: CallForwardingReason,
        number: impl Into<String>,
        timeout_seconds: u32,
    ) -> Self {
        Self {
            enabled: true,
            reason,
            number: Some(Sensitive::new(number.into())),
            timeout_seconds,
        }
    }

    /// A disabled rule with no target
    pub fn disabled(reason: CallForwardingReason) -> Self {
        Self {
            enabled: false,
            reason,
            number: None,
            timeout_seconds: 0,
        }
    }

    /// Target number, if any
    pub fn number(&self) -> Option<&str> {
        self.number.as_ref().map(|n| n.expose().as_str())
    }
}

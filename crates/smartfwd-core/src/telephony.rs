//! Platform capabilities consumed by the flow
//!
//! The telephony and subscription managers are modelled as traits so the
//! orchestration can run against a real platform binding, the simulated
//! device in [`crate::sim`], or a test double.
//!
//! Every telephony operation is callback-style: the implementation must
//! eventually invoke the supplied completion exactly once, on any thread.
//! Dropping the completion without calling it is reported to the waiting
//! command as a failure.

use crate::model::{CallForwardingInfo, CallForwardingReason, CallWaitingStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Subscription identifier of a SIM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubId(i32);

impl SubId {
    /// Sentinel for "no subscription in this slot"
    pub const INVALID: SubId = SubId(-1);

    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for SubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error code delivered by the platform for forwarding operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelephonyErrorCode {
    Unknown,
    FdnCheckFailure,
    NotSupported,
}

impl TelephonyErrorCode {
    /// Platform integer code
    pub fn code(&self) -> i32 {
        match self {
            TelephonyErrorCode::Unknown => 1,
            TelephonyErrorCode::FdnCheckFailure => 2,
            TelephonyErrorCode::NotSupported => 3,
        }
    }
}

impl fmt::Display for TelephonyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TelephonyErrorCode::Unknown => "unknown",
            TelephonyErrorCode::FdnCheckFailure => "fdn_check_failure",
            TelephonyErrorCode::NotSupported => "not_supported",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// One-shot completion callback handed to the platform
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Result of a call-forwarding query
pub type ForwardingQueryResult = Result<CallForwardingInfo, TelephonyErrorCode>;

/// Result of a call-forwarding update
pub type ForwardingUpdateResult = Result<(), TelephonyErrorCode>;

/// Per-subscription call settings exposed by the telephony manager
pub trait TelephonyService: Send + Sync {
    /// Read the call-waiting status
    fn get_call_waiting_status(&self, sub_id: SubId, done: Completion<CallWaitingStatus>);

    /// Turn call waiting on or off
    ///
    /// The completion receives the status after the change, or an error
    /// status when the network refused it.
    fn set_call_waiting_enabled(
        &self,
        sub_id: SubId,
        enabled: bool,
        done: Completion<CallWaitingStatus>,
    );

    /// Read the forwarding rule registered for `reason`
    fn get_call_forwarding(
        &self,
        sub_id: SubId,
        reason: CallForwardingReason,
        done: Completion<ForwardingQueryResult>,
    );

    /// Register a forwarding rule
    fn set_call_forwarding(
        &self,
        sub_id: SubId,
        info: CallForwardingInfo,
        done: Completion<ForwardingUpdateResult>,
    );
}

/// Slot-to-subscription mapping exposed by the subscription manager
pub trait SubscriptionService: Send + Sync {
    fn active_modem_count(&self) -> usize;

    /// Subscription currently in `slot`, or [`SubId::INVALID`]
    fn subscription_id_for_slot(&self, slot: usize) -> SubId;

    fn is_valid_subscription_id(&self, sub_id: SubId) -> bool {
        sub_id.is_valid()
    }
}

/// Service handles as obtained from the platform
///
/// Either service may be missing (the platform lookup returned nothing);
/// the flow's precondition check turns that into a failed result instead
/// of a panic.
#[derive(Clone, Default)]
pub struct PlatformServices {
    pub telephony: Option<Arc<dyn TelephonyService>>,
    pub subscriptions: Option<Arc<dyn SubscriptionService>>,
}

impl PlatformServices {
    pub fn new(
        telephony: Arc<dyn TelephonyService>,
        subscriptions: Arc<dyn SubscriptionService>,
    ) -> Self {
        Self {
            telephony: Some(telephony),
            subscriptions: Some(subscriptions),
        }
    }

    /// Both services backed by one object, e.g. the simulated device
    pub fn from_device<D>(device: Arc<D>) -> Self
    where
        D: TelephonyService + SubscriptionService + 'static,
    {
        let telephony: Arc<dyn TelephonyService> = device.clone();
        let subscriptions: Arc<dyn SubscriptionService> = device;
        Self::new(telephony, subscriptions)
    }

    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl fmt::Debug for PlatformServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformServices")
            .field("telephony", &self.telephony.is_some())
            .field("subscriptions", &self.subscriptions.is_some())
            .finish()
    }
}

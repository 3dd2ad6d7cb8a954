pub mod call;
pub mod captured;
pub mod result;
pub mod slot;

pub use call::{CallForwardingInfo, CallForwardingReason, CallWaitingStatus};
pub use captured::Captured;
pub use result::{FailureReason, FeatureResult};
pub use slot::SlotUtData;

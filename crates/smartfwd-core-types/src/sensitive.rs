//! Redaction wrapper for subscriber data
//!
//! Forwarding targets are phone numbers. They travel through the flow, the
//! backup store and the simulated device, and must never show up in a log
//! line in clear text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// Wrapper that redacts its contents in Debug and Display
///
/// Serialization is transparent: persisting a `Sensitive<String>` writes the
/// plain value, since the backup store must be able to restore it.
///
/// # Example
///
/// ```
/// use smartfwd_core_types::Sensitive;
///
/// let number = Sensitive::new("+15550001111".to_string());
/// assert_eq!(format!("{:?}", number), "***REDACTED***");
/// assert_eq!(number.masked(), "***11");
/// assert_eq!(number.expose(), "+15550001111");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    ///
    /// Only call this where the value is handed to the platform or the
    /// backup store.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: AsRef<str>> Sensitive<T> {
    /// Log-safe rendering that keeps only the last two characters
    pub fn masked(&self) -> String {
        let s = self.0.as_ref();
        let chars: Vec<char> = s.chars().collect();
        if chars.len() <= 2 {
            return "***".to_string();
        }
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("***{}", tail)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: Serialize> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

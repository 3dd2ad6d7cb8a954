//! Single-assignment value handle
//!
//! A query command records the value it fetched into a `Captured<T>`; the
//! slot data and the paired update command hold clones of the same handle
//! and read the value out. The handle carries only the value, never the
//! query command itself.

use std::fmt;
use std::sync::{Arc, OnceLock};

pub struct Captured<T>(Arc<OnceLock<T>>);

impl<T> Captured<T> {
    pub fn new() -> Self {
        Self(Arc::new(OnceLock::new()))
    }

    /// Record the value
    ///
    /// Returns `false` if a value was already recorded; the first value wins.
    pub fn record(&self, value: T) -> bool {
        self.0.set(value).is_ok()
    }

    pub fn is_recorded(&self) -> bool {
        self.0.get().is_some()
    }
}

impl<T: Clone> Captured<T> {
    /// Copy of the recorded value, if any
    pub fn get(&self) -> Option<T> {
        self.0.get().cloned()
    }
}

impl<T> Clone for Captured<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Captured<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Captured<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(value) => f.debug_tuple("Captured").field(value).finish(),
            None => f.write_str("Captured(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_record_wins() {
        let cell = Captured::new();
        assert!(cell.record(1));
        assert!(!cell.record(2));
        assert_eq!(cell.get(), Some(1));
    }

    #[test]
    fn test_clones_share_the_value() {
        let writer: Captured<String> = Captured::new();
        let reader = writer.clone();
        assert!(!reader.is_recorded());

        writer.record("enabled".to_string());
        assert_eq!(reader.get().as_deref(), Some("enabled"));
    }

    #[test]
    fn test_debug_pending() {
        let cell: Captured<u8> = Captured::new();
        assert_eq!(format!("{:?}", cell), "Captured(<pending>)");
    }
}

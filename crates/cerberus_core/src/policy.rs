//! Rate-threshold policies.

use crate::DurationToken;
use serde::{Deserialize, Serialize};

/// Sliding-window rate threshold for one action kind.
///
/// When a principal's recorded events of a kind reach `max_count` within
/// `window`, the violation escalates to the configured sanction. Absence of
/// a policy disables escalation for that kind; detection and reversion may
/// still occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    max_count: u32,
    window: DurationToken,
}

impl ThresholdPolicy {
    /// Build a policy.
    ///
    /// Returns `None` when `max_count` is zero; the window token is non-zero
    /// by construction.
    pub fn new(max_count: u32, window: DurationToken) -> Option<Self> {
        if max_count == 0 {
            return None;
        }
        Some(Self { max_count, window })
    }

    /// Events allowed within the window before escalation fires.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// The sliding window the count is taken over.
    pub fn window(&self) -> DurationToken {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_is_rejected() {
        let window = DurationToken::parse("10s").unwrap();
        assert!(ThresholdPolicy::new(0, window).is_none());
        assert!(ThresholdPolicy::new(1, window).is_some());
    }
}

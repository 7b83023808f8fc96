//! Module enable switches.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The enable switch for one enforcement module.
///
/// A switch starts disabled and becomes persistently active once an operator
/// enables it. From then on, disable requests are transient: the request is
/// honored for a configurable grace period and then reverts to enabled. The
/// rule is evaluated at read time; there is no background re-enable timer.
/// This guards an armed module against being switched off quietly during a
/// takeover while still giving operators a window for legitimate maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleSwitch {
    enabled: bool,
    disabled_at: Option<DateTime<Utc>>,
}

impl ModuleSwitch {
    /// A switch that has been armed.
    pub fn armed() -> Self {
        Self {
            enabled: true,
            disabled_at: None,
        }
    }

    /// Arm the module and clear any pending disable request.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.disabled_at = None;
    }

    /// Request a transient disable at `now`.
    ///
    /// On a switch that was never armed this is a no-op; it is already
    /// inactive.
    pub fn disable(&mut self, now: DateTime<Utc>) {
        if self.enabled {
            self.disabled_at = Some(now);
        }
    }

    /// Whether the module enforces at `now`, under the given grace period.
    pub fn is_active(&self, grace: Duration, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.disabled_at {
            Some(at) => now.signed_duration_since(at) >= grace,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive_until_armed() {
        let now = Utc::now();
        let grace = Duration::seconds(60);
        let mut switch = ModuleSwitch::default();
        assert!(!switch.is_active(grace, now));
        switch.enable();
        assert!(switch.is_active(grace, now));
    }

    #[test]
    fn disable_is_honored_only_for_the_grace_period() {
        let now = Utc::now();
        let grace = Duration::seconds(60);
        let mut switch = ModuleSwitch::armed();

        switch.disable(now);
        assert!(!switch.is_active(grace, now));
        assert!(!switch.is_active(grace, now + Duration::seconds(59)));
        assert!(switch.is_active(grace, now + Duration::seconds(60)));
    }

    #[test]
    fn enable_clears_a_pending_disable() {
        let now = Utc::now();
        let grace = Duration::seconds(60);
        let mut switch = ModuleSwitch::armed();
        switch.disable(now);
        switch.enable();
        assert!(switch.is_active(grace, now));
    }

    #[test]
    fn disable_on_unarmed_switch_is_a_noop() {
        let now = Utc::now();
        let mut switch = ModuleSwitch::default();
        switch.disable(now);
        assert_eq!(switch, ModuleSwitch::default());
    }
}

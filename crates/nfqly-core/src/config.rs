// ── Runtime service configuration ──
//
// Describes *how* to reach one router and what to poll. Carries credential
// data and tuning, but never touches disk — the CLI builds a
// `ServiceConfig` from its profile layer and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::command::Firmware;

/// Default SSH port on Keenetic routers with Entware.
pub const DEFAULT_SSH_PORT: u16 = 222;
/// Default NFQWS web UI port (display-only, never dialed).
pub const DEFAULT_WEB_PORT: u16 = 90;
/// Default poll interval when monitoring is enabled, seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Poll cadence when monitoring is disabled: one refresh per hour keeps
/// the version and availability roughly current without load.
pub const IDLE_POLL_INTERVAL_SECS: u64 = 3600;

/// Valid poll interval range, seconds.
pub const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 10..=3600;

/// Configuration for monitoring a single router.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub ssh_port: u16,
    /// Display-only metadata for the device entry.
    pub web_port: u16,
    pub username: String,
    pub password: SecretString,
    pub firmware: Firmware,
    /// Use the legacy `nfqws-keenetic` package instead of `nfqws2`.
    pub legacy: bool,
    /// Whether to poll at `poll_interval` instead of the hourly idle rate.
    pub monitoring: bool,
    /// Configured interval, seconds. Only honored when `monitoring` is on.
    pub poll_interval_secs: u64,
}

impl ServiceConfig {
    pub fn new(host: impl Into<String>, password: SecretString, firmware: Firmware) -> Self {
        Self {
            host: host.into(),
            ssh_port: DEFAULT_SSH_PORT,
            web_port: DEFAULT_WEB_PORT,
            username: "root".to_owned(),
            password,
            firmware,
            legacy: false,
            monitoring: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// The cadence the poll loop actually runs at: the configured interval
    /// (clamped to the valid range) when monitoring is enabled, otherwise
    /// the hourly idle rate.
    pub fn effective_poll_interval(&self) -> Duration {
        if self.monitoring {
            let secs = self
                .poll_interval_secs
                .clamp(*POLL_INTERVAL_RANGE.start(), *POLL_INTERVAL_RANGE.end());
            Duration::from_secs(secs)
        } else {
            Duration::from_secs(IDLE_POLL_INTERVAL_SECS)
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ServiceConfig {
        ServiceConfig::new("192.168.1.1", SecretString::from("pw"), Firmware::Keenetic)
    }

    #[test]
    fn monitoring_disabled_polls_hourly() {
        let cfg = config();
        assert!(!cfg.monitoring);
        assert_eq!(cfg.effective_poll_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn monitoring_enabled_uses_the_configured_interval() {
        let mut cfg = config();
        cfg.monitoring = true;
        cfg.poll_interval_secs = 30;
        assert_eq!(cfg.effective_poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn interval_is_clamped_to_the_valid_range() {
        let mut cfg = config();
        cfg.monitoring = true;
        cfg.poll_interval_secs = 3;
        assert_eq!(cfg.effective_poll_interval(), Duration::from_secs(10));
        cfg.poll_interval_secs = 90_000;
        assert_eq!(cfg.effective_poll_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn defaults_match_the_keenetic_deployment() {
        let cfg = config();
        assert_eq!(cfg.ssh_port, 222);
        assert_eq!(cfg.web_port, 90);
        assert_eq!(cfg.username, "root");
        assert!(!cfg.legacy);
    }
}

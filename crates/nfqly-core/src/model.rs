// ── Domain model ──
//
// Immutable value types produced by the coordinator and consumed by
// presentation adapters (CLI today). A Snapshot has no identity beyond
// "latest value": every poll replaces it wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::Firmware;

/// Observed state of the NFQWS service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    /// The status command reported the service as running.
    Running,
    /// The status command ran but did not report the service as running.
    Stopped,
    /// The session was established but something failed mid-poll.
    Error,
    /// The session could not be established at all.
    ConnectionError,
}

impl ServiceStatus {
    /// Classify a status-command stdout capture.
    ///
    /// Canonical rule: case-insensitive substring `"running"`; empty or
    /// missing output means stopped.
    pub fn classify(stdout: Option<&str>) -> Self {
        let is_running = stdout
            .is_some_and(|out| out.to_lowercase().contains("running"));
        if is_running { Self::Running } else { Self::Stopped }
    }
}

/// Placeholder until the version lookup resolves.
pub const VERSION_UNKNOWN: &str = "unknown";

/// Result of one poll cycle. Replaced wholesale on every poll, never
/// partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: ServiceStatus,
    /// `true` only when the poll reached the router and ran its commands.
    pub available: bool,
    pub is_running: bool,
    /// Resolved package version, or [`VERSION_UNKNOWN`].
    pub version: String,
    pub manufacturer: String,
    pub model: String,
    pub polled_at: DateTime<Utc>,
}

impl Snapshot {
    /// Healthy snapshot from a completed status check.
    pub fn observed(status: ServiceStatus, identity: &DeviceIdentity, version: String) -> Self {
        Self {
            status,
            available: true,
            is_running: status == ServiceStatus::Running,
            version,
            manufacturer: identity.manufacturer.clone(),
            model: identity.model.clone(),
            polled_at: Utc::now(),
        }
    }

    /// Degraded snapshot for a failed poll. Carries the last known version
    /// so the version entity keeps its value across outages.
    pub fn degraded(status: ServiceStatus, identity: &DeviceIdentity, version: String) -> Self {
        Self {
            status,
            available: false,
            is_running: false,
            version,
            manufacturer: identity.manufacturer.clone(),
            model: identity.model.clone(),
            polled_at: Utc::now(),
        }
    }
}

/// Device metadata derived once from configuration. Pure function of the
/// firmware mode and legacy flag — never changes after setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub manufacturer: String,
    pub model: String,
    /// Display title, e.g. `NFQWS - 192.168.1.1`.
    pub name: String,
}

impl DeviceIdentity {
    pub fn derive(host: &str, firmware: Firmware, legacy: bool) -> Self {
        let manufacturer = match firmware {
            Firmware::OpenWrt => "OpenWRT",
            Firmware::Keenetic => "Keenetic",
        };
        let model = if firmware == Firmware::Keenetic && !legacy {
            "NFQWS2"
        } else {
            "NFQWS"
        };
        Self {
            manufacturer: manufacturer.to_owned(),
            model: model.to_owned(),
            name: format!("NFQWS - {host}"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_matches_running_case_insensitively() {
        assert_eq!(
            ServiceStatus::classify(Some("nfqws is running")),
            ServiceStatus::Running
        );
        assert_eq!(
            ServiceStatus::classify(Some("Service RUNNING since boot")),
            ServiceStatus::Running
        );
    }

    #[test]
    fn classify_treats_everything_else_as_stopped() {
        assert_eq!(ServiceStatus::classify(Some("stopped")), ServiceStatus::Stopped);
        assert_eq!(ServiceStatus::classify(Some("")), ServiceStatus::Stopped);
        assert_eq!(ServiceStatus::classify(None), ServiceStatus::Stopped);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(ServiceStatus::ConnectionError.to_string(), "connection_error");
        assert_eq!(ServiceStatus::Running.to_string(), "running");
    }

    #[test]
    fn identity_is_a_pure_function_of_the_flags() {
        let keenetic = DeviceIdentity::derive("10.0.0.1", Firmware::Keenetic, false);
        assert_eq!(keenetic.manufacturer, "Keenetic");
        assert_eq!(keenetic.model, "NFQWS2");
        assert_eq!(keenetic.name, "NFQWS - 10.0.0.1");

        let legacy = DeviceIdentity::derive("10.0.0.1", Firmware::Keenetic, true);
        assert_eq!(legacy.model, "NFQWS");

        let openwrt = DeviceIdentity::derive("router", Firmware::OpenWrt, false);
        assert_eq!(openwrt.manufacturer, "OpenWRT");
        assert_eq!(openwrt.model, "NFQWS");
    }

    #[test]
    fn degraded_snapshot_is_unavailable_and_not_running() {
        let identity = DeviceIdentity::derive("r", Firmware::OpenWrt, false);
        let snap = Snapshot::degraded(
            ServiceStatus::ConnectionError,
            &identity,
            VERSION_UNKNOWN.to_owned(),
        );
        assert!(!snap.available);
        assert!(!snap.is_running);
        assert_eq!(snap.status, ServiceStatus::ConnectionError);
        assert_eq!(snap.version, VERSION_UNKNOWN);
    }
}

// ── Command table ──
//
// Pure mapping from (firmware, legacy flag, action) to the literal shell
// command issued on the router. No user input is ever spliced into a
// command string.

use serde::{Deserialize, Serialize};

/// Router operating-system family, which determines the service-manager
/// syntax.
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
pub enum Firmware {
    /// Keenetic with Entware (`/opt/etc/init.d` init scripts).
    Keenetic,
    /// OpenWrt (`service` wrapper).
    OpenWrt,
}

/// The closed set of operations the coordinator can issue.
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
pub enum Action {
    Status,
    Start,
    Stop,
    Restart,
}

// Keenetic, legacy nfqws-keenetic package.
const CMD_STATUS_KEENETIC: &str = "/opt/etc/init.d/S51nfqws status";
const CMD_START_KEENETIC: &str = "/opt/etc/init.d/S51nfqws start";
const CMD_STOP_KEENETIC: &str = "/opt/etc/init.d/S51nfqws stop";
const CMD_RESTART_KEENETIC: &str = "/opt/etc/init.d/S51nfqws restart";

// Keenetic, current nfqws2 package.
const CMD_STATUS_KEENETIC_V2: &str = "/opt/etc/init.d/S51nfqws2 status";
const CMD_START_KEENETIC_V2: &str = "/opt/etc/init.d/S51nfqws2 start";
const CMD_STOP_KEENETIC_V2: &str = "/opt/etc/init.d/S51nfqws2 stop";
const CMD_RESTART_KEENETIC_V2: &str = "/opt/etc/init.d/S51nfqws2 restart";

// OpenWrt.
const CMD_STATUS_OPENWRT: &str = "service nfqws-keenetic status";
const CMD_START_OPENWRT: &str = "service nfqws-keenetic start";
const CMD_STOP_OPENWRT: &str = "service nfqws-keenetic stop";
const CMD_RESTART_OPENWRT: &str = "service nfqws-keenetic restart";

/// Resolve the literal shell command for an action on the given platform.
pub fn resolve_command(firmware: Firmware, legacy: bool, action: Action) -> &'static str {
    match (firmware, legacy, action) {
        (Firmware::Keenetic, true, Action::Status) => CMD_STATUS_KEENETIC,
        (Firmware::Keenetic, true, Action::Start) => CMD_START_KEENETIC,
        (Firmware::Keenetic, true, Action::Stop) => CMD_STOP_KEENETIC,
        (Firmware::Keenetic, true, Action::Restart) => CMD_RESTART_KEENETIC,
        (Firmware::Keenetic, false, Action::Status) => CMD_STATUS_KEENETIC_V2,
        (Firmware::Keenetic, false, Action::Start) => CMD_START_KEENETIC_V2,
        (Firmware::Keenetic, false, Action::Stop) => CMD_STOP_KEENETIC_V2,
        (Firmware::Keenetic, false, Action::Restart) => CMD_RESTART_KEENETIC_V2,
        (Firmware::OpenWrt, _, Action::Status) => CMD_STATUS_OPENWRT,
        (Firmware::OpenWrt, _, Action::Start) => CMD_START_OPENWRT,
        (Firmware::OpenWrt, _, Action::Stop) => CMD_STOP_OPENWRT,
        (Firmware::OpenWrt, _, Action::Restart) => CMD_RESTART_OPENWRT,
    }
}

/// Package whose `opkg` metadata carries the service version.
pub fn package_name(firmware: Firmware, legacy: bool) -> &'static str {
    if legacy || firmware == Firmware::OpenWrt {
        "nfqws-keenetic"
    } else {
        "nfqws2"
    }
}

/// The `opkg info <pkg>` invocation for the version lookup.
pub fn version_command(firmware: Firmware, legacy: bool) -> String {
    format!("opkg info {}", package_name(firmware, legacy))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keenetic_legacy_start_literal() {
        assert_eq!(
            resolve_command(Firmware::Keenetic, true, Action::Start),
            "/opt/etc/init.d/S51nfqws start"
        );
    }

    #[test]
    fn keenetic_current_uses_the_nfqws2_init_script() {
        assert_eq!(
            resolve_command(Firmware::Keenetic, false, Action::Restart),
            "/opt/etc/init.d/S51nfqws2 restart"
        );
    }

    #[test]
    fn openwrt_stop_literal_ignores_the_legacy_flag() {
        assert_eq!(
            resolve_command(Firmware::OpenWrt, false, Action::Stop),
            "service nfqws-keenetic stop"
        );
        assert_eq!(
            resolve_command(Firmware::OpenWrt, true, Action::Stop),
            "service nfqws-keenetic stop"
        );
    }

    #[test]
    fn version_command_picks_the_package_by_mode() {
        assert_eq!(
            version_command(Firmware::Keenetic, false),
            "opkg info nfqws2"
        );
        assert_eq!(
            version_command(Firmware::Keenetic, true),
            "opkg info nfqws-keenetic"
        );
        assert_eq!(
            version_command(Firmware::OpenWrt, false),
            "opkg info nfqws-keenetic"
        );
    }

    #[test]
    fn unknown_action_strings_fail_to_parse() {
        assert!(Action::from_str("start").is_ok());
        assert!(Action::from_str("reload").is_err());
        assert!(Action::from_str("").is_err());
    }
}

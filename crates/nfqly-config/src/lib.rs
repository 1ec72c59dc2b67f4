//! Shared configuration for the nfqly CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `nfqly_core::ServiceConfig`. The core crate never reads
//! config files — this crate is the one place persisted configuration is
//! parsed and validated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nfqly_core::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SSH_PORT, DEFAULT_WEB_PORT, Firmware,
    POLL_INTERVAL_RANGE, ServiceConfig,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named router profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Router address (hostname or IP).
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// NFQWS web UI port — display-only metadata.
    #[serde(default = "default_web_port")]
    pub web_port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    /// SSH password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Router firmware family: "keenetic" or "open_wrt".
    #[serde(default = "default_firmware")]
    pub firmware: Firmware,

    /// Use the legacy nfqws-keenetic package instead of nfqws2.
    #[serde(default)]
    pub legacy: bool,

    /// Poll at `poll_interval` instead of the hourly idle rate.
    #[serde(default)]
    pub monitoring: bool,

    /// Poll interval in seconds (10–3600). Honored only with monitoring.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}
fn default_web_port() -> u16 {
    DEFAULT_WEB_PORT
}
fn default_username() -> String {
    "root".into()
}
fn default_firmware() -> Firmware {
    Firmware::Keenetic
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "nfqly", "nfqly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nfqly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from a specific file plus the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NFQLY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the SSH password from the credential chain.
///
/// Order: profile's `password_env` → `NFQLY_PASSWORD` → system keyring →
/// plaintext field in the config file.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var("NFQLY_PASSWORD") {
        return Ok(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new("nfqly", &format!("{profile_name}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to ServiceConfig ────────────────────────────────────

/// Build a `ServiceConfig` from a profile, validating ranges.
pub fn profile_to_service_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ServiceConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "host cannot be empty".into(),
        });
    }

    if profile.monitoring && !POLL_INTERVAL_RANGE.contains(&profile.poll_interval) {
        return Err(ConfigError::Validation {
            field: "poll_interval".into(),
            reason: format!(
                "expected {}..={} seconds, got {}",
                POLL_INTERVAL_RANGE.start(),
                POLL_INTERVAL_RANGE.end(),
                profile.poll_interval
            ),
        });
    }

    let password = resolve_password(profile, profile_name)?;

    let mut cfg = ServiceConfig::new(profile.host.clone(), password, profile.firmware);
    cfg.ssh_port = profile.ssh_port;
    cfg.web_port = profile.web_port;
    cfg.username = profile.username.clone();
    cfg.legacy = profile.legacy;
    cfg.monitoring = profile.monitoring;
    cfg.poll_interval_secs = profile.poll_interval;
    Ok(cfg)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(toml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(toml.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_profiles_with_defaults_filled_in() {
        let file = write_config(
            r#"
            default_profile = "home"

            [profiles.home]
            host = "192.168.1.1"
            password = "secret"
            "#,
        );

        let cfg = load_config_from(file.path()).expect("load");
        assert_eq!(cfg.default_profile.as_deref(), Some("home"));

        let profile = &cfg.profiles["home"];
        assert_eq!(profile.ssh_port, 222);
        assert_eq!(profile.web_port, 90);
        assert_eq!(profile.username, "root");
        assert_eq!(profile.firmware, Firmware::Keenetic);
        assert!(!profile.legacy);
        assert!(!profile.monitoring);
        assert_eq!(profile.poll_interval, 30);
    }

    #[test]
    fn missing_file_yields_pure_defaults() {
        let cfg = load_config_from(Path::new("/nonexistent/nfqly.toml")).expect("load");
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn profile_translates_to_service_config() {
        let file = write_config(
            r#"
            [profiles.router]
            host = "10.0.0.1"
            ssh_port = 2222
            username = "admin"
            password = "pw"
            firmware = "open_wrt"
            monitoring = true
            poll_interval = 60
            "#,
        );

        let cfg = load_config_from(file.path()).expect("load");
        let svc =
            profile_to_service_config(&cfg.profiles["router"], "router").expect("translate");

        assert_eq!(svc.host, "10.0.0.1");
        assert_eq!(svc.ssh_port, 2222);
        assert_eq!(svc.username, "admin");
        assert_eq!(svc.firmware, Firmware::OpenWrt);
        assert!(svc.monitoring);
        assert_eq!(svc.poll_interval_secs, 60);
    }

    #[test]
    fn out_of_range_interval_is_rejected_when_monitoring() {
        let profile = Profile {
            host: "10.0.0.1".into(),
            ssh_port: 222,
            web_port: 90,
            username: "root".into(),
            password: Some("pw".into()),
            password_env: None,
            firmware: Firmware::Keenetic,
            legacy: false,
            monitoring: true,
            poll_interval: 5,
        };

        let err = profile_to_service_config(&profile, "p").expect_err("out of range");
        assert!(err.to_string().contains("poll_interval"));

        // Without monitoring the interval is never honored, so not checked.
        let idle = Profile {
            monitoring: false,
            ..profile
        };
        assert!(profile_to_service_config(&idle, "p").is_ok());
    }

    #[test]
    fn empty_host_is_rejected() {
        let profile = Profile {
            host: "  ".into(),
            ssh_port: 222,
            web_port: 90,
            username: "root".into(),
            password: Some("pw".into()),
            password_env: None,
            firmware: Firmware::Keenetic,
            legacy: false,
            monitoring: false,
            poll_interval: 30,
        };
        assert!(profile_to_service_config(&profile, "p").is_err());
    }
}

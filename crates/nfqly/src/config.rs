//! Bridges the profile layer (`nfqly-config`) and CLI flag overrides into
//! the runtime `ServiceConfig` the coordinator consumes.

use secrecy::SecretString;

use nfqly_config::{Config, ConfigError};
use nfqly_core::{Firmware, ServiceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile name selected by flags, config default, or `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".to_owned())
}

/// Build a `ServiceConfig` from the config file, profile, and CLI overrides.
pub fn build_service_config(global: &GlobalOpts) -> Result<ServiceConfig, CliError> {
    let cfg = nfqly_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // A configured profile is the base; CLI flags override its fields.
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut profile = profile.clone();
        if let Some(ref host) = global.host {
            profile.host = host.clone();
        }
        if let Some(port) = global.ssh_port {
            profile.ssh_port = port;
        }
        if let Some(ref username) = global.username {
            profile.username = username.clone();
        }
        if let Some(firmware) = global.firmware {
            profile.firmware = firmware.into();
        }
        if global.legacy {
            profile.legacy = true;
        }
        if let Some(ref password) = global.password {
            profile.password = Some(password.clone());
        }

        return nfqly_config::profile_to_service_config(&profile, &profile_name).map_err(
            |err| match err {
                ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
                ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
                other => CliError::Config(other),
            },
        );
    }

    // An explicitly requested profile that doesn't exist is an error;
    // otherwise fall through to flags/env alone.
    if global.profile.is_some() {
        return Err(CliError::UnknownProfile {
            profile: profile_name,
        });
    }

    let Some(ref host) = global.host else {
        return Err(CliError::NoConfig {
            path: nfqly_config::config_path().display().to_string(),
        });
    };

    let Some(ref password) = global.password else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let firmware: Firmware = global.firmware.map_or(Firmware::Keenetic, Into::into);
    let mut service = ServiceConfig::new(host.clone(), SecretString::from(password.clone()), firmware);
    if let Some(port) = global.ssh_port {
        service.ssh_port = port;
    }
    if let Some(ref username) = global.username {
        service.username = username.clone();
    }
    service.legacy = global.legacy;
    Ok(service)
}

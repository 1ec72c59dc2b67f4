//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use nfqly_config::{Config, Profile};
use nfqly_core::{
    Coordinator, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SSH_PORT, DEFAULT_WEB_PORT, Firmware,
    POLL_INTERVAL_RANGE, ServiceConfig,
};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_profile_name;
use crate::error::CliError;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "ssh_port = {}", p.ssh_port);
        let _ = writeln!(out, "web_port = {}", p.web_port);
        let _ = writeln!(out, "username = \"{}\"", p.username);
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        let _ = writeln!(out, "firmware = \"{}\"", p.firmware);
        let _ = writeln!(out, "legacy = {}", p.legacy);
        let _ = writeln!(out, "monitoring = {}", p.monitoring);
        let _ = writeln!(out, "poll_interval = {}", p.poll_interval);
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store the password in the system keyring or keep it in the
/// config file. Returns `Some(secret)` if the user chose plaintext.
fn prompt_password_storage(
    secret: &str,
    profile_name: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the password be stored?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_in_keyring(profile_name, secret)?;
        eprintln!("   ✓ password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

/// Assemble a service config from the values entered during `config init`,
/// used for the post-save connection test.
fn init_service_config(
    host: String,
    ssh_port: u16,
    username: String,
    secret: &str,
    firmware: Firmware,
    legacy: bool,
) -> ServiceConfig {
    let mut service = ServiceConfig::new(host, SecretString::from(secret.to_owned()), firmware);
    service.ssh_port = ssh_port;
    service.username = username;
    service.legacy = legacy;
    service
}

fn store_in_keyring(profile_name: &str, secret: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new("nfqly", &format!("{profile_name}/password")).map_err(
        |e| CliError::Validation {
            field: "keyring".into(),
            reason: format!("failed to access keyring: {e}"),
        },
    )?;
    entry.set_password(secret).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store password in keyring: {e}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init => {
            let mut cfg = nfqly_config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Router host")
                .interact_text()
                .map_err(prompt_err)?;

            let ssh_port: u16 = Input::new()
                .with_prompt("SSH port")
                .default(DEFAULT_SSH_PORT)
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Username")
                .default("root".into())
                .interact_text()
                .map_err(prompt_err)?;

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            let password = prompt_password_storage(&secret, &profile_name)?;

            let firmware_choices = &["Keenetic (Entware)", "OpenWrt"];
            let firmware = match Select::new()
                .with_prompt("Router firmware")
                .items(firmware_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => Firmware::Keenetic,
                _ => Firmware::OpenWrt,
            };

            let legacy = firmware == Firmware::Keenetic
                && Confirm::new()
                    .with_prompt("Use the legacy nfqws-keenetic package?")
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?;

            let monitoring = Confirm::new()
                .with_prompt("Enable periodic status monitoring?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let poll_interval = if monitoring {
                Input::new()
                    .with_prompt(format!(
                        "Poll interval in seconds ({}-{})",
                        POLL_INTERVAL_RANGE.start(),
                        POLL_INTERVAL_RANGE.end()
                    ))
                    .default(DEFAULT_POLL_INTERVAL_SECS)
                    .validate_with(|v: &u64| {
                        if POLL_INTERVAL_RANGE.contains(v) {
                            Ok(())
                        } else {
                            Err("interval out of range")
                        }
                    })
                    .interact_text()
                    .map_err(prompt_err)?
            } else {
                DEFAULT_POLL_INTERVAL_SECS
            };

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    host: host.clone(),
                    ssh_port,
                    web_port: DEFAULT_WEB_PORT,
                    username: username.clone(),
                    password,
                    password_env: None,
                    firmware,
                    legacy,
                    monitoring,
                    poll_interval,
                },
            );
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }

            nfqly_config::save_config(&cfg)?;
            eprintln!(
                "✓ profile '{profile_name}' saved to {}",
                nfqly_config::config_path().display()
            );

            if Confirm::new()
                .with_prompt("Test the SSH connection now?")
                .default(true)
                .interact()
                .map_err(prompt_err)?
            {
                let service =
                    init_service_config(host, ssh_port, username, &secret, firmware, legacy);
                Coordinator::with_ssh(service).verify_connection().await?;
                eprintln!("✓ connected to the router");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = nfqly_config::load_config_or_default();
            print!("{}", format_config_redacted(&cfg));
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", nfqly_config::config_path().display());
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = nfqly_config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::UnknownProfile {
                    profile: profile_name,
                });
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            store_in_keyring(&profile_name, &secret)?;
            eprintln!("✓ password for '{profile_name}' stored in system keyring");
            Ok(())
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn connection_test_uses_the_entered_values() {
        let service = init_service_config(
            "192.168.1.1".into(),
            2222,
            "admin".into(),
            "hunter2",
            Firmware::Keenetic,
            true,
        );

        assert_eq!(service.host, "192.168.1.1");
        assert_eq!(service.ssh_port, 2222);
        assert_eq!(service.username, "admin");
        assert_eq!(service.password.expose_secret(), "hunter2");
        assert_eq!(service.firmware, Firmware::Keenetic);
        assert!(service.legacy);
    }
}

//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders snapshots in the format selected by `--output`. Table uses
//! `tabled`, structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nfqly_core::{ServiceStatus, Snapshot};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn status_label(status: ServiceStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        ServiceStatus::Running => status.to_string().green().to_string(),
        ServiceStatus::Stopped => status.to_string().yellow().to_string(),
        ServiceStatus::Error | ServiceStatus::ConnectionError => {
            status.to_string().red().to_string()
        }
    }
}

// ── Snapshot rendering ───────────────────────────────────────────────

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Available")]
    available: bool,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Polled")]
    polled: String,
}

/// Render one snapshot in the chosen format.
pub fn render_snapshot(format: &OutputFormat, snapshot: &Snapshot, color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let row = SnapshotRow {
                device: format!("{} {}", snapshot.manufacturer, snapshot.model),
                status: status_label(snapshot.status, color),
                available: snapshot.available,
                version: snapshot.version.clone(),
                polled: snapshot.polled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            };
            render_table(&[row])
        }
        OutputFormat::Json => render_json(snapshot, false),
        OutputFormat::JsonCompact => render_json(snapshot, true),
        OutputFormat::Yaml => render_yaml(snapshot),
        OutputFormat::Plain => snapshot.status.to_string(),
    }
}

/// Render a bare string value (e.g. the version) in the chosen format.
pub fn render_value(format: &OutputFormat, key: &str, value: &str) -> String {
    match format {
        OutputFormat::Json => render_json(&serde_json::json!({ key: value }), false),
        OutputFormat::JsonCompact => render_json(&serde_json::json!({ key: value }), true),
        OutputFormat::Yaml => format!("{key}: {value}"),
        OutputFormat::Table | OutputFormat::Plain => value.to_owned(),
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

fn render_json<T: serde::Serialize>(data: &T, compact: bool) -> String {
    let result = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    result.unwrap_or_else(|e| format!("serialization error: {e}"))
}

fn render_yaml<T: serde::Serialize>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization error: {e}"))
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    println!("{output}");
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nfqly_core::{DeviceIdentity, Firmware};

    fn snapshot() -> Snapshot {
        let identity = DeviceIdentity::derive("10.0.0.1", Firmware::Keenetic, false);
        Snapshot::observed(ServiceStatus::Running, &identity, "70.4-1".to_owned())
    }

    #[test]
    fn plain_output_is_just_the_status() {
        let out = render_snapshot(&OutputFormat::Plain, &snapshot(), false);
        assert_eq!(out, "running");
    }

    #[test]
    fn json_output_round_trips() {
        let out = render_snapshot(&OutputFormat::JsonCompact, &snapshot(), false);
        let parsed: Snapshot = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed.version, "70.4-1");
    }

    #[test]
    fn table_output_names_the_device() {
        let out = render_snapshot(&OutputFormat::Table, &snapshot(), false);
        assert!(out.contains("Keenetic NFQWS2"));
        assert!(out.contains("running"));
    }

    #[test]
    fn value_rendering_honors_the_format() {
        assert_eq!(render_value(&OutputFormat::Plain, "version", "1.0"), "1.0");
        assert_eq!(
            render_value(&OutputFormat::Yaml, "version", "1.0"),
            "version: 1.0"
        );
        assert_eq!(
            render_value(&OutputFormat::JsonCompact, "version", "1.0"),
            "{\"version\":\"1.0\"}"
        );
    }

    #[test]
    fn value_json_escapes_special_characters() {
        let out = render_value(&OutputFormat::JsonCompact, "version", "1.0 \"beta\\1\"");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed["version"], "1.0 \"beta\\1\"");
    }
}

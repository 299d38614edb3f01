//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use aquadash_core::{Device, DeviceMode};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Device rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Pump")]
    pump: String,
    #[tabled(rename = "Water")]
    water: String,
    #[tabled(rename = "Alert")]
    alert: String,
}

impl DeviceRow {
    fn new(d: &Device, color: bool) -> Self {
        let mode = d.mode.to_string();
        let pump = if d.pump_status { "ON" } else { "OFF" };
        let alert = d.alert.clone().unwrap_or_default();

        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            location: d.location_label().to_owned(),
            mode: if color && d.mode == DeviceMode::Automatic {
                mode.cyan().to_string()
            } else {
                mode
            },
            pump: match (color, d.pump_status) {
                (true, true) => pump.green().to_string(),
                (true, false) => pump.dimmed().to_string(),
                (false, _) => pump.to_owned(),
            },
            water: level_bar(d.water_level),
            alert: if color { alert.red().to_string() } else { alert },
        }
    }
}

/// `63.5% ██████░░░░` style gauge, clamped for display.
fn level_bar(level: f64) -> String {
    let pct = level.clamp(0.0, 100.0);
    let filled = (0..10).filter(|i| f64::from(*i) * 10.0 < pct).count();
    format!(
        "{level:>5.1}% {}{}",
        "█".repeat(filled),
        "░".repeat(10 - filled)
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a device set in the chosen format.
pub fn render_devices(format: OutputFormat, devices: &[Arc<Device>], color: bool) -> String {
    match format {
        OutputFormat::Table => {
            if devices.is_empty() {
                return "No devices".into();
            }
            let rows: Vec<DeviceRow> = devices.iter().map(|d| DeviceRow::new(d, color)).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(devices, false),
        OutputFormat::JsonCompact => render_json(devices, true),
        OutputFormat::Plain => devices.iter().map(|d| d.id.as_str()).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

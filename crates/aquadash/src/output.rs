//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use aquadash_core::{EntryStatus, Reading, Snapshot};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_status(status: EntryStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        EntryStatus::Ready => label.green().to_string(),
        EntryStatus::Failed => label.red().bold().to_string(),
        EntryStatus::Loading => label.yellow().to_string(),
        EntryStatus::Empty => label.dimmed().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
    let _ = stdout.flush();
}

// ── Readings ─────────────────────────────────────────────────────────

/// One printed update: a snapshot plus where and when it was observed.
#[derive(Debug, Serialize)]
pub struct ReadingView<'a> {
    pub source: &'a str,
    pub observed_at: DateTime<Local>,
    pub status: EntryStatus,
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: Option<&'a Reading>,
}

impl<'a> ReadingView<'a> {
    pub fn from_snapshot(source: &'a str, snapshot: &'a Snapshot<Reading>) -> Self {
        Self {
            source,
            observed_at: Local::now(),
            status: snapshot.status(),
            revision: snapshot.revision(),
            error: snapshot.error.as_ref().map(ToString::to_string),
            data: snapshot.data.as_deref(),
        }
    }

    /// A one-off reading that never went through a cache entry.
    pub fn one_shot(source: &'a str, reading: &'a Reading) -> Self {
        Self {
            source,
            observed_at: Local::now(),
            status: EntryStatus::Ready,
            revision: 1,
            error: None,
            data: Some(reading),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render one reading in the chosen format.
pub fn render_reading(
    format: OutputFormat,
    view: &ReadingView<'_>,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => render_json(view, false),
        OutputFormat::JsonCompact => render_json(view, true),
        OutputFormat::Plain => Ok(view
            .data
            .map(|data| {
                data.iter()
                    .map(|(k, v)| format!("{k}={}", display_value(v)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()),
        OutputFormat::Table => {
            let mut header = format!(
                "{}  {}  {}  rev {}",
                view.observed_at.format("%H:%M:%S"),
                view.source,
                paint_status(view.status, color),
                view.revision
            );
            if let Some(ref err) = view.error {
                header.push_str("\n  ");
                header.push_str(&if color {
                    err.red().to_string()
                } else {
                    err.clone()
                });
            }
            let Some(data) = view.data else {
                return Ok(header);
            };
            let rows: Vec<FieldRow> = data
                .iter()
                .map(|(k, v)| FieldRow {
                    field: k.clone(),
                    value: display_value(v),
                })
                .collect();
            Ok(format!("{header}\n{}", render_table(&rows)))
        }
    }
}

/// Strings print bare; everything else prints as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        other => other.to_string(),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading() -> Reading {
        match json!({"LEVEL": 3.5, "fecha": "01.01.25..08.00", "PUMP": null}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn plain_prints_field_value_lines() {
        let data = reading();
        let view = ReadingView::one_shot("X", &data);
        let out = render_reading(OutputFormat::Plain, &view, false).unwrap();
        assert!(out.contains("LEVEL=3.5"));
        assert!(out.contains("fecha=01.01.25..08.00"));
        assert!(out.contains("PUMP=-"));
    }

    #[test]
    fn compact_json_is_one_line() {
        let data = reading();
        let view = ReadingView::one_shot("X", &data);
        let out = render_reading(OutputFormat::JsonCompact, &view, false).unwrap();
        assert!(!out.contains('\n'));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["status"], "ready");
        assert_eq!(parsed["data"]["LEVEL"], 3.5);
    }

    #[test]
    fn table_without_data_is_header_only() {
        let snap = Snapshot::<Reading>::default();
        let view = ReadingView::from_snapshot("LB", &snap);
        let out = render_reading(OutputFormat::Table, &view, false).unwrap();
        assert!(out.contains("LB  empty  rev 0"));
        assert!(!out.contains('╭'));
    }
}

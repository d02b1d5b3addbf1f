//! Output formatting: JSON, YAML, plain, table.
//!
//! Store values are plain JSON, so every renderer works on
//! `serde_json::Value`. Tables use `tabled`.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a JSON value in the chosen format.
///
/// - `json` / `json-compact` / `yaml`: serde serialization
/// - `plain`: strings unquoted, arrays one element per line
/// - `table`: objects as key/value rows, arrays of objects as rows
pub fn render_value(format: OutputFormat, value: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(value)?),
        OutputFormat::Yaml => render_yaml(value),
        OutputFormat::Plain => Ok(render_plain(value)),
        OutputFormat::Table => Ok(render_value_table(value)),
    }
}

/// Render a list of rows: `table` via the `Tabled` derive, the other
/// formats through serde.
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
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => render_yaml(data),
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

// ── Format-specific renderers ────────────────────────────────────────

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    let text = serde_yaml::to_string(data)?;
    Ok(text.trim_end().to_owned())
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(plain_scalar).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}\t{}", plain_scalar(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// One-line rendering: strings bare, everything else as compact JSON.
fn plain_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn render_value_table(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let rows: Vec<FieldRow> = map
                .iter()
                .map(|(k, v)| FieldRow {
                    field: k.clone(),
                    value: plain_scalar(v),
                })
                .collect();
            render_table(&rows)
        }
        Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
            render_object_rows(items)
        }
        other => render_plain(other),
    }
}

/// Rows of objects: columns are the union of keys in first-seen order.
fn render_object_rows(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(columns.iter().copied());
    for item in items {
        builder.push_record(
            columns
                .iter()
                .map(|c| item.get(*c).map(plain_scalar).unwrap_or_default()),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

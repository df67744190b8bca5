//! Output formatting for dispensed domains and status reports.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{AppError, DispenserStatus, DomainItem, Result};

/// Formats a dispensed domain as a pretty-printed resource document.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_domain_json(domain: &DomainItem) -> Result<String> {
    serde_json::to_string_pretty(domain).map_err(AppError::json_parse)
}

/// Formats the dispenser status as a pretty-printed JSON object.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_status_json(status: &DispenserStatus) -> Result<String> {
    serde_json::to_string_pretty(status).map_err(AppError::json_parse)
}

/// Formats the dispenser status as a table.
pub fn format_status_table(status: &DispenserStatus) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Item", "Value"]);

    let last_advance = status.last_advance.map_or_else(
        || "-".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    table.add_row(vec!["Cursor file", status.cursor_file.as_str()]);
    table.add_row(vec!["Position", &status.position.to_string()]);
    table.add_row(vec!["Total domains", &status.total.to_string()]);
    table.add_row(vec!["Remaining", &status.remaining().to_string()]);
    table.add_row(vec!["Last advance", &last_advance]);
    table.add_row(vec!["Measurement file", status.measurement_file.as_str()]);
    table.add_row(vec!["Measurement bytes", &status.measurement_bytes.to_string()]);

    let state = if status.is_exhausted() {
        "exhausted".red().bold()
    } else {
        "dispensing".green().bold()
    };

    format!("{} {state}\n{table}", "📊 Dispenser".bold())
}

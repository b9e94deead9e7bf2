//! Output formatting for command results.
//!
//! Supports table and JSON output formats.

use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table};
use grove_storage::id::IdFileHeader;
use grove_storage::store::{RebuildReport, StoreMode, StoreStats};
use serde::Serialize;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Two-column table.
    Table,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Maps the `--json` flag to a format.
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

/// Formats store statistics.
pub fn format_stats(stats: &StoreStats, format: OutputFormat) -> Result<String> {
    let windows = &stats.windows;
    render(
        stats,
        format,
        vec![
            ("kind", stats.kind.to_string()),
            ("record size", stats.record_size.to_string()),
            ("high id", stats.high_id.to_string()),
            ("ids in use", stats.ids_in_use.to_string()),
            ("free ids", stats.free_ids.to_string()),
            ("data bytes", stats.data_bytes().to_string()),
            ("mode", mode_name(stats.mode).to_string()),
            ("window acquisitions", windows.acquisitions.to_string()),
            ("window hit ratio", format!("{:.2}", windows.hit_ratio())),
            ("window evictions", windows.evictions.to_string()),
            ("direct transfers", windows.transfers.to_string()),
        ],
    )
}

/// Formats an allocator rebuild report.
pub fn format_report(report: &RebuildReport, format: OutputFormat) -> Result<String> {
    render(
        report,
        format,
        vec![
            ("kind", report.kind.to_string()),
            ("high id", report.high_id.to_string()),
            ("free ids", report.free_ids.to_string()),
            ("records scanned", report.records_scanned.to_string()),
            ("sentinel restored", report.sentinel_restored.to_string()),
        ],
    )
}

/// Formats an id file header.
pub fn format_header(header: &IdFileHeader, format: OutputFormat) -> Result<String> {
    render(
        header,
        format,
        vec![
            ("sticky", header.sticky.to_string()),
            ("high id", header.high_id.to_string()),
            ("free ids", header.free_ids.to_string()),
        ],
    )
}

fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    rows: Vec<(&str, String)>,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(format_table(rows)),
    }
}

fn format_table(rows: Vec<(&str, String)>) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(vec!["field", "value"]);

    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    table.to_string()
}

fn mode_name(mode: StoreMode) -> &'static str {
    match mode {
        StoreMode::NormalOperation => "normal operation",
        StoreMode::RecoveryReplay => "recovery replay",
    }
}

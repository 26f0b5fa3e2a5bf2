//! Export a [`SummaryTable`] to disk.
//!
//! The spreadsheet is the primary artefact: one sheet, a bold header row, and
//! wrapped cells so newline-joined bullet lists stay readable. CSV and JSON
//! exist for piping into other tools.
//!
//! Every export is written to a sibling temp file first and then renamed into
//! place, so an interrupted run never leaves a truncated file behind.

use crate::error::ResumeError;
use crate::output::SummaryTable;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used when the caller gives no output path.
pub const DEFAULT_OUTPUT_FILE: &str = "multiple_resumes_summary_data.xlsx";

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Resumes";

/// Widest column the spreadsheet auto-sizing will produce.
const MAX_COLUMN_WIDTH: usize = 60;

/// On-disk format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    /// Infer the format from the output path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialise `table` into the bytes of `format`.
pub fn render_table(table: &SummaryTable, format: ExportFormat) -> Result<Vec<u8>, String> {
    match format {
        ExportFormat::Xlsx => render_xlsx(table).map_err(|e| e.to_string()),
        ExportFormat::Csv => render_csv(table),
        ExportFormat::Json => render_json(table),
    }
}

/// Write `table` to `path` atomically.
///
/// Parent directories are created as needed. An empty table still produces a
/// file with just the header row; callers that treat "no data" as an error
/// check before calling.
pub async fn export_table(
    table: &SummaryTable,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ResumeError> {
    let bytes = render_table(table, format).map_err(|detail| ResumeError::ExportFailed {
        path: path.to_path_buf(),
        format: format.to_string(),
        detail,
    })?;

    let write_failed = |source: std::io::Error| ResumeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let tmp_path = temp_path(path, format);
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    info!(
        "Wrote {} row(s) to {} ({})",
        table.len(),
        path.display(),
        format
    );
    Ok(())
}

fn temp_path(path: &Path, format: ExportFormat) -> PathBuf {
    path.with_extension(format!("{}.tmp", format.extension()))
}

fn render_xlsx(table: &SummaryTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Top)
        .set_text_wrap();
    let cell = Format::new().set_align(FormatAlign::Top).set_text_wrap();

    let columns = table.columns();
    let records = table.records();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_freeze_panes(1, 0)?;

    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, value) in record.iter().enumerate() {
            sheet.write_string_with_format(row as u32 + 1, col as u16, *value, &cell)?;
        }
    }

    for (col, title) in columns.iter().enumerate() {
        let widest = records
            .iter()
            .flat_map(|r| r[col].lines())
            .map(|l| l.chars().count())
            .chain(std::iter::once(title.chars().count()))
            .max()
            .unwrap_or(0);
        sheet.set_column_width(col as u16, (widest + 2).min(MAX_COLUMN_WIDTH) as f64)?;
    }

    debug!("Rendered {} row(s) as xlsx", records.len());
    workbook.save_to_buffer()
}

fn render_csv(table: &SummaryTable) -> Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .map_err(|e| e.to_string())?;
    for record in table.records() {
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    writer.into_inner().map_err(|e| e.to_string())
}

/// An array of objects keyed by column title.
fn render_json(table: &SummaryTable) -> Result<Vec<u8>, String> {
    let columns = table.columns();
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = table
        .records()
        .into_iter()
        .map(|record| {
            columns
                .iter()
                .zip(record)
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
                .collect()
        })
        .collect();
    serde_json::to_vec_pretty(&rows).map_err(|e| e.to_string())
}

/// Render `table` as a GitHub-flavoured Markdown table for the terminal.
///
/// Embedded newlines become `<br>` and pipes are escaped so each record stays
/// on one line.
pub fn render_text_table(table: &SummaryTable) -> String {
    let escape = |s: &str| s.replace('|', "\\|").replace('\n', "<br>");
    let columns = table.columns();

    let mut out = String::new();
    out.push_str(&format!("| {} |\n", columns.join(" | ")));
    out.push_str(&format!(
        "|{}|\n",
        columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));
    for record in table.records() {
        let cells: Vec<String> = record.into_iter().map(escape).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

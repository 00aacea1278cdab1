//! Report export: one spreadsheet and one CSV per run
//!
//! Both files share a UTC-timestamped base name. An empty row set writes
//! nothing; the caller reports "nothing found" instead.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook};

use crate::application::errors::ExportError;
use crate::config::OutputConfig;
use crate::domain::FindingRow;

/// Paths of the two files written by a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub excel: PathBuf,
    pub csv: PathBuf,
}

/// Write the collected rows to an xlsx/csv pair in the output directory.
///
/// Returns `None` (and writes nothing) when the row set is empty.
pub fn export_report(
    rows: &[FindingRow],
    output: &OutputConfig,
) -> Result<Option<ReportFiles>, ExportError> {
    if rows.is_empty() {
        tracing::info!("no vulnerabilities found, nothing to export");
        return Ok(None);
    }

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let base = format!("{}_{}", output.prefix, timestamp);
    let files = ReportFiles {
        excel: output.directory.join(format!("{}.xlsx", base)),
        csv: output.directory.join(format!("{}.csv", base)),
    };

    write_xlsx(rows, &files.excel)?;
    write_csv(rows, &files.csv)?;

    tracing::info!(rows = rows.len(), base = %base, "report files written");
    Ok(Some(files))
}

fn write_xlsx(rows: &[FindingRow], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (col, header) in FindingRow::HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.values().iter().enumerate() {
            worksheet.write_string((i + 1) as u32, col as u16, *value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(rows: &[FindingRow], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(FindingRow::HEADERS)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    writer.flush()?;
    Ok(())
}

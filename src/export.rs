use std::path::Path;

use log::info;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::ScrapeError;
use crate::models::{ProductRecord, COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` files get CSV, anything else is written as a workbook.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }
}

/// Writes a header row plus one row per record and returns the number of
/// data rows written.
pub fn save(records: &[ProductRecord], path: &Path) -> Result<usize, ScrapeError> {
    let format = ExportFormat::from_path(path);
    match format {
        ExportFormat::Xlsx => save_xlsx(records, path).map_err(|e| export_error(path, e))?,
        ExportFormat::Csv => save_csv(records, path).map_err(|e| export_error(path, e))?,
    }
    info!("Wrote {} rows to {} ({:?})", records.len(), path.display(), format);
    Ok(records.len())
}

fn save_xlsx(records: &[ProductRecord], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in record.cells().iter().enumerate() {
            worksheet.write_string(row, col as u16, *cell)?;
        }
    }

    workbook.save(path)
}

fn save_csv(records: &[ProductRecord], path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    // serialize() only emits a header once it sees a record
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn export_error(path: &Path, err: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Export {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

// ============================================================
// FILE LOADER
// ============================================================
// Turn an uploaded CSV or spreadsheet into a typed dataset

mod csv_parser;
mod workbook_reader;

pub use csv_parser::CsvParser;
pub use workbook_reader::WorkbookReader;

use std::path::Path;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::Dataset;

/// Upload formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Delimited,
    Workbook,
}

impl FileKind {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename.trim())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(FileKind::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileKind::Workbook),
            _ => Err(AppError::FileFormat(format!(
                "Unsupported format for '{}'. Use CSV or Excel (xlsx, xls)",
                filename
            ))),
        }
    }
}

/// Load an uploaded file into a dataset
pub fn load(filename: &str, bytes: &[u8]) -> Result<Dataset> {
    let kind = FileKind::from_filename(filename)?;

    if bytes.is_empty() {
        return Err(AppError::FileFormat("File is empty".to_string()));
    }

    let dataset = match kind {
        FileKind::Delimited => CsvParser::parse_bytes_auto_detect(bytes)?,
        FileKind::Workbook => WorkbookReader::parse_bytes(bytes)?,
    };

    info!(
        filename,
        kind = ?kind,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Loaded dataset"
    );

    Ok(dataset)
}

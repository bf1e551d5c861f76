// ============================================================
// WORKBOOK READER
// ============================================================
// Read the first worksheet of an Excel/ODS workbook

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::{excel_serial_to_date, parse_date, CellValue, Dataset};

/// Workbook reader backed by calamine
pub struct WorkbookReader;

impl WorkbookReader {
    /// Parse the first worksheet; its first row is the header
    pub fn parse_bytes(bytes: &[u8]) -> Result<Dataset> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::FileFormat(format!("Failed to open workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::FileFormat("No worksheet found in workbook".to_string()))?
            .map_err(|e| AppError::FileFormat(format!("Failed to read worksheet: {}", e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(header_text).collect())
            .ok_or_else(|| AppError::FileFormat("Worksheet is empty".to_string()))?;

        if headers.iter().all(|header| header.trim().is_empty()) {
            return Err(AppError::FileFormat("Missing header row".to_string()));
        }

        let body: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        debug!(rows = body.len(), columns = headers.len(), "Read worksheet");

        Ok(Dataset::from_rows(headers, body))
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::String(value) => CellValue::from_raw(value),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(value) => excel_serial_to_date(value.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(value) => parse_date(value)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::from_raw(value)),
        Data::DurationIso(value) => CellValue::from_raw(value),
    }
}

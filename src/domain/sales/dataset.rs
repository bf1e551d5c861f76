// ============================================================
// DATASET
// ============================================================
// Immutable, column-oriented table produced by the file loader

use super::{CellValue, ScalarType};
use chrono::NaiveDate;
use std::collections::HashSet;

/// A named column whose non-empty cells all share one scalar type
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ScalarType,
    cells: Vec<CellValue>,
}

impl Column {
    /// Build a column from raw cells, inferring its scalar type.
    ///
    /// Numeric wins when every non-empty cell reads as a number, then
    /// Date, otherwise every cell is kept as text.
    pub fn infer(name: impl Into<String>, raw: Vec<CellValue>) -> Self {
        let name = name.into();
        let non_empty = raw.iter().filter(|cell| !cell.is_empty()).count();

        if non_empty == 0 {
            return Self {
                name,
                kind: ScalarType::Empty,
                cells: raw.into_iter().map(|_| CellValue::Empty).collect(),
            };
        }

        if let Some(numbers) = coerce_all(&raw, CellValue::coerce_number) {
            let cells = numbers
                .into_iter()
                .map(|value| value.map(CellValue::Number).unwrap_or(CellValue::Empty))
                .collect();
            return Self {
                name,
                kind: ScalarType::Numeric,
                cells,
            };
        }

        if let Some(dates) = coerce_all(&raw, CellValue::coerce_date) {
            let cells = dates
                .into_iter()
                .map(|value| value.map(CellValue::Date).unwrap_or(CellValue::Empty))
                .collect();
            return Self {
                name,
                kind: ScalarType::Date,
                cells,
            };
        }

        let cells = raw
            .into_iter()
            .map(|cell| match cell {
                CellValue::Text(_) | CellValue::Empty => cell,
                other => CellValue::Text(other.to_string()),
            })
            .collect();

        Self {
            name,
            kind: ScalarType::Text,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ScalarType {
        self.kind
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize) -> Option<&CellValue> {
        self.cells.get(row)
    }

    pub fn number_at(&self, row: usize) -> Option<f64> {
        self.cells.get(row).and_then(CellValue::as_number)
    }

    pub fn date_at(&self, row: usize) -> Option<NaiveDate> {
        self.cells.get(row).and_then(CellValue::as_date)
    }

    /// Cell rendered as a grouping label; blank labels are skipped.
    pub fn label_at(&self, row: usize) -> Option<String> {
        self.cells
            .get(row)
            .and_then(CellValue::to_text)
            .filter(|label| !label.trim().is_empty())
    }

    /// Number of distinct non-empty values (by rendered text).
    pub fn distinct_count(&self) -> usize {
        self.cells
            .iter()
            .filter_map(CellValue::to_text)
            .collect::<HashSet<_>>()
            .len()
    }

}

/// Coerce every non-empty cell, failing as soon as one does not convert.
fn coerce_all<T>(cells: &[CellValue], coerce: impl Fn(&CellValue) -> Option<T>) -> Option<Vec<Option<T>>> {
    cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Some(None)
            } else {
                coerce(cell).map(Some)
            }
        })
        .collect()
}

/// Ordered sequence of equally long named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from a header row and row-major cells.
    ///
    /// Headers are cleaned (blank → `column_<n>`, duplicates suffixed
    /// `.1`, `.2`, ...). Short rows are padded, long rows truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let headers = clean_headers(headers);
        let width = headers.len();
        let row_count = rows.len();

        let mut raw_columns: Vec<Vec<CellValue>> =
            (0..width).map(|_| Vec::with_capacity(row_count)).collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in raw_columns.iter_mut() {
                column.push(cells.next().unwrap_or(CellValue::Empty));
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, cells)| Column::infer(name, cells))
            .collect();

        Self { columns, row_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cells of one row in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .filter_map(|column| column.get(index))
                .collect(),
        )
    }
}

fn clean_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::with_capacity(headers.len());

    for (index, header) in headers.into_iter().enumerate() {
        let base = header.trim().trim_start_matches('\u{feff}').trim().to_string();
        let base = if base.is_empty() {
            format!("column_{}", index + 1)
        } else {
            base
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        cleaned.push(candidate);
    }

    cleaned
}

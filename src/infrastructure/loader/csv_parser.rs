// ============================================================
// CSV PARSER
// ============================================================
// Parse delimited text with encoding and delimiter detection

use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::{CellValue, Dataset};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Delimiter candidates, in preference order on ties
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// CSV parser producing a typed dataset
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode raw bytes and parse them with automatic delimiter detection
    pub fn parse_bytes_auto_detect(bytes: &[u8]) -> Result<Dataset> {
        let content = Self::decode(bytes);
        let delimiter = Self::detect_delimiter(&content);
        debug!(delimiter = %(delimiter as char).escape_default(), "Detected CSV delimiter");

        Self::default().with_delimiter(delimiter).parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<Dataset> {
        if content.trim().is_empty() {
            return Err(AppError::FileFormat("File is empty".to_string()));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::FileFormat(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|header| header.to_string())
            .collect();

        if headers.iter().all(|header| header.trim().is_empty()) {
            return Err(AppError::FileFormat("Missing header row".to_string()));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::FileFormat(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            // Blank lines inside the file carry no data
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            rows.push(record.iter().map(CellValue::from_raw).collect());
        }

        Ok(Dataset::from_rows(headers, rows))
    }

    /// Decode bytes as UTF-8, falling back to Windows-1252 for legacy exports
    pub fn decode(bytes: &[u8]) -> String {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        match std::str::from_utf8(bytes) {
            Ok(content) => content.to_string(),
            Err(_) => {
                let (content, _, _) = WINDOWS_1252.decode(bytes);
                debug!("Content is not valid UTF-8, decoded as Windows-1252");
                content.into_owned()
            }
        }
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let sample_lines: Vec<_> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(10)
            .collect();

        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &DELIMITER_CANDIDATES {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::ScalarType;

    #[test]
    fn test_parse_simple_csv() {
        let content = "product,units,revenue\nLaptop,1,1200\nMouse,2,50";
        let dataset = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_names(), vec!["product", "units", "revenue"]);
        assert_eq!(dataset.column(0).unwrap().kind(), ScalarType::Text);
        assert_eq!(dataset.column(2).unwrap().number_at(0), Some(1200.0));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvParser::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(CsvParser::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(CsvParser::detect_delimiter("a\tb\nc\td"), b'\t');
        assert_eq!(CsvParser::detect_delimiter("notes\nhello"), b',');
    }

    #[test]
    fn test_semicolon_file_with_decimal_commas() {
        let bytes = "Fecha;Producto;Ventas\n01/02/2024;Teclado;80,50\n02/02/2024;Mouse;25".as_bytes();
        let dataset = CsvParser::parse_bytes_auto_detect(bytes).unwrap();

        assert_eq!(dataset.column_count(), 3);
        assert_eq!(dataset.column(0).unwrap().kind(), ScalarType::Date);
        assert_eq!(dataset.column(2).unwrap().number_at(0), Some(80.5));
    }

    #[test]
    fn test_decode_strips_bom_and_falls_back_to_windows_1252() {
        assert_eq!(CsvParser::decode(b"\xEF\xBB\xBFsales"), "sales");
        // "Región" encoded as Windows-1252
        assert_eq!(CsvParser::decode(b"Regi\xF3n"), "Región");
    }

    #[test]
    fn test_empty_content_is_a_format_error() {
        let err = CsvParser::new().parse_content("  \n").unwrap_err();
        assert!(matches!(err, AppError::FileFormat(_)));
    }

    #[test]
    fn test_header_only_file_has_zero_rows() {
        let dataset = CsvParser::new().parse_content("date,product,sales\n").unwrap();
        assert_eq!(dataset.row_count(), 0);
        assert_eq!(dataset.column_count(), 3);
    }
}

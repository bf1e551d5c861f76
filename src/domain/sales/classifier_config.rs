// ============================================================
// CLASSIFIER CONFIGURATION
// ============================================================
// Thresholds for column role detection

use serde::{Deserialize, Serialize};

/// Configuration for column role classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Maximum number of rows inspected per column (default: 1000)
    pub sample_rows: usize,

    /// Minimum score for a role candidate to be considered (default: 0.2)
    pub min_confidence: f32,

    /// Distinct/non-empty ratio above which text looks like customers or
    /// products (default: 0.5)
    pub high_cardinality_ratio: f32,

    /// Maximum distinct values for text to look like regions or shipping
    /// methods (default: 20)
    pub low_cardinality_max: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_rows: 1000,
            min_confidence: 0.2,
            high_cardinality_ratio: 0.5,
            low_cardinality_max: 20,
        }
    }
}

impl ClassifierConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rows == 0 {
            return Err("sample_rows must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.high_cardinality_ratio) {
            return Err("high_cardinality_ratio must be between 0.0 and 1.0".to_string());
        }
        if self.low_cardinality_max == 0 {
            return Err("low_cardinality_max must be > 0".to_string());
        }
        Ok(())
    }
}

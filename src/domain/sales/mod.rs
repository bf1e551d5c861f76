// ============================================================
// SALES DOMAIN LAYER
// ============================================================
// Core types for sales datasets, column roles and insights
// No I/O, no async

mod analysis;
mod cell_value;
mod classifier_config;
mod column_profile;
mod column_role;
mod dataset;
mod insight;

pub use analysis::SalesAnalysis;
pub use cell_value::{excel_serial_to_date, parse_date, CellValue, ScalarType};
pub use classifier_config::ClassifierConfig;
pub use column_profile::{ColumnProfile, RoleMap};
pub use column_role::ColumnRole;
pub use dataset::{Column, Dataset};
pub use insight::{
    InsightKind, InsightRow, InsightSet, InsightTable, SummaryMetrics, TimeGranularity,
};

use super::{ColumnProfile, Dataset, InsightSet, RoleMap, SummaryMetrics};
use chrono::{DateTime, Local};

/// Everything derived from one uploaded file.
///
/// Profiles and insights are only valid for the dataset they were built
/// from, so the bundle is always replaced as a whole.
#[derive(Debug, Clone)]
pub struct SalesAnalysis {
    pub source_name: String,
    pub dataset: Dataset,
    pub profiles: Vec<ColumnProfile>,
    pub insights: InsightSet,
    pub metrics: SummaryMetrics,
    pub analyzed_at: DateTime<Local>,
}

impl SalesAnalysis {
    pub fn roles(&self) -> RoleMap {
        RoleMap::from_profiles(&self.profiles)
    }
}

// ============================================================
// COLUMN PROFILES
// ============================================================
// Classifier output: one profile per dataset column

use super::{ColumnRole, ScalarType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification result for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Position of the column in the dataset (0-based)
    pub index: usize,

    /// Column header as loaded
    pub name: String,

    /// Winning role, or `Unclassified`
    pub role: ColumnRole,

    /// Confidence of the role assignment (0.0 - 1.0)
    pub confidence: f32,

    /// Inferred scalar type of the column
    pub scalar_type: ScalarType,

    /// Distinct non-empty values in the inspected sample
    pub distinct_count: usize,

    /// Empty cells in the inspected sample
    pub empty_count: usize,

    /// First few non-empty values, rendered as text
    pub preview: Vec<String>,
}

/// Lookup from assigned role to column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMap {
    columns: BTreeMap<ColumnRole, usize>,
}

impl RoleMap {
    pub fn from_profiles(profiles: &[ColumnProfile]) -> Self {
        let columns = profiles
            .iter()
            .filter(|profile| profile.role.is_assigned())
            .map(|profile| (profile.role, profile.index))
            .collect();
        Self { columns }
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    /// Roles from `required` that have no column.
    pub fn missing(&self, required: &[ColumnRole]) -> Vec<ColumnRole> {
        required
            .iter()
            .copied()
            .filter(|role| !self.contains(*role))
            .collect()
    }
}

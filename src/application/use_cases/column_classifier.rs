// ============================================================
// COLUMN CLASSIFIER
// ============================================================
// Assign a semantic role to every dataset column from its header
// and, when the header says nothing useful, from its values

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::application::use_cases::role_keywords::{
    is_free_text_header, is_identifier_header, name_score, normalize_header, ROLE_KEYWORDS,
};
use crate::domain::sales::{
    CellValue, ClassifierConfig, Column, ColumnProfile, ColumnRole, Dataset, ScalarType,
};

/// Name scores at or above this settle the column without looking at values
const CONCLUSIVE_NAME_SCORE: f32 = 0.5;

/// Penalty factor when a column's type does not fit the role
const TYPE_MISMATCH_FACTOR: f32 = 0.5;

/// Text averaging more characters than this reads as free text
const NARRATIVE_AVG_LENGTH: f32 = 30.0;

/// Text averaging at least this many words per value reads as free text
const NARRATIVE_AVG_WORDS: f32 = 4.0;

const PREVIEW_LEN: usize = 5;

/// A scored (column, role) pairing before assignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleCandidate {
    pub column: usize,
    pub role: ColumnRole,
    pub score: f32,
}

/// Statistics over the inspected sample of one column
#[derive(Debug, Clone, Default)]
struct ColumnSample {
    non_empty: usize,
    empty: usize,
    distinct: usize,
    avg_length: f32,
    avg_words: f32,
    has_fraction: bool,
    max_abs: f64,
    preview: Vec<String>,
}

impl ColumnSample {
    fn collect(column: &Column, limit: usize) -> Self {
        let mut sample = ColumnSample::default();
        let mut distinct = HashSet::new();
        let mut total_length = 0usize;
        let mut total_words = 0usize;

        for cell in column.cells().iter().take(limit) {
            let Some(text) = cell.to_text() else {
                sample.empty += 1;
                continue;
            };

            sample.non_empty += 1;
            total_length += text.chars().count();
            total_words += text.split_whitespace().count();

            if let CellValue::Number(value) = cell {
                sample.has_fraction |= value.fract() != 0.0;
                sample.max_abs = sample.max_abs.max(value.abs());
            }

            if sample.preview.len() < PREVIEW_LEN {
                sample.preview.push(text.clone());
            }
            distinct.insert(text);
        }

        sample.distinct = distinct.len();
        if sample.non_empty > 0 {
            sample.avg_length = total_length as f32 / sample.non_empty as f32;
            sample.avg_words = total_words as f32 / sample.non_empty as f32;
        }
        sample
    }

    fn distinct_ratio(&self) -> f32 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.distinct as f32 / self.non_empty as f32
        }
    }

    fn is_narrative(&self) -> bool {
        self.avg_length > NARRATIVE_AVG_LENGTH || self.avg_words >= NARRATIVE_AVG_WORDS
    }
}

/// Heuristic column role classifier
pub struct ColumnClassifier {
    config: ClassifierConfig,
}

impl ColumnClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify every column of the dataset.
    ///
    /// Candidates are accepted by score descending, then column order,
    /// then role order; each role and each column is used at most once.
    /// Columns left over are `Unclassified` with confidence 0.
    pub fn classify(&self, dataset: &Dataset) -> Vec<ColumnProfile> {
        let samples: Vec<ColumnSample> = dataset
            .columns()
            .iter()
            .map(|column| ColumnSample::collect(column, self.config.sample_rows))
            .collect();

        let assignments = assign(
            self.candidates_with_samples(dataset, &samples),
            dataset.column_count(),
        );

        let profiles: Vec<ColumnProfile> = dataset
            .columns()
            .iter()
            .zip(samples)
            .enumerate()
            .map(|(index, (column, sample))| {
                let (role, confidence) = assignments[index]
                    .map(|c| (c.role, c.score))
                    .unwrap_or((ColumnRole::Unclassified, 0.0));

                ColumnProfile {
                    index,
                    name: column.name().to_string(),
                    role,
                    confidence,
                    scalar_type: column.kind(),
                    distinct_count: sample.distinct,
                    empty_count: sample.empty,
                    preview: sample.preview,
                }
            })
            .collect();

        debug!(
            columns = profiles.len(),
            assigned = profiles.iter().filter(|p| p.role.is_assigned()).count(),
            "Classified columns"
        );

        profiles
    }

    /// All role candidates above the confidence floor, unordered
    #[cfg(test)]
    pub fn candidates(&self, dataset: &Dataset) -> Vec<RoleCandidate> {
        let samples: Vec<ColumnSample> = dataset
            .columns()
            .iter()
            .map(|column| ColumnSample::collect(column, self.config.sample_rows))
            .collect();
        self.candidates_with_samples(dataset, &samples)
    }

    fn candidates_with_samples(
        &self,
        dataset: &Dataset,
        samples: &[ColumnSample],
    ) -> Vec<RoleCandidate> {
        dataset
            .columns()
            .iter()
            .zip(samples)
            .enumerate()
            .flat_map(|(index, (column, sample))| self.score_column(index, column, sample))
            .filter(|candidate| candidate.score >= self.config.min_confidence)
            .collect()
    }

    fn score_column(&self, index: usize, column: &Column, sample: &ColumnSample) -> Vec<RoleCandidate> {
        let header = normalize_header(column.name());

        let name_scores: Vec<(ColumnRole, f32)> = ROLE_KEYWORDS
            .iter()
            .map(|keywords| (keywords.role, name_score(&header, keywords)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        let best_name = name_scores
            .iter()
            .map(|(_, score)| *score)
            .fold(0.0f32, f32::max);

        let scores = if best_name >= CONCLUSIVE_NAME_SCORE
            || is_identifier_header(&header)
            || is_free_text_header(&header)
        {
            name_scores
        } else {
            let mut merged = name_scores;
            for (role, score) in self.value_shape_scores(column.kind(), sample) {
                match merged.iter_mut().find(|(existing, _)| *existing == role) {
                    Some(entry) => entry.1 = entry.1.max(score),
                    None => merged.push((role, score)),
                }
            }
            merged
        };

        scores
            .into_iter()
            .map(|(role, score)| RoleCandidate {
                column: index,
                role,
                score: (score * type_compatibility(role, column.kind())).clamp(0.0, 1.0),
            })
            .collect()
    }

    fn value_shape_scores(&self, kind: ScalarType, sample: &ColumnSample) -> Vec<(ColumnRole, f32)> {
        match kind {
            ScalarType::Date => vec![(ColumnRole::Date, 0.5)],
            ScalarType::Numeric => {
                if sample.has_fraction || sample.max_abs >= 1000.0 {
                    vec![(ColumnRole::Sales, 0.4), (ColumnRole::Quantity, 0.2)]
                } else {
                    vec![(ColumnRole::Quantity, 0.35), (ColumnRole::Sales, 0.3)]
                }
            }
            ScalarType::Text => {
                if sample.is_narrative() {
                    Vec::new()
                } else if sample.distinct_ratio() > self.config.high_cardinality_ratio {
                    vec![(ColumnRole::Customer, 0.3), (ColumnRole::Product, 0.25)]
                } else if sample.distinct <= self.config.low_cardinality_max {
                    vec![(ColumnRole::Region, 0.3), (ColumnRole::ShippingMethod, 0.2)]
                } else {
                    Vec::new()
                }
            }
            ScalarType::Empty => Vec::new(),
        }
    }
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Greedy assignment: highest score first, first column wins ties
fn assign(mut candidates: Vec<RoleCandidate>, column_count: usize) -> Vec<Option<RoleCandidate>> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.column.cmp(&b.column))
            .then(a.role.cmp(&b.role))
    });

    let mut assigned: Vec<Option<RoleCandidate>> = vec![None; column_count];
    let mut taken_roles: HashSet<ColumnRole> = HashSet::new();

    for candidate in candidates {
        if taken_roles.contains(&candidate.role) || assigned[candidate.column].is_some() {
            continue;
        }
        taken_roles.insert(candidate.role);
        assigned[candidate.column] = Some(candidate);
    }

    assigned
}

fn type_compatibility(role: ColumnRole, kind: ScalarType) -> f32 {
    match (role.expected_type(), kind) {
        (_, ScalarType::Empty) => 1.0,
        (Some(expected), actual) if expected == actual => 1.0,
        (Some(_), _) => TYPE_MISMATCH_FACTOR,
        (None, _) => 0.0,
    }
}

// ============================================================
// INSIGHT GENERATOR
// ============================================================
// Ranked aggregates over a classified dataset

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::domain::sales::{
    Column, ColumnProfile, ColumnRole, Dataset, InsightKind, InsightRow, InsightSet,
    InsightTable, RoleMap, SummaryMetrics, TimeGranularity,
};

pub const DEFAULT_TOP_N: usize = 10;

/// Date spans shorter than this are bucketed per day
const DAILY_SPAN_DAYS: i64 = 60;

/// Date spans shorter than this (about 18 months) are bucketed per week
const WEEKLY_SPAN_DAYS: i64 = 548;

/// Sums values per label while remembering first-occurrence order
#[derive(Default)]
struct GroupTotals {
    index: HashMap<String, usize>,
    groups: Vec<InsightRow>,
}

impl GroupTotals {
    fn add(&mut self, label: String, value: f64) {
        match self.index.get(&label) {
            Some(&position) => {
                let row = &mut self.groups[position];
                row.value += value;
                row.count += 1;
            }
            None => {
                self.index.insert(label.clone(), self.groups.len());
                self.groups.push(InsightRow {
                    label,
                    value,
                    count: 1,
                });
            }
        }
    }

    /// Stable sort by value descending so equal values keep row order
    fn ranked(mut self, top_n: usize) -> Vec<InsightRow> {
        self.groups.sort_by(|a, b| b.value.total_cmp(&a.value));
        self.groups.truncate(top_n);
        self.groups
    }
}

/// Computes insight tables and summary metrics from column roles
pub struct InsightGenerator {
    top_n: usize,
}

impl InsightGenerator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Compute every insight whose roles are present.
    ///
    /// Without a Sales column nothing is produced. Insights that end up
    /// with no rows are left out.
    pub fn generate(&self, dataset: &Dataset, profiles: &[ColumnProfile]) -> InsightSet {
        let roles = RoleMap::from_profiles(profiles);
        let mut insights = InsightSet::default();

        if !roles.contains(ColumnRole::Sales) {
            debug!("No sales column detected, skipping insights");
            return insights;
        }

        for kind in InsightKind::ALL {
            let missing = roles.missing(kind.required_roles());
            if !missing.is_empty() {
                debug!(insight = %kind, ?missing, "Insight skipped, roles missing");
                continue;
            }

            if let Some(table) = self.compute(kind, dataset, &roles) {
                if !table.is_empty() {
                    insights.insert(kind, table);
                }
            }
        }

        debug!(count = insights.len(), "Generated insights");
        insights
    }

    /// Headline numbers; role-dependent fields are `None` without the role
    pub fn summarize(&self, dataset: &Dataset, profiles: &[ColumnProfile]) -> SummaryMetrics {
        let roles = RoleMap::from_profiles(profiles);
        let column_for = move |role| roles.get(role).and_then(|index| dataset.column(index));

        let sales_values: Option<Vec<f64>> = column_for(ColumnRole::Sales)
            .map(|column| column.cells().iter().filter_map(|cell| cell.as_number()).collect());

        let total_sales = sales_values.as_ref().map(|values| values.iter().sum::<f64>());
        let average_sales = sales_values.as_ref().and_then(|values| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        });

        SummaryMetrics {
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            total_sales,
            average_sales,
            unique_products: column_for(ColumnRole::Product).map(Column::distinct_count),
            unique_regions: column_for(ColumnRole::Region).map(Column::distinct_count),
        }
    }

    fn compute(&self, kind: InsightKind, dataset: &Dataset, roles: &RoleMap) -> Option<InsightTable> {
        let column = move |role| roles.get(role).and_then(|index| dataset.column(index));
        let sales = column(ColumnRole::Sales)?;

        let table = match kind {
            InsightKind::TopProducts => self.ranked_sum(column(ColumnRole::Product)?, sales),
            InsightKind::TopCustomers => self.ranked_sum(column(ColumnRole::Customer)?, sales),
            InsightKind::TopRegions => self.ranked_sum(column(ColumnRole::Region)?, sales),
            InsightKind::SalesByShippingMethod => {
                self.ranked_sum(column(ColumnRole::ShippingMethod)?, sales)
            }
            InsightKind::ProfitByProduct => {
                self.ranked_sum(column(ColumnRole::Product)?, column(ColumnRole::Profit)?)
            }
            InsightKind::UnitsByProduct => {
                self.ranked_sum(column(ColumnRole::Product)?, column(ColumnRole::Quantity)?)
            }
            InsightKind::SalesOverTime => sales_over_time(column(ColumnRole::Date)?, sales),
            InsightKind::DiscountVsSales => discount_vs_sales(column(ColumnRole::Discount)?, sales),
        };

        Some(table)
    }

    fn ranked_sum(&self, labels: &Column, values: &Column) -> InsightTable {
        let mut totals = GroupTotals::default();

        for row in 0..labels.len() {
            let (Some(label), Some(value)) = (labels.label_at(row), values.number_at(row)) else {
                continue;
            };
            totals.add(label, value);
        }

        InsightTable {
            label_header: labels.name().to_string(),
            value_header: values.name().to_string(),
            granularity: None,
            rows: totals.ranked(self.top_n),
        }
    }
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

/// Pick the bucket size from the span between first and last date
pub fn granularity_for_span(first: NaiveDate, last: NaiveDate) -> TimeGranularity {
    let span = (last - first).num_days();
    if span < DAILY_SPAN_DAYS {
        TimeGranularity::Day
    } else if span < WEEKLY_SPAN_DAYS {
        TimeGranularity::Week
    } else {
        TimeGranularity::Month
    }
}

/// First day of the bucket holding `date`
fn bucket_start(date: NaiveDate, granularity: TimeGranularity) -> NaiveDate {
    match granularity {
        TimeGranularity::Day => date,
        TimeGranularity::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        TimeGranularity::Month => date.with_day(1).unwrap_or(date),
    }
}

fn bucket_label(start: NaiveDate, granularity: TimeGranularity) -> String {
    match granularity {
        TimeGranularity::Day | TimeGranularity::Week => start.format("%Y-%m-%d").to_string(),
        TimeGranularity::Month => start.format("%Y-%m").to_string(),
    }
}

fn sales_over_time(dates: &Column, sales: &Column) -> InsightTable {
    let points: Vec<(NaiveDate, f64)> = (0..dates.len())
        .filter_map(|row| Some((dates.date_at(row)?, sales.number_at(row)?)))
        .collect();

    let first = points.iter().map(|(date, _)| *date).min();
    let last = points.iter().map(|(date, _)| *date).max();
    let granularity = match (first, last) {
        (Some(first), Some(last)) => granularity_for_span(first, last),
        _ => TimeGranularity::Day,
    };

    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value) in points {
        let entry = buckets.entry(bucket_start(date, granularity)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    InsightTable {
        label_header: dates.name().to_string(),
        value_header: sales.name().to_string(),
        granularity: Some(granularity),
        rows: buckets
            .into_iter()
            .map(|(start, (value, count))| InsightRow {
                label: bucket_label(start, granularity),
                value,
                count,
            })
            .collect(),
    }
}

fn discount_vs_sales(discounts: &Column, sales: &Column) -> InsightTable {
    // Keyed by hundredths so levels sort numerically
    let mut levels: BTreeMap<i64, (f64, usize)> = BTreeMap::new();

    for row in 0..discounts.len() {
        let (Some(discount), Some(value)) = (discounts.number_at(row), sales.number_at(row)) else {
            continue;
        };
        let entry = levels.entry((discount * 100.0).round() as i64).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    InsightTable {
        label_header: discounts.name().to_string(),
        value_header: format!("Average {}", sales.name()),
        granularity: None,
        rows: levels
            .into_iter()
            .map(|(level, (total, count))| InsightRow {
                label: format!("{:.2}", level as f64 / 100.0),
                value: total / count as f64,
                count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::column_classifier::ColumnClassifier;
    use crate::domain::sales::CellValue;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| CellValue::from_raw(v)).collect())
                .collect(),
        )
    }

    fn analyze(data: &Dataset) -> InsightSet {
        let profiles = ColumnClassifier::default().classify(data);
        InsightGenerator::default().generate(data, &profiles)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_layout_produces_ranked_products() {
        let data = dataset(
            &["date", "product", "region", "units", "revenue"],
            &[
                &["2024-01-01", "Mouse", "North", "3", "75"],
                &["2024-01-02", "Laptop", "South", "1", "1200"],
                &["2024-01-03", "Laptop", "North", "2", "2400"],
            ],
        );
        let insights = analyze(&data);

        let products = insights.get(InsightKind::TopProducts).unwrap();
        assert!(products.rows.len() <= 3);
        assert_eq!(products.labels(), vec!["Laptop", "Mouse"]);
        assert_eq!(products.values(), vec![3600.0, 75.0]);
        assert_eq!(products.rows[0].count, 2);

        let units = insights.get(InsightKind::UnitsByProduct).unwrap();
        assert_eq!(units.values(), vec![3.0, 3.0]);
        // Equal totals keep first-occurrence order
        assert_eq!(units.labels(), vec!["Mouse", "Laptop"]);

        assert!(insights.contains(InsightKind::TopRegions));
        assert!(insights.contains(InsightKind::SalesOverTime));
        assert!(!insights.contains(InsightKind::TopCustomers));
        assert!(!insights.contains(InsightKind::DiscountVsSales));
    }

    #[test]
    fn test_no_sales_column_means_no_insights() {
        let data = dataset(
            &["notes"],
            &[&["Customer asked for a callback next week, follow up on Monday"]],
        );
        assert!(analyze(&data).is_empty());
    }

    #[test]
    fn test_zero_rows_yield_empty_insights() {
        let data = dataset(&["date", "product", "sales"], &[]);
        assert!(analyze(&data).is_empty());
    }

    #[test]
    fn test_top_n_limits_ranked_tables() {
        let rows: Vec<Vec<String>> = (0..15)
            .map(|i| vec![format!("P{}", i), format!("{}", i * 10)])
            .collect();
        let data = Dataset::from_rows(
            vec!["product".to_string(), "sales".to_string()],
            rows.iter()
                .map(|row| row.iter().map(|v| CellValue::from_raw(v)).collect())
                .collect(),
        );
        let profiles = ColumnClassifier::default().classify(&data);
        let insights = InsightGenerator::new(5).generate(&data, &profiles);

        let products = insights.get(InsightKind::TopProducts).unwrap();
        assert_eq!(products.rows.len(), 5);
        assert_eq!(products.rows[0].label, "P14");
    }

    #[test]
    fn test_blank_labels_and_values_are_skipped() {
        let data = dataset(
            &["customer", "sales"],
            &[&["Ana", "10"], &["", "50"], &["Luis", ""], &["Ana", "5"]],
        );
        let customers = analyze(&data);
        let customers = customers.get(InsightKind::TopCustomers).unwrap();

        assert_eq!(customers.labels(), vec!["Ana"]);
        assert_eq!(customers.values(), vec![15.0]);
    }

    #[test]
    fn test_discount_levels_average_sales() {
        let data = dataset(
            &["discount", "sales"],
            &[&["0.1", "100"], &["0", "40"], &["0.10", "300"], &["0.2", "50"]],
        );
        let insights = analyze(&data);
        let table = insights.get(InsightKind::DiscountVsSales).unwrap();

        assert_eq!(table.labels(), vec!["0.00", "0.10", "0.20"]);
        assert_eq!(table.values(), vec![40.0, 200.0, 50.0]);
        assert_eq!(table.rows[1].count, 2);
    }

    #[test]
    fn test_granularity_follows_date_span() {
        assert_eq!(
            granularity_for_span(date(2024, 1, 1), date(2024, 2, 1)),
            TimeGranularity::Day
        );
        assert_eq!(
            granularity_for_span(date(2024, 1, 1), date(2024, 6, 1)),
            TimeGranularity::Week
        );
        assert_eq!(
            granularity_for_span(date(2022, 1, 1), date(2024, 6, 1)),
            TimeGranularity::Month
        );
    }

    #[test]
    fn test_weekly_buckets_are_labelled_by_monday() {
        let data = dataset(
            &["date", "sales"],
            &[
                // Wednesday and Friday of the same week
                &["2024-01-03", "10"],
                &["2024-01-05", "20"],
                &["2024-04-10", "5"],
            ],
        );
        let insights = analyze(&data);
        let table = insights.get(InsightKind::SalesOverTime).unwrap();

        assert_eq!(table.granularity, Some(TimeGranularity::Week));
        assert_eq!(table.labels(), vec!["2024-01-01", "2024-04-08"]);
        assert_eq!(table.values(), vec![30.0, 5.0]);
    }

    #[test]
    fn test_monthly_buckets_are_chronological() {
        let data = dataset(
            &["date", "sales"],
            &[&["2024-03-15", "1"], &["2022-01-20", "2"], &["2022-01-02", "3"]],
        );
        let insights = analyze(&data);
        let table = insights.get(InsightKind::SalesOverTime).unwrap();

        assert_eq!(table.labels(), vec!["2022-01", "2024-03"]);
        assert_eq!(table.values(), vec![5.0, 1.0]);
    }

    #[test]
    fn test_summary_metrics() {
        let data = dataset(
            &["product", "region", "sales"],
            &[&["A", "North", "10"], &["B", "North", "30"], &["A", "South", ""]],
        );
        let profiles = ColumnClassifier::default().classify(&data);
        let metrics = InsightGenerator::default().summarize(&data, &profiles);

        assert_eq!(metrics.row_count, 3);
        assert_eq!(metrics.column_count, 3);
        assert_eq!(metrics.total_sales, Some(40.0));
        assert_eq!(metrics.average_sales, Some(20.0));
        assert_eq!(metrics.unique_products, Some(2));
        assert_eq!(metrics.unique_regions, Some(2));
    }

    #[test]
    fn test_summary_without_roles() {
        let data = dataset(&["notes"], &[&["a rather long remark that is clearly free text"]]);
        let profiles = ColumnClassifier::default().classify(&data);
        let metrics = InsightGenerator::default().summarize(&data, &profiles);

        assert_eq!(metrics.total_sales, None);
        assert_eq!(metrics.average_sales, None);
        assert_eq!(metrics.unique_products, None);
    }
}

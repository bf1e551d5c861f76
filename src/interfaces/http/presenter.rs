// ============================================================
// CHART PRESENTER
// ============================================================
// Shape analyses into JSON the dashboard page renders directly

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::sales::{
    CellValue, ColumnProfile, ColumnRole, InsightKind, SalesAnalysis, SummaryMetrics,
};
use crate::infrastructure::session_store::{SessionSnapshot, SessionState};
use crate::shared::number_format::{format_amount, format_count};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
}

impl MetricCard {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// One chart slot on the dashboard.
///
/// A missing prerequisite is reported as data, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartEntry {
    Ready {
        insight: InsightKind,
        title: String,
        chart_type: &'static str,
        labels: Vec<String>,
        values: Vec<f64>,
        x_title: String,
        y_title: String,
    },
    InsufficientData {
        insight: InsightKind,
        title: String,
        missing_roles: Vec<ColumnRole>,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub generation: u64,
    pub source_name: Option<String>,
    pub row_count: Option<usize>,
    pub column_count: Option<usize>,
    pub loaded_at: Option<DateTime<Local>>,
    pub columns: Vec<ColumnProfile>,
    pub metrics: Vec<MetricCard>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub source_name: String,
    pub generation: u64,
    pub metrics: Vec<MetricCard>,
    pub charts: Vec<ChartEntry>,
}

#[derive(Debug, Serialize)]
pub struct DataPage<'a> {
    pub columns: Vec<&'a str>,
    pub offset: usize,
    pub limit: usize,
    pub total_rows: usize,
    pub rows: Vec<Vec<&'a CellValue>>,
}

fn chart_type(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::SalesOverTime => "line",
        InsightKind::TopRegions => "pie",
        InsightKind::DiscountVsSales => "scatter",
        _ => "bar",
    }
}

pub fn metric_cards(metrics: &SummaryMetrics) -> Vec<MetricCard> {
    let mut cards = vec![
        MetricCard::new("Records", format_count(metrics.row_count)),
        MetricCard::new("Columns", format_count(metrics.column_count)),
    ];
    if let Some(total) = metrics.total_sales {
        cards.push(MetricCard::new("Total Sales", format_amount(total)));
    }
    if let Some(average) = metrics.average_sales {
        cards.push(MetricCard::new("Average Sale", format_amount(average)));
    }
    if let Some(products) = metrics.unique_products {
        cards.push(MetricCard::new("Unique Products", format_count(products)));
    }
    if let Some(regions) = metrics.unique_regions {
        cards.push(MetricCard::new("Regions", format_count(regions)));
    }
    cards
}

pub fn chart_entry(kind: InsightKind, analysis: &SalesAnalysis) -> ChartEntry {
    match analysis.insights.get(kind) {
        Some(table) => ChartEntry::Ready {
            insight: kind,
            title: kind.title().to_string(),
            chart_type: chart_type(kind),
            labels: table.labels(),
            values: table.values(),
            x_title: table.label_header.clone(),
            y_title: table.value_header.clone(),
        },
        None => {
            let missing_roles = analysis.roles().missing(kind.required_roles());
            let message = if missing_roles.is_empty() {
                "Not enough rows to compute this insight".to_string()
            } else {
                let names: Vec<&str> = missing_roles.iter().map(|role| role.as_str()).collect();
                format!("No column detected for: {}", names.join(", "))
            };
            ChartEntry::InsufficientData {
                insight: kind,
                title: kind.title().to_string(),
                missing_roles,
                message,
            }
        }
    }
}

pub fn dashboard(analysis: &SalesAnalysis, generation: u64) -> DashboardView {
    DashboardView {
        source_name: analysis.source_name.clone(),
        generation,
        metrics: metric_cards(&analysis.metrics),
        charts: InsightKind::ALL
            .iter()
            .map(|kind| chart_entry(*kind, analysis))
            .collect(),
    }
}

pub fn session_view(snapshot: Option<SessionSnapshot>, analysis: Option<&SalesAnalysis>) -> SessionView {
    let snapshot = snapshot.unwrap_or(SessionSnapshot {
        id: String::new(),
        state: SessionState::Empty,
        generation: 0,
        source_name: None,
        row_count: None,
        column_count: None,
        loaded_at: None,
    });

    SessionView {
        state: snapshot.state,
        generation: snapshot.generation,
        source_name: snapshot.source_name,
        row_count: snapshot.row_count,
        column_count: snapshot.column_count,
        loaded_at: snapshot.loaded_at,
        columns: analysis.map(|a| a.profiles.clone()).unwrap_or_default(),
        metrics: analysis.map(|a| metric_cards(&a.metrics)).unwrap_or_default(),
    }
}

pub fn data_page(analysis: &SalesAnalysis, offset: usize, limit: usize) -> DataPage<'_> {
    let dataset = &analysis.dataset;
    let end = offset.saturating_add(limit).min(dataset.row_count());

    DataPage {
        columns: dataset.column_names(),
        offset,
        limit,
        total_rows: dataset.row_count(),
        rows: (offset..end).filter_map(|index| dataset.row(index)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::sales_analysis::SalesAnalysisUseCase;
    use crate::domain::sales::ClassifierConfig;

    fn sample() -> SalesAnalysis {
        SalesAnalysisUseCase::new(ClassifierConfig::default(), 10)
            .execute_sample()
            .unwrap()
    }

    #[test]
    fn test_metric_cards_for_sample() {
        let cards = metric_cards(&sample().metrics);
        let labels: Vec<&str> = cards.iter().map(|c| c.label.as_str()).collect();

        assert_eq!(
            labels,
            vec!["Records", "Columns", "Total Sales", "Average Sale", "Unique Products", "Regions"]
        );
        assert_eq!(cards[2].value, "$2,855.00");
        assert_eq!(cards[3].value, "$571.00");
    }

    #[test]
    fn test_ready_and_insufficient_entries() {
        let analysis = sample();

        match chart_entry(InsightKind::TopProducts, &analysis) {
            ChartEntry::Ready { labels, values, chart_type, .. } => {
                assert_eq!(labels[0], "Laptop");
                assert_eq!(values[0], 2400.0);
                assert_eq!(chart_type, "bar");
            }
            other => panic!("expected ready chart, got {:?}", other),
        }

        match chart_entry(InsightKind::TopCustomers, &analysis) {
            ChartEntry::InsufficientData { missing_roles, .. } => {
                assert_eq!(missing_roles, vec![ColumnRole::Customer]);
            }
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_entry_serializes_with_status_tag() {
        let json = serde_json::to_value(chart_entry(InsightKind::DiscountVsSales, &sample())).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["insight"], "discount_vs_sales");
        assert_eq!(json["missing_roles"][0], "discount");
    }

    #[test]
    fn test_dashboard_has_one_chart_per_kind() {
        let view = dashboard(&sample(), 1);
        assert_eq!(view.charts.len(), InsightKind::ALL.len());
        assert_eq!(view.source_name, "sample.csv");
    }

    #[test]
    fn test_data_page_bounds() {
        let analysis = sample();
        let page = data_page(&analysis, 3, 10);

        assert_eq!(page.total_rows, 5);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.columns, vec!["Fecha", "Producto", "Ventas", "Región"]);
        assert!(data_page(&analysis, 50, 10).rows.is_empty());
    }
}

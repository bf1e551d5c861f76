// ============================================================
// INSIGHT TYPES
// ============================================================
// Aggregated results derived from a classified dataset

use super::ColumnRole;
use crate::domain::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Named aggregate the insight generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    TopProducts,
    TopCustomers,
    TopRegions,
    SalesOverTime,
    DiscountVsSales,
    SalesByShippingMethod,
    ProfitByProduct,
    UnitsByProduct,
}

impl InsightKind {
    pub const ALL: [InsightKind; 8] = [
        InsightKind::TopProducts,
        InsightKind::TopCustomers,
        InsightKind::TopRegions,
        InsightKind::SalesOverTime,
        InsightKind::DiscountVsSales,
        InsightKind::SalesByShippingMethod,
        InsightKind::ProfitByProduct,
        InsightKind::UnitsByProduct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::TopProducts => "top_products",
            InsightKind::TopCustomers => "top_customers",
            InsightKind::TopRegions => "top_regions",
            InsightKind::SalesOverTime => "sales_over_time",
            InsightKind::DiscountVsSales => "discount_vs_sales",
            InsightKind::SalesByShippingMethod => "sales_by_shipping_method",
            InsightKind::ProfitByProduct => "profit_by_product",
            InsightKind::UnitsByProduct => "units_by_product",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InsightKind::TopProducts => "Top Products",
            InsightKind::TopCustomers => "Top Customers",
            InsightKind::TopRegions => "Sales by Region",
            InsightKind::SalesOverTime => "Sales over Time",
            InsightKind::DiscountVsSales => "Average Sales by Discount",
            InsightKind::SalesByShippingMethod => "Sales by Shipping Method",
            InsightKind::ProfitByProduct => "Most Profitable Products",
            InsightKind::UnitsByProduct => "Units Sold by Product",
        }
    }

    /// Roles that must be present for the insight to be computed.
    ///
    /// Sales is always listed: without it no insight is produced.
    pub fn required_roles(&self) -> &'static [ColumnRole] {
        match self {
            InsightKind::TopProducts => &[ColumnRole::Sales, ColumnRole::Product],
            InsightKind::TopCustomers => &[ColumnRole::Sales, ColumnRole::Customer],
            InsightKind::TopRegions => &[ColumnRole::Sales, ColumnRole::Region],
            InsightKind::SalesOverTime => &[ColumnRole::Sales, ColumnRole::Date],
            InsightKind::DiscountVsSales => &[ColumnRole::Sales, ColumnRole::Discount],
            InsightKind::SalesByShippingMethod => {
                &[ColumnRole::Sales, ColumnRole::ShippingMethod]
            }
            InsightKind::ProfitByProduct => {
                &[ColumnRole::Sales, ColumnRole::Product, ColumnRole::Profit]
            }
            InsightKind::UnitsByProduct => {
                &[ColumnRole::Sales, ColumnRole::Product, ColumnRole::Quantity]
            }
        }
    }
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InsightKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::NotFound(format!("Unknown insight '{}'", value)))
    }
}

/// Bucket size used for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Day,
    Week,
    Month,
}

/// One line of an insight result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRow {
    pub label: String,
    pub value: f64,
    /// Rows that contributed to this line
    pub count: usize,
}

/// Small ordered result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightTable {
    pub label_header: String,
    pub value_header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<TimeGranularity>,
    pub rows: Vec<InsightRow>,
}

impl InsightTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.value).collect()
    }
}

/// All insights computed for one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    insights: BTreeMap<InsightKind, InsightTable>,
}

impl InsightSet {
    pub fn insert(&mut self, kind: InsightKind, table: InsightTable) {
        self.insights.insert(kind, table);
    }

    pub fn get(&self, kind: InsightKind) -> Option<&InsightTable> {
        self.insights.get(&kind)
    }

    #[cfg(test)]
    pub fn contains(&self, kind: InsightKind) -> bool {
        self.insights.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }
}

/// Headline numbers shown above the charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub row_count: usize,
    pub column_count: usize,
    pub total_sales: Option<f64>,
    pub average_sales: Option<f64>,
    pub unique_products: Option<usize>,
    pub unique_regions: Option<usize>,
}

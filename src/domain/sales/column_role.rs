// ============================================================
// COLUMN ROLE ENUM
// ============================================================
// Semantic category a dataset column plays in sales analysis

use super::ScalarType;
use serde::{Deserialize, Serialize};

/// Semantic role detected for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Sales,
    Product,
    Customer,
    Region,
    Date,
    Quantity,
    Discount,
    ShippingMethod,
    Profit,
    Unclassified,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Sales => "sales",
            ColumnRole::Product => "product",
            ColumnRole::Customer => "customer",
            ColumnRole::Region => "region",
            ColumnRole::Date => "date",
            ColumnRole::Quantity => "quantity",
            ColumnRole::Discount => "discount",
            ColumnRole::ShippingMethod => "shipping_method",
            ColumnRole::Profit => "profit",
            ColumnRole::Unclassified => "unclassified",
        }
    }

    /// Scalar type a column holding this role is expected to have.
    pub fn expected_type(&self) -> Option<ScalarType> {
        match self {
            ColumnRole::Sales | ColumnRole::Quantity | ColumnRole::Discount | ColumnRole::Profit => {
                Some(ScalarType::Numeric)
            }
            ColumnRole::Date => Some(ScalarType::Date),
            ColumnRole::Product
            | ColumnRole::Customer
            | ColumnRole::Region
            | ColumnRole::ShippingMethod => Some(ScalarType::Text),
            ColumnRole::Unclassified => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, ColumnRole::Unclassified)
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub mod error;

// Sales dataset, roles and insights
pub mod sales;

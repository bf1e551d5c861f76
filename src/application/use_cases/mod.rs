pub mod column_classifier;
pub mod insight_generator;
pub mod role_keywords;
pub mod sales_analysis;

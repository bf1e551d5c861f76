use crate::application::use_cases::column_classifier::ColumnClassifier;
use crate::application::use_cases::insight_generator::InsightGenerator;
use crate::domain::error::Result;
use crate::domain::sales::{ClassifierConfig, Dataset, SalesAnalysis};
use crate::infrastructure::loader::{self, CsvParser};
use chrono::Local;
use tracing::info;

pub const SAMPLE_FILENAME: &str = "sample.csv";

const SAMPLE_CSV: &str = "\
Fecha,Producto,Ventas,Región
2024-01-01,Laptop,1200,Norte
2024-01-02,Mouse,25,Sur
2024-01-03,Teclado,80,Norte
2024-01-04,Monitor,350,Este
2024-01-05,Laptop,1200,Oeste
";

/// Load, classify and aggregate one uploaded file
pub struct SalesAnalysisUseCase {
    classifier: ColumnClassifier,
    generator: InsightGenerator,
}

impl SalesAnalysisUseCase {
    pub fn new(classifier_config: ClassifierConfig, top_n: usize) -> Self {
        Self {
            classifier: ColumnClassifier::new(classifier_config),
            generator: InsightGenerator::new(top_n),
        }
    }

    pub fn execute(&self, filename: &str, bytes: &[u8]) -> Result<SalesAnalysis> {
        let dataset = loader::load(filename, bytes)?;
        Ok(self.analyze(filename, dataset))
    }

    pub fn execute_sample(&self) -> Result<SalesAnalysis> {
        Ok(self.analyze(SAMPLE_FILENAME, sample_dataset()?))
    }

    pub fn analyze(&self, source_name: &str, dataset: Dataset) -> SalesAnalysis {
        let profiles = self.classifier.classify(&dataset);
        let insights = self.generator.generate(&dataset, &profiles);
        let metrics = self.generator.summarize(&dataset, &profiles);

        info!(
            source = source_name,
            rows = dataset.row_count(),
            insights = insights.len(),
            "Analyzed dataset"
        );

        SalesAnalysis {
            source_name: source_name.to_string(),
            dataset,
            profiles,
            insights,
            metrics,
            analyzed_at: Local::now(),
        }
    }
}

/// Small built-in dataset for trying the dashboard without a file
pub fn sample_dataset() -> Result<Dataset> {
    CsvParser::new().parse_content(SAMPLE_CSV)
}

//! # Financial KPI Engine
//!
//! A library for computing analyst-defined financial KPIs from the raw line items
//! of a company's fiscal-year filing.
//!
//! ## Core Concepts
//!
//! - **KPI Catalog**: Named formulas with a unit and a category, loaded once (e.g. from CSV)
//! - **Financial Snapshot**: `{fiscal year -> {account identifier -> amount}}` for one filing
//! - **Account Aliases**: One canonical identifier may be spelled differently across
//!   taxonomies (`ifrs-full_Revenue`, `dart_OperatingRevenue`, ...); aliases are tried in order
//! - **Time-Shifted References**: `Revenue[t-1]` reads the prior year's amount
//! - **Closed Grammar**: Formulas support `+ - * /`, unary signs, parentheses and `ABS(x)` only
//! - **Failure Isolation**: A KPI whose inputs are missing, divides by zero or uses an
//!   unsupported construct is omitted; the rest of the batch still computes
//!
//! ## Example
//!
//! ```rust
//! use financial_kpi_engine::*;
//!
//! let catalog = KpiCatalog::from_definitions(vec![KpiDefinition::new(
//!     "OperatingMargin",
//!     "OperatingIncome/Revenue",
//!     KpiUnit::Ratio,
//!     "Profitability",
//! )])
//! .unwrap();
//!
//! let mut snapshot = FinancialSnapshot::new();
//! snapshot.insert(2023, "OperatingIncome", 100);
//! snapshot.insert(2023, "Revenue", 1000);
//!
//! let report = compute_all(&catalog, 2023, &snapshot);
//! assert_eq!(report.total_kpi_count, 1);
//! assert_eq!(report.categories["Profitability"][0].value, "0.10");
//! ```

pub mod aliases;
pub mod binder;
pub mod catalog;
pub mod config;
pub mod dart;
pub mod engine;
pub mod error;
pub mod formula;
pub mod schema;
pub mod source;
pub mod utils;
pub mod validation;

pub use aliases::AccountAliasTable;
pub use binder::{bind, time_variable_name, BoundFormula};
pub use catalog::KpiCatalog;
pub use config::EngineConfig;
pub use engine::{compute_all, KpiEngine};
pub use error::{KpiError, Result};
pub use formula::{evaluate, parse_expression, BindingContext, Expr, Value};
pub use schema::*;
pub use source::{FetchOutcome, FinancialDataSource, ReportCode};
pub use utils::*;
pub use validation::{
    validate_and_format, Bound, ResultFormatter, RuleScope, SanityRule, ValidationPolicy,
    REVIEW_REQUIRED,
};

use log::info;
use std::path::Path;

/// Loads the catalog and configuration that a KPI service needs at startup.
/// A catalog that cannot be loaded is fatal: the engine cannot serve requests
/// without its formula definitions.
pub struct KpiEngineLoader;

impl KpiEngineLoader {
    pub fn load(catalog_path: impl AsRef<Path>, config: EngineConfig) -> Result<KpiEngine> {
        let catalog = KpiCatalog::from_csv_path(catalog_path)?;
        info!(
            "KPI engine ready: {} definitions, {} alias entries, {} sanity rules",
            catalog.len(),
            config.aliases.len(),
            config.validation.rules.len()
        );
        KpiEngine::new(catalog, config)
    }

    pub fn load_with_config_file(
        catalog_path: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
    ) -> Result<KpiEngine> {
        let config = EngineConfig::from_path(config_path)?;
        Self::load(catalog_path, config)
    }
}

/// Fetches one filing from `source` and computes every catalog KPI for it.
/// A filing without data produces an empty report rather than an error.
pub async fn compute_for_filing<S: FinancialDataSource>(
    engine: &KpiEngine,
    source: &S,
    corp_code: &str,
    fiscal_year: i32,
    report_code: ReportCode,
) -> Result<KpiReport> {
    let outcome = source.fetch(corp_code, fiscal_year, report_code).await?;
    let snapshot = outcome.into_snapshot();
    Ok(engine.compute_all(fiscal_year, &snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct StaticSource {
        outcome: FetchOutcome,
    }

    impl FinancialDataSource for StaticSource {
        async fn fetch(&self, _corp_code: &str, _fiscal_year: i32, _report_code: ReportCode) -> Result<FetchOutcome> {
            Ok(self.outcome.clone())
        }
    }

    fn engine() -> KpiEngine {
        let catalog = KpiCatalog::from_definitions(vec![KpiDefinition::new(
            "OperatingMargin",
            "OperatingIncome/Revenue",
            KpiUnit::Ratio,
            "Profitability",
        )])
        .unwrap();
        KpiEngine::with_default_config(catalog)
    }

    #[tokio::test]
    async fn test_compute_for_filing_with_data() {
        let mut snapshot = FinancialSnapshot::new();
        snapshot.insert(2023, "OperatingIncome", 250);
        snapshot.insert(2023, "Revenue", 1000);
        let source = StaticSource {
            outcome: FetchOutcome::Data(snapshot),
        };

        let report = compute_for_filing(&engine(), &source, "00760971", 2023, ReportCode::Annual)
            .await
            .unwrap();
        assert_eq!(report.get("OperatingMargin").unwrap().value, "0.25");
    }

    #[tokio::test]
    async fn test_compute_for_filing_without_data() {
        let source = StaticSource {
            outcome: FetchOutcome::NoData,
        };
        let report = compute_for_filing(&engine(), &source, "00760971", 2023, ReportCode::Annual)
            .await
            .unwrap();
        assert_eq!(report.total_kpi_count, 0);
        assert!(report.categories.is_empty());
    }

    #[test]
    fn test_loader_fails_without_catalog() {
        let result = KpiEngineLoader::load("/missing/catalog.csv", EngineConfig::default());
        assert!(matches!(result, Err(KpiError::CatalogLoad { .. })));
    }

    #[test]
    fn test_loader_reads_catalog_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("kpis.csv");
        let config_path = dir.path().join("engine.json");

        let mut file = std::fs::File::create(&catalog_path).unwrap();
        writeln!(file, "name,formula,unit,category").unwrap();
        writeln!(file, "NetMargin,NetIncome / Sales,ratio,Profitability").unwrap();
        std::fs::write(
            &config_path,
            r#"{"aliases": {"NetIncome": ["us-gaap_NetIncomeLoss"], "Sales": ["us-gaap_Revenues"]}}"#,
        )
        .unwrap();

        let engine = KpiEngineLoader::load_with_config_file(&catalog_path, &config_path).unwrap();

        let mut snapshot = FinancialSnapshot::new();
        snapshot.insert(2024, "us-gaap_NetIncomeLoss", 30);
        snapshot.insert(2024, "us-gaap_Revenues", 200);
        let report = engine.compute_all(2024, &snapshot);
        assert_eq!(report.get("NetMargin").unwrap().value, "0.15");
    }
}

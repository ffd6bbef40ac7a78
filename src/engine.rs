use crate::aliases::AccountAliasTable;
use crate::binder::bind;
use crate::catalog::KpiCatalog;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::schema::{FinancialSnapshot, KpiDefinition, KpiReport, KpiResult, SkippedKpi};
use crate::validation::ResultFormatter;
use log::{debug, info, warn};
use std::sync::OnceLock;

/// Computes every KPI of a catalog against one company's fiscal-year snapshot.
///
/// The catalog and configuration are read-only after construction, so one engine
/// can serve concurrent requests; each call owns its snapshot and bindings.
pub struct KpiEngine {
    catalog: KpiCatalog,
    config: EngineConfig,
    formatter: ResultFormatter,
}

impl KpiEngine {
    pub fn new(catalog: KpiCatalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let formatter = ResultFormatter::new(config.validation.clone());
        Ok(Self {
            catalog,
            config,
            formatter,
        })
    }

    pub fn with_default_config(catalog: KpiCatalog) -> Self {
        let config = EngineConfig::default();
        let formatter = ResultFormatter::new(config.validation.clone());
        Self {
            catalog,
            config,
            formatter,
        }
    }

    pub fn catalog(&self) -> &KpiCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute_all(&self, fiscal_year: i32, snapshot: &FinancialSnapshot) -> KpiReport {
        self.compute_detailed(fiscal_year, snapshot).0
    }

    /// Like [`compute_all`](Self::compute_all), also returning why each omitted
    /// KPI was skipped.
    pub fn compute_detailed(
        &self,
        fiscal_year: i32,
        snapshot: &FinancialSnapshot,
    ) -> (KpiReport, Vec<SkippedKpi>) {
        Batch {
            catalog: &self.catalog,
            aliases: &self.config.aliases,
            formatter: &self.formatter,
        }
        .run(fiscal_year, snapshot)
    }
}

/// One pass over a borrowed catalog.
struct Batch<'a> {
    catalog: &'a KpiCatalog,
    aliases: &'a AccountAliasTable,
    formatter: &'a ResultFormatter,
}

impl Batch<'_> {
    fn run(&self, fiscal_year: i32, snapshot: &FinancialSnapshot) -> (KpiReport, Vec<SkippedKpi>) {
        info!(
            "Computing {} KPIs for fiscal year {}",
            self.catalog.len(),
            fiscal_year
        );

        let mut report = KpiReport::default();
        let mut skipped = Vec::new();

        for definition in self.catalog {
            match self.compute_one(definition, fiscal_year, snapshot) {
                Ok(result) => {
                    debug!("KPI {} = {} ({})", result.kpi_name, result.value, result.unit);
                    report.push(result);
                }
                Err(e) => {
                    if e.is_expected_omission() {
                        debug!("Skipping KPI {}: {}", definition.name, e);
                    } else {
                        warn!("Skipping KPI {} (formula '{}'): {}", definition.name, definition.formula, e);
                    }
                    skipped.push(SkippedKpi {
                        kpi_name: definition.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Computed {} of {} KPIs for fiscal year {}",
            report.total_kpi_count,
            self.catalog.len(),
            fiscal_year
        );

        (report, skipped)
    }

    fn compute_one(
        &self,
        definition: &KpiDefinition,
        fiscal_year: i32,
        snapshot: &FinancialSnapshot,
    ) -> Result<KpiResult> {
        let bound = bind(&definition.formula, fiscal_year, snapshot, self.aliases)?;
        debug!(
            "KPI {}: evaluating '{}' with {:?}",
            definition.name, bound.expression, bound.context
        );

        let value = bound.expr.evaluate(&bound.context)?;
        let formatted = self
            .formatter
            .validate_and_format(&definition.name, value, definition.unit);

        Ok(KpiResult {
            kpi_name: definition.name.clone(),
            value: formatted,
            unit: definition.unit,
            category: definition.category.clone(),
            formula: definition.formula.clone(),
        })
    }
}

fn default_setup() -> &'static (AccountAliasTable, ResultFormatter) {
    static DEFAULTS: OnceLock<(AccountAliasTable, ResultFormatter)> = OnceLock::new();
    DEFAULTS.get_or_init(|| (AccountAliasTable::default(), ResultFormatter::default()))
}

/// Computes `catalog` with the built-in alias table and sanity rules. The catalog
/// is borrowed and the defaults are built once per process.
pub fn compute_all(catalog: &KpiCatalog, fiscal_year: i32, snapshot: &FinancialSnapshot) -> KpiReport {
    let (aliases, formatter) = default_setup();
    Batch {
        catalog,
        aliases,
        formatter,
    }
    .run(fiscal_year, snapshot)
    .0
}

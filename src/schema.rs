use crate::error::{KpiError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum KpiUnit {
    #[schemars(description = "Reported as-is in the smallest reporting unit (e.g. KRW).")]
    Plain,

    #[schemars(description = "Amounts divided by 1,000,000 before formatting.")]
    Millions,

    #[schemars(description = "A percentage; the formula is expected to multiply by 100 itself.")]
    Percent,

    #[schemars(description = "A dimensionless ratio or multiple (e.g. times, turnover).")]
    Ratio,
}

impl KpiUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiUnit::Plain => "plain",
            KpiUnit::Millions => "millions",
            KpiUnit::Percent => "percent",
            KpiUnit::Ratio => "ratio",
        }
    }

    pub fn scale_factor(&self) -> Option<f64> {
        match self {
            KpiUnit::Millions => Some(1_000_000.0),
            _ => None,
        }
    }
}

impl Default for KpiUnit {
    fn default() -> Self {
        Self::Plain
    }
}

impl fmt::Display for KpiUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KpiUnit {
    type Err = KpiError;

    /// Accepts the English unit names as well as the labels used in the analyst
    /// KPI sheet (`원`, `백만원`, `%`, `배`, `회`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "plain" | "원" | "krw" => Ok(KpiUnit::Plain),
            "millions" | "million" | "백만원" => Ok(KpiUnit::Millions),
            "percent" | "%" => Ok(KpiUnit::Percent),
            "ratio" | "times" | "배" | "회" => Ok(KpiUnit::Ratio),
            other => Err(KpiError::InvalidConfig(format!("Unknown KPI unit '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct KpiDefinition {
    #[schemars(description = "Unique display name of the KPI (e.g. 'OperatingMargin', '부채비율')")]
    pub name: String,

    #[schemars(
        description = "Arithmetic formula over account identifiers. Time-shifted references use the suffix [t-1], [t], [t+1]. Only + - * / and ABS(x) are allowed."
    )]
    pub formula: String,

    #[serde(default)]
    pub unit: KpiUnit,

    #[schemars(description = "Grouping label used in the report (e.g. 'Profitability')")]
    pub category: String,
}

impl KpiDefinition {
    pub fn new(
        name: impl Into<String>,
        formula: impl Into<String>,
        unit: KpiUnit,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            unit,
            category: category.into(),
        }
    }
}

/// All account amounts reported for one fiscal year, keyed by the
/// taxonomy-specific account identifier.
pub type YearFinancials = BTreeMap<String, i64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FinancialSnapshot {
    years: BTreeMap<i32, YearFinancials>,
}

impl FinancialSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(&self, fiscal_year: i32) -> Option<&YearFinancials> {
        self.years.get(&fiscal_year)
    }

    pub fn insert(&mut self, fiscal_year: i32, account_id: impl Into<String>, amount: i64) {
        self.years
            .entry(fiscal_year)
            .or_default()
            .insert(account_id.into(), amount);
    }

    pub fn with_year(mut self, fiscal_year: i32, financials: YearFinancials) -> Self {
        self.years.insert(fiscal_year, financials);
        self
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn account_count(&self, fiscal_year: i32) -> usize {
        self.years.get(&fiscal_year).map_or(0, |y| y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.years.values().all(|y| y.is_empty())
    }
}

impl From<BTreeMap<i32, YearFinancials>> for FinancialSnapshot {
    fn from(years: BTreeMap<i32, YearFinancials>) -> Self {
        Self { years }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiResult {
    pub kpi_name: String,
    /// Formatted value, or "N/A (requires review)" when a sanity rule tripped.
    pub value: String,
    pub unit: KpiUnit,
    pub category: String,
    /// The catalog formula verbatim, never the rewritten internal form.
    pub formula: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiReport {
    pub categories: BTreeMap<String, Vec<KpiResult>>,
    pub total_kpi_count: usize,
}

impl KpiReport {
    pub(crate) fn push(&mut self, result: KpiResult) {
        self.categories
            .entry(result.category.clone())
            .or_default()
            .push(result);
        self.total_kpi_count += 1;
    }

    pub fn get(&self, kpi_name: &str) -> Option<&KpiResult> {
        self.categories
            .values()
            .flatten()
            .find(|r| r.kpi_name == kpi_name)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(KpiReport)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedKpi {
    pub kpi_name: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_parsing_accepts_sheet_labels() {
        assert_eq!("백만원".parse::<KpiUnit>().unwrap(), KpiUnit::Millions);
        assert_eq!("%".parse::<KpiUnit>().unwrap(), KpiUnit::Percent);
        assert_eq!("배".parse::<KpiUnit>().unwrap(), KpiUnit::Ratio);
        assert_eq!("".parse::<KpiUnit>().unwrap(), KpiUnit::Plain);
        assert_eq!(" Ratio ".parse::<KpiUnit>().unwrap(), KpiUnit::Ratio);
        assert!("furlongs".parse::<KpiUnit>().is_err());
    }

    #[test]
    fn test_unit_serializes_lowercase() {
        let json = serde_json::to_string(&KpiUnit::Millions).unwrap();
        assert_eq!(json, "\"millions\"");
    }

    #[test]
    fn test_snapshot_serialization_shape() {
        let mut snapshot = FinancialSnapshot::new();
        snapshot.insert(2023, "Revenue", 1000);
        snapshot.insert(2022, "Revenue", 900);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"2022":{"Revenue":900},"2023":{"Revenue":1000}}"#);

        let back: FinancialSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.year(2023).and_then(|y| y.get("Revenue")), Some(&1000));
        assert_eq!(back.account_count(2022), 1);
    }

    #[test]
    fn test_report_push_counts() {
        let mut report = KpiReport::default();
        report.push(KpiResult {
            kpi_name: "OperatingMargin".to_string(),
            value: "0.10".to_string(),
            unit: KpiUnit::Ratio,
            category: "Profitability".to_string(),
            formula: "OperatingIncome/Revenue".to_string(),
        });

        assert_eq!(report.total_kpi_count, 1);
        assert!(report.get("OperatingMargin").is_some());
        assert!(report.get("NetMargin").is_none());
    }
}

use crate::error::{KpiError, Result};
use crate::schema::FinancialSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Periodic report kinds, identified by their disclosure-service codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    #[serde(rename = "11011")]
    Annual,
    #[serde(rename = "11012")]
    HalfYear,
    #[serde(rename = "11013")]
    FirstQuarter,
    #[serde(rename = "11014")]
    ThirdQuarter,
}

impl ReportCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::Annual => "11011",
            ReportCode::HalfYear => "11012",
            ReportCode::FirstQuarter => "11013",
            ReportCode::ThirdQuarter => "11014",
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportCode {
    type Err = KpiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "11011" => Ok(ReportCode::Annual),
            "11012" => Ok(ReportCode::HalfYear),
            "11013" => Ok(ReportCode::FirstQuarter),
            "11014" => Ok(ReportCode::ThirdQuarter),
            other => Err(KpiError::InvalidConfig(format!("Unknown report code '{}'", other))),
        }
    }
}

/// Result of asking a data source for one filing. `NoData` is a legitimate
/// answer (the filing lacks the statements), not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Data(FinancialSnapshot),
    NoData,
}

impl FetchOutcome {
    /// The snapshot to compute against; a filing without data yields an empty
    /// snapshot, for which every KPI is simply omitted.
    pub fn into_snapshot(self) -> FinancialSnapshot {
        match self {
            FetchOutcome::Data(snapshot) => snapshot,
            FetchOutcome::NoData => FinancialSnapshot::new(),
        }
    }
}

/// Supplies financial statements for a company filing, covering the requested
/// fiscal year and the one before it.
pub trait FinancialDataSource {
    fn fetch(
        &self,
        corp_code: &str,
        fiscal_year: i32,
        report_code: ReportCode,
    ) -> impl Future<Output = Result<FetchOutcome>> + Send;
}

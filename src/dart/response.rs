use crate::error::{KpiError, Result};
use crate::schema::FinancialSnapshot;
use crate::source::FetchOutcome;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "000";
pub const STATUS_NO_DATA: &str = "013";

/// Report-name fragments of the periodic filings KPIs are computed from.
pub const PERIODIC_REPORT_KINDS: [&str; 3] = ["사업보고서", "반기보고서", "분기보고서"];

/// Body of the single-company full financial statement endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub list: Vec<DartAccountItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartAccountItem {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_nm: Option<String>,
    /// Current-term amount.
    #[serde(default)]
    pub thstrm_amount: Option<String>,
    /// Prior-term amount.
    #[serde(default)]
    pub frmtrm_amount: Option<String>,
}

/// Amounts arrive as text with thousands separators; blank and `-` mean zero.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(0);
    }
    cleaned
        .parse::<i64>()
        .map_err(|_| KpiError::InvalidAmount(raw.to_string()))
}

/// Splits one filing into a two-year snapshot: current-term amounts under
/// `fiscal_year`, prior-term amounts under `fiscal_year - 1`.
pub fn snapshot_from_response(response: &DartResponse, fiscal_year: i32) -> Result<FetchOutcome> {
    match response.status.as_str() {
        STATUS_NO_DATA => return Ok(FetchOutcome::NoData),
        STATUS_OK => {}
        other => {
            return Err(KpiError::DataSource {
                status: other.to_string(),
                message: response.message.clone(),
            })
        }
    }

    let previous_year = fiscal_year - 1;
    let mut snapshot = FinancialSnapshot::new()
        .with_year(fiscal_year, Default::default())
        .with_year(previous_year, Default::default());

    for item in &response.list {
        let account_id = match item.account_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        if let Some(raw) = &item.thstrm_amount {
            snapshot.insert(fiscal_year, account_id, parse_amount(raw)?);
        }
        if let Some(raw) = &item.frmtrm_amount {
            snapshot.insert(previous_year, account_id, parse_amount(raw)?);
        }
    }

    Ok(FetchOutcome::Data(snapshot))
}

/// Body of the disclosure search endpoint (`list.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartFilingList {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub list: Vec<DartFiling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartFiling {
    #[serde(default)]
    pub corp_code: String,
    #[serde(default)]
    pub corp_name: String,
    #[serde(default)]
    pub report_nm: String,
    /// Receipt number identifying the filing.
    #[serde(default)]
    pub rcept_no: String,
    /// Receipt date, `YYYYMMDD`.
    #[serde(default)]
    pub rcept_dt: String,
}

impl DartFiling {
    pub fn is_periodic_report(&self) -> bool {
        PERIODIC_REPORT_KINDS
            .iter()
            .any(|kind| self.report_nm.contains(kind))
    }
}

/// Annual, half-year and quarterly reports from a search response, in response
/// order. A "no data" status yields an empty list.
pub fn periodic_reports(response: &DartFilingList) -> Result<Vec<DartFiling>> {
    match response.status.as_str() {
        STATUS_NO_DATA => Ok(Vec::new()),
        STATUS_OK => Ok(response
            .list
            .iter()
            .filter(|filing| filing.is_periodic_report())
            .cloned()
            .collect()),
        other => Err(KpiError::DataSource {
            status: other.to_string(),
            message: response.message.clone(),
        }),
    }
}

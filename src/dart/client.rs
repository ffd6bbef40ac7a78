use crate::dart::response::{
    periodic_reports, snapshot_from_response, DartFiling, DartFilingList, DartResponse,
};
use crate::error::{KpiError, Result};
use crate::source::{FetchOutcome, FinancialDataSource, ReportCode};
use log::{debug, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct DartClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DartClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DART_BASE_URL.to_string(),
        }
    }

    /// Reads the API key from `DART_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DART_API_KEY")
            .map_err(|_| KpiError::InvalidConfig("DART_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Consolidated (CFS) statements for one filing. The response carries both
    /// the current and the prior term, so one request covers two fiscal years.
    pub async fn fetch_financials(
        &self,
        corp_code: &str,
        fiscal_year: i32,
        report_code: ReportCode,
    ) -> Result<FetchOutcome> {
        let year = fiscal_year.to_string();

        debug!(
            "Requesting DART statements for {} (year {}, report {})",
            corp_code, fiscal_year, report_code
        );

        let body: DartResponse = self
            .get_json(
                "fnlttSinglAcntAll.json",
                &[
                    ("corp_code", corp_code),
                    ("bsns_year", year.as_str()),
                    ("reprt_code", report_code.code()),
                    ("fs_div", "CFS"),
                ],
            )
            .await?;
        let outcome = snapshot_from_response(&body, fiscal_year)?;

        match &outcome {
            FetchOutcome::NoData => {
                info!(
                    "No DART data for {} (year {}, report {})",
                    corp_code, fiscal_year, report_code
                );
            }
            FetchOutcome::Data(snapshot) => {
                info!(
                    "Received DART data for {}: {} accounts for {}, {} accounts for {}",
                    corp_code,
                    snapshot.account_count(fiscal_year),
                    fiscal_year,
                    snapshot.account_count(fiscal_year - 1),
                    fiscal_year - 1
                );
            }
        }

        Ok(outcome)
    }

    /// Periodic reports (annual, half-year, quarterly) filed by `corp_code` since
    /// `begin_date` (`YYYYMMDD`).
    pub async fn list_reports(&self, corp_code: &str, begin_date: &str) -> Result<Vec<DartFiling>> {
        debug!("Listing DART filings for {} since {}", corp_code, begin_date);

        let body: DartFilingList = self
            .get_json(
                "list.json",
                &[
                    ("corp_code", corp_code),
                    ("bgn_de", begin_date),
                    ("pblntf_ty", "A"),
                ],
            )
            .await?;
        let reports = periodic_reports(&body)?;

        info!(
            "Found {} periodic reports for {} ({} filings listed)",
            reports.len(),
            corp_code,
            body.list.len()
        );
        Ok(reports)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .client
            .get(&url)
            .query(&[("crtfc_key", self.api_key.as_str())])
            .query(params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(KpiError::DataSource {
                status: status.as_u16().to_string(),
                message: error_text,
            });
        }

        Ok(res.json().await?)
    }
}

impl FinancialDataSource for DartClient {
    async fn fetch(
        &self,
        corp_code: &str,
        fiscal_year: i32,
        report_code: ReportCode,
    ) -> Result<FetchOutcome> {
        self.fetch_financials(corp_code, fiscal_year, report_code)
            .await
    }
}

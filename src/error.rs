use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Missing required account {identifier} for fiscal year {year}")]
    MissingAccount { identifier: String, year: i32 },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unsupported formula construct: {0}")]
    UnsupportedConstruct(String),

    #[error("Malformed formula at position {position}: {details}")]
    Syntax { position: usize, details: String },

    #[error("Variable '{0}' is not bound in the evaluation context")]
    UnboundVariable(String),

    #[error("Formula produced a non-finite value")]
    NonFiniteResult,

    #[error("Failed to load KPI catalog from {source_name}: {details}")]
    CatalogLoad {
        source_name: String,
        details: String,
    },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Disclosure service returned status {status}: {message}")]
    DataSource { status: String, message: String },

    #[error("Invalid amount '{0}' in filing data")]
    InvalidAmount(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "dart")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl KpiError {
    /// Missing data and zero denominators are routine in real filings; everything
    /// else that fails a single KPI points at a defect in the catalog.
    pub fn is_expected_omission(&self) -> bool {
        matches!(
            self,
            KpiError::MissingAccount { .. } | KpiError::DivisionByZero
        )
    }
}

pub type Result<T> = std::result::Result<T, KpiError>;

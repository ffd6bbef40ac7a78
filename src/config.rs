use crate::aliases::AccountAliasTable;
use crate::error::{KpiError, Result};
use crate::validation::{RuleScope, ValidationPolicy};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only settings handed to [`KpiEngine`](crate::KpiEngine) at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[serde(default)]
    #[schemars(
        description = "Canonical account identifier -> taxonomy-specific aliases, tried in order. Identifiers not listed fall back to the identifier with '_' replaced by '-'."
    )]
    pub aliases: AccountAliasTable,

    #[serde(default)]
    #[schemars(
        description = "Ordered sanity rules. A KPI whose raw value violates any applicable rule is reported as 'N/A (requires review)'."
    )]
    pub validation: ValidationPolicy,
}

impl EngineConfig {
    pub fn new(aliases: AccountAliasTable, validation: ValidationPolicy) -> Result<Self> {
        let config = Self {
            aliases,
            validation,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.aliases.validate()?;
        for (idx, rule) in self.validation.rules.iter().enumerate() {
            if let RuleScope::NameContains { markers } = &rule.scope {
                if markers.is_empty() || markers.iter().any(|m| m.is_empty()) {
                    return Err(KpiError::InvalidConfig(format!(
                        "Sanity rule #{} needs at least one non-empty name marker",
                        idx
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        debug!(
            "Loaded engine configuration with {} alias entries and {} sanity rules",
            config.aliases.len(),
            config.validation.rules.len()
        );
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

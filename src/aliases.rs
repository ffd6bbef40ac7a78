use crate::error::{KpiError, Result};
use crate::schema::YearFinancials;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Maps a canonical account identifier (as written in formulas) to the
/// taxonomy-specific identifiers that may carry the same line item in a filing.
/// Aliases are tried in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AccountAliasTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl AccountAliasTable {
    /// An empty table: every identifier resolves through the default transform only.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_alias<I, S>(mut self, canonical_id: impl Into<String>, aliases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical_id = canonical_id.into();
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if aliases.is_empty() {
            return Err(KpiError::InvalidConfig(format!(
                "Alias list for '{}' must not be empty",
                canonical_id
            )));
        }
        self.entries.insert(canonical_id, aliases);
        Ok(self)
    }

    /// Checks the invariant that every alias list is non-empty. Needed after
    /// deserialization, which bypasses `with_alias`.
    pub fn validate(&self) -> Result<()> {
        match self.entries.iter().find(|(_, aliases)| aliases.is_empty()) {
            Some((canonical_id, _)) => Err(KpiError::InvalidConfig(format!(
                "Alias list for '{}' must not be empty",
                canonical_id
            ))),
            None => Ok(()),
        }
    }

    /// Aliases tried for `canonical_id`. Identifiers without an entry fall back to
    /// a single alias with every `_` turned into `-` (the filing spelling of
    /// `ifrs-full` style prefixes).
    pub fn aliases_for<'a>(&'a self, canonical_id: &str) -> Cow<'a, [String]> {
        match self.entries.get(canonical_id) {
            Some(aliases) => Cow::Borrowed(aliases.as_slice()),
            None => Cow::Owned(vec![canonical_id.replace('_', "-")]),
        }
    }

    /// First amount present under any alias of `canonical_id`, or `None`.
    pub fn resolve(&self, financials_for_year: &YearFinancials, canonical_id: &str) -> Option<i64> {
        self.aliases_for(canonical_id)
            .iter()
            .find_map(|alias| financials_for_year.get(alias).copied())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AccountAliasTable {
    /// The IFRS / DART table used for Korean consolidated filings.
    fn default() -> Self {
        let table: [(&str, &[&str]); 9] = [
            (
                "ifrs_full_Revenue",
                &["ifrs-full_Revenue", "ifrs_Revenue", "dart_OperatingRevenue", "dart_Sales"],
            ),
            (
                "dart_OperatingIncomeLoss",
                &["dart_OperatingIncomeLoss", "ifrs-full_OperatingIncomeLoss", "ifrs_OperatingIncomeLoss"],
            ),
            (
                "ifrs_full_ProfitLoss",
                &["ifrs-full_ProfitLoss", "ifrs_ProfitLoss", "dart_ProfitLossForFinancialStatements"],
            ),
            ("ifrs_full_Assets", &["ifrs-full_Assets", "ifrs_Assets"]),
            ("ifrs_full_Liabilities", &["ifrs-full_Liabilities", "ifrs_Liabilities"]),
            ("ifrs_full_Equity", &["ifrs-full_Equity", "ifrs_Equity"]),
            ("ifrs_full_CurrentAssets", &["ifrs-full_CurrentAssets", "ifrs_CurrentAssets"]),
            (
                "ifrs_full_CurrentLiabilities",
                &["ifrs-full_CurrentLiabilities", "ifrs_CurrentLiabilities"],
            ),
            (
                "ifrs_full_CashFlowsFromUsedInOperatingActivities",
                &[
                    "ifrs-full_CashFlowsFromUsedInOperatingActivities",
                    "ifrs_CashFlowsFromUsedInOperatingActivities",
                ],
            ),
        ];

        let entries = table
            .iter()
            .map(|(canonical, aliases)| {
                (
                    canonical.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();

        Self { entries }
    }
}

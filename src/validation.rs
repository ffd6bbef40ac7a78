use crate::formula::Value;
use crate::schema::KpiUnit;
use crate::utils::{format_decimal, format_integer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const REVIEW_REQUIRED: &str = "N/A (requires review)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleScope {
    #[schemars(description = "Applies when the KPI name contains any of the markers (case-sensitive).")]
    NameContains { markers: Vec<String> },

    #[schemars(description = "Applies to every KPI reported in the given unit.")]
    Unit { unit: KpiUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bound {
    #[schemars(description = "Value must lie within [min, max]. Either side may be omitted.")]
    Range { min: Option<f64>, max: Option<f64> },

    #[schemars(description = "Absolute value must not exceed the limit.")]
    Magnitude { limit: f64 },
}

impl Bound {
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Bound::Range { min, max } => {
                min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
            }
            Bound::Magnitude { limit } => value.abs() <= limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SanityRule {
    pub scope: RuleScope,
    pub bound: Bound,
}

impl SanityRule {
    pub fn name_contains(markers: &[&str], bound: Bound) -> Self {
        Self {
            scope: RuleScope::NameContains {
                markers: markers.iter().map(|m| m.to_string()).collect(),
            },
            bound,
        }
    }

    pub fn applies_to(&self, kpi_name: &str, unit: KpiUnit) -> bool {
        match &self.scope {
            RuleScope::NameContains { markers } => markers.iter().any(|m| kpi_name.contains(m.as_str())),
            RuleScope::Unit { unit: scoped } => *scoped == unit,
        }
    }

    pub fn is_violated_by(&self, kpi_name: &str, unit: KpiUnit, value: f64) -> bool {
        self.applies_to(kpi_name, unit) && !self.bound.admits(value)
    }
}

/// Ordered sanity rules applied to the raw (unscaled) value of every KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationPolicy {
    pub rules: Vec<SanityRule>,
}

impl ValidationPolicy {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn violation(&self, kpi_name: &str, unit: KpiUnit, value: f64) -> Option<&SanityRule> {
        self.rules
            .iter()
            .find(|rule| rule.is_violated_by(kpi_name, unit, value))
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                SanityRule::name_contains(
                    &["부채비율", "DebtRatio", "Debt Ratio"],
                    Bound::Range {
                        min: Some(0.0),
                        max: Some(5000.0),
                    },
                ),
                SanityRule::name_contains(
                    &["유동비율", "CurrentRatio", "Current Ratio"],
                    Bound::Range {
                        min: None,
                        max: Some(5000.0),
                    },
                ),
                SanityRule::name_contains(&["증가율", "Growth"], Bound::Magnitude { limit: 5000.0 }),
                SanityRule::name_contains(&["ROE"], Bound::Magnitude { limit: 1000.0 }),
                SanityRule {
                    scope: RuleScope::Unit { unit: KpiUnit::Ratio },
                    bound: Bound::Magnitude { limit: 5000.0 },
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultFormatter {
    policy: ValidationPolicy,
}

impl ResultFormatter {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Applies the sanity rules, then unit scaling, then display formatting.
    pub fn validate_and_format(&self, kpi_name: &str, raw_value: Value, unit: KpiUnit) -> String {
        if self
            .policy
            .violation(kpi_name, unit, raw_value.as_f64())
            .is_some()
        {
            return REVIEW_REQUIRED.to_string();
        }

        let value = match unit.scale_factor() {
            Some(factor) => Value::Float(raw_value.as_f64() / factor),
            None => raw_value,
        };

        match value {
            Value::Int(v) => format_integer(v),
            Value::Float(v) => format_decimal(v),
        }
    }
}

/// [`ResultFormatter::validate_and_format`] with the built-in sanity rules.
pub fn validate_and_format(kpi_name: &str, raw_value: Value, unit: KpiUnit) -> String {
    ResultFormatter::default().validate_and_format(kpi_name, raw_value, unit)
}

use crate::error::{KpiError, Result};
use crate::schema::{KpiDefinition, KpiUnit};
use csv::{ReaderBuilder, Trim};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the analyst KPI sheet. Both English headers and the sheet's
/// original Korean headers are accepted.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(alias = "재무지표명")]
    name: String,
    #[serde(alias = "산식(AccountID)")]
    formula: String,
    #[serde(default, alias = "단위")]
    unit: String,
    #[serde(default, alias = "대분류")]
    category: String,
}

/// The ordered, immutable set of KPI definitions the engine computes.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCatalog {
    definitions: Vec<KpiDefinition>,
}

impl KpiCatalog {
    pub fn from_definitions(definitions: Vec<KpiDefinition>) -> Result<Self> {
        Self::checked(definitions, "in-memory definitions")
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|e| KpiError::CatalogLoad {
            source_name: source_name.clone(),
            details: e.to_string(),
        })?;
        Self::read_csv(file, &source_name)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        Self::read_csv(reader, "reader")
    }

    fn read_csv<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let load_error = |details: String| KpiError::CatalogLoad {
            source_name: source_name.to_string(),
            details,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut definitions = Vec::new();
        for (line_num, result) in reader.deserialize::<CatalogRow>().enumerate() {
            let row = result.map_err(|e| load_error(format!("row {}: {}", line_num + 2, e)))?;
            let unit = row
                .unit
                .parse::<KpiUnit>()
                .map_err(|e| load_error(format!("row {} ({}): {}", line_num + 2, row.name, e)))?;

            definitions.push(KpiDefinition {
                name: row.name,
                formula: row.formula,
                unit,
                category: row.category,
            });
        }

        let catalog = Self::checked(definitions, source_name)?;
        info!("Loaded {} KPI definitions from {}", catalog.len(), source_name);
        Ok(catalog)
    }

    fn checked(definitions: Vec<KpiDefinition>, source_name: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            let problem = if definition.name.trim().is_empty() {
                Some("KPI with an empty name".to_string())
            } else if definition.formula.trim().is_empty() {
                Some(format!("KPI '{}' has an empty formula", definition.name))
            } else if !seen.insert(definition.name.as_str()) {
                Some(format!("duplicate KPI name '{}'", definition.name))
            } else {
                None
            };

            if let Some(details) = problem {
                return Err(KpiError::CatalogLoad {
                    source_name: source_name.to_string(),
                    details,
                });
            }
        }

        Ok(Self { definitions })
    }

    pub fn get(&self, name: &str) -> Option<&KpiDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KpiDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<'a> IntoIterator for &'a KpiCatalog {
    type Item = &'a KpiDefinition;
    type IntoIter = std::slice::Iter<'a, KpiDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Classification, ColumnHeader, DatasetDescriptor, RowSchema};

pub const DEFAULT_RESOURCE_TEMPLATE: &str =
    "{jurisdiction}/Crawl_Data_{jurisdiction} - {classification}{period}.csv";
pub const DEFAULT_REASONS_COLUMN: &str = "Reasons_Non_Compliant";
pub const DEFAULT_IDENTITY_COLUMN: &str = "Site_URL";
pub const DEFAULT_LABELS_PATH: &str = "column_labels.json";
pub const DEFAULT_DESCRIPTIONS_PATH: &str = "classifications_of_compliance.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEntry {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionEntry {
    pub code: String,
    pub periods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationNames {
    #[serde(default = "default_all_name")]
    pub all: String,
    #[serde(default = "default_null_name")]
    pub null_site: String,
    #[serde(default = "default_pnc_name")]
    pub potentially_non_compliant: String,
}

impl Default for ClassificationNames {
    fn default() -> Self {
        Self {
            all: default_all_name(),
            null_site: default_null_name(),
            potentially_non_compliant: default_pnc_name(),
        }
    }
}

impl ClassificationNames {
    pub fn token(&self, classification: Classification) -> &str {
        match classification {
            Classification::All => &self.all,
            Classification::NullSite => &self.null_site,
            Classification::PotentiallyNonCompliant => &self.potentially_non_compliant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub periods: Vec<PeriodEntry>,
    pub jurisdictions: Vec<JurisdictionEntry>,
    #[serde(default = "default_resource_template")]
    pub resource_template: String,
    #[serde(default)]
    pub classification_names: ClassificationNames,
    #[serde(default = "default_reasons_column")]
    pub reasons_column: String,
    #[serde(default = "default_identity_column")]
    pub identity_column: String,
    #[serde(default = "default_labels_path")]
    pub column_labels_path: String,
    #[serde(default = "default_descriptions_path")]
    pub descriptions_path: String,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let catalog = Self::from_json_str(&raw)
            .with_context(|| format!("invalid catalog {}", path.display()))?;
        debug!(
            path = %path.display(),
            periods = catalog.periods.len(),
            jurisdictions = catalog.jurisdictions.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw).context("failed to parse catalog json")?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.periods.is_empty() {
            bail!("catalog lists no periods");
        }
        if self.jurisdictions.is_empty() {
            bail!("catalog lists no jurisdictions");
        }

        for jurisdiction in &self.jurisdictions {
            for period in &jurisdiction.periods {
                if self.period_rank(period).is_none() {
                    warn!(
                        jurisdiction = %jurisdiction.code,
                        period = %period,
                        "supported period missing from global ordering; it will be ignored"
                    );
                }
            }
        }

        Ok(())
    }

    pub fn schema(&self) -> RowSchema {
        RowSchema {
            reasons_column: self.reasons_column.clone(),
            identity_column: self.identity_column.clone(),
        }
    }

    pub fn jurisdiction(&self, code: &str) -> Option<&JurisdictionEntry> {
        self.jurisdictions.iter().find(|entry| entry.code == code)
    }

    pub fn period_rank(&self, key: &str) -> Option<usize> {
        self.periods.iter().position(|entry| entry.key == key)
    }

    pub fn supports(&self, jurisdiction: &str, period: &str) -> bool {
        self.period_rank(period).is_some()
            && self
                .jurisdiction(jurisdiction)
                .is_some_and(|entry| entry.periods.iter().any(|key| key == period))
    }

    pub fn supported_periods(&self, jurisdiction: &str) -> Vec<&PeriodEntry> {
        self.periods
            .iter()
            .filter(|entry| self.supports(jurisdiction, &entry.key))
            .collect()
    }

    pub fn latest_period(&self, jurisdiction: &str) -> Option<&str> {
        self.supported_periods(jurisdiction)
            .last()
            .map(|entry| entry.key.as_str())
    }

    pub fn resolve_selection(
        &self,
        jurisdiction: Option<&str>,
        period: Option<&str>,
        classification: Classification,
    ) -> Result<DatasetDescriptor> {
        let fallback = self
            .jurisdictions
            .first()
            .context("catalog lists no jurisdictions")?;

        let entry = match jurisdiction.map(str::trim) {
            Some(code) => match self.jurisdiction(code) {
                Some(entry) => entry,
                None => {
                    warn!(requested = code, fallback = %fallback.code, "unknown jurisdiction; using default");
                    fallback
                }
            },
            None => fallback,
        };

        let latest = self
            .latest_period(&entry.code)
            .with_context(|| format!("jurisdiction {} has no supported periods", entry.code))?;

        let period = match period.map(str::trim) {
            Some(key) if self.supports(&entry.code, key) => key,
            Some(key) => {
                warn!(
                    jurisdiction = %entry.code,
                    requested = key,
                    fallback = latest,
                    "period not supported for jurisdiction; using most recent"
                );
                latest
            }
            None => latest,
        };

        Ok(DatasetDescriptor::new(&entry.code, period, classification))
    }

    pub fn locate(&self, descriptor: &DatasetDescriptor) -> String {
        self.resource_template
            .replace("{jurisdiction}", &descriptor.jurisdiction)
            .replace("{period}", &descriptor.period)
            .replace(
                "{classification}",
                self.classification_names.token(descriptor.classification),
            )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SideConfig {
    labels: HashMap<String, String>,
    descriptions: HashMap<String, String>,
}

impl SideConfig {
    pub fn load(data_root: &Path, catalog: &Catalog) -> Self {
        Self {
            labels: load_lookup(&data_root.join(&catalog.column_labels_path)),
            descriptions: load_lookup(&data_root.join(&catalog.descriptions_path)),
        }
    }

    pub fn header(&self, name: &str) -> ColumnHeader {
        ColumnHeader {
            name: name.to_string(),
            label: self
                .labels
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string()),
            description: self.descriptions.get(name).cloned(),
        }
    }

    pub fn describe(&self, key: &str) -> Option<&str> {
        self.descriptions.get(key).map(String::as_str)
    }
}

fn load_lookup(path: &Path) -> HashMap<String, String> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "side configuration unavailable");
            return HashMap::new();
        }
    };

    let document: HashMap<String, Value> = match serde_json::from_slice(&raw) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "side configuration is not a json object");
            return HashMap::new();
        }
    };

    document
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key.trim().to_string(), text)),
            _ => None,
        })
        .collect()
}

fn default_resource_template() -> String {
    DEFAULT_RESOURCE_TEMPLATE.to_string()
}

fn default_reasons_column() -> String {
    DEFAULT_REASONS_COLUMN.to_string()
}

fn default_identity_column() -> String {
    DEFAULT_IDENTITY_COLUMN.to_string()
}

fn default_labels_path() -> String {
    DEFAULT_LABELS_PATH.to_string()
}

fn default_descriptions_path() -> String {
    DEFAULT_DESCRIPTIONS_PATH.to_string()
}

fn default_all_name() -> String {
    "AllSites".to_string()
}

fn default_null_name() -> String {
    "NullSites".to_string()
}

fn default_pnc_name() -> String {
    "PotentiallyNonCompliantSites".to_string()
}

#[cfg(test)]
pub(crate) fn sample_catalog() -> Catalog {
    Catalog::from_json_str(
        r#"{
          "periods": [
            {"key": "Dec2024", "label": "December 2024"},
            {"key": "Feb2025", "label": "February 2025"},
            {"key": "Apr2025", "label": "April 2025"}
          ],
          "jurisdictions": [
            {"code": "CA", "periods": ["Dec2024", "Feb2025"]},
            {"code": "CT", "periods": ["Feb2025", "Apr2025"]}
          ]
        }"#,
    )
    .expect("sample catalog parses")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_catalog_fields() {
        let catalog = sample_catalog();
        assert_eq!(catalog.resource_template, DEFAULT_RESOURCE_TEMPLATE);
        assert_eq!(catalog.schema().reasons_column, DEFAULT_REASONS_COLUMN);
        assert_eq!(catalog.classification_names.null_site, "NullSites");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(Catalog::from_json_str(r#"{"periods": [], "jurisdictions": []}"#).is_err());
    }

    #[test]
    fn locate_expands_template_placeholders() {
        let catalog = sample_catalog();
        let descriptor =
            DatasetDescriptor::new("CA", "Dec2024", Classification::PotentiallyNonCompliant);
        assert_eq!(
            catalog.locate(&descriptor),
            "CA/Crawl_Data_CA - PotentiallyNonCompliantSitesDec2024.csv"
        );
    }

    #[test]
    fn unsupported_period_falls_back_to_most_recent_supported() {
        let catalog = sample_catalog();

        let healed = catalog
            .resolve_selection(Some("CA"), Some("Apr2025"), Classification::NullSite)
            .unwrap();
        assert_eq!(healed.period, "Feb2025");

        let defaulted = catalog
            .resolve_selection(None, None, Classification::All)
            .unwrap();
        assert_eq!(defaulted.jurisdiction, "CA");
        assert_eq!(defaulted.period, "Feb2025");

        let unknown = catalog
            .resolve_selection(Some("ZZ"), Some("Apr2025"), Classification::All)
            .unwrap();
        assert_eq!(unknown.jurisdiction, "CA");
        assert_eq!(unknown.period, "Feb2025");

        let kept = catalog
            .resolve_selection(Some("CT"), Some("Feb2025"), Classification::All)
            .unwrap();
        assert_eq!(kept.period, "Feb2025");
    }

    #[test]
    fn side_config_falls_back_to_raw_names_when_files_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = sample_catalog();
        std::fs::write(dir.path().join(DEFAULT_DESCRIPTIONS_PATH), "not json").unwrap();

        let side = SideConfig::load(dir.path(), &catalog);
        let header = side.header("Site_URL");
        assert_eq!(header.label, "Site_URL");
        assert!(header.description.is_none());
    }

    #[test]
    fn side_config_reads_labels_and_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = sample_catalog();
        std::fs::write(
            dir.path().join(DEFAULT_LABELS_PATH),
            r#"{"Site_URL": "Site", "Count": 3}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_DESCRIPTIONS_PATH),
            r#"{"uspapi": "USP API signal disagrees with GPC"}"#,
        )
        .unwrap();

        let side = SideConfig::load(dir.path(), &catalog);
        assert_eq!(side.header("Site_URL").label, "Site");
        assert_eq!(side.header("Count").label, "Count");
        assert_eq!(side.describe("uspapi"), Some("USP API signal disagrees with GPC"));
    }
}

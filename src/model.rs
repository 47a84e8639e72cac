use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Serialize, Serializer};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    All,
    NullSite,
    PotentiallyNonCompliant,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NullSite => "null-site",
            Self::PotentiallyNonCompliant => "potentially-non-compliant",
        }
    }

    pub fn is_reason_bearing(self) -> bool {
        matches!(self, Self::PotentiallyNonCompliant)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DatasetDescriptor {
    pub jurisdiction: String,
    pub period: String,
    pub classification: Classification,
}

impl DatasetDescriptor {
    pub fn new(jurisdiction: &str, period: &str, classification: Classification) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            period: period.to_string(),
            classification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<String>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .rposition(|name| name == column)
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    pub reasons_column: String,
    pub identity_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHeader {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ReasonCode {
    InvalidUspapi,
    InvalidUspCookies,
    Uspapi,
    UspCookies,
    MissingAfterUspapi,
    MissingAfterUspCookies,
    InvalidGppString,
    SaleOptOutUsnat,
    SharingOptOutUsnat,
    TargetedAdvertisingOptOutUsnat,
    SaleOptOutState,
    SharingOptOutState,
    TargetedAdvertisingOptOutState,
    MissingAfterGppString,
    InvalidOptanonConsent,
    OptanonConsent,
    MissingAfterOptanonConsent,
    WellKnown,
    InvalidWellKnown,
    SegmentSwitchGpp,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 20] = [
        Self::InvalidUspapi,
        Self::InvalidUspCookies,
        Self::Uspapi,
        Self::UspCookies,
        Self::MissingAfterUspapi,
        Self::MissingAfterUspCookies,
        Self::InvalidGppString,
        Self::SaleOptOutUsnat,
        Self::SharingOptOutUsnat,
        Self::TargetedAdvertisingOptOutUsnat,
        Self::SaleOptOutState,
        Self::SharingOptOutState,
        Self::TargetedAdvertisingOptOutState,
        Self::MissingAfterGppString,
        Self::InvalidOptanonConsent,
        Self::OptanonConsent,
        Self::MissingAfterOptanonConsent,
        Self::WellKnown,
        Self::InvalidWellKnown,
        Self::SegmentSwitchGpp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUspapi => "Invalid_uspapi",
            Self::InvalidUspCookies => "Invalid_usp_cookies",
            Self::Uspapi => "uspapi",
            Self::UspCookies => "usp_cookies",
            Self::MissingAfterUspapi => "MissingAfter_uspapi",
            Self::MissingAfterUspCookies => "MissingAfter_usp_cookies",
            Self::InvalidGppString => "Invalid_GPPString",
            Self::SaleOptOutUsnat => "SaleOptOut_USNAT",
            Self::SharingOptOutUsnat => "SharingOptOut_USNAT",
            Self::TargetedAdvertisingOptOutUsnat => "TargetedAdvertisingOptOut_USNAT",
            Self::SaleOptOutState => "SaleOptOut_State",
            Self::SharingOptOutState => "SharingOptOut_State",
            Self::TargetedAdvertisingOptOutState => "TargetedAdvertisingOptOut_State",
            Self::MissingAfterGppString => "MissingAfterGPPString",
            Self::InvalidOptanonConsent => "Invalid_OptanonConsent",
            Self::OptanonConsent => "OptanonConsent",
            Self::MissingAfterOptanonConsent => "MissingAfterOptanonConsent",
            Self::WellKnown => "Well-Known",
            Self::InvalidWellKnown => "Invalid_Well-Known",
            Self::SegmentSwitchGpp => "SegmentSwitchGPP",
        }
    }
}

impl FromStr for ReasonCode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let wanted = value.trim();
        match Self::ALL.iter().find(|code| code.as_str() == wanted) {
            Some(code) => Ok(*code),
            None => bail!("unknown reason code: {wanted}"),
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub const PNC_SITES_TAG: &str = "Potentially Non-Compliant Sites";
pub const NULL_SITES_TAG: &str = "Null Sites";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TrendTag {
    PotentiallyNonCompliantSites,
    NullSites,
    Reason(ReasonCode),
}

impl TrendTag {
    pub fn all() -> Vec<TrendTag> {
        let mut tags = vec![Self::PotentiallyNonCompliantSites, Self::NullSites];
        tags.extend(ReasonCode::ALL.iter().copied().map(Self::Reason));
        tags
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PotentiallyNonCompliantSites => PNC_SITES_TAG,
            Self::NullSites => NULL_SITES_TAG,
            Self::Reason(code) => code.as_str(),
        }
    }
}

impl FromStr for TrendTag {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            PNC_SITES_TAG => Ok(Self::PotentiallyNonCompliantSites),
            NULL_SITES_TAG => Ok(Self::NullSites),
            other => other.parse().map(Self::Reason),
        }
    }
}

impl fmt::Display for TrendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TrendTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub selected_reasons: BTreeSet<ReasonCode>,
    pub search_text: String,
    pub dataset: DatasetDescriptor,
}

impl FilterState {
    pub fn new(dataset: DatasetDescriptor) -> Self {
        Self {
            selected_reasons: BTreeSet::new(),
            search_text: String::new(),
            dataset,
        }
    }

    pub fn with_reasons(mut self, reasons: impl IntoIterator<Item = ReasonCode>) -> Self {
        self.selected_reasons = reasons.into_iter().collect();
        self
    }

    pub fn with_search(mut self, search_text: &str) -> Self {
        self.search_text = search_text.to_string();
        self
    }
}

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::loader::{LoadedResource, ResourceRequest};
use crate::model::{Classification, DatasetDescriptor, ReasonCode, Row, RowSchema, TrendTag};
use crate::value::ValueParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSelection {
    pub jurisdictions: Vec<String>,
    pub tags: Vec<TrendTag>,
}

impl TrendSelection {
    pub fn new(catalog: &Catalog, jurisdictions: &[String], tags: &[TrendTag]) -> Self {
        let mut seen = HashSet::new();
        let mut resolved: Vec<String> = jurisdictions
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| {
                if catalog.jurisdiction(code).is_none() {
                    warn!(jurisdiction = %code, "unknown jurisdiction dropped from trend selection");
                    return false;
                }
                seen.insert(code.clone())
            })
            .collect();

        if resolved.is_empty() && !jurisdictions.is_empty() {
            if let Some(fallback) = catalog.jurisdictions.first() {
                warn!(fallback = %fallback.code, "no known jurisdiction selected; using default");
                resolved.push(fallback.code.clone());
            }
        }

        let mut seen_tags = HashSet::new();
        let tags = tags.iter().copied().filter(|tag| seen_tags.insert(*tag)).collect();

        Self {
            jurisdictions: resolved,
            tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSlot {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub jurisdiction: String,
    pub tag: TrendTag,
    pub label: String,
    /// One entry per axis slot; `None` means the period was not measured.
    pub counts: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendChart {
    pub axis: Vec<PeriodSlot>,
    pub series: Vec<TrendSeries>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PeriodCounts {
    reason_bearing_rows: Option<usize>,
    null_rows: Option<usize>,
    reason_rows: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct TrendInputs {
    cells: HashMap<(String, String), PeriodCounts>,
}

impl TrendInputs {
    pub fn from_loaded(
        loaded: &[LoadedResource],
        schema: &RowSchema,
        parser: &ValueParser,
    ) -> Self {
        let mut inputs = Self::default();
        for item in loaded {
            inputs.insert(&item.request.descriptor, &item.resource.rows, schema, parser);
        }
        inputs
    }

    pub fn insert(
        &mut self,
        descriptor: &DatasetDescriptor,
        rows: &[Row],
        schema: &RowSchema,
        parser: &ValueParser,
    ) {
        let cell = self
            .cells
            .entry((descriptor.jurisdiction.clone(), descriptor.period.clone()))
            .or_default();

        match descriptor.classification {
            Classification::PotentiallyNonCompliant => {
                cell.reason_bearing_rows = Some(rows.len());
                cell.reason_rows.clear();
                for row in rows {
                    let raw = row.get(&schema.reasons_column).unwrap_or_default();
                    let reasons: HashSet<String> = parser.reasons(raw).into_iter().collect();
                    for reason in reasons {
                        *cell.reason_rows.entry(reason).or_default() += 1;
                    }
                }
            }
            Classification::NullSite => cell.null_rows = Some(rows.len()),
            Classification::All => {
                debug!(
                    jurisdiction = %descriptor.jurisdiction,
                    period = %descriptor.period,
                    "all-sites resource is not used for trends"
                );
            }
        }
    }

    fn count(&self, jurisdiction: &str, period: &str, tag: TrendTag) -> Option<usize> {
        let cell = self
            .cells
            .get(&(jurisdiction.to_string(), period.to_string()))?;
        match tag {
            TrendTag::PotentiallyNonCompliantSites => cell.reason_bearing_rows,
            TrendTag::NullSites => cell.null_rows,
            TrendTag::Reason(code) => cell
                .reason_bearing_rows
                .map(|_| reason_count(&cell.reason_rows, code)),
        }
    }
}

fn reason_count(counts: &HashMap<String, usize>, code: ReasonCode) -> usize {
    counts.get(code.as_str()).copied().unwrap_or(0)
}

pub fn period_axis(catalog: &Catalog, jurisdictions: &[String]) -> Vec<PeriodSlot> {
    catalog
        .periods
        .iter()
        .filter(|entry| {
            jurisdictions.is_empty()
                || jurisdictions
                    .iter()
                    .any(|code| catalog.supports(code, &entry.key))
        })
        .map(|entry| PeriodSlot {
            key: entry.key.clone(),
            label: entry.label.clone(),
        })
        .collect()
}

pub fn trend_requests(catalog: &Catalog, selection: &TrendSelection) -> Vec<ResourceRequest> {
    let mut requests = Vec::new();
    for code in &selection.jurisdictions {
        for period in catalog.supported_periods(code) {
            for classification in [
                Classification::PotentiallyNonCompliant,
                Classification::NullSite,
            ] {
                requests.push(ResourceRequest::new(
                    catalog,
                    DatasetDescriptor::new(code, &period.key, classification),
                ));
            }
        }
    }
    requests
}

pub fn aggregate(catalog: &Catalog, selection: &TrendSelection, inputs: &TrendInputs) -> TrendChart {
    let axis = period_axis(catalog, &selection.jurisdictions);
    let mut series = Vec::with_capacity(selection.jurisdictions.len() * selection.tags.len());

    for code in &selection.jurisdictions {
        for tag in &selection.tags {
            let counts = axis
                .iter()
                .map(|slot| {
                    if !catalog.supports(code, &slot.key) {
                        return None;
                    }
                    inputs.count(code, &slot.key, *tag)
                })
                .collect();

            series.push(TrendSeries {
                jurisdiction: code.clone(),
                tag: *tag,
                label: format!("{code} - {tag}"),
                counts,
            });
        }
    }

    TrendChart { axis, series }
}

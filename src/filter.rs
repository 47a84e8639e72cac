use std::collections::BTreeSet;

use crate::model::{FilterState, Row, RowSchema};
use crate::value::ValueParser;

#[derive(Debug)]
struct RowPredicate<'s> {
    reasons: Option<BTreeSet<&'static str>>,
    needle: Option<String>,
    schema: &'s RowSchema,
}

impl<'s> RowPredicate<'s> {
    fn compile(state: &FilterState, schema: &'s RowSchema) -> Self {
        if !state.dataset.classification.is_reason_bearing() {
            return Self {
                reasons: None,
                needle: None,
                schema,
            };
        }

        let reasons = (!state.selected_reasons.is_empty()).then(|| {
            state
                .selected_reasons
                .iter()
                .map(|code| code.as_str())
                .collect::<BTreeSet<_>>()
        });

        let query = state.search_text.trim();
        let needle = (!query.is_empty()).then(|| query.to_lowercase());

        Self {
            reasons,
            needle,
            schema,
        }
    }

    fn is_pass_through(&self) -> bool {
        self.reasons.is_none() && self.needle.is_none()
    }

    fn matches(&self, row: &Row, parser: &ValueParser) -> bool {
        if let Some(selected) = &self.reasons {
            let raw = row.get(&self.schema.reasons_column).unwrap_or_default();
            let hit = parser
                .reasons(raw)
                .iter()
                .any(|reason| selected.contains(reason.as_str()));
            if !hit {
                return false;
            }
        }

        if let Some(needle) = &self.needle {
            let identity = row.get(&self.schema.identity_column).unwrap_or_default();
            if !identity.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        true
    }
}

pub fn filter_rows<'a, I>(
    rows: I,
    state: &FilterState,
    schema: &RowSchema,
    parser: &ValueParser,
) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    let predicate = RowPredicate::compile(state, schema);
    if predicate.is_pass_through() {
        return rows.into_iter().collect();
    }

    rows.into_iter()
        .filter(|row| predicate.matches(row, parser))
        .collect()
}

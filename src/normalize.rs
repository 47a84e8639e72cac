use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::model::Row;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedResource {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub dropped_records: usize,
}

pub fn normalize_records(text: &str) -> NormalizedResource {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|name| name.trim().to_string()).collect(),
        Err(err) => {
            warn!(error = %err, "unreadable header line; resource treated as empty");
            return NormalizedResource::default();
        }
    };

    if columns.iter().all(|name| name.is_empty()) {
        return NormalizedResource::default();
    }

    let shared: Arc<[String]> = columns.clone().into();
    let mut rows = Vec::new();
    let mut dropped_records = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(record = index + 1, error = %err, "dropping malformed record");
                dropped_records += 1;
                continue;
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        if record.len() > shared.len() {
            warn!(
                record = index + 1,
                expected = shared.len(),
                found = record.len(),
                "dropping record with extra fields"
            );
            dropped_records += 1;
            continue;
        }

        rows.push(Row::new(
            Arc::clone(&shared),
            record.iter().map(ToOwned::to_owned).collect(),
        ));
    }

    debug!(
        columns = columns.len(),
        rows = rows.len(),
        dropped = dropped_records,
        "normalized resource"
    );

    NormalizedResource {
        columns,
        rows,
        dropped_records,
    }
}

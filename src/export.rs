use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use csv::WriterBuilder;

use crate::model::DatasetDescriptor;
use crate::util::ensure_directory;
use crate::window::ProjectedTable;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn export_file_name(descriptor: &DatasetDescriptor) -> String {
    let sanitize = |value: &str| {
        value
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
            .collect::<String>()
    };

    format!(
        "{}_{}_{}.csv",
        sanitize(&descriptor.jurisdiction),
        sanitize(&descriptor.period),
        descriptor.classification.as_str()
    )
}

pub fn encode_table(table: &ProjectedTable) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());

    if !table.columns.is_empty() {
        writer
            .write_record(&table.columns)
            .context("failed to encode export header")?;
        for row in &table.rows {
            writer
                .write_record(row)
                .context("failed to encode export row")?;
        }
    }

    writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush export buffer: {}", err.error()))
}

pub fn write_export(
    out_dir: &Path,
    descriptor: &DatasetDescriptor,
    table: &ProjectedTable,
) -> Result<PathBuf> {
    ensure_directory(out_dir)?;
    let path = out_dir.join(export_file_name(descriptor));
    let bytes = encode_table(table)?;
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

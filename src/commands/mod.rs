use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::catalog::{Catalog, SideConfig};
use crate::loader::FsSource;
use crate::value::ValueParser;

pub mod catalog;
pub mod cell;
pub mod export;
pub mod table;
pub mod trends;
mod view;

pub struct Workspace {
    pub catalog: Catalog,
    pub side: SideConfig,
    pub parser: ValueParser,
    pub source: Arc<FsSource>,
}

impl Workspace {
    pub fn open(data_root: &Path, catalog_path: Option<&Path>) -> Result<Self> {
        let catalog_path = catalog_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("catalog.json"));

        let catalog = Catalog::load(&catalog_path)?;
        let side = SideConfig::load(data_root, &catalog);
        let parser = ValueParser::new()?;

        info!(
            data_root = %data_root.display(),
            catalog = %catalog_path.display(),
            "workspace opened"
        );

        Ok(Self {
            catalog,
            side,
            parser,
            source: Arc::new(FsSource::new(data_root)),
        })
    }
}

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::model::DatasetDescriptor;
use crate::normalize::{NormalizedResource, normalize_records};

pub trait ResourceSource: Send + Sync + 'static {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceSource for FsSource {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<String>> + Send {
        let path = self.root.join(locator);
        async move {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    pub descriptor: DatasetDescriptor,
    pub locator: String,
}

impl ResourceRequest {
    pub fn new(catalog: &Catalog, descriptor: DatasetDescriptor) -> Self {
        let locator = catalog.locate(&descriptor);
        Self {
            descriptor,
            locator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedResource {
    pub request: ResourceRequest,
    pub resource: NormalizedResource,
}

pub async fn load_batch<S: ResourceSource>(
    source: &Arc<S>,
    requests: Vec<ResourceRequest>,
) -> Result<Vec<LoadedResource>> {
    let total = requests.len();
    let mut tasks = JoinSet::new();

    for (index, request) in requests.into_iter().enumerate() {
        let source = Arc::clone(source);
        tasks.spawn(async move {
            let fetched = source.fetch(&request.locator).await;
            (index, request, fetched)
        });
    }

    let mut slots: Vec<Option<LoadedResource>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (index, request, fetched) = joined.context("resource load task failed")?;
        let text =
            fetched.with_context(|| format!("failed to load resource {}", request.locator))?;

        let resource = normalize_records(&text);
        debug!(
            locator = %request.locator,
            rows = resource.rows.len(),
            dropped = resource.dropped_records,
            "resource loaded"
        );
        slots[index] = Some(LoadedResource { request, resource });
    }

    info!(resources = total, "resource batch resolved");
    Ok(slots.into_iter().flatten().collect())
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::MemorySource;
    use super::*;
    use crate::model::Classification;

    fn request(locator: &str) -> ResourceRequest {
        ResourceRequest {
            descriptor: DatasetDescriptor::new("CA", locator, Classification::All),
            locator: locator.to_string(),
        }
    }

    #[tokio::test]
    async fn batch_results_keep_request_order_despite_completion_order() {
        let source = Arc::new(
            MemorySource::default()
                .with_file("slow", "a\n1\n2\n")
                .with_file("fast", "a\n3\n")
                .with_delay("slow", Duration::from_millis(30)),
        );

        let loaded = load_batch(&source, vec![request("slow"), request("fast")])
            .await
            .unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].request.locator, "slow");
        assert_eq!(loaded[0].resource.rows.len(), 2);
        assert_eq!(loaded[1].resource.rows.len(), 1);
    }

    #[tokio::test]
    async fn one_missing_resource_fails_the_batch() {
        let source = Arc::new(MemorySource::default().with_file("present", "a\n1\n"));

        let err = load_batch(&source, vec![request("present"), request("absent")])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("absent"));
    }

    #[tokio::test]
    async fn filesystem_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("CA")).unwrap();
        std::fs::write(dir.path().join("CA/data.csv"), "Site_URL\nx.com\n").unwrap();

        let source = Arc::new(FsSource::new(dir.path()));
        let loaded = load_batch(&source, vec![request("CA/data.csv")]).await.unwrap();
        assert_eq!(loaded[0].resource.rows[0].get("Site_URL"), Some("x.com"));
    }
}

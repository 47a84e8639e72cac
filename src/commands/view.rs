use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::SelectionArgs;
use crate::commands::Workspace;
use crate::filter::filter_rows;
use crate::loader::{ResourceRequest, load_batch};
use crate::model::{FilterState, Row};
use crate::normalize::NormalizedResource;
use crate::session::Session;
use crate::window::resolve_columns;

pub(crate) struct LoadedSelection {
    pub state: FilterState,
    pub resource: NormalizedResource,
}

impl LoadedSelection {
    pub fn filtered<'a>(&'a self, workspace: &Workspace) -> Vec<&'a Row> {
        filter_rows(
            &self.resource.rows,
            &self.state,
            &workspace.catalog.schema(),
            &workspace.parser,
        )
    }

    pub fn visible_columns(&self, requested: &[String]) -> Vec<String> {
        resolve_columns(&self.resource.columns, requested)
    }
}

pub(crate) fn build_state(workspace: &Workspace, selection: &SelectionArgs) -> Result<FilterState> {
    let dataset = workspace.catalog.resolve_selection(
        selection.jurisdiction.as_deref(),
        selection.period.as_deref(),
        selection.classification,
    )?;

    Ok(FilterState::new(dataset)
        .with_reasons(selection.reasons.iter().copied())
        .with_search(&selection.search))
}

pub(crate) async fn load_selection(
    workspace: &Workspace,
    selection: &SelectionArgs,
) -> Result<LoadedSelection> {
    let state = build_state(workspace, selection)?;
    let request = ResourceRequest::new(&workspace.catalog, state.dataset.clone());

    info!(
        jurisdiction = %state.dataset.jurisdiction,
        period = %state.dataset.period,
        classification = %state.dataset.classification,
        locator = %request.locator,
        "loading dataset"
    );

    let mut session: Session<FilterState, NormalizedResource> = Session::new();
    let generation = session.begin(state);

    match load_batch(&workspace.source, vec![request]).await {
        Ok(mut batch) => {
            let resource = batch.pop().map(|loaded| loaded.resource).unwrap_or_default();
            session.commit(generation, resource);
        }
        Err(err) => {
            session.fail(generation, &err);
            return Err(err);
        }
    }

    let committed = session
        .into_committed()
        .context("dataset load produced no committed state")?;
    debug!(
        generation = committed.generation.value(),
        rows = committed.data.rows.len(),
        "dataset committed"
    );

    Ok(LoadedSelection {
        state: committed.selection,
        resource: committed.data,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::model::{Classification, ReasonCode};
    use crate::window::{paginate, project};

    const CATALOG: &str = r#"{
      "periods": [
        {"key": "Dec2024", "label": "December 2024"},
        {"key": "Feb2025", "label": "February 2025"}
      ],
      "jurisdictions": [{"code": "CA", "periods": ["Dec2024", "Feb2025"]}]
    }"#;

    fn seed(root: &Path) {
        fs::write(root.join("catalog.json"), CATALOG).unwrap();
        fs::create_dir_all(root.join("CA")).unwrap();

        let mut csv = String::from("Site_URL , Reasons_Non_Compliant,Status\n");
        for index in 0..23 {
            let reasons = if index % 2 == 0 {
                "['uspapi', 'OptanonConsent']"
            } else {
                "['OptanonConsent']"
            };
            csv.push_str(&format!("site{index}.com,\"{reasons}\",ok\n"));
        }
        fs::write(
            root.join("CA/Crawl_Data_CA - PotentiallyNonCompliantSitesFeb2025.csv"),
            csv,
        )
        .unwrap();
    }

    fn selection() -> SelectionArgs {
        SelectionArgs {
            jurisdiction: Some("CA".to_string()),
            period: None,
            classification: Classification::PotentiallyNonCompliant,
            reasons: Vec::new(),
            search: String::new(),
            columns: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_period_loads_most_recent_resource() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let workspace = Workspace::open(dir.path(), None).unwrap();

        let loaded = load_selection(&workspace, &selection()).await.unwrap();
        assert_eq!(loaded.state.dataset.period, "Feb2025");
        assert_eq!(
            loaded.resource.columns,
            vec!["Site_URL", "Reasons_Non_Compliant", "Status"]
        );

        let filtered = loaded.filtered(&workspace);
        let (window, page) = paginate(&filtered, 3, 10);
        assert_eq!(window.start_index(), 20);
        assert_eq!(page.len(), 3);
    }

    #[tokio::test]
    async fn reason_and_search_facets_narrow_the_table() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let workspace = Workspace::open(dir.path(), None).unwrap();

        let mut args = selection();
        args.reasons = vec![ReasonCode::Uspapi];
        args.search = "SITE1".to_string();
        args.columns = vec!["Status".to_string(), "Site_URL".to_string()];

        let loaded = load_selection(&workspace, &args).await.unwrap();
        let filtered = loaded.filtered(&workspace);
        let table = project(filtered.iter().copied(), &loaded.visible_columns(&args.columns));

        // even indices carry uspapi; site1x.com with x even: 10,12,14,16,18
        assert_eq!(table.columns, vec!["Status", "Site_URL"]);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0], vec!["ok", "site10.com"]);
    }

    #[tokio::test]
    async fn missing_resource_surfaces_an_error() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let workspace = Workspace::open(dir.path(), None).unwrap();

        let mut args = selection();
        args.period = Some("Dec2024".to_string());

        let err = load_selection(&workspace, &args).await.err().unwrap();
        assert!(format!("{err:#}").contains("Dec2024"));
    }
}

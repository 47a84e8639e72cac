use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::cli::TrendsArgs;
use crate::commands::Workspace;
use crate::loader::load_batch;
use crate::model::{ReasonCode, TrendTag};
use crate::session::Session;
use crate::trends::{TrendChart, TrendInputs, TrendSelection, aggregate, trend_requests};
use crate::util::{now_utc_string, write_json_pretty, write_json_stdout};

#[derive(Debug, Serialize)]
struct TrendReport {
    generated_at: String,
    jurisdictions: Vec<String>,
    chart: TrendChart,
}

pub async fn run(workspace: &Workspace, args: TrendsArgs) -> Result<()> {
    let selection = resolve_selection(workspace, &args);

    if selection.tags.is_empty() {
        println!("Select one or more reasons to view the chart.");
        return Ok(());
    }

    let requests = trend_requests(&workspace.catalog, &selection);
    info!(
        jurisdictions = selection.jurisdictions.len(),
        tags = selection.tags.len(),
        resources = requests.len(),
        "loading trend resources"
    );

    let mut session: Session<TrendSelection, TrendInputs> = Session::new();
    let generation = session.begin(selection);

    match load_batch(&workspace.source, requests).await {
        Ok(loaded) => {
            let schema = workspace.catalog.schema();
            let inputs = TrendInputs::from_loaded(&loaded, &schema, &workspace.parser);
            session.commit(generation, inputs);
        }
        Err(err) => {
            session.fail(generation, &err);
            let message = session.last_error().unwrap_or("unknown error");
            bail!("failed to load trend data: {message}");
        }
    }

    let committed = session
        .committed()
        .context("trend load produced no committed state")?;
    let chart = aggregate(&workspace.catalog, &committed.selection, &committed.data);

    let report = TrendReport {
        generated_at: now_utc_string(),
        jurisdictions: committed.selection.jurisdictions.clone(),
        chart,
    };

    if let Some(path) = &args.out {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote trend report");
    }

    if args.json {
        return write_json_stdout(&report);
    }

    write_text_chart(&report.chart)
}

fn resolve_selection(workspace: &Workspace, args: &TrendsArgs) -> TrendSelection {
    let jurisdictions = if args.jurisdictions.is_empty() {
        workspace
            .catalog
            .jurisdictions
            .first()
            .map(|entry| vec![entry.code.clone()])
            .unwrap_or_default()
    } else {
        args.jurisdictions.clone()
    };

    let mut tags = args.tags.clone();
    if args.all_reasons {
        tags.extend(ReasonCode::ALL.iter().copied().map(TrendTag::Reason));
    }

    TrendSelection::new(&workspace.catalog, &jurisdictions, &tags)
}

fn write_text_chart(chart: &TrendChart) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let labels: Vec<&str> = chart.axis.iter().map(|slot| slot.label.as_str()).collect();
    writeln!(output, "Series\t{}", labels.join("\t"))?;

    for series in &chart.series {
        let counts: Vec<String> = series
            .counts
            .iter()
            .map(|count| count.map_or_else(|| "-".to_string(), |value| value.to_string()))
            .collect();
        writeln!(output, "{}\t{}", series.label, counts.join("\t"))?;
    }

    output.flush()?;
    Ok(())
}

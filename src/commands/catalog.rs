use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::cli::CatalogArgs;
use crate::commands::Workspace;
use crate::model::TrendTag;
use crate::util::write_json_stdout;

#[derive(Debug, Serialize)]
struct CoverageEntry {
    code: String,
    periods: Vec<String>,
    latest: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReasonEntry {
    tag: TrendTag,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogListing {
    periods: Vec<(String, String)>,
    jurisdictions: Vec<CoverageEntry>,
    reasons: Vec<ReasonEntry>,
}

pub fn run(workspace: &Workspace, args: CatalogArgs) -> Result<()> {
    let catalog = &workspace.catalog;

    let listing = CatalogListing {
        periods: catalog
            .periods
            .iter()
            .map(|entry| (entry.key.clone(), entry.label.clone()))
            .collect(),
        jurisdictions: catalog
            .jurisdictions
            .iter()
            .map(|entry| CoverageEntry {
                code: entry.code.clone(),
                periods: catalog
                    .supported_periods(&entry.code)
                    .into_iter()
                    .map(|period| period.key.clone())
                    .collect(),
                latest: catalog.latest_period(&entry.code).map(ToOwned::to_owned),
            })
            .collect(),
        reasons: TrendTag::all()
            .into_iter()
            .map(|tag| ReasonEntry {
                tag,
                description: workspace.side.describe(tag.as_str()).map(ToOwned::to_owned),
            })
            .collect(),
    };

    if args.json {
        return write_json_stdout(&listing);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Periods:")?;
    for (key, label) in &listing.periods {
        writeln!(output, "\t{key}\t{label}")?;
    }

    writeln!(output, "Jurisdictions:")?;
    for entry in &listing.jurisdictions {
        writeln!(
            output,
            "\t{}\t{}\tlatest={}",
            entry.code,
            entry.periods.join(","),
            entry.latest.as_deref().unwrap_or("-")
        )?;
    }

    writeln!(output, "Reasons:")?;
    for entry in &listing.reasons {
        match &entry.description {
            Some(description) => writeln!(output, "\t{}\t{}", entry.tag, description)?,
            None => writeln!(output, "\t{}", entry.tag)?,
        }
    }

    output.flush()?;
    Ok(())
}

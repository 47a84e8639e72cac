use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::TableArgs;
use crate::commands::Workspace;
use crate::commands::view::load_selection;
use crate::model::{ColumnHeader, FilterState};
use crate::util::write_json_stdout;
use crate::window::{PageWindow, ProjectedTable, paginate, project};

#[derive(Debug, Serialize)]
struct TableResponse {
    selection: FilterState,
    total_rows: usize,
    matched_rows: usize,
    window: PageWindow,
    page_count: usize,
    start_index: usize,
    end_index: usize,
    columns: Vec<ColumnHeader>,
    rows: Vec<Vec<String>>,
}

pub async fn run(workspace: &Workspace, args: TableArgs) -> Result<()> {
    let loaded = load_selection(workspace, &args.selection).await?;
    let filtered = loaded.filtered(workspace);
    let columns = loaded.visible_columns(&args.selection.columns);

    let (window, page_rows) = paginate(&filtered, args.page, args.page_size);
    let mut table = project(page_rows.iter().copied(), &columns);

    if args.expand {
        for row in &mut table.rows {
            for cell in row.iter_mut() {
                *cell = workspace.parser.render(cell);
            }
        }
    }

    info!(
        total = loaded.resource.rows.len(),
        matched = filtered.len(),
        page = window.page_index,
        pages = window.page_count(),
        "table view ready"
    );

    let headers: Vec<ColumnHeader> = columns
        .iter()
        .map(|name| workspace.side.header(name))
        .collect();

    if args.json {
        return write_json_stdout(&TableResponse {
            selection: loaded.state.clone(),
            total_rows: loaded.resource.rows.len(),
            matched_rows: filtered.len(),
            window,
            page_count: window.page_count(),
            start_index: window.start_index(),
            end_index: window.end_index(),
            columns: headers,
            rows: table.rows,
        });
    }

    write_text_table(&loaded.state, &window, &headers, &table)
}

fn write_text_table(
    state: &FilterState,
    window: &PageWindow,
    headers: &[ColumnHeader],
    table: &ProjectedTable,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Dataset: {} {} ({})",
        state.dataset.jurisdiction, state.dataset.period, state.dataset.classification
    )?;
    if !state.selected_reasons.is_empty() {
        let reasons: Vec<&str> = state
            .selected_reasons
            .iter()
            .map(|code| code.as_str())
            .collect();
        writeln!(output, "Reasons: {}", reasons.join(", "))?;
    }
    if !state.search_text.trim().is_empty() {
        writeln!(output, "Search: {}", state.search_text.trim())?;
    }

    if window.is_empty() {
        writeln!(output, "No data rows.")?;
        output.flush()?;
        return Ok(());
    }

    writeln!(
        output,
        "Page {} of {} (rows {}-{} of {})",
        window.page_index,
        window.page_count(),
        window.start_index() + 1,
        window.end_index(),
        window.total_items
    )?;

    let labels: Vec<&str> = headers.iter().map(|header| header.label.as_str()).collect();
    writeln!(output, "{}", labels.join("\t"))?;

    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|cell| cell.replace('\n', "; ")).collect();
        writeln!(output, "{}", cells.join("\t"))?;
    }

    output.flush()?;
    Ok(())
}

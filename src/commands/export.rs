use anyhow::Result;
use tracing::info;

use crate::cli::ExportArgs;
use crate::commands::Workspace;
use crate::commands::view::load_selection;
use crate::export::write_export;
use crate::window::project;

pub async fn run(workspace: &Workspace, args: ExportArgs) -> Result<()> {
    let loaded = load_selection(workspace, &args.selection).await?;
    let filtered = loaded.filtered(workspace);
    let columns = loaded.visible_columns(&args.selection.columns);

    let table = project(filtered.iter().copied(), &columns);
    let path = write_export(&args.out_dir, &loaded.state.dataset, &table)?;

    info!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "wrote export"
    );
    println!("{}", path.display());

    Ok(())
}

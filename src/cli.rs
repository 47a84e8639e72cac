use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::{Classification, ReasonCode, TrendTag};
use crate::window::DEFAULT_PAGE_SIZE;

#[derive(Parser, Debug)]
#[command(
    name = "crawlscope",
    version,
    about = "Browse, filter, export, and chart compliance-crawl datasets"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "public")]
    pub data_root: PathBuf,

    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Table(TableArgs),
    Export(ExportArgs),
    Trends(TrendsArgs),
    Catalog(CatalogArgs),
    Cell(CellArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    #[arg(long)]
    pub jurisdiction: Option<String>,

    #[arg(long)]
    pub period: Option<String>,

    #[arg(long, value_enum, default_value_t = Classification::PotentiallyNonCompliant)]
    pub classification: Classification,

    #[arg(long = "reason", value_parser = parse_reason_code)]
    pub reasons: Vec<ReasonCode>,

    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long = "column")]
    pub columns: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, default_value_t = false)]
    pub expand: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[arg(long, default_value = "exports")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TrendsArgs {
    #[arg(long = "jurisdiction")]
    pub jurisdictions: Vec<String>,

    #[arg(long = "reason", value_parser = parse_trend_tag)]
    pub tags: Vec<TrendTag>,

    #[arg(long, default_value_t = false)]
    pub all_reasons: bool,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CellArgs {
    pub raw: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_reason_code(value: &str) -> Result<ReasonCode, String> {
    value.parse().map_err(|err: anyhow::Error| err.to_string())
}

fn parse_trend_tag(value: &str) -> Result<TrendTag, String> {
    value.parse().map_err(|err: anyhow::Error| err.to_string())
}

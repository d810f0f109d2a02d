pub mod config;
pub mod export;
pub mod report;
pub mod source;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::Dimension;
use crate::reports::Granularity;
use crate::settings::Theme;

#[derive(Parser)]
#[command(
    name = "insightedge",
    about = "Sales & expense dashboard for any CSV, XLSX or JSON export."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the rows come from and which of them to keep.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// CSV, XLSX or JSON file with sales and/or expense rows
    pub file: PathBuf,
    /// Type for every row when the file has no Type column (e.g. Sales)
    #[arg(long = "type-label")]
    pub type_label: Option<String>,
    /// Use this column as the Date instead of guessing
    #[arg(long = "date-column")]
    pub date_column: Option<String>,
    /// Use this column as the Amount instead of guessing
    #[arg(long = "amount-column")]
    pub amount_column: Option<String>,
    /// Start date: YYYY-MM-DD (inclusive)
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: YYYY-MM-DD (inclusive)
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Keep only these types (repeatable)
    #[arg(long = "type")]
    pub types: Vec<String>,
    /// Keep only these products (repeatable)
    #[arg(long = "product")]
    pub products: Vec<String>,
    /// Keep only these categories (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Keep only these customers (repeatable)
    #[arg(long = "customer")]
    pub customers: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which columns were picked as Date, Amount, Type and breakdowns.
    Columns {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Total sales, total expenses and net profit.
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Sales vs expenses over time.
    Trend {
        #[command(flatten)]
        source: SourceArgs,
        /// Bucket size (default from settings)
        #[arg(long = "by", value_enum)]
        by: Option<Granularity>,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Amounts per product, category or customer.
    Breakdown {
        #[command(flatten)]
        source: SourceArgs,
        /// Dimension to group by
        #[arg(long = "by", value_enum)]
        by: Dimension,
        /// Show each value's share of the total instead of the per-type split
        #[arg(long)]
        share: bool,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Activity by weekday and hour of day.
    Heatmap {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Linear sales forecast.
    Forecast {
        #[command(flatten)]
        source: SourceArgs,
        /// Number of days to project (default from settings)
        #[arg(long)]
        horizon: Option<usize>,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Everything at once: KPIs, trend, breakdown, heatmap and forecast.
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,
        /// Trend bucket size (default from settings)
        #[arg(long = "by", value_enum)]
        by: Option<Granularity>,
        /// Add a breakdown by this dimension
        #[arg(long, value_enum)]
        breakdown: Option<Dimension>,
        /// Leave out the heatmap
        #[arg(long = "no-heatmap")]
        no_heatmap: bool,
        /// Leave out the forecast
        #[arg(long = "no-forecast")]
        no_forecast: bool,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Export the filtered rows to CSV or XLSX.
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Output path ending in .csv or .xlsx (default: <export_dir>/insightedge-YYYY-MM-DD.xlsx)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Add a "Forecast Data" sheet (XLSX only)
        #[arg(long = "with-forecast")]
        with_forecast: bool,
    },
    /// View or change saved preferences.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings and where they are stored.
    Show,
    /// Change one or more settings.
    Set {
        #[arg(long, value_enum)]
        theme: Option<Theme>,
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
        #[arg(long = "forecast-horizon")]
        forecast_horizon: Option<usize>,
        /// Include the heatmap in dashboards: true/false
        #[arg(long)]
        heatmap: Option<bool>,
        /// Include the forecast in dashboards: true/false
        #[arg(long)]
        forecast: Option<bool>,
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
    },
}

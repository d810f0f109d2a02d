use std::path::PathBuf;

use log::warn;

use crate::cli::source::{self, Session};
use crate::cli::SourceArgs;
use crate::error::{InsightError, Result};
use crate::export::{self, ExportKind};
use crate::filter::{self, FilterStatus};
use crate::forecast::forecast_sales;
use crate::settings::Settings;

fn default_path(settings: &Settings) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    PathBuf::from(&settings.export_dir).join(format!("insightedge-{date}.xlsx"))
}

pub fn run(
    args: &SourceArgs,
    output: Option<PathBuf>,
    with_forecast: bool,
    settings: &Settings,
) -> Result<()> {
    let path = output.unwrap_or_else(|| default_path(settings));
    let kind = ExportKind::from_path(&path)?;

    let Session { table, spec } = source::open(args)?;
    let rows = filter::apply(&table, &spec);
    let status = FilterStatus::of(&table, &rows);
    if !status.has_rows() {
        println!("{}", status.message());
        return Ok(());
    }

    let forecast = if with_forecast && kind == ExportKind::Xlsx {
        match forecast_sales(&rows, settings.forecast_horizon) {
            Ok(f) => Some(f),
            Err(InsightError::InsufficientData(reason)) => {
                warn!("forecast sheet skipped: {reason}");
                eprintln!("Forecast sheet skipped: {reason}.");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        if with_forecast {
            eprintln!("CSV export has no forecast sheet; use an .xlsx path.");
        }
        None
    };

    export::export(&rows, forecast.as_ref(), &path)?;
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

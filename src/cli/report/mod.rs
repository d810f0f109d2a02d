pub mod text;

use std::path::Path;

use log::info;

use crate::cli::source::{self, Session};
use crate::cli::{OutputArgs, SourceArgs};
use crate::error::{InsightError, Result};
use crate::filter::{self, FilterStatus};
use crate::forecast::forecast_sales;
use crate::models::Dimension;
use crate::pipeline::{self, DimensionBreakdown};
use crate::reports::{self, Granularity};
use crate::settings::{Settings, Theme};

use text::Palette;

/// Print to stdout, or write to `--output` without colors.
fn emit(out: &OutputArgs, render: impl Fn(&Palette) -> String, theme: Theme) -> Result<()> {
    match &out.output {
        Some(path) => {
            write_text(path, &render(&Palette::new(Theme::Plain)))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", render(&Palette::new(theme))),
    }
    Ok(())
}

fn write_text(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{body}\n"))?;
    Ok(())
}

/// Load and filter; `None` when there is nothing to report on.
fn filtered(args: &SourceArgs, theme: Theme) -> Result<Option<Session>> {
    let Session { table, spec } = source::open(args)?;
    let rows = filter::apply(&table, &spec);
    let status = FilterStatus::of(&table, &rows);
    info!("{}", status.message());
    if !status.has_rows() {
        println!("{}", text::format_status(status, &Palette::new(theme)));
        return Ok(None);
    }
    Ok(Some(Session { table: rows, spec }))
}

pub fn columns(args: &SourceArgs, settings: &Settings) -> Result<()> {
    let session = source::open(args)?;
    println!(
        "{}",
        text::format_columns(&session.table, &Palette::new(settings.theme))
    );
    Ok(())
}

pub fn summary(args: &SourceArgs, out: &OutputArgs, settings: &Settings) -> Result<()> {
    let Some(session) = filtered(args, settings.theme)? else {
        return Ok(());
    };
    let k = reports::kpis(&session.table);
    emit(out, |p| text::format_kpis(&k, p), settings.theme)
}

pub fn trend(
    args: &SourceArgs,
    by: Option<Granularity>,
    out: &OutputArgs,
    settings: &Settings,
) -> Result<()> {
    let Some(session) = filtered(args, settings.theme)? else {
        return Ok(());
    };
    let granularity = by.unwrap_or(settings.granularity);
    let points = reports::time_trend(&session.table, granularity);
    emit(out, |p| text::format_trend(&points, granularity, p), settings.theme)
}

pub fn breakdown(
    args: &SourceArgs,
    by: Dimension,
    share: bool,
    out: &OutputArgs,
    settings: &Settings,
) -> Result<()> {
    let Some(session) = filtered(args, settings.theme)? else {
        return Ok(());
    };
    if !session.table.has_dimension(by) {
        return Err(InsightError::Other(format!(
            "No {} column found in {}",
            by.label(),
            args.file.display()
        )));
    }
    let b = DimensionBreakdown {
        dimension: by,
        rows: reports::breakdown(&session.table, by),
        share: reports::share(&session.table, by),
    };
    if share {
        emit(out, |p| text::format_share(&b, p), settings.theme)
    } else {
        emit(out, |p| text::format_breakdown(&b, p), settings.theme)
    }
}

pub fn heatmap(args: &SourceArgs, out: &OutputArgs, settings: &Settings) -> Result<()> {
    let Some(session) = filtered(args, settings.theme)? else {
        return Ok(());
    };
    let h = reports::activity_heatmap(&session.table);
    emit(out, |p| text::format_heatmap(&h, p), settings.theme)
}

pub fn forecast(
    args: &SourceArgs,
    horizon: Option<usize>,
    out: &OutputArgs,
    settings: &Settings,
) -> Result<()> {
    let Some(session) = filtered(args, settings.theme)? else {
        return Ok(());
    };
    let f = forecast_sales(&session.table, horizon.unwrap_or(settings.forecast_horizon))?;
    emit(out, |p| text::format_forecast(&f, p), settings.theme)
}

pub fn dashboard(
    args: &SourceArgs,
    by: Option<Granularity>,
    breakdown: Option<Dimension>,
    no_heatmap: bool,
    no_forecast: bool,
    out: &OutputArgs,
    settings: &Settings,
) -> Result<()> {
    let Session { table, spec } = source::open(args)?;
    let mut config = settings.dashboard_config();
    if let Some(g) = by {
        config.granularity = g;
    }
    config.breakdown = breakdown;
    config.features.heatmap &= !no_heatmap;
    config.features.forecast &= !no_forecast;

    let d = pipeline::build(&table, &spec, &config);
    emit(out, |p| text::format_dashboard(&d, p), settings.theme)
}

mod cli;
mod error;
mod export;
mod filter;
mod fmt;
mod forecast;
mod importer;
mod models;
mod normalizer;
mod pipeline;
mod reports;
mod settings;
#[cfg(test)]
mod test_support;

use clap::Parser;
use env_logger::{Builder, Env, Target};

use cli::config::SettingsChange;
use cli::{Cli, Commands, ConfigCommands};

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings::load_settings();

    let result = match cli.command {
        Commands::Columns { source } => cli::report::columns(&source, &settings),
        Commands::Summary { source, out } => cli::report::summary(&source, &out, &settings),
        Commands::Trend { source, by, out } => cli::report::trend(&source, by, &out, &settings),
        Commands::Breakdown {
            source,
            by,
            share,
            out,
        } => cli::report::breakdown(&source, by, share, &out, &settings),
        Commands::Heatmap { source, out } => cli::report::heatmap(&source, &out, &settings),
        Commands::Forecast {
            source,
            horizon,
            out,
        } => cli::report::forecast(&source, horizon, &out, &settings),
        Commands::Dashboard {
            source,
            by,
            breakdown,
            no_heatmap,
            no_forecast,
            out,
        } => cli::report::dashboard(
            &source,
            by,
            breakdown,
            no_heatmap,
            no_forecast,
            &out,
            &settings,
        ),
        Commands::Export {
            source,
            output,
            with_forecast,
        } => cli::export::run(&source, output, with_forecast, &settings),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(&settings),
            ConfigCommands::Set {
                theme,
                granularity,
                forecast_horizon,
                heatmap,
                forecast,
                export_dir,
            } => cli::config::set(
                SettingsChange {
                    theme,
                    granularity,
                    forecast_horizon,
                    heatmap,
                    forecast,
                    export_dir,
                },
                settings,
            ),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

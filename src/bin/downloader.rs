//! Downloads NWP model data in GRIB2 format from DWD's open data file server.
//!
//! ```text
//! downloader --model icon-eu --single-level-fields t_2m,clch \
//!     --max-time-step 12 --time-step-interval 3 --directory /data/nwp
//! ```

use chrono::{NaiveDateTime, Timelike};
use clap::Parser;
use log::{error, info};
use opendata_downloader::{
    ensure_destination_dir, CatalogError, Downloader, DownloaderError, ExpandError, FailurePolicy,
    IntoRunTimestamp, ModelCatalog,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "downloader",
    version,
    about = "Downloads NWP model data in GRIB2 format from DWD's Open Data file server https://opendata.dwd.de using HTTPS."
)]
struct Args {
    /// The NWP model name (defaults to the first model of the catalog)
    #[arg(long)]
    model: Option<String>,

    /// The model grid (defaults to the model's first grid)
    #[arg(long)]
    grid: Option<String>,

    /// One or more single-level model fields that should be downloaded, e.g. t_2m,tmax_2m,clch,pmsl
    #[arg(long, default_value = "t_2m")]
    single_level_fields: String,

    /// The minimum forecast time step to download
    #[arg(long, default_value_t = 0)]
    min_time_step: u32,

    /// The maximum forecast time step to download
    #[arg(long, default_value_t = 0)]
    max_time_step: u32,

    /// The interval (in hours) between forecast time steps to download
    #[arg(long, default_value_t = 1)]
    time_step_interval: u32,

    /// The time stamp of the dataset, e.g. '2020-06-26 18:00'. Uses the latest available if omitted
    #[arg(long, value_parser = parse_timestamp)]
    timestamp: Option<NaiveDateTime>,

    /// The download directory, defaults to the working directory
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Model definition file in JSON format, replaces the bundled models
    #[arg(long, value_name = "PATH")]
    model_file: Option<PathBuf>,

    /// HTTP(S) proxy to use for all downloads
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Keep downloading the remaining files after a failed one
    #[arg(long)]
    continue_on_error: bool,

    /// Print the most recent available timestamp of the model and exit
    #[arg(long)]
    latest_timestamp: bool,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    value
        .into_run_timestamp()
        .ok_or_else(|| format!("invalid timestamp '{}', expected e.g. '2020-06-26 18:00'", value))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()).await {
        error!("{}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            error!("caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), DownloaderError> {
    let catalog = match &args.model_file {
        Some(path) => ModelCatalog::from_file(path)?,
        None => ModelCatalog::bundled()?,
    };

    let model = match &args.model {
        Some(name) => catalog
            .find_model_ignore_case(name)
            .ok_or_else(|| CatalogError::UnknownModel(name.clone()))?
            .to_string(),
        None => catalog.default_model().name().to_string(),
    };
    let config = catalog.lookup(&model)?;

    if args.latest_timestamp {
        let latest = catalog.most_recent_model_timestamp(&model)?;
        println!("{}", latest.format("%Y-%m-%dT%H:%M:%S+00:00"));
        return Ok(());
    }

    let grid = resolve_grid(&catalog, args.grid.as_deref(), config.default_grid())?;
    let timestamp = match args.timestamp {
        Some(timestamp) => timestamp,
        None => catalog.most_recent_model_timestamp(&model)?,
    };
    let directory = match args.directory {
        Some(directory) => directory,
        None => std::env::current_dir().map_err(ExpandError::WorkingDirectory)?,
    };
    ensure_destination_dir(&directory).await?;

    info!(
        "\n---------------\nModel: {}\nGrid: {}\nFields: {}\nMinimum time step: {}\nMaximum time step: {}\nTime step interval: {}\nTimestamp: {}\nModel run: {:02}\nDestination: {}\n---------------",
        model,
        grid,
        args.single_level_fields,
        args.min_time_step,
        args.max_time_step,
        args.time_step_interval,
        timestamp.format("%Y-%m-%d"),
        timestamp.hour(),
        directory.display()
    );

    let failure_policy = if args.continue_on_error {
        FailurePolicy::ContinueOnError
    } else {
        FailurePolicy::FailFast
    };
    let downloader = Downloader::builder()
        .catalog(catalog)
        .maybe_proxy(args.proxy)
        .failure_policy(failure_policy)
        .build()?;

    let summary = downloader
        .download()
        .model(&model)
        .grid(&grid)
        .fields(&args.single_level_fields)
        .min_time_step(args.min_time_step)
        .max_time_step(args.max_time_step)
        .time_step_interval(args.time_step_interval)
        .timestamp(timestamp)
        .directory(directory)
        .call()
        .await?;

    for failed in &summary.failed {
        error!("{}: {}", failed.url, failed.error);
    }
    summary.ensure_complete()
}

/// Matches `grid` against the catalog's grids ignoring case, or falls back to `default`.
fn resolve_grid(
    catalog: &ModelCatalog,
    grid: Option<&str>,
    default: &str,
) -> Result<String, DownloaderError> {
    match grid {
        Some(grid) => catalog
            .find_grid_ignore_case(grid)
            .map(str::to_string)
            .ok_or_else(|| DownloaderError::UnknownGrid {
                grid: grid.to_string(),
                choices: catalog.grid_names().collect::<Vec<_>>().join(", "),
            }),
        None => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_matches_ignoring_case() {
        let catalog = ModelCatalog::bundled().unwrap();
        assert_eq!(
            resolve_grid(&catalog, Some("Regular-Lat-Lon"), "icosahedral").unwrap(),
            "regular-lat-lon"
        );
        assert_eq!(resolve_grid(&catalog, None, "icosahedral").unwrap(), "icosahedral");
    }

    #[test]
    fn unknown_grid_lists_choices() {
        let catalog = ModelCatalog::bundled().unwrap();
        match resolve_grid(&catalog, Some("gaussian"), "icosahedral") {
            Err(DownloaderError::UnknownGrid { grid, choices }) => {
                assert_eq!(grid, "gaussian");
                assert_eq!(choices, "icosahedral, regular-lat-lon, rotated-lat-lon");
            }
            other => panic!("expected UnknownGrid, got {:?}", other),
        }
    }

    #[test]
    fn parses_cli_timestamps() {
        let expected = chrono::NaiveDate::from_ymd_opt(2020, 6, 26)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2020-06-26 18:00"), Ok(expected));
        assert!(parse_timestamp("yesterday").is_err());
    }
}

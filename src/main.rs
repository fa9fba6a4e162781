//! `rainalert` - one-shot rain onset check.
//!
//! Loads configuration, runs the pipeline once for the configured location
//! and prints the response envelope as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use rainalert_service::config::{ApiKeys, Config, DEFAULT_CONFIG_PATH};
use rainalert_service::dev_mode::{DevMode, FixedGeocoder};
use rainalert_service::handler::{RainAlert, Response};
use rainalert_service::ingest::forecast::DarkSkyClient;
use rainalert_service::ingest::geocode::GoogleGeocoder;
use rainalert_service::logging::{self, DataSource};

#[derive(Parser, Debug)]
#[command(name = "rainalert", about = "Tells you when rain is about to start")]
struct Cli {
    /// Path to the TOML config file [default: rainalert.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Location to check, overriding the config file
    #[arg(long)]
    location: Option<String>,

    /// Alert threshold in [0, 1], overriding the config file
    #[arg(long)]
    threshold: Option<f64>,

    /// Replay a captured forecast payload instead of calling the providers
    #[arg(long, value_name = "PAYLOAD_JSON")]
    replay: Option<PathBuf>,

    /// Latitude reported for the location in replay mode [default: 0]
    #[arg(long, requires = "replay", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude reported for the location in replay mode [default: 0]
    #[arg(long, requires = "replay", allow_negative_numbers = true)]
    lng: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::read(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::read(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };
    config.apply_overrides(cli.location.clone(), cli.threshold);
    config.validate()?;

    logging::init_logger(config.logging.level, config.logging.json);
    logging::info(
        DataSource::System,
        Some(&config.location),
        &format!("checking with threshold {}", config.detector.threshold),
    );

    let response = match &cli.replay {
        Some(payload) => {
            logging::info(
                DataSource::System,
                None,
                &format!("replaying {}", payload.display()),
            );
            RainAlert::new(
                config.location.clone(),
                config.detector,
                FixedGeocoder::new(cli.lat.unwrap_or(0.0), cli.lng.unwrap_or(0.0)),
                DevMode::new(payload),
            )
            .handle()
        }
        None => run_live(&config)?,
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_live(config: &Config) -> Result<Response> {
    let keys = ApiKeys::from_env();
    let geocoder = GoogleGeocoder::new(&config.geocoder, keys.require_maps()?.to_string())
        .context("building geocoder client")?;
    let forecast = DarkSkyClient::new(&config.forecast, keys.require_forecast()?.to_string())
        .context("building forecast client")?;

    Ok(RainAlert::new(config.location.clone(), config.detector, geocoder, forecast).handle())
}

//! Load test of the TermMax backend.
//!
//! This binary runs the functional scenario (one pass over every route) and
//! the loading scenario (ramping virtual users) concurrently, then checks
//! the run against the pass thresholds.

mod client;
mod config;
mod error;
mod functional;
mod loading;
mod metrics;

use std::{process::exit, sync::Arc, time::Duration};

use clap::Parser;
use tracing::{error, info, warn};

use client::ApiClient;
use config::{CliConfig, EnvConfig, Settings};
use error::Result;
use metrics::{Metrics, Thresholds};

const FUNCTIONAL_MAX_DURATION: Duration = Duration::from_secs(60);

async fn run(settings: Settings) -> Result<bool> {
    let metrics = Arc::new(Metrics::default());
    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()?;
    let client = ApiClient::new(http, settings.base_url.clone(), metrics.clone());

    info!(
        base_url = %settings.base_url,
        chain_ids = ?settings.chain_ids,
        scenario = ?settings.scenario,
        "starting load test"
    );

    let functional = async {
        if settings.scenario.functional()
            && tokio::time::timeout(
                FUNCTIONAL_MAX_DURATION,
                functional::run(&client, &settings.chain_ids),
            )
            .await
            .is_err()
        {
            warn!("functional scenario exceeded its maximum duration");
        }
    };
    let loading = async {
        if settings.scenario.loading() {
            loading::run(&client, &settings.chain_ids, &settings.stages).await;
        }
    };
    tokio::join!(functional, loading);

    let summary = metrics.summary();
    println!("\n--- Load Test Summary ---");
    print!("{summary}");

    let violations = Thresholds::standard().violations(&summary);
    for threshold in &violations {
        println!("threshold crossed: {threshold}");
    }
    Ok(violations.is_empty())
}

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    let env = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::resolve(cli, env) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid base URL: {}", e);
            exit(1);
        }
    };

    match run(settings).await {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            error!(%e, "Load test failed");
            exit(1);
        }
    }
}

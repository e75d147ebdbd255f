//! TermMax order history tracker.
//!
//! This binary collects the events of an order, prints the history table
//! and the order summary, and optionally exports the history as JSON/CSV.

mod config;
mod error;

use std::{fs::File, io::BufWriter, process::exit};

use alloy::{
    primitives::Address,
    providers::ProviderBuilder,
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use clap::Parser;
use termmax_tools::{
    abi::ORDER_DESCRIPTOR,
    descriptor::{TrackedTopics, event_signatures, parse_descriptor},
    history::HistoryBuilder,
    ledger::RpcLedger,
    report::{self, DisplayOptions},
};
use tracing::{error, info};
use url::Url;

use config::{CliConfig, EnvConfig};
use error::Result;

fn list_events() -> Result<()> {
    let entries = parse_descriptor(ORDER_DESCRIPTOR)?;
    for signature in event_signatures(&entries).values() {
        println!("{}", signature.display);
        println!("  {}", signature.topic);
    }
    Ok(())
}

async fn run(cli: CliConfig, env: EnvConfig, order: Address, rpc_url: Url) -> Result<()> {
    let topics = TrackedTopics::order()?;
    let limits = env.limits();

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(env.rpc_retries, 100, 200))
        .http(rpc_url);
    let provider = ProviderBuilder::new().connect_client(client);
    let ledger = RpcLedger::new(provider, limits.rpc_timeout());

    info!(%order, start_block = cli.start_block, end_block = ?cli.end_block, "tracking order history");
    let history = HistoryBuilder::new(&ledger, order, topics)
        .from_block(cli.start_block)
        .to_block(cli.end_block)
        .with_limits(limits)
        .build()
        .await;
    if let Some(diagnostic) = &history.order.diagnostic {
        error!(%diagnostic, "order info is incomplete");
    }

    print!(
        "{}",
        report::history_table(
            &history.events,
            DisplayOptions {
                limit: cli.limit,
                detailed: cli.show_details,
            },
        )
    );

    if let Some(path) = &cli.output_file {
        std::fs::write(path, report::to_json(&history.events, &history.order)?)?;
        println!("\nResults saved to {}", path.display());
    }

    if let Some(path) = &cli.csv_file {
        report::write_csv(&history.events, BufWriter::new(File::create(path)?))?;
        println!("\nCSV order history exported to {}", path.display());
    }

    print!("{}", report::summary(&history.events, &history.order.value));
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse CLI arguments, usage errors exit with 1
    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    // Parse environment configuration
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

    let result = match (cli.list_events, cli.order, cli.rpc_url.clone()) {
        (true, _, _) => list_events(),
        (false, Some(order), Some(rpc_url)) => run(cli, env, order, rpc_url).await,
        _ => {
            eprintln!("Usage: order_history <order-address> <rpc-url> [options]");
            exit(1);
        }
    };

    if let Err(e) = result {
        error!(%e, "Order history tracking failed");
        exit(1);
    }
}

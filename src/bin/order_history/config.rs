//! Configuration for the order history tracker.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): request limits
//! - CLI arguments: order, RPC endpoint and report options

use std::{path::PathBuf, time::Duration};

use alloy::primitives::Address;
use clap::Parser;
use termmax_tools::Limits;
use url::Url;

/// Environment configuration, variables prefixed with `ORDER_HISTORY_`.
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Maximum number of blocks per log query
    #[serde(default = "default_block_batch_size")]
    pub block_batch_size: u64,

    /// Maximum number of concurrent block lookups
    #[serde(default = "default_timestamp_batch_size")]
    pub timestamp_batch_size: usize,

    /// Deadline of a single RPC call
    #[serde(default = "default_rpc_timeout_seconds")]
    pub rpc_timeout_seconds: u64,

    /// Retries of rate limited RPC calls
    #[serde(default = "default_rpc_retries")]
    pub rpc_retries: u32,
}

fn default_block_batch_size() -> u64 {
    10_000
}

fn default_timestamp_batch_size() -> usize {
    50
}

fn default_rpc_timeout_seconds() -> u64 {
    30
}

fn default_rpc_retries() -> u32 {
    3
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("ORDER_HISTORY_").from_env()
    }

    pub fn limits(&self) -> Limits {
        Limits::custom(
            self.block_batch_size,
            self.timestamp_batch_size,
            Duration::from_secs(self.rpc_timeout_seconds),
        )
    }
}

/// CLI arguments of the tracker.
#[derive(Debug, Parser)]
#[command(name = "order_history")]
#[command(about = "Track and report the event history of a TermMax order")]
#[command(version)]
pub struct CliConfig {
    /// Order contract address
    #[arg(required_unless_present = "list_events")]
    pub order: Option<Address>,

    /// RPC URL of the node
    #[arg(required_unless_present = "list_events")]
    pub rpc_url: Option<Url>,

    /// First block to query
    #[arg(long, default_value = "0")]
    pub start_block: u64,

    /// Last block to query (default: current head)
    #[arg(long)]
    pub end_block: Option<u64>,

    /// Resolve block timestamps (always enabled, kept for compatibility)
    #[arg(long)]
    pub include_timestamps: bool,

    /// Print a detailed view of the first events
    #[arg(long)]
    pub show_details: bool,

    /// Maximum number of events displayed
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Write the history as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "order-history.json")]
    pub output_file: Option<PathBuf>,

    /// Write the history as CSV
    #[arg(long, num_args = 0..=1, default_missing_value = "order-history.csv")]
    pub csv_file: Option<PathBuf>,

    /// Print the signatures and topics of the order events and exit
    #[arg(long)]
    pub list_events: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = CliConfig::try_parse_from([
            "order_history",
            "0x0101010101010101010101010101010101010101",
            "http://localhost:8545",
        ])
        .unwrap();
        assert_eq!(cli.order, Some(Address::repeat_byte(1)));
        assert_eq!(cli.start_block, 0);
        assert_eq!(cli.end_block, None);
        assert_eq!(cli.limit, 20);
        assert!(cli.output_file.is_none());
        assert!(cli.csv_file.is_none());
    }

    #[test]
    fn test_cli_output_files() {
        let cli = CliConfig::try_parse_from([
            "order_history",
            "0x0101010101010101010101010101010101010101",
            "http://localhost:8545",
            "--output-file",
            "--csv-file",
            "out.csv",
            "--end-block",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.output_file, Some(PathBuf::from("order-history.json")));
        assert_eq!(cli.csv_file, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.end_block, Some(100));
    }

    #[test]
    fn test_cli_requires_order() {
        assert!(CliConfig::try_parse_from(["order_history"]).is_err());
        assert!(CliConfig::try_parse_from(["order_history", "--list-events"]).is_ok());
    }

    #[test]
    fn test_env_defaults() {
        let env: EnvConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(env.block_batch_size, 10_000);
        assert_eq!(env.timestamp_batch_size, 50);
        assert_eq!(env.rpc_retries, 3);
        assert_eq!(env.limits().rpc_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_zero_timeout() {
        let env: EnvConfig = envy::from_iter(vec![(
            "RPC_TIMEOUT_SECONDS".to_string(),
            "0".to_string(),
        )])
        .unwrap();
        assert_eq!(env.rpc_timeout_seconds, 0);
        assert_eq!(env.limits().rpc_timeout(), Duration::from_secs(1));
    }
}

//! TermMax order tooling.
//!
//! # Overview
//!
//! Read-side indexer reconstructing the event history of a TermMax order
//! from the ledger.
//!
//! Use [`history::HistoryBuilder`] to collect, classify and enrich the
//! events of an order, then [`report`] to render the resulting
//! [`history::OrderHistory`] as a console report, JSON or CSV.
//!
//! [`deploy`] converts market deployment spreadsheets into the JSON consumed
//! by the deployment scripts.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Ledger history is assumed final, reorgs are not detected.
//!
//! * Vault, router and gearing token events are not tracked.
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory ledger with order, market and
//! token fixtures.
//!

pub mod abi;
pub mod classify;
pub mod collection;
pub mod deploy;
pub mod descriptor;
pub mod enrich;
pub mod error;
pub mod history;
pub mod info;
pub mod ledger;
pub mod num;
pub mod query;
pub mod report;
pub mod testing;
pub mod types;

use std::time::Duration;

#[derive(Clone, Debug)]
/// Bounds of the requests issued to the ledger.
pub struct Limits {
    block_batch_size: u64,
    timestamp_batch_size: usize,
    rpc_timeout: Duration,
}

const MIN_RPC_TIMEOUT: Duration = Duration::from_secs(1);

impl Limits {
    pub fn standard() -> Self {
        Self {
            block_batch_size: 10_000,
            timestamp_batch_size: 50,
            rpc_timeout: Duration::from_secs(30),
        }
    }

    /// Zero batch sizes are raised to one, timeouts to one second.
    pub fn custom(block_batch_size: u64, timestamp_batch_size: usize, rpc_timeout: Duration) -> Self {
        Self {
            block_batch_size: block_batch_size.max(1),
            timestamp_batch_size: timestamp_batch_size.max(1),
            rpc_timeout: rpc_timeout.max(MIN_RPC_TIMEOUT),
        }
    }

    /// Maximum number of blocks covered by a single log query.
    pub fn block_batch_size(&self) -> u64 {
        self.block_batch_size
    }

    /// Maximum number of concurrent block lookups.
    pub fn timestamp_batch_size(&self) -> usize {
        self.timestamp_batch_size
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::standard()
    }
}

//! Read access to the ledger.

use std::{future::IntoFuture, time::Duration};

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, Bytes},
    providers::Provider,
    rpc::types::{Filter, Log, TransactionRequest},
};

use crate::error::LedgerError;

/// Log query for a single topic over an inclusive block range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LogQuery {
    pub address: Address,
    pub topic0: B256,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogQuery {
    pub fn filter(&self) -> Filter {
        Filter::new()
            .address(self.address)
            .event_signature(self.topic0)
            .from_block(self.from_block)
            .to_block(self.to_block)
    }
}

/// Read calls the history tracker issues against the ledger.
///
/// Implemented over an alloy [`Provider`] by [`RpcLedger`], and in memory by
/// [`crate::testing::MockLedger`].
pub trait Ledger {
    /// Number of the most recent block.
    fn head_block(&self) -> impl Future<Output = Result<u64, LedgerError>>;

    /// Logs matching the query, in ledger order.
    fn logs(&self, query: LogQuery) -> impl Future<Output = Result<Vec<Log>, LedgerError>>;

    /// Unix timestamp of the block, `None` if the block is unknown.
    fn block_timestamp(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<Option<u64>, LedgerError>>;

    /// Executes a view call at the latest block and returns the raw output.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes, LedgerError>>;
}

/// [`Ledger`] over an alloy [`Provider`], bounding every call with a deadline.
///
/// It is recommended to setup the provider with
/// [`alloy::transports::layers::RetryBackoffLayer`].
#[derive(Clone, derive_more::Debug)]
pub struct RpcLedger<P> {
    #[debug(skip)]
    provider: P,
    timeout: Duration,
}

impl<P: Provider> RpcLedger<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn bounded<T, E, F>(&self, call: F) -> Result<T, LedgerError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        LedgerError: From<E>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(LedgerError::from),
            Err(_) => Err(LedgerError::Timeout(self.timeout)),
        }
    }
}

impl<P: Provider> Ledger for RpcLedger<P> {
    async fn head_block(&self) -> Result<u64, LedgerError> {
        self.bounded(self.provider.get_block_number()).await
    }

    async fn logs(&self, query: LogQuery) -> Result<Vec<Log>, LedgerError> {
        let filter = query.filter();
        self.bounded(self.provider.get_logs(&filter)).await
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, LedgerError> {
        let block = self
            .bounded(
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number)),
            )
            .await?;
        Ok(block.map(|b| b.into_header().timestamp))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.bounded(self.provider.call(tx)).await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_log_query_filter() {
        let query = LogQuery {
            address: address!("0x00000000000000000000000000000000000000aa"),
            topic0: b256!("0x1111111111111111111111111111111111111111111111111111111111111111"),
            from_block: 10,
            to_block: 20,
        };
        let filter = query.filter();
        assert_eq!(filter.get_from_block(), Some(10));
        assert_eq!(filter.get_to_block(), Some(20));
        assert!(filter.address.matches(&query.address));
        assert!(filter.topics[0].matches(&query.topic0));
    }
}

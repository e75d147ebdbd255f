//! Order history reconstruction.
//!
//! [`HistoryBuilder`] runs the whole pipeline: order snapshot, batched log
//! collection, classification, block time resolution and enrichment.
//! Each stage is best effort, so the resulting [`OrderHistory`] is always
//! usable, with [`EventsCollection::incomplete`] and the snapshot diagnostic
//! telling what is missing.

use alloy::primitives::Address;

use crate::{
    Limits,
    classify::classify,
    collection::EventsCollection,
    descriptor::TrackedTopics,
    enrich::{Enricher, resolve_timestamps},
    info::fetch_order_info,
    ledger::Ledger,
    query::collect_logs,
    types::{EnrichedEvent, OrderInfo, Partial},
};

/// Enriched event history of an order along with the order snapshot.
#[derive(Debug)]
pub struct OrderHistory {
    pub order: Partial<OrderInfo>,
    pub events: EventsCollection<EnrichedEvent>,
}

/// Builds the event history of a single order.
pub struct HistoryBuilder<'l, L> {
    ledger: &'l L,
    order: Address,
    topics: TrackedTopics,
    from_block: u64,
    to_block: Option<u64>,
    limits: Limits,
}

impl<'l, L: Ledger> HistoryBuilder<'l, L> {
    /// Creates a new [`HistoryBuilder`] covering the whole order history
    /// up to the current head.
    pub fn new(ledger: &'l L, order: Address, topics: TrackedTopics) -> Self {
        Self {
            ledger,
            order,
            topics,
            from_block: 0,
            to_block: None,
            limits: Limits::standard(),
        }
    }

    /// Sets the first block to query (default: genesis).
    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = block;
        self
    }

    /// Sets the last block to query (default: current head).
    pub fn to_block(mut self, block: Option<u64>) -> Self {
        self.to_block = block;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn build(self) -> OrderHistory {
        let order = fetch_order_info(self.ledger, self.order).await;
        let raw = collect_logs(
            self.ledger,
            self.order,
            &self.topics,
            self.from_block,
            self.to_block,
            &self.limits,
        )
        .await;
        let events = classify(&raw);
        let timestamps =
            resolve_timestamps(self.ledger, &events, self.limits.timestamp_batch_size()).await;
        let events = Enricher::new(&order.value).enrich(&events, &timestamps);
        OrderHistory { order, events }
    }
}

/// Tracks the history of `order` over `[from_block, to_block]` with the
/// given limits.
pub async fn track_order_history<L: Ledger>(
    ledger: &L,
    order: Address,
    topics: TrackedTopics,
    from_block: u64,
    to_block: Option<u64>,
    limits: Limits,
) -> OrderHistory {
    HistoryBuilder::new(ledger, order, topics)
        .from_block(from_block)
        .to_block(to_block)
        .with_limits(limits)
        .build()
        .await
}

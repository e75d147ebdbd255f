//! Batched retrieval of the tracked order event logs.

use std::collections::BTreeMap;

use alloy::{primitives::Address, rpc::types::Log};

use crate::{
    Limits,
    descriptor::TrackedTopics,
    ledger::{Ledger, LogQuery},
    types::EventKind,
};

/// Iterator over consecutive inclusive block windows of at most `width` blocks.
#[derive(Clone, Debug)]
pub struct BlockWindows {
    next: Option<u64>,
    end: u64,
    width: u64,
}

impl BlockWindows {
    pub fn new(start: u64, end: u64, width: u64) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
            width: width.max(1),
        }
    }
}

impl Iterator for BlockWindows {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let from = self.next?;
        let to = from.saturating_add(self.width - 1).min(self.end);
        self.next = to.checked_add(1).filter(|n| *n <= self.end);
        Some((from, to))
    }
}

/// Raw logs of the tracked event kinds, each list in retrieval order.
#[derive(Clone, Debug, Default)]
pub struct RawLogs {
    logs: BTreeMap<EventKind, Vec<Log>>,
    incomplete: bool,
    diagnostic: Option<String>,
}

impl RawLogs {
    pub fn logs(&self, kind: EventKind) -> &[Log] {
        self.logs.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collection stopped early, logs of later blocks may be missing.
    pub fn incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub(crate) fn push(&mut self, kind: EventKind, logs: Vec<Log>) {
        self.logs.entry(kind).or_default().extend(logs);
    }

    fn interrupt(&mut self, diagnostic: String) {
        self.incomplete = true;
        self.diagnostic = Some(diagnostic);
    }
}

/// Collects the logs of the tracked events emitted by `address` within
/// `[from_block, to_block]`, up to the current head when no end is given.
///
/// Windows are fetched sequentially, the queries of a window concurrently.
/// Failures do not propagate: logs of the windows fetched so far are kept
/// and the result is flagged as incomplete.
pub async fn collect_logs<L: Ledger>(
    ledger: &L,
    address: Address,
    topics: &TrackedTopics,
    from_block: u64,
    to_block: Option<u64>,
    limits: &Limits,
) -> RawLogs {
    let mut result = RawLogs::default();
    let end = match to_block {
        Some(end) => end,
        None => match ledger.head_block().await {
            Ok(head) => head,
            Err(err) => {
                tracing::error!(%err, "failed to resolve head block");
                result.interrupt(format!("head block: {err}"));
                return result;
            }
        },
    };

    tracing::info!(from_block, end, %address, "querying order events");
    for (from, to) in BlockWindows::new(from_block, end, limits.block_batch_size()) {
        tracing::debug!(from, to, "querying block window");
        let queries = EventKind::ALL.map(|kind| {
            ledger.logs(LogQuery {
                address,
                topic0: topics.topic(kind),
                from_block: from,
                to_block: to,
            })
        });
        match futures::future::try_join_all(queries).await {
            Ok(batches) => {
                for (kind, logs) in EventKind::ALL.into_iter().zip(batches) {
                    result.push(kind, logs);
                }
            }
            Err(err) => {
                tracing::error!(from, to, %err, "failed to query block window");
                result.interrupt(format!("blocks {from}..={to}: {err}"));
                break;
            }
        }
    }
    tracing::info!(
        logs = result.len(),
        incomplete = result.incomplete,
        "order events collected"
    );
    result
}

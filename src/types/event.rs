use alloy::primitives::{Address, I256, TxHash, U256};
use chrono::{DateTime, SecondsFormat, Utc};

use super::{Direction, EventKind, LogPosition, OperationType};

/// Event along with its ledger position.
#[derive(Clone, Debug, PartialEq)]
pub struct EventContext<T> {
    pub(crate) block_number: u64,
    pub(crate) tx_hash: TxHash,
    pub(crate) log_index: u64,
    pub(crate) kind: EventKind,
    pub(crate) event: T,
}

impl<T> EventContext<T> {
    pub fn new(block_number: u64, tx_hash: TxHash, log_index: u64, kind: EventKind, event: T) -> Self {
        Self {
            block_number,
            tx_hash,
            log_index,
            kind,
            event,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    /// Kind of the ledger event the payload was decoded from.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn position(&self) -> LogPosition {
        LogPosition::new(self.block_number, self.log_index)
    }

    pub fn event(&self) -> &T {
        &self.event
    }

    pub(crate) fn pass<O>(&self, other: O) -> EventContext<O> {
        EventContext {
            block_number: self.block_number,
            tx_hash: self.tx_hash,
            log_index: self.log_index,
            kind: self.kind,
            event: other,
        }
    }
}

/// Swap against the order, amounts normalized to conceptual in/out legs
/// whichever side of the trade was fixed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Swap {
    pub token_in: Address,
    pub token_out: Address,
    pub caller: Address,
    pub recipient: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee: U256,
}

/// Change of order reserves and/or curve configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateOrder {
    pub ft_change: I256,
    pub xt_change: I256,
    pub gt_id: U256,
    pub max_xt_reserve: U256,
    pub swap_trigger: Address,
}

impl UpdateOrder {
    /// A positive leg makes it a deposit even if the other leg is negative.
    pub fn operation(&self) -> OperationType {
        if self.ft_change.is_positive() || self.xt_change.is_positive() {
            OperationType::Deposit
        } else if self.ft_change.is_negative() || self.xt_change.is_negative() {
            OperationType::Withdraw
        } else {
            OperationType::UpdateCurve
        }
    }
}

/// Withdrawal of arbitrary assets from the order by its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawAssets {
    pub token: Address,
    pub owner: Address,
    pub recipient: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderInitialized {
    pub market: Address,
    pub maker: Address,
    pub max_xt_reserve: U256,
    pub swap_trigger: Address,
}

/// Normalized order event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderEvent {
    Swap(Swap),
    UpdateOrder(UpdateOrder),
    WithdrawAssets(WithdrawAssets),
    OrderInitialized(OrderInitialized),
}

impl OrderEvent {
    pub fn operation(&self) -> OperationType {
        match self {
            OrderEvent::Swap(_) => OperationType::Swap,
            OrderEvent::UpdateOrder(u) => u.operation(),
            OrderEvent::WithdrawAssets(_) => OperationType::Withdraw,
            OrderEvent::OrderInitialized(_) => OperationType::Create,
        }
    }
}

/// Net economic flow of a swap, with the leg that nets against itself removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbstractFlow {
    pub in_symbol: String,
    pub out_symbol: String,
    pub in_amount: String,
    pub out_amount: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedSwap {
    pub raw: Swap,
    pub token_in_symbol: String,
    pub token_out_symbol: String,
    pub token_in_amount: String,
    pub token_out_amount: String,
    pub fee_amount: String,
    pub days_to_maturity: Option<i64>,
    pub direction: Direction,
    pub flow: Option<AbstractFlow>,
    /// Annualized rate, only present while the market has days left to maturity.
    pub avg_matched_interest_rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedUpdateOrder {
    pub raw: UpdateOrder,
    pub ft_change: String,
    pub xt_change: String,
    pub max_xt_reserve: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedWithdrawAssets {
    pub raw: WithdrawAssets,
    pub token_symbol: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedOrderInitialized {
    pub raw: OrderInitialized,
    pub max_xt_reserve: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnrichedDetails {
    Swap(EnrichedSwap),
    UpdateOrder(EnrichedUpdateOrder),
    WithdrawAssets(EnrichedWithdrawAssets),
    OrderInitialized(EnrichedOrderInitialized),
}

/// Order event with resolved block time and human readable amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedEvent {
    pub timestamp: Option<u64>,
    pub details: EnrichedDetails,
}

impl EnrichedEvent {
    pub fn operation(&self) -> OperationType {
        match &self.details {
            EnrichedDetails::Swap(_) => OperationType::Swap,
            EnrichedDetails::UpdateOrder(u) => u.raw.operation(),
            EnrichedDetails::WithdrawAssets(_) => OperationType::Withdraw,
            EnrichedDetails::OrderInitialized(_) => OperationType::Create,
        }
    }

    /// Block time as an ISO-8601 UTC string with milliseconds.
    pub fn date(&self) -> Option<String> {
        self.timestamp.and_then(iso_date)
    }
}

/// Formats unix seconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn iso_date(timestamp: u64) -> Option<String> {
    let secs = i64::try_from(timestamp).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

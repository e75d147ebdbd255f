//! Enrichment of order events with block time, token labels and the
//! economic view of swaps.

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::{Address, I256, U256};
use fastnum::{D256, dec256};
use itertools::Itertools;

use crate::{
    collection::EventsCollection,
    ledger::Ledger,
    num::{Converter, DEFAULT_DECIMALS, format_signed_units, format_units},
    types::{
        AbstractFlow, Direction, EnrichedDetails, EnrichedEvent, EnrichedOrderInitialized,
        EnrichedSwap, EnrichedUpdateOrder, EnrichedWithdrawAssets, EventContext, MarketTokens,
        OrderEvent, OrderInfo, Swap, TokenInfo,
    },
};

const SECONDS_PER_DAY: i64 = 86400;
const DAYS_PER_YEAR: D256 = dec256!(365);

/// Resolves timestamps of the blocks referenced by the events.
///
/// Distinct blocks are fetched in sequential batches of `batch_size`
/// concurrent requests. Blocks that fail or are unknown are left out.
pub async fn resolve_timestamps<L: Ledger, T>(
    ledger: &L,
    events: &EventsCollection<T>,
    batch_size: usize,
) -> BTreeMap<u64, u64> {
    let blocks = events
        .chronological()
        .iter()
        .map(|e| e.block_number())
        .collect::<BTreeSet<_>>();
    let mut timestamps = BTreeMap::new();
    for batch in &blocks.into_iter().chunks(batch_size.max(1)) {
        let batch = batch.collect::<Vec<_>>();
        let results =
            futures::future::join_all(batch.iter().map(|n| ledger.block_timestamp(*n))).await;
        for (block, result) in batch.into_iter().zip(results) {
            match result {
                Ok(Some(ts)) => {
                    timestamps.insert(block, ts);
                }
                Ok(None) => tracing::warn!(block, "block not found, timestamp unknown"),
                Err(err) => tracing::warn!(block, %err, "failed to fetch block timestamp"),
            }
        }
    }
    tracing::debug!(blocks = timestamps.len(), "block timestamps resolved");
    timestamps
}

/// Derives display and economic fields of events from the order snapshot.
#[derive(Debug)]
pub struct Enricher<'a> {
    order: &'a OrderInfo,
}

impl<'a> Enricher<'a> {
    pub fn new(order: &'a OrderInfo) -> Self {
        Self { order }
    }

    fn tokens(&self) -> Option<&MarketTokens> {
        self.order.tokens()
    }

    fn token(&self, address: Address) -> TokenInfo {
        self.tokens()
            .and_then(|t| t.find(address))
            .cloned()
            .unwrap_or_else(|| TokenInfo::unknown(address))
    }

    fn debt_decimals(&self) -> u8 {
        self.tokens()
            .map(|t| t.debt_token.value.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    fn ft_decimals(&self) -> u8 {
        self.tokens()
            .map(|t| t.ft.value.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    fn xt_decimals(&self) -> u8 {
        self.tokens()
            .map(|t| t.xt.value.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    /// Whole days left to maturity at the given time, negative once matured.
    pub fn days_to_maturity(&self, timestamp: Option<u64>) -> Option<i64> {
        let maturity = i64::try_from(self.order.maturity()?).ok()?;
        let timestamp = i64::try_from(timestamp?).ok()?;
        Some((maturity - timestamp).div_euclid(SECONDS_PER_DAY))
    }

    pub fn enrich_event(&self, event: &OrderEvent, timestamp: Option<u64>) -> EnrichedEvent {
        let details = match event {
            OrderEvent::Swap(swap) => EnrichedDetails::Swap(self.enrich_swap(swap, timestamp)),
            OrderEvent::UpdateOrder(update) => EnrichedDetails::UpdateOrder(EnrichedUpdateOrder {
                raw: update.clone(),
                ft_change: format_signed_units(update.ft_change, self.ft_decimals()),
                xt_change: format_signed_units(update.xt_change, self.xt_decimals()),
                max_xt_reserve: format_units(update.max_xt_reserve, self.xt_decimals()),
            }),
            OrderEvent::WithdrawAssets(withdraw) => {
                let token = self.token(withdraw.token);
                EnrichedDetails::WithdrawAssets(EnrichedWithdrawAssets {
                    raw: withdraw.clone(),
                    amount: format_units(withdraw.amount, token.decimals),
                    token_symbol: token.symbol,
                })
            }
            OrderEvent::OrderInitialized(init) => {
                EnrichedDetails::OrderInitialized(EnrichedOrderInitialized {
                    raw: init.clone(),
                    max_xt_reserve: format_units(init.max_xt_reserve, self.xt_decimals()),
                })
            }
        };
        EnrichedEvent { timestamp, details }
    }

    pub fn enrich_swap(&self, swap: &Swap, timestamp: Option<u64>) -> EnrichedSwap {
        let token_in = self.token(swap.token_in);
        let token_out = self.token(swap.token_out);
        let days_to_maturity = self.days_to_maturity(timestamp);
        let (direction, flow, rate) = match self.abstract_flow(swap, &token_in, &token_out) {
            Some((direction, flow, (numerator, denominator))) => {
                let rate = days_to_maturity
                    .filter(|days| *days > 0)
                    .and_then(|days| annualized_rate(numerator, denominator, days));
                (direction, Some(flow), rate)
            }
            None => (Direction::Other, None, None),
        };
        EnrichedSwap {
            raw: swap.clone(),
            token_in_amount: format_units(swap.amount_in, token_in.decimals),
            token_out_amount: format_units(swap.amount_out, token_out.decimals),
            fee_amount: format_units(swap.fee, self.debt_decimals()),
            token_in_symbol: token_in.symbol,
            token_out_symbol: token_out.symbol,
            days_to_maturity,
            direction,
            flow,
            avg_matched_interest_rate: rate,
        }
    }

    /// Maps the four claim token/debt token pairs onto a direction and the
    /// net flow, the side trading the debt token against itself is netted.
    ///
    /// Also returns the numerator and denominator of the matched rate.
    fn abstract_flow(
        &self,
        swap: &Swap,
        token_in: &TokenInfo,
        token_out: &TokenInfo,
    ) -> Option<(Direction, AbstractFlow, (D256, D256))> {
        let tokens = self.tokens()?;
        let (ft, xt, debt) = (&tokens.ft.value, &tokens.xt.value, &tokens.debt_token.value);
        let debt_decimals = debt.decimals;
        let amount_in = to_signed(swap.amount_in);
        let amount_out = to_signed(swap.amount_out);

        // Net input: the taker pays in a claim token and receives debt tokens
        let net_in = |direction| {
            let in_raw = amount_in - amount_out;
            let abstract_in = Converter::new(debt_decimals).from_signed::<4>(in_raw);
            let abstract_out = Converter::new(token_out.decimals).from_signed::<4>(amount_out);
            let (in_symbol, out_symbol) = match direction {
                Direction::Lend => (&ft.symbol, &xt.symbol),
                _ => (&xt.symbol, &ft.symbol),
            };
            let ratio = match direction {
                Direction::Lend => (abstract_in, abstract_out),
                _ => (abstract_out, abstract_in),
            };
            (
                direction,
                AbstractFlow {
                    in_symbol: in_symbol.clone(),
                    out_symbol: out_symbol.clone(),
                    in_amount: format_signed_units(in_raw, debt_decimals),
                    out_amount: format_units(swap.amount_out, token_out.decimals),
                },
                ratio,
            )
        };
        // Net output: the taker pays debt tokens and receives a claim token
        let net_out = |direction| {
            let out_raw = amount_out - amount_in;
            let abstract_in = Converter::new(token_in.decimals).from_signed::<4>(amount_in);
            let abstract_out = Converter::new(debt_decimals).from_signed::<4>(out_raw);
            let (in_symbol, out_symbol) = match direction {
                Direction::Lend => (&ft.symbol, &xt.symbol),
                _ => (&xt.symbol, &ft.symbol),
            };
            let ratio = match direction {
                Direction::Lend => (abstract_in, abstract_out),
                _ => (abstract_out, abstract_in),
            };
            (
                direction,
                AbstractFlow {
                    in_symbol: in_symbol.clone(),
                    out_symbol: out_symbol.clone(),
                    in_amount: format_units(swap.amount_in, token_in.decimals),
                    out_amount: format_signed_units(out_raw, debt_decimals),
                },
                ratio,
            )
        };

        let pair = (swap.token_in, swap.token_out);
        if pair == (ft.address, debt.address) {
            Some(net_in(Direction::Lend))
        } else if pair == (debt.address, xt.address) {
            Some(net_out(Direction::Lend))
        } else if pair == (xt.address, debt.address) {
            Some(net_in(Direction::Borrow))
        } else if pair == (debt.address, ft.address) {
            Some(net_out(Direction::Borrow))
        } else {
            None
        }
    }

    /// Enriches every event, keeping positions and categories.
    pub fn enrich(
        &self,
        events: &EventsCollection<OrderEvent>,
        timestamps: &BTreeMap<u64, u64>,
    ) -> EventsCollection<EnrichedEvent> {
        events.map(|e: &EventContext<OrderEvent>| {
            self.enrich_event(e.event(), timestamps.get(&e.block_number()).copied())
        })
    }
}

fn to_signed(value: U256) -> I256 {
    // Event amounts are at most 128 bits wide
    I256::try_from(value).unwrap_or(I256::MAX)
}

/// `numerator / denominator * 365 / days`, `None` when undefined or not finite.
pub fn annualized_rate(numerator: D256, denominator: D256, days: i64) -> Option<f64> {
    if denominator.is_zero() || days <= 0 {
        return None;
    }
    let rate = numerator / denominator * DAYS_PER_YEAR / D256::from(days);
    rate.to_string()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
}

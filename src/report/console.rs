use std::fmt::Write;

use super::{EnrichedEvents, day};
use crate::{
    collection::Category,
    num::{DEFAULT_DECIMALS, format_units},
    types::{EnrichedDetails, EnrichedEvent, EnrichedSwap, EventContext, OperationType, OrderInfo},
};

const DETAILED_EVENTS: usize = 5;

#[derive(Clone, Copy, Debug)]
pub struct DisplayOptions {
    /// Maximum number of events listed.
    pub limit: usize,
    /// Also dump the full fields of the first listed events.
    pub detailed: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            detailed: false,
        }
    }
}

fn swap_details(swap: &EnrichedSwap) -> String {
    match &swap.flow {
        Some(flow) => format!(
            "{}: {} {} → {} {}",
            swap.direction, flow.in_amount, flow.in_symbol, flow.out_amount, flow.out_symbol
        ),
        None => format!(
            "{}: {} {} → {} {}",
            swap.direction,
            swap.token_in_amount,
            swap.token_in_symbol,
            swap.token_out_amount,
            swap.token_out_symbol
        ),
    }
}

/// Free text summary of the event for the history table.
fn details(event: &EnrichedEvent) -> String {
    match (&event.details, event.operation()) {
        (EnrichedDetails::Swap(swap), _) => swap_details(swap),
        (EnrichedDetails::UpdateOrder(update), OperationType::Deposit) => {
            let mut legs = Vec::new();
            if update.raw.ft_change.is_positive() {
                legs.push(format!("{} FT", update.ft_change));
            }
            if update.raw.xt_change.is_positive() {
                legs.push(format!("{} XT", update.xt_change));
            }
            format!("Add: {}", legs.join(" and "))
        }
        (EnrichedDetails::UpdateOrder(update), OperationType::Withdraw) => {
            let mut legs = Vec::new();
            if update.raw.ft_change.is_negative() {
                legs.push(format!("{} FT", update.ft_change.trim_start_matches('-')));
            }
            if update.raw.xt_change.is_negative() {
                legs.push(format!("{} XT", update.xt_change.trim_start_matches('-')));
            }
            format!("Remove: {}", legs.join(" and "))
        }
        (EnrichedDetails::UpdateOrder(update), _) => {
            format!("Max XT Reserve: {}", update.max_xt_reserve)
        }
        (EnrichedDetails::WithdrawAssets(withdraw), _) => {
            format!("Remove: {} {}", withdraw.amount, withdraw.token_symbol)
        }
        (EnrichedDetails::OrderInitialized(init), _) => {
            let maker = init.raw.maker.to_string();
            format!(
                "Order Created, Max XT Reserve: {}, Maker: {}...",
                init.max_xt_reserve,
                maker.get(..10).unwrap_or(&maker)
            )
        }
    }
}

fn write_detailed(out: &mut String, idx: usize, event: &EventContext<EnrichedEvent>) {
    let e = event.event();
    _ = writeln!(out, "\nEvent #{}:", idx + 1);
    _ = writeln!(out, "Hash: {}", event.tx_hash());
    _ = writeln!(
        out,
        "Block: {} | Log Index: {}",
        event.block_number(),
        event.log_index()
    );
    _ = writeln!(out, "Type: {}", event.kind());
    _ = writeln!(out, "Operation: {}", e.operation());
    _ = writeln!(
        out,
        "Date: {}",
        e.date().unwrap_or_else(|| "Unknown".to_string())
    );
    match &e.details {
        EnrichedDetails::Swap(swap) => {
            _ = writeln!(out, "Direction: {}", swap.direction);
            _ = writeln!(
                out,
                "Token In: {} {} ({})",
                swap.token_in_amount, swap.token_in_symbol, swap.raw.token_in
            );
            _ = writeln!(
                out,
                "Token Out: {} {} ({})",
                swap.token_out_amount, swap.token_out_symbol, swap.raw.token_out
            );
            _ = writeln!(out, "Fee: {}", swap.fee_amount);
            _ = writeln!(out, "Caller: {}", swap.raw.caller);
            _ = writeln!(out, "Recipient: {}", swap.raw.recipient);
        }
        EnrichedDetails::UpdateOrder(update) => {
            _ = writeln!(out, "FT Change: {}", update.ft_change);
            _ = writeln!(out, "XT Change: {}", update.xt_change);
            _ = writeln!(out, "Max XT Reserve: {}", update.max_xt_reserve);
            _ = writeln!(out, "GT ID: {}", update.raw.gt_id);
            _ = writeln!(out, "Swap Trigger: {}", update.raw.swap_trigger);
        }
        EnrichedDetails::WithdrawAssets(withdraw) => {
            _ = writeln!(
                out,
                "Token: {} ({})",
                withdraw.token_symbol, withdraw.raw.token
            );
            _ = writeln!(out, "Amount: {}", withdraw.amount);
            _ = writeln!(out, "Owner: {}", withdraw.raw.owner);
            _ = writeln!(out, "Recipient: {}", withdraw.raw.recipient);
        }
        EnrichedDetails::OrderInitialized(init) => {
            _ = writeln!(out, "Market: {}", init.raw.market);
            _ = writeln!(out, "Maker: {}", init.raw.maker);
            _ = writeln!(out, "Max XT Reserve: {}", init.max_xt_reserve);
            _ = writeln!(out, "Swap Trigger: {}", init.raw.swap_trigger);
        }
    }
}

/// Renders the most recent events as a table.
pub fn history_table(events: &EnrichedEvents, options: DisplayOptions) -> String {
    let mut out = String::new();
    let all = events.all();
    if all.is_empty() {
        out.push_str("No events found\n");
        return out;
    }

    let shown = &all[..options.limit.min(all.len())];
    _ = writeln!(
        out,
        "\n--- Order History (showing {} of {} events) ---",
        shown.len(),
        all.len()
    );
    out.push_str("Date       | Block   | Type       | Operation | Details\n");
    out.push_str("-----------+---------+------------+-----------+------------------------------------\n");
    for event in shown {
        let date = event.event().date();
        _ = writeln!(
            out,
            "{} | {} | {:<12} | {:<11} | {}",
            date.as_deref().map(day).unwrap_or("Unknown"),
            event.block_number(),
            event.kind().name(),
            event.event().operation().to_string(),
            details(event.event())
        );
    }

    if options.detailed && !shown.is_empty() {
        out.push_str("\n--- Detailed Event View ---\n");
        for (idx, event) in shown.iter().take(DETAILED_EVENTS).enumerate() {
            write_detailed(&mut out, idx, event);
        }
    }

    if all.len() > options.limit {
        _ = writeln!(out, "\n... and {} more events", all.len() - options.limit);
    }
    out
}

/// Renders per category counts and the current order reserves.
pub fn summary(events: &EnrichedEvents, order: &OrderInfo) -> String {
    let mut out = String::from("\n--- Order Summary ---\n");
    _ = writeln!(out, "Total Events: {}", events.len());
    for (label, category) in [
        ("Swaps", Category::Swaps),
        ("Deposits", Category::Deposits),
        ("Withdrawals", Category::Withdrawals),
        ("Curve Updates", Category::UpdateCurves),
        ("Creations", Category::Creations),
    ] {
        _ = writeln!(out, "- {label}: {}", events.category_len(category));
    }
    if events.incomplete() {
        out.push_str("WARNING: event retrieval stopped early, the history may be incomplete\n");
    }

    let ((ft_decimals, ft_symbol), (xt_decimals, xt_symbol)) = match order.tokens() {
        Some(tokens) => (
            (tokens.ft.value.decimals, tokens.ft.value.symbol.as_str()),
            (tokens.xt.value.decimals, tokens.xt.value.symbol.as_str()),
        ),
        None => ((DEFAULT_DECIMALS, "FT"), (DEFAULT_DECIMALS, "XT")),
    };
    out.push_str("\n--- Current Reserves ---\n");
    _ = writeln!(
        out,
        "FT Reserve: {} {ft_symbol}",
        format_units(order.ft_reserve, ft_decimals)
    );
    _ = writeln!(
        out,
        "XT Reserve: {} {xt_symbol}",
        format_units(order.xt_reserve, xt_decimals)
    );
    if let Some(config) = &order.market_info.value.config {
        _ = writeln!(out, "\nMarket Maturity: {}", config.maturity_date);
    }
    out
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, I256, TxHash, U256};

    use super::*;
    use crate::{
        collection::EventsCollection,
        types::{
            Direction, EnrichedOrderInitialized, EnrichedUpdateOrder, EnrichedWithdrawAssets,
            EventKind, OrderEvent, OrderInitialized, UpdateOrder, WithdrawAssets,
        },
    };

    fn update(ft: i64, xt: i64) -> EnrichedEvent {
        EnrichedEvent {
            timestamp: Some(1_700_000_000),
            details: EnrichedDetails::UpdateOrder(EnrichedUpdateOrder {
                raw: UpdateOrder {
                    ft_change: I256::try_from(ft).unwrap(),
                    xt_change: I256::try_from(xt).unwrap(),
                    gt_id: U256::from(3),
                    max_xt_reserve: U256::from(5),
                    swap_trigger: Address::ZERO,
                },
                ft_change: crate::num::format_signed_units(I256::try_from(ft).unwrap(), 0),
                xt_change: crate::num::format_signed_units(I256::try_from(xt).unwrap(), 0),
                max_xt_reserve: "5.0".to_string(),
            }),
        }
    }

    fn collection(events: Vec<(u64, u64, EventKind, EnrichedEvent)>) -> EnrichedEvents {
        let mut raw = EventsCollection::default();
        for (block, log, kind, _) in &events {
            // Payload only matters for categories
            raw.push(EventContext::new(
                *block,
                TxHash::ZERO,
                *log,
                *kind,
                OrderEvent::WithdrawAssets(WithdrawAssets {
                    token: Address::ZERO,
                    owner: Address::ZERO,
                    recipient: Address::ZERO,
                    amount: U256::ZERO,
                }),
            ));
        }
        let mut payloads = events.into_iter().map(|(.., e)| e);
        raw.map(|_| payloads.next().unwrap())
    }

    #[test]
    fn test_details() {
        assert_eq!(details(&update(5, -3)), "Add: 5.0 FT");
        assert_eq!(details(&update(2, 4)), "Add: 2.0 FT and 4.0 XT");
        assert_eq!(details(&update(-2, -4)), "Remove: 2.0 FT and 4.0 XT");
        assert_eq!(details(&update(0, 0)), "Max XT Reserve: 5.0");

        let withdraw = EnrichedEvent {
            timestamp: None,
            details: EnrichedDetails::WithdrawAssets(EnrichedWithdrawAssets {
                raw: WithdrawAssets {
                    token: Address::ZERO,
                    owner: Address::ZERO,
                    recipient: Address::ZERO,
                    amount: U256::from(1),
                },
                token_symbol: "USDC".to_string(),
                amount: "1.5".to_string(),
            }),
        };
        assert_eq!(details(&withdraw), "Remove: 1.5 USDC");

        let init = EnrichedEvent {
            timestamp: None,
            details: EnrichedDetails::OrderInitialized(EnrichedOrderInitialized {
                raw: OrderInitialized {
                    market: Address::ZERO,
                    maker: Address::repeat_byte(0xab),
                    max_xt_reserve: U256::ZERO,
                    swap_trigger: Address::ZERO,
                },
                max_xt_reserve: "7.0".to_string(),
            }),
        };
        let maker = Address::repeat_byte(0xab).to_string();
        assert_eq!(
            details(&init),
            format!("Order Created, Max XT Reserve: 7.0, Maker: {}...", &maker[..10])
        );
    }

    #[test]
    fn test_history_table_limit() {
        let events = collection(vec![
            (10, 2, EventKind::UpdateOrder, update(1, 0)),
            (12, 0, EventKind::UpdateOrder, update(0, 0)),
            (10, 0, EventKind::UpdateOrder, update(-1, 0)),
        ]);
        let table = history_table(
            &events,
            DisplayOptions {
                limit: 2,
                detailed: false,
            },
        );
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines[1], "--- Order History (showing 2 of 3 events) ---");
        assert_eq!(
            lines[4],
            "2023-11-14 | 12 | UpdateOrder  | UpdateCurve | Max XT Reserve: 5.0"
        );
        assert_eq!(
            lines[5],
            "2023-11-14 | 10 | UpdateOrder  | Withdraw    | Remove: 1.0 FT"
        );
        assert_eq!(lines.last(), Some(&"... and 1 more events"));
    }

    #[test]
    fn test_history_table_detailed() {
        let events = collection(
            (0..7)
                .map(|i| (i, 0, EventKind::UpdateOrder, update(1, 0)))
                .collect(),
        );
        let table = history_table(
            &events,
            DisplayOptions {
                limit: 20,
                detailed: true,
            },
        );
        assert!(table.contains("--- Detailed Event View ---"));
        assert!(table.contains("Event #5:"));
        assert!(!table.contains("Event #6:"));
        assert!(table.contains("GT ID: 3"));
        assert!(!table.contains("more events"));
    }

    #[test]
    fn test_empty_history() {
        let events: EnrichedEvents = EventsCollection::default();
        assert_eq!(
            history_table(&events, DisplayOptions::default()),
            "No events found\n"
        );
    }

    #[test]
    fn test_swap_details_without_flow() {
        let swap = EnrichedSwap {
            raw: crate::types::Swap {
                token_in: Address::ZERO,
                token_out: Address::ZERO,
                caller: Address::ZERO,
                recipient: Address::ZERO,
                amount_in: U256::ZERO,
                amount_out: U256::ZERO,
                fee: U256::ZERO,
            },
            token_in_symbol: "FT".to_string(),
            token_out_symbol: "XT".to_string(),
            token_in_amount: "1.0".to_string(),
            token_out_amount: "2.0".to_string(),
            fee_amount: "0.0".to_string(),
            days_to_maturity: None,
            direction: Direction::Other,
            flow: None,
            avg_matched_interest_rate: None,
        };
        assert_eq!(swap_details(&swap), "OTHER: 1.0 FT → 2.0 XT");
    }

    #[test]
    fn test_summary_without_market() {
        let mut order = crate::types::OrderInfo::empty(Address::repeat_byte(1));
        order.ft_reserve = U256::from(10).pow(U256::from(18));
        order.xt_reserve = U256::from(5) * U256::from(10).pow(U256::from(17));

        let summary = summary(&EventsCollection::default(), &order);
        assert_eq!(summary.matches("--- Current Reserves ---").count(), 1);
        assert!(summary.contains("FT Reserve: 1.0 FT\n"));
        assert!(summary.contains("XT Reserve: 0.5 XT\n"));
        assert!(summary.contains("Total Events: 0"));
        assert!(!summary.contains("Market Maturity"));
    }
}

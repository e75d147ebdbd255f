use alloy::primitives::{Address, I256, TxHash, U256};
use serde::Serialize;

use super::EnrichedEvents;
use crate::{
    collection::Category,
    types::{
        Direction, EnrichedDetails, EnrichedEvent, EventContext, EventKind, OperationType,
        OrderInfo, Partial, display_string,
    },
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapFields<'a> {
    token_in: Address,
    token_out: Address,
    caller: Address,
    recipient: Address,
    #[serde(serialize_with = "display_string")]
    token_in_amount: U256,
    #[serde(serialize_with = "display_string")]
    token_out_amount: U256,
    #[serde(serialize_with = "display_string")]
    fee_amount: U256,
    token_in_symbol: &'a str,
    token_out_symbol: &'a str,
    token_in_amount_formatted: &'a str,
    token_out_amount_formatted: &'a str,
    fee_amount_formatted: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_to_maturity: Option<i64>,
    direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    abstract_token_in_symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    abstract_token_out_symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    abstract_token_in_amount_formatted: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    abstract_token_out_amount_formatted: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_matched_interest_rate: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderFields<'a> {
    #[serde(serialize_with = "display_string")]
    ft_change_amt: I256,
    #[serde(serialize_with = "display_string")]
    xt_change_amt: I256,
    #[serde(serialize_with = "display_string")]
    gt_id: U256,
    #[serde(serialize_with = "display_string")]
    max_xt_reserve: U256,
    swap_trigger: Address,
    ft_change_amt_formatted: &'a str,
    xt_change_amt_formatted: &'a str,
    max_xt_reserve_formatted: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawAssetsFields<'a> {
    token: Address,
    owner: Address,
    recipient: Address,
    #[serde(serialize_with = "display_string")]
    amount: U256,
    token_symbol: &'a str,
    amount_formatted: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderInitializedFields<'a> {
    market: Address,
    maker: Address,
    #[serde(serialize_with = "display_string")]
    max_xt_reserve: U256,
    swap_trigger: Address,
    max_xt_reserve_formatted: &'a str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EventFields<'a> {
    Swap(SwapFields<'a>),
    UpdateOrder(UpdateOrderFields<'a>),
    WithdrawAssets(WithdrawAssetsFields<'a>),
    OrderInitialized(OrderInitializedFields<'a>),
}

/// Event as exported, raw amounts as decimal strings next to formatted ones.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonEvent<'a> {
    block_number: u64,
    transaction_hash: TxHash,
    log_index: u64,
    event_type: EventKind,
    operation_type: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(flatten)]
    fields: EventFields<'a>,
}

impl<'a> From<&'a EventContext<EnrichedEvent>> for JsonEvent<'a> {
    fn from(ctx: &'a EventContext<EnrichedEvent>) -> Self {
        let event = ctx.event();
        let fields = match &event.details {
            EnrichedDetails::Swap(s) => EventFields::Swap(SwapFields {
                token_in: s.raw.token_in,
                token_out: s.raw.token_out,
                caller: s.raw.caller,
                recipient: s.raw.recipient,
                token_in_amount: s.raw.amount_in,
                token_out_amount: s.raw.amount_out,
                fee_amount: s.raw.fee,
                token_in_symbol: &s.token_in_symbol,
                token_out_symbol: &s.token_out_symbol,
                token_in_amount_formatted: &s.token_in_amount,
                token_out_amount_formatted: &s.token_out_amount,
                fee_amount_formatted: &s.fee_amount,
                days_to_maturity: s.days_to_maturity,
                direction: s.direction,
                abstract_token_in_symbol: s.flow.as_ref().map(|f| f.in_symbol.as_str()),
                abstract_token_out_symbol: s.flow.as_ref().map(|f| f.out_symbol.as_str()),
                abstract_token_in_amount_formatted: s.flow.as_ref().map(|f| f.in_amount.as_str()),
                abstract_token_out_amount_formatted: s
                    .flow
                    .as_ref()
                    .map(|f| f.out_amount.as_str()),
                avg_matched_interest_rate: s.avg_matched_interest_rate,
            }),
            EnrichedDetails::UpdateOrder(u) => EventFields::UpdateOrder(UpdateOrderFields {
                ft_change_amt: u.raw.ft_change,
                xt_change_amt: u.raw.xt_change,
                gt_id: u.raw.gt_id,
                max_xt_reserve: u.raw.max_xt_reserve,
                swap_trigger: u.raw.swap_trigger,
                ft_change_amt_formatted: &u.ft_change,
                xt_change_amt_formatted: &u.xt_change,
                max_xt_reserve_formatted: &u.max_xt_reserve,
            }),
            EnrichedDetails::WithdrawAssets(w) => {
                EventFields::WithdrawAssets(WithdrawAssetsFields {
                    token: w.raw.token,
                    owner: w.raw.owner,
                    recipient: w.raw.recipient,
                    amount: w.raw.amount,
                    token_symbol: &w.token_symbol,
                    amount_formatted: &w.amount,
                })
            }
            EnrichedDetails::OrderInitialized(i) => {
                EventFields::OrderInitialized(OrderInitializedFields {
                    market: i.raw.market,
                    maker: i.raw.maker,
                    max_xt_reserve: i.raw.max_xt_reserve,
                    swap_trigger: i.raw.swap_trigger,
                    max_xt_reserve_formatted: &i.max_xt_reserve,
                })
            }
        };
        Self {
            block_number: ctx.block_number(),
            transaction_hash: ctx.tx_hash(),
            log_index: ctx.log_index(),
            event_type: ctx.kind(),
            operation_type: event.operation(),
            timestamp: event.timestamp,
            date: event.date(),
            fields,
        }
    }
}

/// Exported order history.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument<'a> {
    swaps: Vec<JsonEvent<'a>>,
    deposits: Vec<JsonEvent<'a>>,
    withdrawals: Vec<JsonEvent<'a>>,
    update_curves: Vec<JsonEvent<'a>>,
    creations: Vec<JsonEvent<'a>>,
    all: Vec<JsonEvent<'a>>,
    incomplete: bool,
    order_info: &'a Partial<OrderInfo>,
}

impl<'a> HistoryDocument<'a> {
    pub fn new(events: &'a EnrichedEvents, order: &'a Partial<OrderInfo>) -> Self {
        let category =
            |c: Category| events.category(c).map(JsonEvent::from).collect::<Vec<_>>();
        Self {
            swaps: category(Category::Swaps),
            deposits: category(Category::Deposits),
            withdrawals: category(Category::Withdrawals),
            update_curves: category(Category::UpdateCurves),
            creations: category(Category::Creations),
            all: events.all().into_iter().map(JsonEvent::from).collect(),
            incomplete: events.incomplete(),
            order_info: order,
        }
    }
}

/// Pretty printed JSON export of the history.
pub fn to_json(
    events: &EnrichedEvents,
    order: &Partial<OrderInfo>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&HistoryDocument::new(events, order))
}

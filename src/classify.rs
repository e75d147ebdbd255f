//! Decoding of raw logs into normalized, categorized order events.

use alloy::{primitives::U256, rpc::types::Log, sol_types::SolEventInterface};

use crate::{
    abi::order::TermMaxOrder::TermMaxOrderEvents,
    collection::EventsCollection,
    error::LedgerError,
    query::RawLogs,
    types::{
        EventContext, EventKind, OrderEvent, OrderInitialized, Swap, UpdateOrder, WithdrawAssets,
    },
};

pub type RawEvent = EventContext<OrderEvent>;

/// Decodes a tracked order event log.
///
/// Exact-output swaps are normalized so `amount_in` is always what the taker
/// paid and `amount_out` what it received.
pub fn decode_log(log: &Log) -> Result<RawEvent, LedgerError> {
    let block_number = log
        .block_number
        .ok_or(LedgerError::MissingLogField("block number"))?;
    let tx_hash = log
        .transaction_hash
        .ok_or(LedgerError::MissingLogField("transaction hash"))?;
    let log_index = log
        .log_index
        .ok_or(LedgerError::MissingLogField("log index"))?;

    let (kind, event) = match TermMaxOrderEvents::decode_log(&log.inner)?.data {
        TermMaxOrderEvents::SwapExactTokenToToken(e) => (
            EventKind::SwapExactTokenToToken,
            OrderEvent::Swap(Swap {
                token_in: e.tokenIn,
                token_out: e.tokenOut,
                caller: e.caller,
                recipient: e.recipient,
                amount_in: U256::from(e.tokenAmtIn),
                amount_out: U256::from(e.netTokenOut),
                fee: U256::from(e.feeAmt),
            }),
        ),
        TermMaxOrderEvents::SwapTokenToExactToken(e) => (
            EventKind::SwapTokenToExactToken,
            OrderEvent::Swap(Swap {
                token_in: e.tokenIn,
                token_out: e.tokenOut,
                caller: e.caller,
                recipient: e.recipient,
                amount_in: U256::from(e.netTokenIn),
                amount_out: U256::from(e.tokenAmtOut),
                fee: U256::from(e.feeAmt),
            }),
        ),
        TermMaxOrderEvents::UpdateOrder(e) => (
            EventKind::UpdateOrder,
            OrderEvent::UpdateOrder(UpdateOrder {
                ft_change: e.ftChangeAmt,
                xt_change: e.xtChangeAmt,
                gt_id: e.gtId,
                max_xt_reserve: e.maxXtReserve,
                swap_trigger: e.swapTrigger,
            }),
        ),
        TermMaxOrderEvents::WithdrawAssets(e) => (
            EventKind::WithdrawAssets,
            OrderEvent::WithdrawAssets(WithdrawAssets {
                token: e.token,
                owner: e.caller,
                recipient: e.recipient,
                amount: e.amount,
            }),
        ),
        TermMaxOrderEvents::OrderInitialized(e) => (
            EventKind::OrderInitialized,
            OrderEvent::OrderInitialized(OrderInitialized {
                market: e.market,
                maker: e.maker,
                max_xt_reserve: e.maxXtReserve,
                swap_trigger: e.swapTrigger,
            }),
        ),
        _ => return Err(LedgerError::Fatal("untracked order event".to_string())),
    };
    Ok(EventContext::new(
        block_number,
        tx_hash,
        log_index,
        kind,
        event,
    ))
}

/// Builds the categorized event collection from the collected logs.
///
/// Logs that fail to decode, lack their position or were returned for a
/// different event kind are logged and skipped.
pub fn classify(raw: &RawLogs) -> EventsCollection<OrderEvent> {
    let mut events = EventsCollection::default();
    events.set_incomplete(raw.incomplete());
    for kind in EventKind::ALL {
        for log in raw.logs(kind) {
            match decode_log(log) {
                Ok(event) if event.kind() == kind => {
                    if !events.push(event) {
                        tracing::warn!(
                            block = log.block_number,
                            log_index = log.log_index,
                            "skipping event at already seen position"
                        );
                    }
                }
                Ok(event) => tracing::warn!(
                    expected = %kind,
                    actual = %event.kind(),
                    block = event.block_number(),
                    "skipping log of unexpected kind"
                ),
                Err(err) => tracing::warn!(
                    %kind,
                    block = log.block_number,
                    log_index = log.log_index,
                    %err,
                    "skipping undecodable log"
                ),
            }
        }
    }
    tracing::info!(
        events = events.len(),
        incomplete = events.incomplete(),
        "order events classified"
    );
    events
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, I256, LogData};

    use super::*;
    use crate::{collection::Category, testing};

    const ORDER: Address = Address::repeat_byte(1);

    #[test]
    fn test_decode_swaps() {
        let (a, b) = (Address::repeat_byte(0xa), Address::repeat_byte(0xb));
        let exact_in = decode_log(&testing::swap_exact_in_log(ORDER, 7, 1, a, b, 1000, 900, 10))
            .unwrap();
        assert_eq!(exact_in.kind(), EventKind::SwapExactTokenToToken);
        assert_eq!(exact_in.position(), crate::types::LogPosition::new(7, 1));
        assert!(matches!(
            exact_in.event(),
            OrderEvent::Swap(Swap { token_in, amount_in, amount_out, fee, .. })
                if *token_in == a
                    && *amount_in == U256::from(1000)
                    && *amount_out == U256::from(900)
                    && *fee == U256::from(10)
        ));

        let exact_out = decode_log(&testing::swap_exact_out_log(ORDER, 8, 0, a, b, 500, 520, 3))
            .unwrap();
        assert_eq!(exact_out.kind(), EventKind::SwapTokenToExactToken);
        assert!(matches!(
            exact_out.event(),
            OrderEvent::Swap(Swap { amount_in, amount_out, .. })
                if *amount_in == U256::from(520) && *amount_out == U256::from(500)
        ));
    }

    #[test]
    fn test_decode_update_and_withdraw() {
        let update = decode_log(&testing::update_order_log(ORDER, 1, 0, 5, -3, U256::from(9)))
            .unwrap();
        assert!(matches!(
            update.event(),
            OrderEvent::UpdateOrder(UpdateOrder { ft_change, xt_change, max_xt_reserve, .. })
                if *ft_change == I256::try_from(5).unwrap()
                    && *xt_change == I256::try_from(-3).unwrap()
                    && *max_xt_reserve == U256::from(9)
        ));

        let caller = Address::repeat_byte(0xcc);
        let withdraw = decode_log(&testing::withdraw_assets_log(
            ORDER,
            2,
            4,
            Address::repeat_byte(0xdd),
            caller,
            U256::from(77),
        ))
        .unwrap();
        assert!(matches!(
            withdraw.event(),
            OrderEvent::WithdrawAssets(WithdrawAssets { owner, amount, .. })
                if *owner == caller && *amount == U256::from(77)
        ));
    }

    #[test]
    fn test_decode_failures() {
        let mut log = testing::update_order_log(ORDER, 1, 0, 1, 0, U256::ZERO);
        log.log_index = None;
        assert!(matches!(
            decode_log(&log),
            Err(LedgerError::MissingLogField("log index"))
        ));

        let garbage = testing::raw_log(ORDER, 1, 0, LogData::new_unchecked(vec![], vec![1, 2].into()));
        assert!(decode_log(&garbage).is_err());
    }

    #[test]
    fn test_classify_skips_bad_logs() {
        let mut raw = RawLogs::default();
        let mut broken = testing::update_order_log(ORDER, 3, 0, 0, 0, U256::ZERO);
        broken.block_number = None;
        raw.push(
            EventKind::UpdateOrder,
            vec![
                testing::update_order_log(ORDER, 1, 0, 5, -3, U256::ZERO),
                broken,
                testing::update_order_log(ORDER, 2, 0, 0, 0, U256::ZERO),
            ],
        );
        raw.push(
            EventKind::OrderInitialized,
            vec![
                testing::order_initialized_log(
                    ORDER,
                    0,
                    0,
                    Address::repeat_byte(2),
                    Address::repeat_byte(3),
                    U256::from(100),
                ),
                // Returned for the wrong query
                testing::update_order_log(ORDER, 4, 0, 1, 1, U256::ZERO),
            ],
        );

        let events = classify(&raw);
        assert_eq!(events.len(), 3);
        assert!(!events.incomplete());
        assert_eq!(events.category_len(Category::Deposits), 1);
        assert_eq!(events.category_len(Category::UpdateCurves), 2);
        assert_eq!(events.category_len(Category::Creations), 1);
    }
}

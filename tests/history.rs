use alloy::primitives::{Address, U256};
use termmax_tools::{
    Limits,
    collection::Category,
    descriptor::TrackedTopics,
    error::LedgerError,
    history::{HistoryBuilder, track_order_history},
    report::{self, DisplayOptions},
    testing::{self, MarketFixture, MockLedger},
    types::{Direction, EnrichedDetails, OperationType},
};

const NOW: u64 = 1_700_000_000;

fn setup(head: u64) -> (MockLedger, MarketFixture) {
    let ledger = MockLedger::new(head);
    let fixture = MarketFixture::new(NOW, 30);
    fixture.install(&ledger);
    (ledger, fixture)
}

/// Tracks a single lending swap, debt token in and XT out.
#[tokio::test]
async fn test_lend_swap_history() {
    let (ledger, fixture) = setup(1_000);
    ledger.add_log(testing::swap_exact_in_log(
        fixture.order,
        100,
        0,
        fixture.debt.address,
        fixture.xt.address,
        1000,
        900,
        10,
    ));
    ledger.set_timestamp(100, NOW);

    let history = track_order_history(
        &ledger,
        fixture.order,
        TrackedTopics::order().unwrap(),
        0,
        None,
        Limits::standard(),
    )
    .await;

    assert!(history.order.is_complete());
    assert_eq!(history.events.len(), 1);
    assert_eq!(history.events.category_len(Category::Swaps), 1);

    let ctx = history.events.all()[0];
    assert_eq!(ctx.block_number(), 100);
    assert_eq!(ctx.log_index(), 0);
    let event = ctx.event();
    assert_eq!(event.operation(), OperationType::Swap);
    assert_eq!(event.timestamp, Some(NOW));

    let EnrichedDetails::Swap(swap) = &event.details else {
        panic!("expected a swap, got {:?}", event.details);
    };
    assert_eq!(swap.direction, Direction::Lend);
    assert_eq!(swap.token_in_symbol, "USDC");
    assert_eq!(swap.token_out_symbol, "XT");
    assert_eq!(swap.token_in_amount, "0.001");
    assert_eq!(swap.token_out_amount, "0.0009");
    assert_eq!(swap.fee_amount, "0.00001");
    assert_eq!(swap.days_to_maturity, Some(30));

    let flow = swap.flow.as_ref().unwrap();
    assert_eq!(flow.in_symbol, "FT");
    assert_eq!(flow.out_symbol, "XT");
    assert_eq!(flow.in_amount, "0.001");
    assert_eq!(flow.out_amount, "-0.0001");

    let rate = swap.avg_matched_interest_rate.unwrap();
    assert!(rate.is_finite());
    assert!((rate - (-10.0 * 365.0 / 30.0)).abs() < 1e-9);
}

/// Tracks a complete order lifecycle and renders every report.
#[tokio::test]
async fn test_order_lifecycle_reports() {
    let (ledger, fixture) = setup(29_999);
    ledger.add_log(testing::order_initialized_log(
        fixture.order,
        10,
        0,
        fixture.market,
        fixture.maker,
        fixture.max_xt_reserve,
    ));
    ledger.add_log(testing::update_order_log(
        fixture.order,
        10,
        1,
        2_000_000,
        1_000_000,
        fixture.max_xt_reserve,
    ));
    ledger.add_log(testing::swap_exact_out_log(
        fixture.order,
        12_000,
        3,
        fixture.xt.address,
        fixture.debt.address,
        500_000,
        600_000,
        1_000,
    ));
    ledger.add_log(testing::update_order_log(
        fixture.order,
        25_000,
        0,
        0,
        0,
        fixture.max_xt_reserve,
    ));
    ledger.add_log(testing::withdraw_assets_log(
        fixture.order,
        25_000,
        2,
        fixture.debt.address,
        fixture.maker,
        U256::from(1_500_000u64),
    ));
    for block in [10, 12_000, 25_000] {
        ledger.set_timestamp(block, NOW + block);
    }

    let history = HistoryBuilder::new(&ledger, fixture.order, TrackedTopics::order().unwrap())
        .build()
        .await;

    let events = &history.events;
    assert_eq!(events.len(), 5);
    assert!(!events.incomplete());
    assert_eq!(events.category_len(Category::Swaps), 1);
    assert_eq!(events.category_len(Category::Deposits), 1);
    assert_eq!(events.category_len(Category::Withdrawals), 1);
    assert_eq!(events.category_len(Category::UpdateCurves), 2);
    assert_eq!(events.category_len(Category::Creations), 1);

    let order: Vec<_> = events
        .all()
        .iter()
        .map(|e| (e.block_number(), e.log_index()))
        .collect();
    assert_eq!(order, vec![(25_000, 0), (25_000, 2), (12_000, 3), (10, 0), (10, 1)]);

    // 3 windows of 10000 blocks, 5 queries each
    assert_eq!(ledger.queries().len(), 15);

    let table = report::history_table(events, DisplayOptions::default());
    assert!(table.contains("showing 5 of 5 events"));
    assert!(table.contains("BORROW"));

    let summary = report::summary(events, &history.order.value);
    assert!(summary.contains("Total Events: 5"));
    assert!(summary.contains("FT Reserve: 5.0 FT"));
    assert!(summary.contains("XT Reserve: 2.5 XT"));
    assert!(!summary.contains("WARNING"));

    let mut csv = Vec::new();
    report::write_csv(events, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "Date,Block,Operation,Direction,Amount,InterestRate");
    assert_eq!(lines[1], "2023-11-14,10,Create,CREATE,10.0,");
    assert_eq!(lines[2], "2023-11-14,10,Deposit,DEPOSIT,2.0,");
    assert!(lines[3].starts_with("2023-11-15,12000,Swap,BORROW,0.1,"));
    assert_eq!(lines.len(), 4);

    let json: serde_json::Value =
        serde_json::from_str(&report::to_json(events, &history.order).unwrap()).unwrap();
    assert_eq!(json["all"].as_array().unwrap().len(), 5);
    assert_eq!(json["all"][0]["timestamp"], NOW + 25_000);
    assert_eq!(json["swaps"][0]["direction"], "BORROW");
    assert_eq!(json["swaps"][0]["tokenInAmount"], "600000");
    assert_eq!(json["orderInfo"]["makerAddress"], fixture.maker.to_string());
    assert_eq!(
        json["orderInfo"]["marketInfo"]["tokens"]["debtToken"]["symbol"],
        "USDC"
    );
}

/// A failing window keeps earlier events and flags the history.
#[tokio::test]
async fn test_partial_history_is_flagged() {
    let (ledger, fixture) = setup(30_000);
    ledger.add_log(testing::update_order_log(
        fixture.order,
        5_000,
        0,
        1_000_000,
        0,
        U256::ZERO,
    ));
    ledger.add_log(testing::update_order_log(
        fixture.order,
        15_000,
        0,
        -1_000_000,
        0,
        U256::ZERO,
    ));
    ledger.fail_logs_from(10_000, LedgerError::Transport("connection reset".to_string()));

    let history = HistoryBuilder::new(&ledger, fixture.order, TrackedTopics::order().unwrap())
        .build()
        .await;
    assert!(history.events.incomplete());
    assert_eq!(history.events.len(), 1);
    assert_eq!(history.events.category_len(Category::Deposits), 1);
    assert!(history.events.all()[0].event().timestamp.is_none());

    let summary = report::summary(&history.events, &history.order.value);
    assert!(summary.contains("WARNING"));
}

/// Unknown orders still produce a usable, empty history.
#[tokio::test]
async fn test_unknown_order() {
    let ledger = MockLedger::new(100);
    let order = Address::repeat_byte(0x99);

    let history = HistoryBuilder::new(&ledger, order, TrackedTopics::order().unwrap())
        .build()
        .await;
    assert!(!history.order.is_complete());
    assert_eq!(history.order.value.address, order);
    assert!(history.events.is_empty());
    assert_eq!(
        report::history_table(&history.events, DisplayOptions::default()),
        "No events found\n"
    );
}

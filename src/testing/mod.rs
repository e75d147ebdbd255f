//! In-memory ledger and test utilities.
//!
//! [`MockLedger`] serves logs, block timestamps and view calls from fixtures
//! and records every log query it receives.
//!
//! [`MarketFixture`] registers a consistent order, market and token set on a
//! [`MockLedger`], while the `*_log` builders produce encoded order event logs.
//!

use std::sync::Mutex;

use alloy::{
    primitives::{Address, Bytes, I256, LogData, U256, keccak256},
    rpc::types::Log,
    sol_types::{SolCall, SolEvent},
};
use dashmap::{DashMap, DashSet};

use crate::{
    abi::{
        erc20::IERC20Metadata,
        market::TermMaxMarket,
        order::TermMaxOrder,
    },
    error::LedgerError,
    ledger::{Ledger, LogQuery},
};

const SECONDS_PER_DAY: u64 = 86400;

/// Ledger backed by in-memory fixtures.
#[derive(Debug, Default)]
pub struct MockLedger {
    head: Mutex<u64>,
    head_failure: Mutex<Option<LedgerError>>,
    logs: Mutex<Vec<Log>>,
    logs_failure: Mutex<Option<(u64, LedgerError)>>,
    timestamps: DashMap<u64, u64>,
    failing_timestamps: DashSet<u64>,
    calls: DashMap<(Address, Bytes), Result<Bytes, LedgerError>>,
    queries: Mutex<Vec<LogQuery>>,
    timestamp_requests: Mutex<Vec<u64>>,
}

impl MockLedger {
    pub fn new(head: u64) -> Self {
        Self {
            head: Mutex::new(head),
            ..Default::default()
        }
    }

    pub fn add_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn set_timestamp(&self, block: u64, timestamp: u64) {
        self.timestamps.insert(block, timestamp);
    }

    pub fn fail_head(&self, err: LedgerError) {
        *self.head_failure.lock().unwrap() = Some(err);
    }

    /// Fails every log query reaching `block` or beyond.
    pub fn fail_logs_from(&self, block: u64, err: LedgerError) {
        *self.logs_failure.lock().unwrap() = Some((block, err));
    }

    pub fn fail_timestamp(&self, block: u64) {
        self.failing_timestamps.insert(block);
    }

    pub fn mock_call<C: SolCall>(&self, to: Address, call: C, ret: &C::Return) {
        self.calls.insert(
            (to, call.abi_encode().into()),
            Ok(C::abi_encode_returns(ret).into()),
        );
    }

    pub fn fail_call<C: SolCall>(&self, to: Address, call: C, err: LedgerError) {
        self.calls.insert((to, call.abi_encode().into()), Err(err));
    }

    /// Log queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<LogQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Blocks whose timestamp was requested, in arrival order.
    pub fn timestamp_requests(&self) -> Vec<u64> {
        self.timestamp_requests.lock().unwrap().clone()
    }
}

impl Ledger for MockLedger {
    async fn head_block(&self) -> Result<u64, LedgerError> {
        if let Some(err) = self.head_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(*self.head.lock().unwrap())
    }

    async fn logs(&self, query: LogQuery) -> Result<Vec<Log>, LedgerError> {
        self.queries.lock().unwrap().push(query);
        if let Some((block, err)) = self.logs_failure.lock().unwrap().clone()
            && query.to_block >= block
        {
            return Err(err);
        }
        let mut logs = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                l.inner.address == query.address
                    && l.inner.data.topics().first() == Some(&query.topic0)
                    && l.block_number
                        .is_some_and(|n| n >= query.from_block && n <= query.to_block)
            })
            .cloned()
            .collect::<Vec<_>>();
        logs.sort_by_key(|l| (l.block_number, l.log_index));
        Ok(logs)
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, LedgerError> {
        self.timestamp_requests.lock().unwrap().push(number);
        if self.failing_timestamps.contains(&number) {
            return Err(LedgerError::Transport(format!("block {number} unavailable")));
        }
        Ok(self.timestamps.get(&number).map(|t| *t))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        self.calls
            .get(&(to, data))
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Err(LedgerError::Reverted("execution reverted".to_string())))
    }
}

/// Deterministic transaction hash for a log position.
pub fn tx_hash(block: u64, log_index: u64) -> alloy::primitives::TxHash {
    keccak256(format!("{block}:{log_index}"))
}

/// Encodes the event as a mined log of `address` at the given position.
pub fn event_log<E: SolEvent>(address: Address, block: u64, log_index: u64, event: &E) -> Log {
    raw_log(address, block, log_index, event.encode_log_data())
}

pub fn raw_log(address: Address, block: u64, log_index: u64, data: LogData) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        block_hash: None,
        block_number: Some(block),
        block_timestamp: None,
        transaction_hash: Some(tx_hash(block, log_index)),
        transaction_index: Some(0),
        log_index: Some(log_index),
        removed: false,
    }
}

fn curve_cuts() -> TermMaxOrder::CurveCuts {
    TermMaxOrder::CurveCuts {
        lendCurveCuts: vec![TermMaxOrder::CurveCut {
            xtReserve: U256::ZERO,
            liqSquare: U256::from(1_000_000u64),
            offset: I256::ZERO,
        }],
        borrowCurveCuts: vec![],
    }
}

#[allow(clippy::too_many_arguments)]
pub fn swap_exact_in_log(
    order: Address,
    block: u64,
    log_index: u64,
    token_in: Address,
    token_out: Address,
    amount_in: u128,
    net_out: u128,
    fee: u128,
) -> Log {
    event_log(
        order,
        block,
        log_index,
        &TermMaxOrder::SwapExactTokenToToken {
            tokenIn: token_in,
            tokenOut: token_out,
            caller: Address::repeat_byte(0xca),
            recipient: Address::repeat_byte(0xce),
            tokenAmtIn: amount_in,
            netTokenOut: net_out,
            feeAmt: fee,
        },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn swap_exact_out_log(
    order: Address,
    block: u64,
    log_index: u64,
    token_in: Address,
    token_out: Address,
    amount_out: u128,
    net_in: u128,
    fee: u128,
) -> Log {
    event_log(
        order,
        block,
        log_index,
        &TermMaxOrder::SwapTokenToExactToken {
            tokenIn: token_in,
            tokenOut: token_out,
            caller: Address::repeat_byte(0xca),
            recipient: Address::repeat_byte(0xce),
            tokenAmtOut: amount_out,
            netTokenIn: net_in,
            feeAmt: fee,
        },
    )
}

pub fn update_order_log(
    order: Address,
    block: u64,
    log_index: u64,
    ft_change: i64,
    xt_change: i64,
    max_xt_reserve: U256,
) -> Log {
    event_log(
        order,
        block,
        log_index,
        &TermMaxOrder::UpdateOrder {
            curveCuts: curve_cuts(),
            ftChangeAmt: I256::try_from(ft_change).unwrap(),
            xtChangeAmt: I256::try_from(xt_change).unwrap(),
            gtId: U256::from(1),
            maxXtReserve: max_xt_reserve,
            swapTrigger: Address::ZERO,
        },
    )
}

pub fn withdraw_assets_log(
    order: Address,
    block: u64,
    log_index: u64,
    token: Address,
    caller: Address,
    amount: U256,
) -> Log {
    event_log(
        order,
        block,
        log_index,
        &TermMaxOrder::WithdrawAssets {
            token,
            caller,
            recipient: caller,
            amount,
        },
    )
}

pub fn order_initialized_log(
    order: Address,
    block: u64,
    log_index: u64,
    market: Address,
    maker: Address,
    max_xt_reserve: U256,
) -> Log {
    event_log(
        order,
        block,
        log_index,
        &TermMaxOrder::OrderInitialized {
            market,
            maker,
            maxXtReserve: max_xt_reserve,
            swapTrigger: Address::ZERO,
            curveCuts: curve_cuts(),
        },
    )
}

/// Token registered by a [`MarketFixture`].
#[derive(Clone, Debug)]
pub struct TokenFixture {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenFixture {
    pub fn new(byte: u8, symbol: &str, decimals: u8) -> Self {
        Self {
            address: Address::repeat_byte(byte),
            name: format!("{symbol} Token"),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// Order with its market and tokens.
///
/// Maturity is relative to `now`, `days_to_maturity` days ahead.
#[derive(Clone, Debug)]
pub struct MarketFixture {
    pub order: Address,
    pub market: Address,
    pub maker: Address,
    pub treasurer: Address,
    pub gt: Address,
    pub ft: TokenFixture,
    pub xt: TokenFixture,
    pub collateral: TokenFixture,
    pub debt: TokenFixture,
    pub now: u64,
    pub maturity: u64,
    pub ft_reserve: U256,
    pub xt_reserve: U256,
    pub max_xt_reserve: U256,
}

impl MarketFixture {
    pub fn new(now: u64, days_to_maturity: u64) -> Self {
        Self {
            order: Address::repeat_byte(0x01),
            market: Address::repeat_byte(0x02),
            maker: Address::repeat_byte(0x03),
            treasurer: Address::repeat_byte(0x04),
            gt: Address::repeat_byte(0x15),
            ft: TokenFixture::new(0x11, "FT", 6),
            xt: TokenFixture::new(0x12, "XT", 6),
            collateral: TokenFixture::new(0x13, "WETH", 18),
            debt: TokenFixture::new(0x14, "USDC", 6),
            now,
            maturity: now + days_to_maturity * SECONDS_PER_DAY,
            ft_reserve: U256::from(5_000_000u64),
            xt_reserve: U256::from(2_500_000u64),
            max_xt_reserve: U256::from(10_000_000u64),
        }
    }

    pub fn install_token(&self, ledger: &MockLedger, token: &TokenFixture) {
        ledger.mock_call(token.address, IERC20Metadata::nameCall {}, &token.name);
        ledger.mock_call(token.address, IERC20Metadata::symbolCall {}, &token.symbol);
        ledger.mock_call(token.address, IERC20Metadata::decimalsCall {}, &token.decimals);
    }

    pub fn install_market(&self, ledger: &MockLedger) {
        ledger.mock_call(
            self.market,
            TermMaxMarket::tokensCall {},
            &TermMaxMarket::tokensReturn {
                _0: self.ft.address,
                _1: self.xt.address,
                _2: self.gt,
                _3: self.collateral.address,
                _4: self.debt.address,
            },
        );
        ledger.mock_call(
            self.market,
            TermMaxMarket::configCall {},
            &TermMaxMarket::MarketConfig {
                treasurer: self.treasurer,
                maturity: self.maturity,
                feeConfig: TermMaxMarket::FeeConfig {
                    lendTakerFeeRatio: 0,
                    lendMakerFeeRatio: 0,
                    borrowTakerFeeRatio: 0,
                    borrowMakerFeeRatio: 0,
                    issueFtFeeRatio: 0,
                    issueFtFeeRef: 0,
                    redeemFeeRatio: 0,
                },
            },
        );
        for token in [&self.ft, &self.xt, &self.collateral, &self.debt] {
            self.install_token(ledger, token);
        }
    }

    pub fn install_order(&self, ledger: &MockLedger) {
        ledger.mock_call(self.order, TermMaxOrder::marketCall {}, &self.market);
        ledger.mock_call(self.order, TermMaxOrder::makerCall {}, &self.maker);
        ledger.mock_call(
            self.order,
            TermMaxOrder::tokenReservesCall {},
            &TermMaxOrder::tokenReservesReturn {
                _0: self.ft_reserve,
                _1: self.xt_reserve,
            },
        );
        ledger.mock_call(
            self.order,
            TermMaxOrder::orderConfigCall {},
            &TermMaxOrder::OrderConfig {
                curveCuts: curve_cuts(),
                gtId: U256::from(1),
                maxXtReserve: self.max_xt_reserve,
                swapTrigger: Address::ZERO,
                feeConfig: TermMaxOrder::FeeConfig {
                    lendTakerFeeRatio: 0,
                    lendMakerFeeRatio: 0,
                    borrowTakerFeeRatio: 0,
                    borrowMakerFeeRatio: 0,
                    issueFtFeeRatio: 0,
                    issueFtFeeRef: 0,
                },
            },
        );
    }

    /// Registers order, market and token view calls.
    pub fn install(&self, ledger: &MockLedger) {
        self.install_order(ledger);
        self.install_market(ledger);
    }
}

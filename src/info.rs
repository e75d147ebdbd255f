//! Best-effort snapshots of order, market and token state.
//!
//! Nothing here fails: unavailable values fall back to defaults and the
//! reason is carried as the [`Partial`] diagnostic.

use alloy::{primitives::Address, sol_types::SolCall};

use crate::{
    abi::{erc20::IERC20Metadata, market::TermMaxMarket, order::TermMaxOrder},
    error::LedgerError,
    ledger::Ledger,
    types::{
        GearingTokenRef, MarketConfig, MarketInfo, MarketTokens, OrderConfig, OrderInfo, Partial,
        TokenInfo, iso_date,
    },
};

/// Executes a typed view call through the ledger.
pub async fn view<L: Ledger, C: SolCall>(
    ledger: &L,
    to: Address,
    call: C,
) -> Result<C::Return, LedgerError> {
    let output = ledger.call(to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&output)?)
}

fn join_diagnostics<'a>(errors: impl IntoIterator<Item = &'a LedgerError>) -> Option<String> {
    let joined = errors
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    (!joined.is_empty()).then_some(joined)
}

/// Reads ERC-20 metadata, each field defaulting on its own.
pub async fn fetch_token_info<L: Ledger>(ledger: &L, token: Address) -> Partial<TokenInfo> {
    let (name, symbol, decimals) = futures::join!(
        view(ledger, token, IERC20Metadata::nameCall {}),
        view(ledger, token, IERC20Metadata::symbolCall {}),
        view(ledger, token, IERC20Metadata::decimalsCall {}),
    );
    let diagnostic = join_diagnostics(
        [name.as_ref().err(), symbol.as_ref().err(), decimals.as_ref().err()]
            .into_iter()
            .flatten(),
    );
    if let Some(err) = &diagnostic {
        tracing::warn!(%token, %err, "token metadata unavailable");
    }

    let default = TokenInfo::unknown(token);
    Partial {
        value: TokenInfo {
            address: token,
            name: name.unwrap_or(default.name),
            symbol: symbol.unwrap_or(default.symbol),
            decimals: decimals.unwrap_or(default.decimals),
        },
        diagnostic,
    }
}

/// Reads market tokens and configuration.
///
/// A market whose tokens cannot be read yields empty info, a missing
/// configuration only leaves `config` unset.
pub async fn fetch_market_info<L: Ledger>(ledger: &L, market: Address) -> Partial<MarketInfo> {
    tracing::info!(%market, "fetching market information");
    let (tokens, config) = futures::join!(
        view(ledger, market, TermMaxMarket::tokensCall {}),
        view(ledger, market, TermMaxMarket::configCall {}),
    );
    let tokens = match tokens {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::error!(%market, %err, "failed to fetch market tokens");
            return Partial::degraded(MarketInfo::empty(market), err);
        }
    };
    let config = match config {
        Ok(config) => Some(MarketConfig {
            treasurer: config.treasurer,
            maturity: config.maturity,
            maturity_date: iso_date(config.maturity).unwrap_or_default(),
        }),
        Err(err) => {
            tracing::warn!(%market, %err, "market config unavailable");
            None
        }
    };

    let (ft, xt, collateral, debt_token) = futures::join!(
        fetch_token_info(ledger, tokens._0),
        fetch_token_info(ledger, tokens._1),
        fetch_token_info(ledger, tokens._3),
        fetch_token_info(ledger, tokens._4),
    );
    tracing::info!(
        ft = %ft.value.symbol,
        xt = %xt.value.symbol,
        collateral = %collateral.value.symbol,
        debt = %debt_token.value.symbol,
        maturity = ?config.as_ref().map(|c| &c.maturity_date),
        "market tokens resolved"
    );

    Partial::complete(MarketInfo {
        address: market,
        config,
        tokens: Some(MarketTokens {
            ft,
            xt,
            gt: GearingTokenRef {
                address: tokens._2,
            },
            collateral,
            debt_token,
        }),
    })
}

/// Reads the order snapshot along with its market.
pub async fn fetch_order_info<L: Ledger>(ledger: &L, order: Address) -> Partial<OrderInfo> {
    tracing::info!(%order, "fetching order information");
    let market = match view(ledger, order, TermMaxOrder::marketCall {}).await {
        Ok(market) => market,
        Err(err) => {
            tracing::error!(%order, %err, "failed to fetch order market");
            return Partial::degraded(OrderInfo::empty(order), err);
        }
    };

    let (market_info, maker, reserves, config) = futures::join!(
        fetch_market_info(ledger, market),
        view(ledger, order, TermMaxOrder::makerCall {}),
        view(ledger, order, TermMaxOrder::tokenReservesCall {}),
        view(ledger, order, TermMaxOrder::orderConfigCall {}),
    );
    let order_config = match config {
        Ok(config) => Some(OrderConfig {
            max_xt_reserve: config.maxXtReserve,
            gt_id: config.gtId,
            swap_trigger: config.swapTrigger,
        }),
        Err(err) => {
            tracing::warn!(%order, %err, "order config unavailable");
            None
        }
    };
    let diagnostic = join_diagnostics(
        [maker.as_ref().err(), reserves.as_ref().err()]
            .into_iter()
            .flatten(),
    );
    let mut info = OrderInfo {
        address: order,
        market_address: market,
        market_info,
        order_config,
        ..OrderInfo::empty(order)
    };
    if let Ok(maker) = maker {
        info.maker_address = maker;
    }
    if let Ok(reserves) = reserves {
        info.ft_reserve = reserves._0;
        info.xt_reserve = reserves._1;
    }
    match diagnostic {
        Some(err) => {
            tracing::error!(%order, %err, "order information incomplete");
            Partial::degraded(info, err)
        }
        None => Partial::complete(info),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::*;
    use crate::testing::{MarketFixture, MockLedger};

    const NOW: u64 = 1_700_000_000;

    #[tokio::test]
    async fn test_fetch_order_info() {
        let ledger = MockLedger::new(100);
        let fixture = MarketFixture::new(NOW, 30);
        fixture.install(&ledger);

        let info = fetch_order_info(&ledger, fixture.order).await;
        assert!(info.is_complete());
        let info = info.value;
        assert_eq!(info.market_address, fixture.market);
        assert_eq!(info.maker_address, fixture.maker);
        assert_eq!(info.ft_reserve, fixture.ft_reserve);
        assert_eq!(info.xt_reserve, fixture.xt_reserve);
        assert_eq!(
            info.order_config.as_ref().map(|c| c.max_xt_reserve),
            Some(fixture.max_xt_reserve)
        );
        assert_eq!(info.maturity(), Some(fixture.maturity));

        let tokens = info.tokens().unwrap();
        assert_eq!(tokens.debt_token.value.symbol, "USDC");
        assert_eq!(tokens.debt_token.value.decimals, 6);
        assert_eq!(tokens.collateral.value.decimals, 18);
        assert_eq!(tokens.gt.address, fixture.gt);
    }

    #[tokio::test]
    async fn test_token_fields_default_individually() {
        let ledger = MockLedger::new(100);
        let token = Address::repeat_byte(0x33);
        ledger.mock_call(token, IERC20Metadata::symbolCall {}, &"FOO".to_string());

        let info = fetch_token_info(&ledger, token).await;
        assert!(!info.is_complete());
        assert_eq!(info.value.symbol, "FOO");
        assert_eq!(info.value.name, "Unknown");
        assert_eq!(info.value.decimals, 18);
    }

    #[tokio::test]
    async fn test_order_without_market() {
        let ledger = MockLedger::new(100);
        let order = Address::repeat_byte(0x01);
        let info = fetch_order_info(&ledger, order).await;
        let (info, diagnostic) = info.into_parts();
        assert!(diagnostic.unwrap().contains("reverted"));
        assert_eq!(info.address, order);
        assert!(info.tokens().is_none());
        assert_eq!(info.ft_reserve, U256::ZERO);
    }

    #[tokio::test]
    async fn test_market_without_config() {
        let ledger = MockLedger::new(100);
        let fixture = MarketFixture::new(NOW, 30);
        fixture.install(&ledger);
        ledger.fail_call(
            fixture.market,
            TermMaxMarket::configCall {},
            LedgerError::Reverted("paused".to_string()),
        );

        let info = fetch_market_info(&ledger, fixture.market).await;
        assert!(info.is_complete());
        assert!(info.value.config.is_none());
        assert!(info.value.tokens.is_some());
    }
}

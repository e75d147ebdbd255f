use alloy::primitives::{Address, U256};
use serde::Serialize;

use super::{Partial, display_string};
use crate::num::DEFAULT_DECIMALS;

/// ERC-20 token metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    /// Placeholder used for tokens whose metadata is unavailable.
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            name: "Unknown".to_string(),
            symbol: "Unknown".to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConfig {
    pub treasurer: Address,
    #[serde(serialize_with = "display_string")]
    pub maturity: u64,
    pub maturity_date: String,
}

/// Gearing token reference, its metadata is not used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GearingTokenRef {
    pub address: Address,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTokens {
    pub ft: Partial<TokenInfo>,
    pub xt: Partial<TokenInfo>,
    pub gt: GearingTokenRef,
    pub collateral: Partial<TokenInfo>,
    pub debt_token: Partial<TokenInfo>,
}

impl MarketTokens {
    /// Metadata of a market token by address.
    pub fn find(&self, address: Address) -> Option<&TokenInfo> {
        [&self.ft, &self.xt, &self.collateral, &self.debt_token]
            .into_iter()
            .map(|t| &t.value)
            .find(|t| t.address == address)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MarketInfo {
    pub address: Address,
    pub config: Option<MarketConfig>,
    pub tokens: Option<MarketTokens>,
}

impl MarketInfo {
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            config: None,
            tokens: None,
        }
    }

    pub fn maturity(&self) -> Option<u64> {
        self.config.as_ref().map(|c| c.maturity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfig {
    #[serde(serialize_with = "display_string")]
    pub max_xt_reserve: U256,
    #[serde(serialize_with = "display_string")]
    pub gt_id: U256,
    pub swap_trigger: Address,
}

/// Snapshot of the order state used as enrichment context.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub address: Address,
    pub market_address: Address,
    pub market_info: Partial<MarketInfo>,
    pub maker_address: Address,
    #[serde(serialize_with = "display_string")]
    pub ft_reserve: U256,
    #[serde(serialize_with = "display_string")]
    pub xt_reserve: U256,
    pub order_config: Option<OrderConfig>,
}

impl OrderInfo {
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            market_address: Address::ZERO,
            market_info: Partial::complete(MarketInfo::empty(Address::ZERO)),
            maker_address: Address::ZERO,
            ft_reserve: U256::ZERO,
            xt_reserve: U256::ZERO,
            order_config: None,
        }
    }

    pub fn tokens(&self) -> Option<&MarketTokens> {
        self.market_info.value.tokens.as_ref()
    }

    pub fn maturity(&self) -> Option<u64> {
        self.market_info.value.maturity()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_order_info_serialization() {
        let mut info = OrderInfo::empty(address!("0x00000000000000000000000000000000000000aa"));
        info.ft_reserve = U256::from(10).pow(U256::from(30));
        info.market_info = Partial::degraded(MarketInfo::empty(Address::ZERO), "call reverted");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["ftReserve"], "1000000000000000000000000000000");
        assert_eq!(json["xtReserve"], "0");
        assert_eq!(json["marketInfo"]["error"], "call reverted");
        assert!(json["orderConfig"].is_null());
    }

    #[test]
    fn test_find_market_token() {
        let token = |b: u8| Partial::complete(TokenInfo::unknown(Address::repeat_byte(b)));
        let tokens = MarketTokens {
            ft: token(1),
            xt: token(2),
            gt: GearingTokenRef {
                address: Address::repeat_byte(3),
            },
            collateral: token(4),
            debt_token: token(5),
        };
        assert_eq!(
            tokens.find(Address::repeat_byte(4)).map(|t| t.address),
            Some(Address::repeat_byte(4))
        );
        assert!(tokens.find(Address::repeat_byte(3)).is_none());
    }
}

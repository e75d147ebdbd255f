//! Market deployment configuration.
//!
//! Converts the market deployment spreadsheet (CSV export) into the JSON
//! document read by the deployment scripts. The first CSV row holds section
//! headers and the second one column headers, market records start at the
//! third row. Columns are positional, see [`Schema`].

use std::{fmt, io, str::FromStr};

use alloy::primitives::U256;
use chrono::DateTime;
use csv::StringRecord;
use fastnum::{UD256, udec256};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{error::DeployConfigError, num::Converter};

/// Decimals of the initial prices.
pub const PRICE_DECIMALS: u8 = 8;

const DEFAULT_UNDERLYING_HEARTBEAT: &str = "86400";
const DEFAULT_COLLATERAL_HEARTBEAT: &str = "3600";
const DEFAULT_GT_KEY_IDENTIFIER: &str = "GearingTokenWithERC20";
const HEADER_ROWS: usize = 2;

/// Column layout of the spreadsheet.
///
/// Both layouts start with `marketType, salt, collateralCapForGt, maturity`,
/// six fee columns, `liquidationLtv, maxLtv, liquidatable`, followed by the
/// underlying and collateral token blocks and `gtKeyIdentifier`.
/// A token block is `tokenAddr, priceFeedAddr, heartBeat, name, symbol,
/// decimals, initialPrice`; [`Schema::V2`] adds `backupPriceFeedAddr` right
/// after `priceFeedAddr`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Schema {
    #[default]
    V1,
    V2,
}

impl Schema {
    fn token_columns(&self) -> usize {
        match self {
            Self::V1 => 7,
            Self::V2 => 8,
        }
    }

    fn underlying(&self) -> usize {
        13
    }

    fn collateral(&self) -> usize {
        self.underlying() + self.token_columns()
    }

    fn gt_key_identifier(&self) -> usize {
        self.collateral() + self.token_columns()
    }
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            other => Err(format!("unknown schema `{other}`, expected v1 or v2")),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConfig {
    pub maturity: String,
    pub lend_taker_fee_ratio: String,
    pub lend_maker_fee_ratio: String,
    pub borrow_taker_fee_ratio: String,
    pub borrow_maker_fee_ratio: String,
    pub mint_gt_fee_ratio: String,
    pub mint_gt_fee_ref: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanConfig {
    pub liquidation_ltv: String,
    pub max_ltv: String,
    pub liquidatable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    pub token_addr: String,
    pub price_feed_addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_price_feed_addr: Option<String>,
    pub heart_beat: String,
    pub name: String,
    pub symbol: String,
    pub decimals: String,
    /// Price in [`PRICE_DECIMALS`] base units.
    pub initial_price: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralConfig {
    #[serde(flatten)]
    pub token: TokenConfig,
    pub gt_key_identifier: String,
}

/// Deployment parameters of a single market.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub salt: u64,
    pub collateral_cap_for_gt: String,
    pub market_config: MarketConfig,
    pub loan_config: LoanConfig,
    pub underlying_config: TokenConfig,
    pub collateral_config: CollateralConfig,
    pub market_name: String,
    pub market_symbol: String,
}

/// Converted spreadsheet, markets keyed `configs_<i>` in record order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[serde(serialize_with = "crate::types::display_string")]
    config_num: usize,
    #[serde(serialize_with = "indexed_configs")]
    configs: Vec<MarketData>,
}

impl DeployConfig {
    pub fn configs(&self) -> &[MarketData] {
        &self.configs
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn indexed_configs<S: Serializer>(configs: &[MarketData], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(configs.len()))?;
    for (i, config) in configs.iter().enumerate() {
        map.serialize_entry(&format!("configs_{i}"), config)?;
    }
    map.end()
}

/// Converts a price to [`PRICE_DECIMALS`] base units, rounding down.
///
/// Unparsable prices convert to `"0"`.
pub fn price_to_base_unit(price: &str) -> String {
    match price.parse::<UD256>() {
        Ok(price) => {
            let scaled = (price * udec256!(100000000)).floor();
            Converter::new(0).to_unsigned(scaled).to_string()
        }
        Err(err) => {
            tracing::warn!(price, %err, "invalid price, using 0");
            "0".to_string()
        }
    }
}

/// Market name as `<underlying>/<collateral>-<DDMMMYYYY>`, the date being
/// the UTC maturity day.
pub fn market_name(underlying: &str, collateral: &str, maturity: i64) -> Option<String> {
    let date = DateTime::from_timestamp(maturity, 0)?;
    let date = date.format("%d%b%Y").to_string().to_uppercase();
    Some(format!("{underlying}/{collateral}-{date}"))
}

struct Record<'r> {
    index: usize,
    fields: &'r StringRecord,
}

impl<'r> Record<'r> {
    fn get(&self, column: usize) -> &'r str {
        self.fields.get(column).unwrap_or_default()
    }

    fn or<'a>(&self, column: usize, default: &'a str) -> &'a str
    where
        'r: 'a,
    {
        match self.get(column) {
            "" => default,
            value => value,
        }
    }

    fn parse<T: FromStr>(&self, column: usize, field: &'static str, default: &str) -> Result<T, DeployConfigError> {
        let value = self.or(column, default);
        value.parse().map_err(|_| DeployConfigError::InvalidField {
            record: self.index,
            field,
            value: value.to_string(),
        })
    }

    fn token(&self, start: usize, schema: Schema, heart_beat: &str) -> TokenConfig {
        let (backup, rest) = match schema {
            Schema::V1 => (None, start + 2),
            Schema::V2 => (Some(self.get(start + 2).to_string()), start + 3),
        };
        TokenConfig {
            token_addr: self.get(start).to_string(),
            price_feed_addr: self.get(start + 1).to_string(),
            backup_price_feed_addr: backup,
            heart_beat: self.or(rest, heart_beat).to_string(),
            name: self.get(rest + 1).to_string(),
            symbol: self.get(rest + 2).to_string(),
            decimals: self.get(rest + 3).to_string(),
            initial_price: price_to_base_unit(self.or(rest + 4, "0")),
        }
    }
}

impl MarketData {
    /// Builds the market from a spreadsheet record, `index` being the 1-based
    /// record number used in diagnostics.
    pub fn from_record(
        fields: &StringRecord,
        index: usize,
        schema: Schema,
    ) -> Result<Self, DeployConfigError> {
        let expected = schema.gt_key_identifier();
        if fields.len() < expected {
            return Err(DeployConfigError::MissingColumns {
                record: index,
                expected,
                actual: fields.len(),
            });
        }
        let record = Record { index, fields };

        let maturity: i64 = record.parse(3, "maturity", "")?;
        let underlying = record.token(schema.underlying(), schema, DEFAULT_UNDERLYING_HEARTBEAT);
        let collateral = record.token(schema.collateral(), schema, DEFAULT_COLLATERAL_HEARTBEAT);
        let name = market_name(&underlying.symbol, &collateral.symbol, maturity).ok_or_else(|| {
            DeployConfigError::InvalidField {
                record: index,
                field: "maturity",
                value: maturity.to_string(),
            }
        })?;

        Ok(Self {
            salt: record.parse(1, "salt", "0")?,
            collateral_cap_for_gt: record.get(2).replace(',', ""),
            market_config: MarketConfig {
                maturity: record.get(3).to_string(),
                lend_taker_fee_ratio: record.get(4).to_string(),
                lend_maker_fee_ratio: record.get(5).to_string(),
                borrow_taker_fee_ratio: record.get(6).to_string(),
                borrow_maker_fee_ratio: record.get(7).to_string(),
                mint_gt_fee_ratio: record.get(8).to_string(),
                mint_gt_fee_ref: record.get(9).to_string(),
            },
            loan_config: LoanConfig {
                liquidation_ltv: record.get(10).to_string(),
                max_ltv: record.get(11).to_string(),
                liquidatable: record.get(12).eq_ignore_ascii_case("true"),
            },
            underlying_config: underlying,
            collateral_config: CollateralConfig {
                token: collateral,
                gt_key_identifier: record
                    .or(schema.gt_key_identifier(), DEFAULT_GT_KEY_IDENTIFIER)
                    .to_string(),
            },
            market_symbol: name.clone(),
            market_name: name,
        })
    }

    /// Collateral cap in whole tokens and its value in price units,
    /// `(cap / 10^decimals, cap * price / 10^decimals / 10^8)`.
    pub fn collateral_cap(&self, index: usize) -> Result<(U256, U256), DeployConfigError> {
        let invalid = |field: &'static str, value: &str| DeployConfigError::InvalidField {
            record: index,
            field,
            value: value.to_string(),
        };
        let cap = match self.collateral_cap_for_gt.as_str() {
            "" => U256::ZERO,
            cap => U256::from_str_radix(cap, 10).map_err(|_| invalid("collateralCapForGt", cap))?,
        };
        let unit = match self.collateral_config.token.decimals.as_str() {
            "" => U256::from(10u8).pow(U256::from(18u8)),
            decimals => decimals
                .parse::<u8>()
                .ok()
                .and_then(|d| U256::from(10u8).checked_pow(U256::from(d)))
                .ok_or_else(|| invalid("collateralDecimals", decimals))?,
        };
        let price = &self.collateral_config.token.initial_price;
        let price = U256::from_str_radix(price, 10).map_err(|_| invalid("collateralInitialPrice", price))?;

        let price_unit = U256::from(10u8).pow(U256::from(PRICE_DECIMALS));
        let vault = cap.saturating_mul(price) / unit / price_unit;
        Ok((cap / unit, vault))
    }
}

/// Converts the spreadsheet read from `reader`.
///
/// Any invalid record aborts the conversion.
pub fn convert<R: io::Read>(reader: R, schema: Schema) -> Result<DeployConfig, DeployConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut configs = Vec::new();
    for (i, record) in reader.records().skip(HEADER_ROWS).enumerate() {
        let index = i + 1;
        let record = record?;
        let market = MarketData::from_record(&record, index, schema).inspect_err(|err| {
            tracing::error!(index, %err, record = ?record, "failed to process record");
        })?;
        if index == 1 {
            tracing::debug!(?market, "first record");
        }

        let (cap_amount, cap_vault) = market.collateral_cap(index)?;
        tracing::info!(
            index,
            market = %market.market_name,
            collateral = %market.collateral_config.token.symbol,
            initial_price = %market.collateral_config.token.initial_price,
            %cap_amount,
            %cap_vault,
            "converted market"
        );
        configs.push(market);
    }

    Ok(DeployConfig {
        config_num: configs.len(),
        configs,
    })
}

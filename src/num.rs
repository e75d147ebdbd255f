use alloy::primitives::{I256, U256};
use fastnum::{
    bint,
    decimal::{Context, Decimal, RoundingMode, UnsignedDecimal},
};

/// Decimals assumed for tokens whose metadata could not be read.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_signed<const N: usize>(&self, value: I256) -> Decimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.unsigned_abs().as_le_slice())
            .expect("Converter: abs(I256) -> UInt::<N>");
        Decimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            match value.sign() {
                alloy::primitives::Sign::Negative => fastnum::decimal::Sign::Minus,
                alloy::primitives::Sign::Positive => fastnum::decimal::Sign::Plus,
            },
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }
}

/// Renders a raw unsigned token amount as a decimal string.
///
/// Trailing fraction zeros are trimmed but at least one fraction digit is kept,
/// so `1000` with 6 decimals is `0.001` and `10^18` with 18 decimals is `1.0`.
pub fn format_units(value: U256, decimals: u8) -> String {
    // 10^decimals above U256::MAX exceeds every value, the integer part is zero
    let (int, frac) = match U256::from(10u8).checked_pow(U256::from(decimals)) {
        Some(scale) => value.div_rem(scale),
        None => (U256::ZERO, value),
    };
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    format!("{int}.{}", if frac.is_empty() { "0" } else { frac })
}

/// Signed counterpart of [`format_units`], negative values are prefixed with `-`.
pub fn format_signed_units(value: I256, decimals: u8) -> String {
    let formatted = format_units(value.unsigned_abs(), decimals);
    if value.is_negative() {
        format!("-{formatted}")
    } else {
        formatted
    }
}

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{OracleError, OracleResult};

/// Largest precision `decode` can represent.
pub const MAX_DECIMALS: u32 = 28;

/// Fixed-point encodes `value` as `round(value * 10^decimals)`.
///
/// The exact binary value is carried into a `Decimal` and rounded there, so
/// exact midpoints round away from zero and no binary product is formed.
pub fn encode(value: f64, decimals: u32) -> OracleResult<u128> {
    if !value.is_finite() {
        return Err(OracleError::InvalidValue(format!("{} is not finite", value)));
    }
    if value < 0.0 {
        return Err(OracleError::InvalidValue(format!("{} is negative", value)));
    }
    if decimals > MAX_DECIMALS {
        return Err(OracleError::InvalidValue(format!(
            "{} decimals exceeds the supported maximum of {}",
            decimals, MAX_DECIMALS
        )));
    }

    let overflow = || OracleError::EncodingOverflow { value, decimals };

    // Values below the smallest decimal step have no representation but
    // round to zero at any supported precision.
    let exact = Decimal::from_f64_retain(value)
        .or_else(|| (value < 1.0).then_some(Decimal::ZERO))
        .ok_or_else(overflow)?;
    let rounded = exact.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);

    let mantissa = u128::try_from(rounded.mantissa()).map_err(|_| overflow())?;
    10u128
        .checked_pow(decimals - rounded.scale())
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(overflow)
}

/// Inverse of [`encode`], exact in decimal.
pub fn decode(encoded: u128, decimals: u32) -> OracleResult<Decimal> {
    let mantissa = i128::try_from(encoded)
        .map_err(|_| OracleError::InvalidValue(format!("{} exceeds the decimal range", encoded)))?;

    Decimal::try_from_i128_with_scale(mantissa, decimals).map_err(|e| {
        OracleError::InvalidValue(format!(
            "{} with {} decimals is not representable: {}",
            encoded, decimals, e
        ))
    })
}

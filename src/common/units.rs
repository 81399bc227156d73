// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::domain::error::AppError;

/// Convert a human-readable decimal string into a token's smallest unit.
///
/// The conversion is exact: parsing goes through `Decimal::from_str_exact`
/// (which errors instead of rounding) and the integer mantissa is scaled into
/// a `U256`. Binary floating point is never involved.
pub fn to_base_units(human: &str, decimals: u8) -> Result<U256, AppError> {
    let parsed = Decimal::from_str_exact(human.trim())
        .map_err(|e| invalid(human, format!("not a decimal number: {e}")))?;
    if parsed.is_sign_negative() {
        return Err(invalid(human, "amount must not be negative"));
    }

    // normalize() drops trailing fractional zeros, so "1.500" fits a
    // one-decimal token.
    let value = parsed.normalize();
    let scale = value.scale();
    if scale > u32::from(decimals) {
        return Err(invalid(
            human,
            format!("more fractional digits than the token's {decimals} decimals"),
        ));
    }

    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let factor = U256::from(10u8)
        .checked_pow(U256::from(u32::from(decimals) - scale))
        .ok_or_else(|| invalid(human, "decimal precision out of range"))?;
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| invalid(human, "amount does not fit the native width"))
}

/// Render a smallest-unit integer back to a human decimal string, exactly.
/// Trailing fractional zeros are trimmed; whole values carry no point.
pub fn format_base_units(native: U256, decimals: u8) -> String {
    let digits = native.to_string();
    let split = decimals as usize;
    let (whole, frac) = if digits.len() > split {
        let at = digits.len() - split;
        (digits[..at].to_string(), digits[at..].to_string())
    } else {
        ("0".to_string(), format!("{digits:0>split$}"))
    };
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{whole}.{frac}")
    }
}

fn invalid(amount: &str, reason: impl Into<String>) -> AppError {
    AppError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.into(),
    }
}

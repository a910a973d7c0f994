//! Decimal ↔ token base unit conversion.

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{ChainError, ChainResult};

/// How fractional base units are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero. Used for exact output amounts.
    Down,
    /// Away from zero. Used for spending ceilings.
    Up,
}

fn scale_factor(decimals: u8) -> ChainResult<Decimal> {
    (0..decimals)
        .try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))
        .ok_or_else(|| ChainError::Conversion(format!("10^{decimals} exceeds decimal range")))
}

/// Convert a token amount to base units (`amount * 10^decimals`).
pub fn to_base_units(amount: Decimal, decimals: u8, rounding: Rounding) -> ChainResult<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ChainError::Conversion(format!("negative amount {amount}")));
    }
    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or_else(|| ChainError::Conversion(format!("{amount} × 10^{decimals} overflows")))?;
    let whole = match rounding {
        Rounding::Down => scaled.trunc(),
        Rounding::Up => scaled.ceil(),
    };
    whole
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| ChainError::Conversion(format!("{whole} is not representable")))
}

/// Convert base units back to a token amount.
pub fn from_base_units(value: U256, decimals: u8) -> ChainResult<Decimal> {
    let raw = u128::try_from(value)
        .ok()
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| ChainError::Conversion(format!("{value} exceeds decimal range")))?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|e| ChainError::Conversion(format!("{value} at {decimals} decimals: {e}")))
}

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::errors::PipelineError;

/// Significant digits a `Decimal` can carry.
const DECIMAL_DIGITS: usize = 28;

fn ten_pow(exp: u32) -> Result<U256, PipelineError> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or_else(|| PipelineError::Validation(format!("10^{exp} overflows 256 bits")))
}

/// Scale a human-unit amount to the token's base units, truncating any
/// precision beyond `decimals`.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, PipelineError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PipelineError::Validation(format!(
            "negative amount {amount}"
        )));
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);

    if scale <= decimals {
        mantissa
            .checked_mul(ten_pow(decimals - scale)?)
            .ok_or_else(|| {
                PipelineError::Validation(format!("{amount} overflows at {decimals} decimals"))
            })
    } else {
        Ok(mantissa / ten_pow(scale - decimals)?)
    }
}

/// Scale a base-unit integer down to human units. Digits beyond what a
/// `Decimal` can hold are truncated from the fractional end.
pub fn from_base_units(raw: U256, decimals: u8) -> Result<Decimal, PipelineError> {
    let digits = raw.to_string();
    let decimals = usize::from(decimals);

    let (int_part, frac_part) = if digits.len() > decimals {
        let (i, f) = digits.split_at(digits.len() - decimals);
        (i.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };

    let int_digits = int_part.trim_start_matches('0').len();
    if int_digits > DECIMAL_DIGITS {
        return Err(PipelineError::Validation(format!(
            "{raw} at {decimals} decimals exceeds decimal range"
        )));
    }

    let frac = frac_part.trim_end_matches('0');
    let keep = frac.len().min(DECIMAL_DIGITS - int_digits).min(DECIMAL_DIGITS);
    let text = if keep == 0 {
        int_part
    } else {
        format!("{int_part}.{}", &frac[..keep])
    };

    text.parse::<Decimal>()
        .map_err(|e| PipelineError::Validation(format!("{raw} at {decimals} decimals: {e}")))
}

use anyhow::{anyhow, Result};
use ethers::types::{Address, H160, U256};
use rust_decimal::{Decimal, RoundingStrategy};

// ===============================
// CONSTANTS
// ===============================

/// Native currency sentinel used by the exchange as a "token" address.
pub const ETHER_ADDRESS: Address = H160([0u8; 20]);

pub const GREEN: &str = "success";
pub const RED: &str = "danger";

/// Base-unit scale: 18 decimal places for ether and SIG alike.
pub const DECIMALS: u32 = 18;

const BALANCE_PRECISION: u32 = 2;
const PRICE_PRECISION: u32 = 5;

// ===============================
// BASE UNIT -> DECIMAL
// ===============================

/// Converts a base-unit amount into its human-scaled value.
///
/// Returns `None` when nothing has been loaded yet, or when the amount is too
/// large to be represented as a `Decimal` (above ~7.9e10 whole units).
pub fn ether(wei: Option<U256>) -> Option<Decimal> {
    let wei = wei?;
    if wei > U256::from(i128::MAX as u128) {
        return None;
    }
    let raw = wei.as_u128() as i128;
    Decimal::try_from_i128_with_scale(raw, DECIMALS)
        .ok()
        .map(|d| d.normalize())
}

/// Tokens and ether share the same decimal resolution.
pub fn tokens(wei: Option<U256>) -> Option<Decimal> {
    ether(wei)
}

/// Display-only rounding of a base-unit balance to two decimal places.
pub fn format_balance(balance: Option<U256>) -> Option<Decimal> {
    ether(balance).map(|b| {
        b.round_dp_with_strategy(BALANCE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    })
}

pub fn format_price(price: Decimal) -> Decimal {
    price
        .round_dp_with_strategy(PRICE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

// ===============================
// DECIMAL -> BASE UNIT
// ===============================

/// Scales a human amount back to base units. Digits beyond the 18th decimal
/// place are truncated.
pub fn to_wei(amount: Decimal) -> Result<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(anyhow!("Negative amount: {}", amount));
    }

    let mantissa = amount.mantissa().unsigned_abs();
    let scale = amount.scale();

    let wei = if scale <= DECIMALS {
        U256::from(mantissa)
            .checked_mul(U256::exp10((DECIMALS - scale) as usize))
            .ok_or_else(|| anyhow!("Amount overflows base units: {}", amount))?
    } else {
        U256::from(mantissa) / U256::exp10((scale - DECIMALS) as usize)
    };

    Ok(wei)
}

/// Parses user input ("1.5") into base units.
pub fn parse_amount(input: &str) -> Result<U256> {
    let amount: Decimal = input
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid amount '{}': {}", input, e))?;
    to_wei(amount)
}

/// Shorthand for whole units in base-unit form, `units(3)` == 3 * 10^18.
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(DECIMALS as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn absent_amount_is_not_formatted() {
        assert_eq!(ether(None), None);
        assert_eq!(format_balance(None), None);
    }

    #[test]
    fn divides_by_the_base_unit_scale() {
        assert_eq!(ether(Some(units(1))), Some(dec!(1)));
        assert_eq!(tokens(Some(U256::from(1_500_000_000_000_000_000u128))), Some(dec!(1.5)));
        assert_eq!(ether(Some(U256::zero())), Some(Decimal::ZERO));
    }

    #[test]
    fn format_balance_rounds_to_two_places() {
        // 1.23456 ether
        let wei = U256::from(1_234_560_000_000_000_000u128);
        assert_eq!(format_balance(Some(wei)), Some(dec!(1.23)));

        // 0.005 rounds up
        let wei = U256::from(5_000_000_000_000_000u128);
        assert_eq!(format_balance(Some(wei)), Some(dec!(0.01)));
    }

    #[test]
    fn oversized_amounts_are_not_representable() {
        assert_eq!(ether(Some(U256::MAX)), None);
    }

    #[test]
    fn to_wei_scales_and_truncates() {
        assert_eq!(to_wei(dec!(1)).unwrap(), units(1));
        assert_eq!(to_wei(dec!(0.1)).unwrap(), U256::from(100_000_000_000_000_000u128));
        assert_eq!(
            to_wei(dec!(0.0000000000000000019)).unwrap(),
            U256::from(1u64)
        );
        assert!(to_wei(dec!(-1)).is_err());
    }

    #[test]
    fn parse_amount_accepts_form_input() {
        assert_eq!(parse_amount(" 2.5 ").unwrap(), U256::from(2_500_000_000_000_000_000u128));
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn price_is_kept_to_five_places() {
        assert_eq!(format_price(dec!(0.123456)), dec!(0.12346));
    }
}

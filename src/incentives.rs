//! Annualized incentive-rate calculator.
//!
//! Computes the ratio between the yearly value of an emission stream and
//! the total value locked in the target token, entirely in scaled integers
//! (WAD inputs, RAY result). Two historical formulations of this ratio
//! exist; the integer one implemented here is exact and authoritative.

use alloy_primitives::U256;

use crate::wadray::{self, pow10, ray_div, wad_mul, MathError};

/// 365 days of seconds.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Annual incentive rate at RAY precision.
///
/// `emission_per_second` is in reward-token base units, `total_supply` in
/// target-token base units; both prices are WAD-scaled in the market
/// reference currency. `reward_decimals` / `target_decimals` must be ≤ 18;
/// all inputs non-negative by construction of `U256` — anything else is a
/// caller contract breach and surfaces as a math error.
///
/// Returns zero when the normalized emission value is zero, rather than
/// producing a meaningless 0/0 ratio.
pub fn incentive_rate(
    emission_per_second: U256,
    reward_price: U256,
    total_supply: U256,
    target_price: U256,
    target_decimals: u32,
    reward_decimals: u32,
) -> wadray::Result<U256> {
    let reward_scale = pow10(decimal_gap(reward_decimals)?)?;
    let target_scale = pow10(decimal_gap(target_decimals)?)?;

    let emission_wad = emission_per_second
        .checked_mul(reward_scale)
        .ok_or(MathError::Overflow)?;
    let emission_value_per_second = wad_mul(emission_wad, reward_price)?;
    if emission_value_per_second.is_zero() {
        return Ok(U256::ZERO);
    }

    let annual_emission_value = emission_value_per_second
        .checked_mul(U256::from(SECONDS_PER_YEAR))
        .ok_or(MathError::Overflow)?;

    let supply_wad = total_supply
        .checked_mul(target_scale)
        .ok_or(MathError::Overflow)?;
    let total_locked_value = wad_mul(supply_wad, target_price)?;

    ray_div(annual_emission_value, total_locked_value)
}

fn decimal_gap(decimals: u32) -> wadray::Result<u32> {
    18u32.checked_sub(decimals).ok_or(MathError::Overflow)
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wadray::{RAY, WAD};

    fn wad(n: u64) -> U256 {
        U256::from(n) * WAD
    }

    #[test]
    fn test_zero_emission_short_circuits() {
        for supply in [U256::ZERO, wad(1), wad(1_000_000)] {
            let rate =
                incentive_rate(U256::ZERO, wad(3), supply, wad(7), 18, 18).unwrap();
            assert_eq!(rate, U256::ZERO);
        }
    }

    #[test]
    fn test_zero_reward_price_short_circuits() {
        // Emission with a worthless reward token is still a zero-value stream.
        let rate = incentive_rate(wad(10), U256::ZERO, wad(100), wad(1), 18, 18).unwrap();
        assert_eq!(rate, U256::ZERO);
    }

    #[test]
    fn test_unit_rate() {
        // supply == emission * seconds_per_year at equal prices → exactly 1.0 RAY
        let emission = wad(5);
        let supply = emission * U256::from(SECONDS_PER_YEAR);
        let price = wad(2);
        let rate = incentive_rate(emission, price, supply, price, 18, 18).unwrap();
        assert_eq!(rate, RAY);
    }

    #[test]
    fn test_heterogeneous_decimals() {
        // 6-decimal supply against an 8-decimal reward stream; same economic
        // quantities as the unit-rate case once normalized.
        let emission = U256::from(5) * pow10(8).unwrap();
        let supply = U256::from(5) * U256::from(SECONDS_PER_YEAR) * pow10(6).unwrap();
        let price = wad(2);
        let rate = incentive_rate(emission, price, supply, price, 6, 8).unwrap();
        assert_eq!(rate, RAY);
    }

    #[test]
    fn test_half_rate() {
        let emission = wad(1);
        let supply = U256::from(2) * wad(1) * U256::from(SECONDS_PER_YEAR);
        let price = wad(1);
        let rate = incentive_rate(emission, price, supply, price, 18, 18).unwrap();
        assert_eq!(rate, RAY / U256::from(2));
    }

    #[test]
    fn test_zero_supply_is_division_by_zero() {
        let err = incentive_rate(wad(1), wad(1), U256::ZERO, wad(1), 18, 18);
        assert_eq!(err, Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_decimals_above_18_rejected() {
        let err = incentive_rate(wad(1), wad(1), wad(1), wad(1), 19, 18);
        assert_eq!(err, Err(MathError::Overflow));
    }
}

//! Fixed-point arithmetic at WAD (1e18) and RAY (1e27) precision.
//!
//! All operations work on `U256`, truncate toward zero (matching
//! deterministic on-chain semantics — no rounding-to-nearest), and use
//! checked arithmetic so overflow surfaces as an error instead of wrapping.

use alloy_primitives::U256;
use thiserror::Error;

/// 1e18, the scale used for token amounts and ETH-denominated prices.
pub const WAD: U256 = U256::from_limbs([0x0de0b6b3a7640000, 0, 0, 0]);

/// 1e27, the scale used for rates and ratios needing extra headroom.
pub const RAY: U256 = U256::from_limbs([0x9fd0803ce8000000, 0x33b2e3c, 0, 0]);

/// 1e9 — the gap between WAD and RAY.
pub const WAD_RAY_RATIO: U256 = U256::from_limbs([0x3b9aca00, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, MathError>;

/// `a * b / WAD`, truncating.
pub fn wad_mul(a: U256, b: U256) -> Result<U256> {
    scaled_mul(a, b, WAD)
}

/// `a * WAD / b`, truncating. Errors on `b == 0`.
pub fn wad_div(a: U256, b: U256) -> Result<U256> {
    scaled_div(a, b, WAD)
}

/// `a * b / RAY`, truncating.
pub fn ray_mul(a: U256, b: U256) -> Result<U256> {
    scaled_mul(a, b, RAY)
}

/// `a * RAY / b`, truncating. Errors on `b == 0`.
pub fn ray_div(a: U256, b: U256) -> Result<U256> {
    scaled_div(a, b, RAY)
}

/// Re-scale a WAD quantity to RAY. Exact — no precision is lost.
pub fn wad_to_ray(a: U256) -> Result<U256> {
    a.checked_mul(WAD_RAY_RATIO).ok_or(MathError::Overflow)
}

/// `10^exp`. Errors once the result no longer fits in 256 bits (exp > 77).
pub fn pow10(exp: u32) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(MathError::Overflow)
}

fn scaled_mul(a: U256, b: U256, unit: U256) -> Result<U256> {
    let prod = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(prod / unit)
}

fn scaled_div(a: U256, b: U256, unit: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let scaled = a.checked_mul(unit).ok_or(MathError::Overflow)?;
    Ok(scaled / b)
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(n: u64) -> U256 {
        U256::from(n) * WAD
    }

    #[test]
    fn test_units_line_up() {
        assert_eq!(WAD * WAD_RAY_RATIO, RAY);
        assert_eq!(pow10(18).unwrap(), WAD);
        assert_eq!(pow10(27).unwrap(), RAY);
    }

    #[test]
    fn test_wad_mul_identity() {
        assert_eq!(wad_mul(wad(7), WAD).unwrap(), wad(7));
    }

    #[test]
    fn test_wad_mul_truncates() {
        // 0.333...^2 = 0.111...0888 → the tail is cut, never rounded up
        let one_third = WAD / U256::from(3u8);
        let sq = wad_mul(one_third, one_third).unwrap();
        assert_eq!(sq, U256::from(111_111_111_111_111_110u64));
    }

    #[test]
    fn test_wad_div_truncates() {
        // 10 / 3 at WAD = 3.333... with the tail cut, not rounded up
        let q = wad_div(U256::from(10u8), U256::from(3u8)).unwrap();
        assert_eq!(q, U256::from(10u8) * WAD / U256::from(3u8));
        assert_eq!(q % U256::from(10u8), U256::from(3u8)); // ...3333
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(wad_div(wad(1), U256::ZERO), Err(MathError::DivisionByZero));
        assert_eq!(ray_div(wad(1), U256::ZERO), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_mul_overflow() {
        assert_eq!(wad_mul(U256::MAX, U256::from(2u8)), Err(MathError::Overflow));
    }

    #[test]
    fn test_div_overflow_on_rescale() {
        // a * RAY no longer fits even though a alone does
        assert_eq!(ray_div(U256::MAX, wad(1)), Err(MathError::Overflow));
    }

    #[test]
    fn test_ray_div_unit() {
        assert_eq!(ray_div(wad(5), wad(5)).unwrap(), RAY);
    }

    #[test]
    fn test_wad_to_ray() {
        assert_eq!(wad_to_ray(wad(3)).unwrap(), U256::from(3u8) * RAY);
    }

    #[test]
    fn test_pow10_bounds() {
        assert_eq!(pow10(0).unwrap(), U256::from(1u8));
        assert_eq!(pow10(8).unwrap(), U256::from(100_000_000u64));
        assert!(pow10(77).is_ok());
        assert_eq!(pow10(78), Err(MathError::Overflow));
    }
}

use crate::chain::PoolSlot;
use crate::errors::{AppError, Result};
use alloy_primitives::U256;
use ethers::types::Address;
use uniswap_v3_math::tick_math::get_sqrt_ratio_at_tick;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Snapshot of a Uniswap V3 pool priced as if its current in-range liquidity
/// were spread uniformly over the whole usable tick range.
///
/// This ignores the real tick-by-tick distribution. It is close enough for
/// trades that are small relative to pool depth, which is all this bot does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    /// Current sqrt(price1/price0) in Q96 (Uniswap V3 `slot0.sqrtPriceX96`).
    pub sqrt_price_x96: U256,
    /// Current in-range liquidity L, applied across the synthetic range.
    pub liquidity: u128,
    /// Current tick index (Uniswap V3 `slot0.tick`).
    pub tick: i32,
    /// Fee tier in hundredths of a bip (10000 = 1%).
    pub fee: u32,
    pub token0: Address,
    pub token1: Address,
    /// Lowest and highest usable ticks for the fee tier's spacing.
    pub lower_tick: i32,
    pub upper_tick: i32,
    /// Sqrt price at `lower_tick` / `upper_tick`, in Q96.
    pub limit_lower_sqrt_price_x96: U256,
    pub limit_upper_sqrt_price_x96: U256,
}

impl PoolState {
    /// Build the two-tick synthetic pool for the pair `(token_a, token_b)`.
    pub fn synthetic(
        slot: &PoolSlot,
        fee: u32,
        token_a: Address,
        token_b: Address,
    ) -> Result<Self> {
        let spacing = tick_spacing(fee)?;
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let lower_tick = nearest_usable_tick(MIN_TICK, spacing);
        let upper_tick = nearest_usable_tick(MAX_TICK, spacing);

        Ok(Self {
            sqrt_price_x96: to_alloy(slot.sqrt_price_x96),
            liquidity: slot.liquidity,
            tick: slot.tick,
            fee,
            token0,
            token1,
            lower_tick,
            upper_tick,
            limit_lower_sqrt_price_x96: get_sqrt_ratio_at_tick(lower_tick)?,
            limit_upper_sqrt_price_x96: get_sqrt_ratio_at_tick(upper_tick)?,
        })
    }

    /// Swapping token0 for token1 moves the price down.
    pub fn zero_for_one(&self, token_in: Address) -> bool {
        token_in == self.token0
    }
}

/// Tick spacing of each standard fee tier.
pub fn tick_spacing(fee: u32) -> Result<i32> {
    match fee {
        100 => Ok(1),
        500 => Ok(10),
        3000 => Ok(60),
        10_000 => Ok(200),
        other => Err(AppError::Config(format!("unsupported fee tier {other}"))),
    }
}

/// Closest multiple of `spacing` to `tick`, kept inside `[MIN_TICK, MAX_TICK]`.
/// Halves round up.
pub fn nearest_usable_tick(tick: i32, spacing: i32) -> i32 {
    let rounded = ((tick as f64 / spacing as f64) + 0.5).floor() as i32 * spacing;
    if rounded < MIN_TICK {
        rounded + spacing
    } else if rounded > MAX_TICK {
        rounded - spacing
    } else {
        rounded
    }
}

pub(crate) fn to_alloy(value: ethers::types::U256) -> U256 {
    U256::from_limbs(value.0)
}

pub(crate) fn from_alloy(value: U256) -> ethers::types::U256 {
    ethers::types::U256(value.into_limbs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_ticks_for_standard_tiers() {
        assert_eq!(nearest_usable_tick(MIN_TICK, 200), -887_200);
        assert_eq!(nearest_usable_tick(MAX_TICK, 200), 887_200);
        assert_eq!(nearest_usable_tick(MIN_TICK, 1), MIN_TICK);
        // 887280 overshoots MAX_TICK and is pulled back one spacing.
        assert_eq!(nearest_usable_tick(MAX_TICK, 60), 887_220);
        assert_eq!(nearest_usable_tick(MIN_TICK, 60), -887_220);
        assert_eq!(nearest_usable_tick(5, 10), 10);
        assert_eq!(nearest_usable_tick(-5, 10), 0);
    }

    #[test]
    fn rejects_unknown_fee_tier() {
        assert!(tick_spacing(2500).is_err());
        assert_eq!(tick_spacing(10_000).unwrap(), 200);
    }

    #[test]
    fn synthetic_pool_sorts_tokens_and_brackets_price() {
        let weth = Address::from_low_u64_be(0x4200);
        let token = Address::from_low_u64_be(0xbeef);
        let slot = PoolSlot {
            sqrt_price_x96: ethers::types::U256::from(2u8).pow(ethers::types::U256::from(96u8)),
            tick: 0,
            liquidity: 1_000_000,
        };
        let pool = PoolState::synthetic(&slot, 10_000, token, weth).unwrap();
        assert_eq!(pool.token0, weth);
        assert_eq!(pool.token1, token);
        assert!(pool.zero_for_one(weth));
        assert!(!pool.zero_for_one(token));
        assert_eq!(pool.lower_tick, -887_200);
        assert_eq!(pool.upper_tick, 887_200);
        assert!(pool.limit_lower_sqrt_price_x96 < pool.sqrt_price_x96);
        assert!(pool.limit_upper_sqrt_price_x96 > pool.sqrt_price_x96);
    }

    #[test]
    fn u256_conversion_preserves_value() {
        let v = ethers::types::U256::from_dec_str("123456789012345678901234567890").unwrap();
        assert_eq!(from_alloy(to_alloy(v)), v);
        assert_eq!(to_alloy(v).to_string(), "123456789012345678901234567890");
    }
}

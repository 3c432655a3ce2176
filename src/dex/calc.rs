use crate::dex::state::{PoolState, from_alloy, to_alloy};
use crate::errors::{AppError, Result};
use crate::models::TradeDirection;
use alloy_primitives::{I256, U256};
use ethers::types::{Address, U256 as EthU256};
use uniswap_v3_math::swap_math::compute_swap_step;

/// A route priced against the synthetic pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedTrade {
    pub direction: TradeDirection,
    /// Amount paid in, LP fee included.
    pub amount_in: EthU256,
    pub amount_out: EthU256,
}

/// Price `amount` of the trade. Buys are exact-output (token received),
/// sells are exact-input (token spent).
pub fn price_trade(
    pool: &PoolState,
    weth: Address,
    token: Address,
    direction: TradeDirection,
    amount: EthU256,
) -> Result<PricedTrade> {
    match direction {
        TradeDirection::Buy => {
            let amount_in = price_exact_output(pool, weth, amount)?;
            Ok(PricedTrade {
                direction,
                amount_in,
                amount_out: amount,
            })
        }
        TradeDirection::Sell => {
            let amount_out = price_exact_input(pool, token, amount)?;
            Ok(PricedTrade {
                direction,
                amount_in: amount,
                amount_out,
            })
        }
    }
}

/// Output received for spending exactly `amount_in` of `token_in`.
pub fn price_exact_input(
    pool: &PoolState,
    token_in: Address,
    amount_in: EthU256,
) -> Result<EthU256> {
    let remaining = to_signed(amount_in)?;
    let (spent, received) = swap_step(pool, pool.zero_for_one(token_in), remaining)?;
    if spent < to_alloy(amount_in) {
        return Err(AppError::InsufficientLiquidity);
    }
    Ok(from_alloy(received))
}

/// Input of `token_in` needed to receive exactly `amount_out` of the other token.
pub fn price_exact_output(
    pool: &PoolState,
    token_in: Address,
    amount_out: EthU256,
) -> Result<EthU256> {
    let remaining = -to_signed(amount_out)?;
    let (spent, received) = swap_step(pool, pool.zero_for_one(token_in), remaining)?;
    if received < to_alloy(amount_out) {
        return Err(AppError::InsufficientLiquidity);
    }
    Ok(from_alloy(spent))
}

/// One step from the current price toward the synthetic range boundary.
/// Returns (input including fee, output).
fn swap_step(pool: &PoolState, zero_for_one: bool, amount_remaining: I256) -> Result<(U256, U256)> {
    if pool.liquidity == 0 {
        return Err(AppError::InsufficientLiquidity);
    }
    let target = if zero_for_one {
        pool.limit_lower_sqrt_price_x96
    } else {
        pool.limit_upper_sqrt_price_x96
    };
    // Price already pinned at the boundary in the swap direction.
    let exhausted = if zero_for_one {
        target >= pool.sqrt_price_x96
    } else {
        target <= pool.sqrt_price_x96
    };
    if exhausted {
        return Err(AppError::InsufficientLiquidity);
    }

    let (_sqrt_next, amount_in, amount_out, fee_amount) = compute_swap_step(
        pool.sqrt_price_x96,
        target,
        pool.liquidity,
        amount_remaining,
        pool.fee,
    )?;
    Ok((amount_in + fee_amount, amount_out))
}

fn to_signed(amount: EthU256) -> Result<I256> {
    if amount.is_zero() {
        return Err(AppError::Other("swap amount must be positive".into()));
    }
    I256::try_from(to_alloy(amount))
        .map_err(|_| AppError::Other(format!("swap amount {amount} exceeds int256")))
}

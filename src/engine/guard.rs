use crate::chain::{Chain, Quoter};
use crate::config::Market;
use crate::errors::{AppError, TradeError};
use crate::models::{TradeDirection, TradeRequest, ValidatedTrade};
use ethers::types::U256;
use ethers::utils::parse_units;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only pre-trade check that the wallet can fund the requested trade.
pub struct FundsGuard<C> {
    chain: Arc<C>,
    market: Arc<Market>,
}

impl<C: Chain + Quoter> FundsGuard<C> {
    pub fn new(chain: Arc<C>, market: Arc<Market>) -> Self {
        Self { chain, market }
    }

    /// Accept the request and return it in base units, or reject it.
    pub async fn check(&self, request: &TradeRequest) -> Result<ValidatedTrade, TradeError> {
        let amount = to_base_units(&request.amount, self.market.token.decimal)
            .map_err(TradeError::InvalidAmount)?;
        let owner = self.chain.signer_address();

        match request.direction {
            TradeDirection::Buy => {
                let required = self
                    .chain
                    .quote_exact_output_single(
                        self.market.weth,
                        self.market.token.address,
                        amount,
                        self.market.token.fee,
                    )
                    .await
                    .map_err(TradeError::QuoteUnavailable)?;
                let available = self
                    .chain
                    .native_balance(owner)
                    .await
                    .map_err(TradeError::QuoteUnavailable)?;
                debug!(%required, %available, "[GUARD] buy quote");
                if required > available {
                    return Err(TradeError::InsufficientInputCurrency {
                        required,
                        available,
                    });
                }
            }
            TradeDirection::Sell => {
                let available = self
                    .chain
                    .token_balance(self.market.token.address, owner)
                    .await
                    .map_err(TradeError::QuoteUnavailable)?;
                debug!(requested = %amount, %available, "[GUARD] sell balance");
                if amount > available {
                    return Err(TradeError::InsufficientOutputToken {
                        requested: amount,
                        available,
                    });
                }
            }
        }

        info!(direction = %request.direction, amount = %request.amount, "[GUARD] funds ok");
        Ok(ValidatedTrade {
            direction: request.direction,
            amount,
        })
    }
}

fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AppError> {
    let fraction = amount
        .trim()
        .split_once('.')
        .map_or("", |(_, frac)| frac)
        .trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(AppError::Other(format!(
            "{amount} has more fractional digits than the token's {decimals} decimals"
        )));
    }
    let units: U256 = parse_units(amount, u32::from(decimals))?.into();
    if units.is_zero() {
        return Err(AppError::Other(format!(
            "{amount} rounds to zero at {decimals} decimals"
        )));
    }
    Ok(units)
}

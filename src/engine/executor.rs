use crate::chain::Chain;
use crate::config::Market;
use crate::dex::{
    PoolState, SwapOptions, encode_swap_calldata, price_trade, router::deadline_from_now,
};
use crate::errors::{AppError, TradeError};
use crate::models::{Receipt, TxRequest, ValidatedTrade};
use ethers::types::U256;
use std::sync::Arc;
use tracing::info;

/// Prices, encodes and submits one swap through the Universal Router.
pub struct SwapExecutor<C> {
    chain: Arc<C>,
    market: Arc<Market>,
}

impl<C: Chain> SwapExecutor<C> {
    pub fn new(chain: Arc<C>, market: Arc<Market>) -> Self {
        Self { chain, market }
    }

    /// Submit the swap and wait for its receipt. Not retried on failure.
    pub async fn execute(&self, trade: &ValidatedTrade) -> Result<Receipt, TradeError> {
        self.try_execute(trade)
            .await
            .map_err(TradeError::ExecutionFailed)
    }

    async fn try_execute(&self, trade: &ValidatedTrade) -> Result<Receipt, AppError> {
        let market = &self.market;
        let slot = self.chain.pool_slot(market.token.pool_address).await?;
        let pool =
            PoolState::synthetic(&slot, market.token.fee, market.weth, market.token.address)?;
        let priced = price_trade(
            &pool,
            market.weth,
            market.token.address,
            trade.direction,
            trade.amount,
        )?;
        info!(
            direction = %priced.direction,
            amount_in = %priced.amount_in,
            amount_out = %priced.amount_out,
            "[SWAP] route priced"
        );

        let options = SwapOptions {
            slippage: market.slippage,
            deadline: deadline_from_now(),
            recipient: self.chain.signer_address(),
        };
        let encoded = encode_swap_calldata(
            &priced,
            market.weth,
            market.token.address,
            market.token.fee,
            &options,
        );

        let receipt = self
            .chain
            .send_and_confirm(TxRequest {
                to: market.router,
                data: encoded.calldata,
                value: encoded.value,
                gas_limit: U256::from(market.token.gas_limit),
                gas_price: market.swap_gas_price,
            })
            .await?;
        info!(link = %market.tx_link(&receipt.tx_hash), "[SWAP] transaction confirmed");
        Ok(receipt)
    }
}

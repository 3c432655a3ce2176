use super::contracts::{
    erc20::Erc20,
    permit2::Permit2,
    pool::UniswapV3Pool,
    quoter::{QuoteExactOutputSingleParams, QuoterV2},
};
use super::{Chain, Permit2Allowance, PoolSlot, Quoter};
use crate::errors::{AppError, Result};
use crate::models::{Receipt, TxRequest};
use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H256, TransactionReceipt, TransactionRequest, U64, U256},
};
use std::sync::Arc;
use tracing::info;

/// Provider with the local wallet attached; every write goes through it.
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Handle for reading chain state and submitting signed transactions.
#[derive(Clone)]
pub struct EthersChain {
    client: Arc<SignerClient>,
    quoter: Address,
}

impl EthersChain {
    pub async fn connect(
        rpc_url: &str,
        wallet_secret: &str,
        chain_id: u64,
        quoter: Address,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        let remote_chain = provider.get_chainid().await?; // sanity-check
        if remote_chain != U256::from(chain_id) {
            return Err(AppError::Config(format!(
                "RPC serves chain {remote_chain}, expected {chain_id}"
            )));
        }
        let wallet = wallet_secret
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()?
            .with_chain_id(chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self { client, quoter })
    }
}

#[async_trait]
impl Chain for EthersChain {
    fn signer_address(&self) -> Address {
        self.client.address()
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.client.provider().get_balance(owner, None).await?)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let erc20 = Erc20::new(token, self.client.clone());
        Ok(erc20.balance_of(owner).call().await?)
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let erc20 = Erc20::new(token, self.client.clone());
        Ok(erc20.allowance(owner, spender).call().await?)
    }

    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance> {
        let permit2 = Permit2::new(permit2, self.client.clone());
        let (amount, expiration, nonce) = permit2.allowance(owner, token, spender).call().await?;
        Ok(Permit2Allowance {
            amount,
            expiration,
            nonce,
        })
    }

    async fn pool_slot(&self, pool: Address) -> Result<PoolSlot> {
        let pool = UniswapV3Pool::new(pool, self.client.clone());
        let (sqrt_price_x96, tick, _, _, _, _fee_protocol, _unlocked) =
            pool.slot_0().call().await?;
        let liquidity = pool.liquidity().call().await?;
        Ok(PoolSlot {
            sqrt_price_x96,
            tick,
            liquidity,
        })
    }

    async fn send_and_confirm(&self, tx: TxRequest) -> Result<Receipt> {
        let request = TransactionRequest::new()
            .to(tx.to)
            .data(tx.data)
            .value(tx.value)
            .gas(tx.gas_limit)
            .gas_price(tx.gas_price);

        let pending = self.client.send_transaction(request, None).await?;
        let tx_hash = pending.tx_hash();
        info!(?tx_hash, to = ?tx.to, "[TX] broadcast, waiting for confirmation");

        confirmed(tx_hash, pending.await?)
    }
}

/// Map the node's answer for a broadcast transaction: no receipt means it was
/// dropped, status 0 means it reverted.
fn confirmed(tx_hash: H256, receipt: Option<TransactionReceipt>) -> Result<Receipt> {
    let receipt = receipt.ok_or(AppError::Dropped)?;
    if receipt.status == Some(U64::zero()) {
        return Err(AppError::Reverted(tx_hash));
    }
    Ok(Receipt {
        tx_hash,
        block_number: receipt.block_number.map(|b| b.as_u64()),
    })
}

#[async_trait]
impl Quoter for EthersChain {
    async fn quote_exact_output_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
        fee: u32,
    ) -> Result<U256> {
        let quoter = QuoterV2::new(self.quoter, self.client.clone());
        let params = QuoteExactOutputSingleParams {
            token_in,
            token_out,
            amount: amount_out,
            fee,
            sqrt_price_limit_x96: U256::zero(),
        };
        let (amount_in, _sqrt_after, _ticks_crossed, _gas_estimate) =
            quoter.quote_exact_output_single(params).call().await?;
        Ok(amount_in)
    }
}

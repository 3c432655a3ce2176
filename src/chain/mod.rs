//! Node, signer and quoter seams.
//!
//! The engine only talks to the chain through these traits; `EthersChain`
//! is the production implementation.

use crate::errors::Result;
use crate::models::{Receipt, TxRequest};
use async_trait::async_trait;
use ethers::types::{Address, U256};

pub mod client;
pub mod contracts;
#[cfg(test)]
pub mod mock;

pub use client::{EthersChain, SignerClient};

/// Allowance record stored by Permit2 for an (owner, token, spender) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permit2Allowance {
    /// uint160 amount.
    pub amount: U256,
    /// uint48 unix timestamp.
    pub expiration: u64,
    pub nonce: u64,
}

/// Live pool values read from `slot0()` and `liquidity()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSlot {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

/// Read access to balances and contracts plus signed submission.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Address of the signing identity.
    fn signer_address(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn token_allowance(&self, token: Address, owner: Address, spender: Address)
    -> Result<U256>;

    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance>;

    async fn pool_slot(&self, pool: Address) -> Result<PoolSlot>;

    /// Sign, broadcast and wait for the receipt. Reverts are errors.
    async fn send_and_confirm(&self, tx: TxRequest) -> Result<Receipt>;
}

/// Off-chain price quotes for exact-output swaps.
#[async_trait]
pub trait Quoter: Send + Sync {
    /// Input amount required to receive exactly `amount_out` of `token_out`.
    async fn quote_exact_output_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
        fee: u32,
    ) -> Result<U256>;
}

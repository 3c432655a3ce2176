//! Shared data structures used throughout the application.

use ethers::types::{Address, Bytes, H256, U256};
use std::fmt;

/// Direction of a trade relative to the configured token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    /// Native currency in, token out. The amount is the desired token output.
    Buy,
    /// Token in, native currency out. The amount is the token input.
    Sell,
}

impl TradeDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A trade decided for the current cycle, amount in human-readable token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    pub direction: TradeDirection,
    pub amount: String,
}

impl TradeRequest {
    pub fn new(direction: TradeDirection, amount: impl Into<String>) -> Self {
        Self {
            direction,
            amount: amount.into(),
        }
    }
}

/// A request that passed the funds guard, amount in the token's base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrade {
    pub direction: TradeDirection,
    pub amount: U256,
}

/// The two authorization layers a sell needs before the router can pull tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceTier {
    /// ERC-20 allowance from the wallet to the Permit2 contract.
    Token,
    /// Permit2 allowance record from the wallet to the router.
    Permit2,
}

impl fmt::Display for AllowanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "tier 1 (token -> permit2)"),
            Self::Permit2 => write!(f, "tier 2 (permit2 -> router)"),
        }
    }
}

/// Transaction to be signed and submitted with a fixed gas policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

//! Randomized Uniswap V3 swap cycler.
//!
//! Repeatedly buys and sells one token against the chain's native currency
//! through the Universal Router, with random sizes and pauses, until a fixed
//! lifetime runs out or neither side of the wallet can fund a trade.

pub mod chain;
pub mod config;
pub mod dex;
pub mod engine;
pub mod errors;
pub mod models;
pub mod utils;

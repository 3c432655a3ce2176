//! Uniswap V3 pricing and Universal Router encoding.

pub mod calc;
pub mod router;
pub mod state;

pub use calc::{PricedTrade, price_trade};
pub use router::{SlippageTolerance, SwapCalldata, SwapOptions, encode_swap_calldata};
pub use state::PoolState;

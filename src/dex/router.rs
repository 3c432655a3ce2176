//! Universal Router calldata for single-pool V3 swaps against native currency.

use crate::chain::contracts::router::ExecuteCall;
use crate::dex::calc::PricedTrade;
use crate::errors::{AppError, Result};
use crate::models::TradeDirection;
use ethers::abi::{AbiEncode, Token, encode};
use ethers::types::{Address, Bytes, U256};
use std::time::{SystemTime, UNIX_EPOCH};

pub const V3_SWAP_EXACT_IN: u8 = 0x00;
pub const V3_SWAP_EXACT_OUT: u8 = 0x01;
pub const WRAP_ETH: u8 = 0x0b;
pub const UNWRAP_WETH: u8 = 0x0c;

/// Seconds a signed swap stays valid.
pub const DEADLINE_SECS: u64 = 20 * 60;

const BIPS_BASE: u32 = 10_000;

/// Router placeholder for "the caller of execute".
pub fn msg_sender() -> Address {
    Address::from_low_u64_be(1)
}

/// Router placeholder for "the router itself".
pub fn address_this() -> Address {
    Address::from_low_u64_be(2)
}

/// Accepted price deviation, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageTolerance {
    bips: u32,
}

impl SlippageTolerance {
    pub fn from_bips(bips: u32) -> Self {
        Self { bips }
    }

    /// Parse a percentage such as `1` or `0.5`.
    pub fn from_percent(raw: &str) -> Result<Self> {
        let percent: f64 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("SLIPPAGE must be a number, got {raw:?}")))?;
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(AppError::Config(format!(
                "SLIPPAGE must be between 0 and 100, got {raw}"
            )));
        }
        Ok(Self::from_bips((percent * 100.0).round() as u32))
    }

    pub fn bips(&self) -> u32 {
        self.bips
    }

    /// Floor of `amount_out / (1 + slippage)`.
    pub fn minimum_out(&self, amount_out: U256) -> U256 {
        amount_out * U256::from(BIPS_BASE) / U256::from(BIPS_BASE + self.bips)
    }

    /// Floor of `amount_in * (1 + slippage)`.
    pub fn maximum_in(&self, amount_in: U256) -> U256 {
        amount_in * U256::from(BIPS_BASE + self.bips) / U256::from(BIPS_BASE)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SwapOptions {
    pub slippage: SlippageTolerance,
    pub deadline: U256,
    pub recipient: Address,
}

/// Encoded `execute` call and the native value to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCalldata {
    pub calldata: Bytes,
    pub value: U256,
}

pub fn deadline_from_now() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    U256::from(now + DEADLINE_SECS)
}

/// Packed V3 path: `token_a | fee (uint24) | token_b`.
pub fn encode_v3_path(token_a: Address, fee: u32, token_b: Address) -> Bytes {
    let mut path = Vec::with_capacity(43);
    path.extend_from_slice(token_a.as_bytes());
    path.extend_from_slice(&fee.to_be_bytes()[1..]);
    path.extend_from_slice(token_b.as_bytes());
    Bytes::from(path)
}

pub fn encode_swap_calldata(
    trade: &PricedTrade,
    weth: Address,
    token: Address,
    fee: u32,
    options: &SwapOptions,
) -> SwapCalldata {
    let (commands, inputs, value) = match trade.direction {
        TradeDirection::Buy => {
            let max_in = options.slippage.maximum_in(trade.amount_in);
            // Exact-output paths run from output back to input.
            let path = encode_v3_path(token, fee, weth);
            let commands = vec![WRAP_ETH, V3_SWAP_EXACT_OUT, UNWRAP_WETH];
            let inputs = vec![
                encode(&[Token::Address(address_this()), Token::Uint(max_in)]),
                encode(&[
                    Token::Address(options.recipient),
                    Token::Uint(trade.amount_out),
                    Token::Uint(max_in),
                    Token::Bytes(path.to_vec()),
                    Token::Bool(false),
                ]),
                // Refund whatever native currency the swap did not use.
                encode(&[Token::Address(msg_sender()), Token::Uint(U256::zero())]),
            ];
            (commands, inputs, max_in)
        }
        TradeDirection::Sell => {
            let min_out = options.slippage.minimum_out(trade.amount_out);
            let path = encode_v3_path(token, fee, weth);
            let commands = vec![V3_SWAP_EXACT_IN, UNWRAP_WETH];
            let inputs = vec![
                encode(&[
                    Token::Address(address_this()),
                    Token::Uint(trade.amount_in),
                    Token::Uint(min_out),
                    Token::Bytes(path.to_vec()),
                    Token::Bool(true),
                ]),
                encode(&[Token::Address(options.recipient), Token::Uint(min_out)]),
            ];
            (commands, inputs, U256::zero())
        }
    };

    let call = ExecuteCall {
        commands: Bytes::from(commands),
        inputs: inputs.into_iter().map(Bytes::from).collect(),
        deadline: options.deadline,
    };
    SwapCalldata {
        calldata: Bytes::from(call.encode()),
        value,
    }
}

//! Configuration loader and application settings.

use crate::dex::router::SlippageTolerance;
use crate::errors::{AppError, Result};
use crate::utils::{AmountBounds, Bounds};
use ethers::types::{Address, U256};
use ethers::utils::parse_units;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

const DEFAULT_CHAIN_ID: u64 = 8453;
const DEFAULT_FEE_TIER: u32 = 10_000;
const DEFAULT_REGISTRY: &str = "token.json";
const DEFAULT_EXPLORER: &str = "https://basescan.org";

/// One entry of the token registry file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    #[serde(rename = "poolAddress")]
    pub pool_address: Address,
    pub decimal: u8,
    pub symbol: String,
    pub name: String,
    /// Gas limit for swap transactions.
    pub gas_limit: u64,
    /// Gas price for swap transactions, in gwei.
    pub gas_price: f64,
    #[serde(default = "default_fee")]
    pub fee: u32,
}

fn default_fee() -> u32 {
    DEFAULT_FEE_TIER
}

/// Token registry keyed by symbol.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TokenRegistry(HashMap<String, TokenInfo>);

impl TokenRegistry {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn get(&self, symbol: &str) -> Result<TokenInfo> {
        self.0
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::Config(format!("token {symbol:?} not found in registry")))
    }
}

/// Which directions the bot trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMode {
    /// Random direction, with a forced opposite direction after a funds rejection.
    Balanced,
    BuyOnly,
    SellOnly,
}

impl FromStr for TradeMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" | "balance" => Ok(Self::Balanced),
            "buy" => Ok(Self::BuyOnly),
            "sell" => Ok(Self::SellOnly),
            other => Err(AppError::Config(format!(
                "TRADE_MODE must be balanced, buy or sell, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balanced => write!(f, "balanced"),
            Self::BuyOnly => write!(f, "buy"),
            Self::SellOnly => write!(f, "sell"),
        }
    }
}

/// Token, pool and contract wiring for the traded pair.
#[derive(Debug, Clone)]
pub struct Market {
    pub token: TokenInfo,
    /// Wrapped native currency.
    pub weth: Address,
    /// Intermediary spender holding the tier-2 allowance.
    pub permit2: Address,
    /// Universal Router: final spender and swap target.
    pub router: Address,
    pub slippage: SlippageTolerance,
    /// `token.gas_price` converted to wei.
    pub swap_gas_price: U256,
    pub explorer_url: String,
}

impl Market {
    pub fn tx_link(&self, tx_hash: &ethers::types::H256) -> String {
        format!("{}/tx/{:?}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Per-cycle randomisation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBounds {
    pub buy_amount: AmountBounds,
    pub sell_amount: AmountBounds,
    /// Inter-cycle delay, milliseconds.
    pub wait_ms: Bounds<u64>,
    /// Total process lifetime, seconds.
    pub lifetime_secs: Bounds<u64>,
}

/// Consolidated application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub wallet_secret: String,
    pub chain_id: u64,
    pub quoter: Address,
    pub mode: TradeMode,
    pub market: Market,
    pub bounds: CycleBounds,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("rpc_url", &self.rpc_url)
            .field("wallet_secret", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("quoter", &self.quoter)
            .field("mode", &self.mode)
            .field("market", &self.market)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; the registry path it names is
    /// read from disk.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let registry_path =
            lookup("TOKEN_REGISTRY").unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
        let registry = TokenRegistry::load(&registry_path).map_err(|e| {
            AppError::Config(format!("cannot read token registry {registry_path}: {e}"))
        })?;
        Self::from_parts(lookup, &registry)
    }

    pub fn from_parts(
        lookup: impl Fn(&str) -> Option<String>,
        registry: &TokenRegistry,
    ) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("Set {key} in the environment")))
        };
        let address = |key: &str| -> Result<Address> {
            required(key)?
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("{key} is not a valid address")))
        };
        let number = |key: &str| -> Result<u64> {
            required(key)?
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer")))
        };

        let rpc_url = required("JSONRPC")?;
        Url::parse(&rpc_url)?;
        let wallet_secret = required("WALLET_SECRET")?;
        let chain_id = match lookup("CHAIN_ID") {
            Some(_) => number("CHAIN_ID")?,
            None => DEFAULT_CHAIN_ID,
        };
        let mode = match lookup("TRADE_MODE") {
            Some(raw) => raw.parse()?,
            None => TradeMode::Balanced,
        };

        let token = registry.get(required("TOKEN")?.trim())?;
        let swap_gas_price: U256 = parse_units(token.gas_price.to_string(), "gwei")?.into();
        let explorer_url = lookup("EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER.to_string());
        Url::parse(&explorer_url)?;

        let market = Market {
            weth: address("MAINNET_WETH")?,
            permit2: address("PERMIT2_ADDRESS")?,
            router: address("UNIVERSAL_SWAP_ROUTER")?,
            slippage: SlippageTolerance::from_percent(&required("SLIPPAGE")?)?,
            swap_gas_price,
            explorer_url,
            token,
        };

        let bounds = CycleBounds {
            buy_amount: AmountBounds::parse(
                &required("MIN_BUY_QUANTITY")?,
                &required("MAX_BUY_QUANTITY")?,
            )?,
            sell_amount: AmountBounds::parse(
                &required("MIN_SELL_QUANTITY")?,
                &required("MAX_SELL_QUANTITY")?,
            )?,
            wait_ms: Bounds::new(number("MIN_TRADE_WAIT")?, number("MAX_TRADE_WAIT")?)?,
            lifetime_secs: Bounds::new(number("MIN_TIME")?, number("MAX_TIME")?)?,
        };

        Ok(Self {
            rpc_url,
            wallet_secret,
            chain_id,
            quoter: address("QUOTE2_ADDRESS")?,
            mode,
            market,
            bounds,
        })
    }
}

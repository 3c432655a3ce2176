use crate::chain::SignerClient;
use crate::models::{AllowanceTier, TradeDirection};
use ethers::types::{H256, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Infrastructure failures: configuration, transport, signing and math.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("Contract error: {0}")]
    Contract(#[from] ethers::contract::ContractError<SignerClient>),

    #[error("Signer error: {0}")]
    Signer(
        #[from]
        ethers::middleware::signer::SignerMiddlewareError<
            ethers::providers::Provider<ethers::providers::Http>,
            ethers::signers::LocalWallet,
        >,
    ),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("Unit conversion error: {0}")]
    Conversion(#[from] ethers::utils::ConversionError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Math error: {0}")]
    Math(#[from] uniswap_v3_math::error::UniswapV3MathError),

    #[error("Transaction {0:?} reverted")]
    Reverted(H256),

    #[error("Transaction dropped before confirmation")]
    Dropped,

    #[error("Insufficient pool liquidity for the requested amount")]
    InsufficientLiquidity,

    #[error("Other: {0}")]
    Other(String),
}

/// Outcome taxonomy of a single trade attempt.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(#[source] AppError),

    #[error("Invalid trade amount: {0}")]
    InvalidAmount(#[source] AppError),

    #[error("Insufficient native balance: required {required}, available {available}")]
    InsufficientInputCurrency { required: U256, available: U256 },

    #[error("Insufficient token balance: requested {requested}, available {available}")]
    InsufficientOutputToken { requested: U256, available: U256 },

    #[error("Approval failed on {tier}: {source}")]
    ApprovalFailed {
        tier: AllowanceTier,
        #[source]
        source: AppError,
    },

    #[error("Swap execution failed: {0}")]
    ExecutionFailed(#[source] AppError),

    #[error("Neither native currency nor token balance is sufficient to trade")]
    FundsDeadlock,

    #[error("Cannot {0} any more: balance exhausted")]
    FundsExhausted(TradeDirection),

    #[error("Lifetime budget expired")]
    LifetimeExpired,
}

impl TradeError {
    /// Rejections raised by the funds guard that drive the forced direction.
    pub fn is_funds_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInputCurrency { .. } | Self::InsufficientOutputToken { .. }
        )
    }

    /// Errors that end the process instead of the current cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FundsDeadlock | Self::FundsExhausted(_) | Self::LifetimeExpired
        )
    }
}

//! In-memory chain used by unit tests.

use super::{Chain, Permit2Allowance, PoolSlot, Quoter};
use crate::config::{Market, TokenInfo};
use crate::dex::router::SlippageTolerance;
use crate::engine::allowance::{MAX_UINT48, max_uint160};
use crate::errors::{AppError, Result};
use crate::models::{Receipt, TxRequest};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::Mutex;

/// Every collaborator call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NativeBalance,
    TokenBalance,
    TokenAllowance,
    Permit2Allowance,
    PoolSlot,
    Quote,
    Sent(Address),
}

#[derive(Debug)]
struct State {
    native: U256,
    token_balance: U256,
    token_allowance: U256,
    permit2: Permit2Allowance,
    slot: PoolSlot,
    quote: Option<U256>,
    failing_targets: Vec<Address>,
    events: Vec<Event>,
    sent: Vec<TxRequest>,
}

pub struct MockChain {
    signer: Address,
    token: Address,
    permit2: Address,
    state: Mutex<State>,
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// Market wiring shared by the engine tests. WETH sorts before the token.
pub fn market() -> Market {
    Market {
        token: TokenInfo {
            address: addr(0xbeef),
            pool_address: addr(0x9001),
            decimal: 18,
            symbol: "TKN".into(),
            name: "Test Token".into(),
            gas_limit: 300_000,
            gas_price: 0.02,
            fee: 10_000,
        },
        weth: addr(0x4200),
        permit2: addr(0x2222),
        router: addr(0x3333),
        slippage: SlippageTolerance::from_bips(100),
        swap_gas_price: U256::from(20_000_000u64),
        explorer_url: "https://basescan.org".into(),
    }
}

pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

impl MockChain {
    /// Well-funded wallet, no approvals, 1:1 pool with deep liquidity.
    pub fn new() -> Self {
        let market = market();
        Self {
            signer: addr(0xa11ce),
            token: market.token.address,
            permit2: market.permit2,
            state: Mutex::new(State {
                native: tokens(1_000),
                token_balance: tokens(1_000),
                token_allowance: U256::zero(),
                permit2: Permit2Allowance::default(),
                slot: PoolSlot {
                    sqrt_price_x96: U256::from(2u8).pow(U256::from(96u8)),
                    tick: 0,
                    liquidity: 10u128.pow(24),
                },
                quote: Some(tokens(1)),
                failing_targets: Vec::new(),
                events: Vec::new(),
                sent: Vec::new(),
            }),
        }
    }

    pub fn with_native(self, amount: U256) -> Self {
        self.state.lock().unwrap().native = amount;
        self
    }

    pub fn with_token_balance(self, amount: U256) -> Self {
        self.state.lock().unwrap().token_balance = amount;
        self
    }

    pub fn with_quote(self, quote: Option<U256>) -> Self {
        self.state.lock().unwrap().quote = quote;
        self
    }

    pub fn with_token_allowance(self, amount: U256) -> Self {
        self.state.lock().unwrap().token_allowance = amount;
        self
    }

    pub fn with_permit2(self, allowance: Permit2Allowance) -> Self {
        self.state.lock().unwrap().permit2 = allowance;
        self
    }

    pub fn with_full_approvals(self) -> Self {
        self.with_token_allowance(U256::MAX).with_permit2(Permit2Allowance {
            amount: max_uint160(),
            expiration: MAX_UINT48,
            nonce: 0,
        })
    }

    pub fn failing_sends_to(self, target: Address) -> Self {
        self.state.lock().unwrap().failing_targets.push(target);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn clear_events(&self) {
        let mut state = self.state.lock().unwrap();
        state.events.clear();
        state.sent.clear();
    }

    fn record(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }
}

#[async_trait]
impl Chain for MockChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256> {
        self.record(Event::NativeBalance);
        Ok(self.state.lock().unwrap().native)
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256> {
        self.record(Event::TokenBalance);
        Ok(self.state.lock().unwrap().token_balance)
    }

    async fn token_allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256> {
        self.record(Event::TokenAllowance);
        Ok(self.state.lock().unwrap().token_allowance)
    }

    async fn permit2_allowance(
        &self,
        _permit2: Address,
        _owner: Address,
        _token: Address,
        _spender: Address,
    ) -> Result<Permit2Allowance> {
        self.record(Event::Permit2Allowance);
        Ok(self.state.lock().unwrap().permit2)
    }

    async fn pool_slot(&self, _pool: Address) -> Result<PoolSlot> {
        self.record(Event::PoolSlot);
        Ok(self.state.lock().unwrap().slot)
    }

    async fn send_and_confirm(&self, tx: TxRequest) -> Result<Receipt> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Sent(tx.to));
        state.sent.push(tx.clone());
        if state.failing_targets.contains(&tx.to) {
            return Err(AppError::Other("execution reverted".into()));
        }
        if tx.to == self.token {
            state.token_allowance = U256::MAX;
        } else if tx.to == self.permit2 {
            state.permit2 = Permit2Allowance {
                amount: max_uint160(),
                expiration: MAX_UINT48,
                nonce: state.permit2.nonce,
            };
        }
        Ok(Receipt {
            tx_hash: H256::from_low_u64_be(state.sent.len() as u64),
            block_number: Some(1),
        })
    }
}

#[async_trait]
impl Quoter for MockChain {
    async fn quote_exact_output_single(
        &self,
        _token_in: Address,
        _token_out: Address,
        _amount_out: U256,
        _fee: u32,
    ) -> Result<U256> {
        self.record(Event::Quote);
        self.state
            .lock()
            .unwrap()
            .quote
            .ok_or_else(|| AppError::Other("quoter unreachable".into()))
    }
}

use crate::chain::contracts::{erc20, permit2};
use crate::chain::{Chain, Permit2Allowance};
use crate::errors::{AppError, TradeError};
use crate::models::{AllowanceTier, TxRequest};
use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;
use tracing::{info, warn};

/// Gas limit of either approval transaction.
pub const APPROVAL_GAS_LIMIT: u64 = 50_000;
/// 0.05 gwei.
pub const TOKEN_APPROVAL_GAS_PRICE: u64 = 50_000_000;
/// 0.01 gwei.
pub const PERMIT2_APPROVAL_GAS_PRICE: u64 = 10_000_000;

/// Largest uint160, the "infinite" Permit2 amount.
pub fn max_uint160() -> U256 {
    (U256::one() << 160) - 1
}

/// Largest uint48, the "never expires" Permit2 expiration.
pub const MAX_UINT48: u64 = (1 << 48) - 1;

/// Keeps both allowance tiers needed by a sell at their maximum.
pub struct AllowanceManager<C> {
    chain: Arc<C>,
    permit2: Address,
}

impl<C: Chain> AllowanceManager<C> {
    pub fn new(chain: Arc<C>, permit2: Address) -> Self {
        Self { chain, permit2 }
    }

    /// Top up tier 1 then tier 2 for `token` spent by `spender`.
    ///
    /// A failing tier is logged and does not stop the other tier. The first
    /// failure is returned; callers currently log it and still attempt the
    /// swap, which then reverts on-chain if authorization is really missing.
    pub async fn ensure_approvals(
        &self,
        token: Address,
        spender: Address,
    ) -> Result<usize, TradeError> {
        let owner = self.chain.signer_address();
        let mut submitted = 0;
        let mut failure = None;

        // Tier 2 is pointless without tier 1, so tier 1 is confirmed first.
        for tier in [AllowanceTier::Token, AllowanceTier::Permit2] {
            let outcome = match tier {
                AllowanceTier::Token => self.ensure_token_tier(owner, token).await,
                AllowanceTier::Permit2 => self.ensure_permit2_tier(owner, token, spender).await,
            };
            match outcome {
                Ok(true) => submitted += 1,
                Ok(false) => {}
                Err(source) => {
                    warn!(%tier, error = %source, "[APPROVE] approval failed");
                    failure.get_or_insert(TradeError::ApprovalFailed { tier, source });
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(submitted),
        }
    }

    /// Returns whether an approval transaction was confirmed.
    async fn ensure_token_tier(&self, owner: Address, token: Address) -> Result<bool, AppError> {
        let current = self.chain.token_allowance(token, owner, self.permit2).await?;
        if !token_tier_needs_approval(current) {
            return Ok(false);
        }
        info!(tier = %AllowanceTier::Token, %current, "[APPROVE] start approving");
        let data = erc20::ApproveCall {
            spender: self.permit2,
            amount: U256::MAX,
        }
        .encode();
        let receipt = self
            .chain
            .send_and_confirm(approval_tx(token, data, TOKEN_APPROVAL_GAS_PRICE))
            .await?;
        info!(tier = %AllowanceTier::Token, tx_hash = ?receipt.tx_hash, "[APPROVE] approved");
        Ok(true)
    }

    async fn ensure_permit2_tier(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<bool, AppError> {
        let current = self
            .chain
            .permit2_allowance(self.permit2, owner, token, spender)
            .await?;
        if !permit2_tier_needs_approval(&current) {
            return Ok(false);
        }
        info!(
            tier = %AllowanceTier::Permit2,
            amount = %current.amount,
            expiration = current.expiration,
            "[APPROVE] start approving"
        );
        let data = permit2::ApproveCall {
            token,
            spender,
            amount: max_uint160(),
            expiration: MAX_UINT48,
        }
        .encode();
        let receipt = self
            .chain
            .send_and_confirm(approval_tx(self.permit2, data, PERMIT2_APPROVAL_GAS_PRICE))
            .await?;
        info!(tier = %AllowanceTier::Permit2, tx_hash = ?receipt.tx_hash, "[APPROVE] approved");
        Ok(true)
    }
}

pub fn token_tier_needs_approval(current: U256) -> bool {
    current < U256::MAX
}

/// Below the maximum amount, or carrying any expiration other than "never".
pub fn permit2_tier_needs_approval(current: &Permit2Allowance) -> bool {
    current.amount < max_uint160() || current.expiration < MAX_UINT48
}

fn approval_tx(to: Address, data: Vec<u8>, gas_price: u64) -> TxRequest {
    TxRequest {
        to,
        data: Bytes::from(data),
        value: U256::zero(),
        gas_limit: U256::from(APPROVAL_GAS_LIMIT),
        gas_price: U256::from(gas_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{Event, MockChain, market};

    fn manager(chain: MockChain) -> (Arc<MockChain>, AllowanceManager<MockChain>) {
        let chain = Arc::new(chain);
        let permit2 = market().permit2;
        (chain.clone(), AllowanceManager::new(chain, permit2))
    }

    fn sent_to(events: &[Event]) -> Vec<Address> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Sent(to) => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn thresholds_match_permit2_limits() {
        assert_eq!(
            max_uint160(),
            U256::from_str_radix("ffffffffffffffffffffffffffffffffffffffff", 16).unwrap()
        );
        assert_eq!(MAX_UINT48, 0xffff_ffff_ffff);
        assert!(token_tier_needs_approval(U256::MAX - 1));
        assert!(!token_tier_needs_approval(U256::MAX));

        let full = Permit2Allowance {
            amount: max_uint160(),
            expiration: MAX_UINT48,
            nonce: 3,
        };
        assert!(!permit2_tier_needs_approval(&full));
        assert!(permit2_tier_needs_approval(&Permit2Allowance {
            expiration: 1_700_000_000,
            ..full
        }));
        assert!(permit2_tier_needs_approval(&Permit2Allowance {
            amount: U256::from(1),
            ..full
        }));
    }

    #[tokio::test]
    async fn approves_tier_one_before_checking_tier_two() {
        let m = market();
        let (chain, manager) = manager(MockChain::new());
        let submitted = manager
            .ensure_approvals(m.token.address, m.router)
            .await
            .unwrap();
        assert_eq!(submitted, 2);
        assert_eq!(
            chain.events(),
            vec![
                Event::TokenAllowance,
                Event::Sent(m.token.address),
                Event::Permit2Allowance,
                Event::Sent(m.permit2),
            ]
        );

        let sent = chain.sent();
        assert_eq!(sent[0].gas_limit, U256::from(APPROVAL_GAS_LIMIT));
        assert_eq!(sent[0].gas_price, U256::from(TOKEN_APPROVAL_GAS_PRICE));
        assert_eq!(sent[1].gas_price, U256::from(PERMIT2_APPROVAL_GAS_PRICE));
        let expected = erc20::ApproveCall {
            spender: m.permit2,
            amount: U256::MAX,
        }
        .encode();
        assert_eq!(sent[0].data.to_vec(), expected);
    }

    #[tokio::test]
    async fn second_call_is_idempotent() {
        let m = market();
        let (chain, manager) = manager(MockChain::new());
        manager
            .ensure_approvals(m.token.address, m.router)
            .await
            .unwrap();
        chain.clear_events();

        let submitted = manager
            .ensure_approvals(m.token.address, m.router)
            .await
            .unwrap();
        assert_eq!(submitted, 0);
        assert!(sent_to(&chain.events()).is_empty());
    }

    #[tokio::test]
    async fn only_expired_tier_two_is_refreshed() {
        let m = market();
        let (chain, manager) = manager(
            MockChain::new()
                .with_token_allowance(U256::MAX)
                .with_permit2(Permit2Allowance {
                    amount: max_uint160(),
                    expiration: 1_600_000_000,
                    nonce: 0,
                }),
        );
        let submitted = manager
            .ensure_approvals(m.token.address, m.router)
            .await
            .unwrap();
        assert_eq!(submitted, 1);
        assert_eq!(sent_to(&chain.events()), vec![m.permit2]);
    }

    #[tokio::test]
    async fn tier_one_failure_still_checks_tier_two() {
        let m = market();
        let (chain, manager) = manager(MockChain::new().failing_sends_to(m.token.address));
        let err = manager
            .ensure_approvals(m.token.address, m.router)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TradeError::ApprovalFailed {
                tier: AllowanceTier::Token,
                ..
            }
        ));
        assert_eq!(sent_to(&chain.events()), vec![m.token.address, m.permit2]);
    }
}

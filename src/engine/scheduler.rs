use super::allowance::AllowanceManager;
use super::direction::{DirectionStateMachine, ForcedDirection};
use super::executor::SwapExecutor;
use super::guard::FundsGuard;
use crate::chain::{Chain, Quoter};
use crate::config::{CycleBounds, Market, TradeMode};
use crate::errors::TradeError;
use crate::models::{Receipt, TradeDirection, TradeRequest};
use crate::utils::Bounds;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, error, info, warn};

/// Seconds left before the process must exit. Cloned handles share the counter;
/// only the countdown task decrements it.
#[derive(Debug, Clone)]
pub struct LifetimeBudget {
    total_secs: u64,
    remaining: Arc<AtomicU64>,
}

impl LifetimeBudget {
    pub fn new(total_secs: u64) -> Self {
        Self {
            total_secs,
            remaining: Arc::new(AtomicU64::new(total_secs)),
        }
    }

    pub fn draw<R: Rng + ?Sized>(bounds: &Bounds<u64>, rng: &mut R) -> Self {
        Self::new(bounds.draw(rng))
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs() == 0
    }

    /// One second elapsed. Returns the seconds left.
    fn tick(&self) -> u64 {
        let previous = self
            .remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |r| Some(r.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}

/// Decrement the budget once per second until it reaches zero.
pub async fn run_countdown(budget: LifetimeBudget) {
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);
    while !budget.is_expired() {
        ticker.tick().await;
        let remaining = budget.tick();
        debug!(remaining, "[TIMER] tick");
    }
    warn!(total_secs = budget.total_secs(), "[TIMER] times up");
}

pub fn spawn_countdown(budget: LifetimeBudget) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_countdown(budget))
}

/// Start the countdown, then drive `work` until it finishes or the budget
/// runs out. `None` means the lifetime ended first and `work` was dropped.
pub async fn within_lifetime<F: Future>(budget: LifetimeBudget, work: F) -> Option<F::Output> {
    let countdown = spawn_countdown(budget);
    tokio::select! {
        _ = countdown => None,
        output = work => Some(output),
    }
}

/// What happened in one non-fatal cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Executed(Receipt),
    /// The funds guard refused the trade; the forced direction was updated.
    Rejected(TradeError),
    /// The trade could not be evaluated (quote or amount problem).
    Skipped(TradeError),
    /// The swap was attempted and failed.
    Failed(TradeError),
}

/// Top-level loop: pick a trade, guard it, approve, execute, wait, repeat.
pub struct CycleScheduler<C, R> {
    guard: FundsGuard<C>,
    allowances: AllowanceManager<C>,
    executor: SwapExecutor<C>,
    market: Arc<Market>,
    mode: TradeMode,
    bounds: CycleBounds,
    direction: DirectionStateMachine,
    budget: LifetimeBudget,
    rng: R,
}

impl<C, R> CycleScheduler<C, R>
where
    C: Chain + Quoter,
    R: Rng,
{
    pub fn new(
        chain: Arc<C>,
        market: Arc<Market>,
        mode: TradeMode,
        bounds: CycleBounds,
        budget: LifetimeBudget,
        rng: R,
    ) -> Self {
        Self {
            guard: FundsGuard::new(chain.clone(), market.clone()),
            allowances: AllowanceManager::new(chain.clone(), market.permit2),
            executor: SwapExecutor::new(chain, market.clone()),
            market,
            mode,
            bounds,
            direction: DirectionStateMachine::new(),
            budget,
            rng,
        }
    }

    pub fn forced(&self) -> ForcedDirection {
        self.direction.forced()
    }

    /// Run cycles until a fatal condition ends the loop.
    pub async fn run(&mut self) -> TradeError {
        loop {
            match self.run_cycle().await {
                Ok(outcome) => debug!(?outcome, "[CYCLE] finished"),
                Err(fatal) => return fatal,
            }
            let wait_ms = self.bounds.wait_ms.draw(&mut self.rng);
            info!(wait_ms, "[CYCLE] waiting before next cycle");
            sleep(Duration::from_millis(wait_ms)).await;
        }
    }

    /// One trade attempt. Only fatal conditions are returned as errors.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, TradeError> {
        if self.budget.is_expired() {
            return Err(TradeError::LifetimeExpired);
        }

        let (direction, forced) = self.pick_direction();
        let amount = match direction {
            TradeDirection::Buy => self.bounds.buy_amount.draw(&mut self.rng),
            TradeDirection::Sell => self.bounds.sell_amount.draw(&mut self.rng),
        };
        info!(
            %direction,
            %amount,
            forced,
            symbol = %self.market.token.symbol,
            "[CYCLE] start {direction}ing"
        );
        let request = TradeRequest::new(direction, amount);

        let trade = match self.guard.check(&request).await {
            Ok(trade) => trade,
            Err(rejection) if rejection.is_funds_rejection() => {
                warn!(error = %rejection, "[GUARD] trade rejected");
                self.record_rejection(direction)?;
                return Ok(CycleOutcome::Rejected(rejection));
            }
            Err(other) => {
                warn!(error = %other, "[GUARD] cycle skipped");
                return Ok(CycleOutcome::Skipped(other));
            }
        };
        if forced {
            self.direction.on_honored();
        }

        if direction == TradeDirection::Sell {
            // Approval failures are not fatal: the swap is still attempted.
            if let Err(err) = self
                .allowances
                .ensure_approvals(self.market.token.address, self.market.router)
                .await
            {
                warn!(error = %err, "[APPROVE] continuing to swap without confirmed approval");
            }
        }

        match self.executor.execute(&trade).await {
            Ok(receipt) => Ok(CycleOutcome::Executed(receipt)),
            Err(err) => {
                error!(error = %err, "[SWAP] cycle failed");
                Ok(CycleOutcome::Failed(err))
            }
        }
    }

    fn pick_direction(&mut self) -> (TradeDirection, bool) {
        match self.mode {
            TradeMode::Balanced => self.direction.choose(&mut self.rng),
            TradeMode::BuyOnly => (TradeDirection::Buy, false),
            TradeMode::SellOnly => (TradeDirection::Sell, false),
        }
    }

    fn record_rejection(&mut self, rejected: TradeDirection) -> Result<(), TradeError> {
        match self.mode {
            TradeMode::Balanced => self.direction.on_rejection(rejected),
            TradeMode::BuyOnly | TradeMode::SellOnly => Err(TradeError::FundsExhausted(rejected)),
        }
    }
}

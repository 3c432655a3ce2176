use crate::errors::TradeError;
use crate::models::TradeDirection;
use rand::Rng;
use tracing::{info, warn};

/// Direction the next cycle must take after a funds rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcedDirection {
    #[default]
    None,
    ForceBuy,
    ForceSell,
}

impl ForcedDirection {
    fn direction(self) -> Option<TradeDirection> {
        match self {
            Self::None => None,
            Self::ForceBuy => Some(TradeDirection::Buy),
            Self::ForceSell => Some(TradeDirection::Sell),
        }
    }

    fn toward(direction: TradeDirection) -> Self {
        match direction {
            TradeDirection::Buy => Self::ForceBuy,
            TradeDirection::Sell => Self::ForceSell,
        }
    }
}

/// Cross-cycle memory of which side last ran out of funds.
///
/// | current   | observed               | next      |
/// |-----------|------------------------|-----------|
/// | None      | buy rejected           | ForceSell |
/// | None      | sell rejected          | ForceBuy  |
/// | ForceSell | sell rejected          | deadlock  |
/// | ForceBuy  | buy rejected           | deadlock  |
/// | Force*    | forced trade honored   | None      |
#[derive(Debug, Default)]
pub struct DirectionStateMachine {
    forced: ForcedDirection,
}

impl DirectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forced(&self) -> ForcedDirection {
        self.forced
    }

    /// The forced direction if one is set, else a fair coin flip.
    /// The flag is true when the direction was forced.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> (TradeDirection, bool) {
        match self.forced.direction() {
            Some(direction) => (direction, true),
            None if rng.gen_bool(0.5) => (TradeDirection::Buy, false),
            None => (TradeDirection::Sell, false),
        }
    }

    /// Record that `rejected` could not be funded.
    pub fn on_rejection(&mut self, rejected: TradeDirection) -> Result<(), TradeError> {
        if self.forced.direction() == Some(rejected) {
            warn!(%rejected, "[CYCLE] forced direction rejected too: no funds on either side");
            return Err(TradeError::FundsDeadlock);
        }
        self.forced = ForcedDirection::toward(rejected.opposite());
        info!(forced = ?self.forced, "[CYCLE] next cycle will {}", rejected.opposite());
        Ok(())
    }

    /// The forced trade passed the funds guard; return to random selection.
    pub fn on_honored(&mut self) {
        self.forced = ForcedDirection::None;
    }
}

//! The trading loop and the pieces it drives each cycle.

pub mod allowance;
pub mod direction;
pub mod executor;
pub mod guard;
pub mod scheduler;

pub use allowance::AllowanceManager;
pub use direction::{DirectionStateMachine, ForcedDirection};
pub use executor::SwapExecutor;
pub use guard::FundsGuard;
pub use scheduler::{
    CycleOutcome, CycleScheduler, LifetimeBudget, spawn_countdown, within_lifetime,
};

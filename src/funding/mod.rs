//! Faucet-driven balance top-ups

pub mod coordinator;
pub mod session;
pub mod sleeper;

pub use coordinator::{FundingCoordinator, FundingPolicy, FundingReport};
pub use session::{FundingOutcome, FundingSession, FundingStep};
pub use sleeper::{Sleeper, TokioSleeper};

//! State machine for one `ensure_balance` run
//!
//! The session keeps a running tally of the balance: it starts from the
//! observed balance and adds whatever each faucet call reports. The chain
//! is not re-read between attempts.

use std::time::Duration;

use num_bigint::BigUint;
use num_traits::Zero;

/// Terminal result of a funding session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingOutcome {
    /// Tally reached the target
    Reached,
    /// A faucet call added nothing
    NoProgress,
    /// Attempt budget spent while still short
    RetriesExhausted,
    /// No faucet is configured for this connector
    Unavailable,
}

impl FundingOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, FundingOutcome::Reached)
    }
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingStep {
    /// Ask the faucet for another round of funds
    RequestFunds,
    /// Wait before the next attempt
    Backoff(Duration),
    Finished(FundingOutcome),
}

#[derive(Debug)]
pub struct FundingSession {
    tally: BigUint,
    target: BigUint,
    retries_remaining: u32,
    backoff: Duration,
    attempts: u32,
    pending_backoff: bool,
    outcome: Option<FundingOutcome>,
}

impl FundingSession {
    pub fn new(current: BigUint, target: BigUint, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            tally: current,
            target,
            retries_remaining: max_attempts,
            backoff,
            attempts: 0,
            pending_backoff: false,
            outcome: None,
        }
    }

    pub fn next_step(&self) -> FundingStep {
        if let Some(outcome) = self.outcome {
            return FundingStep::Finished(outcome);
        }
        if self.pending_backoff {
            return FundingStep::Backoff(self.backoff);
        }
        if self.tally >= self.target {
            FundingStep::Finished(FundingOutcome::Reached)
        } else if self.retries_remaining == 0 {
            FundingStep::Finished(FundingOutcome::RetriesExhausted)
        } else {
            FundingStep::RequestFunds
        }
    }

    /// Apply the amount one faucet call reported
    pub fn record_funds(&mut self, added: &BigUint) {
        self.attempts += 1;

        if added.is_zero() {
            self.outcome = Some(FundingOutcome::NoProgress);
            return;
        }

        self.tally += added;
        if self.tally < self.target {
            self.pending_backoff = true;
            self.retries_remaining = self.retries_remaining.saturating_sub(1);
        }
    }

    /// Mark the pending backoff as served
    pub fn record_backoff(&mut self) {
        self.pending_backoff = false;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn tally(&self) -> &BigUint {
        &self.tally
    }

    pub fn target(&self) -> &BigUint {
        &self.target
    }
}


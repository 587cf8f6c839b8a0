//! Drives a funding session against a faucet and a balance reader

use std::sync::Arc;
use std::time::Duration;

use num_bigint::BigUint;

use crate::config::FundingConfig;
use crate::connectors::{BalanceReader, FaucetConnector};
use crate::error::{validate_address, validate_identity, validate_timeout, ConnectorError};

use super::session::{FundingOutcome, FundingSession, FundingStep};
use super::sleeper::{Sleeper, TokioSleeper};

/// Retry policy for `ensure_balance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Faucet timeout passed on when the caller gives none
    pub default_timeout_secs: u64,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self::from(&FundingConfig::default())
    }
}

impl From<&FundingConfig> for FundingPolicy {
    fn from(config: &FundingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: config.backoff(),
            default_timeout_secs: config.default_timeout_secs,
        }
    }
}

/// Summary of one `ensure_balance` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingReport {
    pub outcome: FundingOutcome,
    /// Faucet calls made
    pub attempts: u32,
    /// Starting balance plus everything the faucet reported
    pub balance: BigUint,
    pub target: BigUint,
}

impl FundingReport {
    pub fn reached(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Tops up an address until it holds a target balance
#[derive(Clone)]
pub struct FundingCoordinator {
    policy: FundingPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl FundingCoordinator {
    pub fn new(policy: FundingPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: FundingPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &FundingPolicy {
        &self.policy
    }

    /// Returns true once `address` holds at least `target`
    ///
    /// Exhausting the faucet is reported as `false`, never as an error.
    pub async fn ensure_balance(
        &self,
        faucet: Option<&dyn FaucetConnector>,
        reader: &dyn BalanceReader,
        identity: &str,
        address: &str,
        target: &BigUint,
        timeout_secs: Option<u64>,
    ) -> Result<bool, ConnectorError> {
        let report = self
            .ensure_balance_report(faucet, reader, identity, address, target, timeout_secs)
            .await?;
        Ok(report.reached())
    }

    /// Same as [`ensure_balance`](Self::ensure_balance) with the full outcome
    pub async fn ensure_balance_report(
        &self,
        faucet: Option<&dyn FaucetConnector>,
        reader: &dyn BalanceReader,
        identity: &str,
        address: &str,
        target: &BigUint,
        timeout_secs: Option<u64>,
    ) -> Result<FundingReport, ConnectorError> {
        validate_identity(identity)?;
        validate_address("address", address)?;
        validate_timeout(timeout_secs)?;

        let Some(faucet) = faucet else {
            log::warn!("No faucet configured; cannot fund {}", address);
            return Ok(FundingReport {
                outcome: FundingOutcome::Unavailable,
                attempts: 0,
                balance: BigUint::default(),
                target: target.clone(),
            });
        };

        let timeout = timeout_secs.unwrap_or(self.policy.default_timeout_secs);
        let current = reader.get_balance(identity, address).await?;
        let mut session = FundingSession::new(
            current,
            target.clone(),
            self.policy.max_attempts,
            self.policy.backoff,
        );

        loop {
            match session.next_step() {
                FundingStep::RequestFunds => {
                    log::debug!(
                        "Funding attempt {} for {} (have {}, want {})",
                        session.attempts() + 1,
                        address,
                        session.tally(),
                        session.target()
                    );
                    let added = faucet.fund_address(identity, address, Some(timeout)).await?;
                    session.record_funds(&added);
                }
                FundingStep::Backoff(delay) => {
                    self.sleeper.sleep(delay).await;
                    session.record_backoff();
                }
                FundingStep::Finished(outcome) => {
                    match outcome {
                        FundingOutcome::Reached => log::info!(
                            "{} holds {} (target {})",
                            address,
                            session.tally(),
                            session.target()
                        ),
                        FundingOutcome::NoProgress => log::warn!(
                            "Faucet returned nothing for {} after {} attempt(s)",
                            address,
                            session.attempts()
                        ),
                        FundingOutcome::RetriesExhausted => log::warn!(
                            "Gave up funding {} after {} attempts (have {}, want {})",
                            address,
                            session.attempts(),
                            session.tally(),
                            session.target()
                        ),
                        FundingOutcome::Unavailable => {}
                    }
                    return Ok(FundingReport {
                        outcome,
                        attempts: session.attempts(),
                        balance: session.tally().clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }
}

//! Faucet command implementations

use num_traits::Zero;

use crate::amount::parse_amount;
use crate::config::ConfigOverrides;
use crate::funding::FundingOutcome;

use super::{open_manager, CommandError};

/// Request one round of faucet funds
pub async fn fund(
    identity: String,
    address: String,
    timeout: Option<u64>,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let manager = open_manager(overrides, &password)?;
    let received = manager.fund(&identity, &address, timeout).await?;

    if received.is_zero() {
        println!("Faucet delivered nothing to {}", address);
    } else {
        println!("✓ Faucet delivered {} to {}", received, address);
    }

    Ok(())
}

/// Fund an address until it holds `target`
pub async fn ensure_balance(
    identity: String,
    address: String,
    target: String,
    timeout: Option<u64>,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let target = parse_amount(&target)?;
    let manager = open_manager(overrides, &password)?;
    let report = manager
        .ensure_balance(&identity, &address, &target, timeout)
        .await?;

    match report.outcome {
        FundingOutcome::Reached => println!(
            "✓ {} holds at least {} ({} faucet request(s))",
            address, target, report.attempts
        ),
        FundingOutcome::NoProgress => println!(
            "✗ Faucet stopped paying out after {} request(s); {} of {} reached",
            report.attempts, report.balance, target
        ),
        FundingOutcome::RetriesExhausted => println!(
            "✗ Gave up after {} request(s); {} of {} reached",
            report.attempts, report.balance, target
        ),
        FundingOutcome::Unavailable => {
            println!("✗ No faucet is configured for the {} connector", manager.wallet().name())
        }
    }

    Ok(())
}

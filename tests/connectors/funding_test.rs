//! Funding coordinator tests
//!
//! Covers the zero-progress exit, the attempt cap, the missing-faucet
//! short circuit and the running tally.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;

use f1r3fly_wallet_connectors::client::ClientError;
use f1r3fly_wallet_connectors::connectors::{ConnectorError, FaucetConnector};
use f1r3fly_wallet_connectors::funding::{FundingOutcome, FundingSession, FundingStep};

use crate::common::{amount, test_coordinator, FixedBalance, RecordingSleeper, ScriptedFaucet};

#[tokio::test]
async fn test_zero_funding_stops_after_first_attempt() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper.clone());
    let faucet = ScriptedFaucet::constant(0);
    let reader = FixedBalance::new(0);

    let funded = coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "addr1", &amount(100), None)
        .await
        .expect("ensure_balance should not error");

    assert!(!funded, "A dry faucet cannot reach the target");
    assert_eq!(faucet.call_count(), 1, "Zero progress should stop immediately");
    assert!(sleeper.delays().is_empty(), "No backoff after zero progress");
}

#[tokio::test]
async fn test_attempts_are_capped_at_ten() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper.clone());
    let faucet = ScriptedFaucet::constant(1);
    let reader = FixedBalance::new(0);

    let report = coordinator
        .ensure_balance_report(
            Some(faucet.as_ref()),
            &reader,
            "id1",
            "addr1",
            &amount(1_000_000),
            None,
        )
        .await
        .unwrap();

    assert!(!report.reached());
    assert_eq!(report.outcome, FundingOutcome::RetriesExhausted);
    assert_eq!(faucet.call_count(), 10, "Exactly ten faucet calls expected");
    assert_eq!(report.attempts, 10);
    assert_eq!(report.balance, amount(10));
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(500); 10],
        "Each short attempt is followed by the fixed backoff"
    );
}

#[tokio::test]
async fn test_missing_faucet_returns_false_without_io() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper.clone());
    let reader = FixedBalance::new(0);

    let report = coordinator
        .ensure_balance_report(None, &reader, "id1", "addr1", &amount(1), None)
        .await
        .unwrap();

    assert_eq!(report.outcome, FundingOutcome::Unavailable);
    assert_eq!(reader.reads(), 0, "Balance must not be read without a faucet");
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_already_funded_address_needs_no_faucet_call() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper);
    let faucet = ScriptedFaucet::constant(1_000);
    let reader = FixedBalance::new(500);

    let funded = coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "addr1", &amount(500), None)
        .await
        .unwrap();

    assert!(funded, "Balance equal to the target satisfies it");
    assert_eq!(faucet.call_count(), 0);
}

#[tokio::test]
async fn test_reaches_target_over_several_attempts() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper.clone());
    let faucet = ScriptedFaucet::constant(40);
    let reader = FixedBalance::new(0);

    let report = coordinator
        .ensure_balance_report(Some(faucet.as_ref()), &reader, "id1", "addr1", &amount(100), None)
        .await
        .unwrap();

    assert_eq!(report.outcome, FundingOutcome::Reached);
    assert_eq!(faucet.call_count(), 3);
    assert_eq!(report.balance, amount(120));
    assert_eq!(sleeper.delays().len(), 2, "No backoff after the final attempt");
    assert_eq!(reader.reads(), 1, "Balance is read once, then tallied");
}

#[tokio::test]
async fn test_faucet_running_dry_midway() {
    let sleeper = RecordingSleeper::new();
    let coordinator = test_coordinator(sleeper.clone());
    let faucet = ScriptedFaucet::sequence(&[30, 0]);
    let reader = FixedBalance::new(0);

    let report = coordinator
        .ensure_balance_report(Some(faucet.as_ref()), &reader, "id1", "addr1", &amount(100), None)
        .await
        .unwrap();

    assert_eq!(report.outcome, FundingOutcome::NoProgress);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.balance, amount(30));
    assert_eq!(sleeper.delays().len(), 1);
}

#[tokio::test]
async fn test_timeout_is_forwarded_to_faucet() {
    let coordinator = test_coordinator(RecordingSleeper::new());
    let faucet = ScriptedFaucet::constant(100);
    let reader = FixedBalance::new(0);

    coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "a", &amount(1), Some(5))
        .await
        .unwrap();
    coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "b", &amount(1), None)
        .await
        .unwrap();

    let timeouts: Vec<Option<u64>> = faucet.calls().into_iter().map(|(_, _, t)| t).collect();
    assert_eq!(timeouts, vec![Some(5), Some(60)], "Default timeout fills in");
}

#[tokio::test]
async fn test_invalid_arguments_are_rejected() {
    let coordinator = test_coordinator(RecordingSleeper::new());
    let faucet = ScriptedFaucet::constant(1);
    let reader = FixedBalance::new(0);

    let empty_identity = coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "  ", "a", &amount(1), None)
        .await;
    assert!(matches!(empty_identity, Err(ConnectorError::Validation(_))));

    let zero_timeout = coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "a", &amount(1), Some(0))
        .await;
    assert!(matches!(zero_timeout, Err(ConnectorError::Validation(_))));

    assert_eq!(faucet.call_count(), 0);
}

struct BrokenFaucet;

#[async_trait]
impl FaucetConnector for BrokenFaucet {
    async fn fund_address(
        &self,
        _identity: &str,
        _address: &str,
        _timeout_secs: Option<u64>,
    ) -> Result<BigUint, ConnectorError> {
        Err(ConnectorError::Transport {
            operation: "faucet request",
            source: ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        })
    }
}

#[tokio::test]
async fn test_faucet_transport_errors_propagate() {
    let coordinator = test_coordinator(RecordingSleeper::new());
    let reader = FixedBalance::new(0);
    let faucet = Arc::new(BrokenFaucet);

    let result = coordinator
        .ensure_balance(Some(faucet.as_ref()), &reader, "id1", "a", &amount(1), None)
        .await;
    assert!(matches!(result, Err(ConnectorError::Transport { .. })));
}

#[test]
fn test_session_steps_through_backoff() {
    let mut session = FundingSession::new(amount(0), amount(10), 3, Duration::from_millis(5));
    assert_eq!(session.next_step(), FundingStep::RequestFunds);

    session.record_funds(&amount(4));
    assert_eq!(session.next_step(), FundingStep::Backoff(Duration::from_millis(5)));

    session.record_backoff();
    assert_eq!(session.next_step(), FundingStep::RequestFunds);

    session.record_funds(&amount(6));
    assert_eq!(session.next_step(), FundingStep::Finished(FundingOutcome::Reached));
    assert_eq!(session.tally(), &amount(10));
}

#[test]
fn test_session_last_attempt_backs_off_before_giving_up() {
    let mut session = FundingSession::new(amount(0), amount(100), 1, Duration::from_millis(5));
    session.record_funds(&amount(1));
    assert!(matches!(session.next_step(), FundingStep::Backoff(_)));

    session.record_backoff();
    assert_eq!(
        session.next_step(),
        FundingStep::Finished(FundingOutcome::RetriesExhausted)
    );
}

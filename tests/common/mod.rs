//! Common test utilities for connector integration tests
//!
//! This module provides shared test infrastructure including:
//! - A sleeper that records delays instead of waiting
//! - Scripted faucets and balance readers
//! - An in-process ledger client standing in for a node
//! - A ready-made in-memory connector harness

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;

use f1r3fly_wallet_connectors::client::{ClientError, FaucetAck, LedgerClient, SignedTransfer};
use f1r3fly_wallet_connectors::connectors::{
    BalanceReader, ConnectorError, FaucetConnector, MemoryFaucetConnector, MemoryWalletConnector,
};
use f1r3fly_wallet_connectors::derivation::F1r3flyDeriver;
use f1r3fly_wallet_connectors::funding::{FundingCoordinator, FundingPolicy, Sleeper};
use f1r3fly_wallet_connectors::ledger::LedgerAccount;
use f1r3fly_wallet_connectors::storage::{
    AddressRecord, EntityStore, MemoryEntityStore, MemoryKeyVault, RecordFilter, StorageError,
};

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn amount(value: u64) -> BigUint {
    BigUint::from(value)
}

/// Sleeper that returns immediately and remembers every delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Faucet that replays a script of amounts; the last entry repeats
pub struct ScriptedFaucet {
    script: Mutex<VecDeque<BigUint>>,
    last: Mutex<BigUint>,
    calls: Mutex<Vec<(String, String, Option<u64>)>>,
}

impl ScriptedFaucet {
    pub fn constant(value: u64) -> Arc<Self> {
        Self::sequence(&[value])
    }

    pub fn sequence(values: &[u64]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(values.iter().map(|v| amount(*v)).collect()),
            last: Mutex::new(amount(0)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, String, Option<u64>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaucetConnector for ScriptedFaucet {
    async fn fund_address(
        &self,
        identity: &str,
        address: &str,
        timeout_secs: Option<u64>,
    ) -> Result<BigUint, ConnectorError> {
        self.calls
            .lock()
            .unwrap()
            .push((identity.to_string(), address.to_string(), timeout_secs));

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// Balance reader with a fixed answer
pub struct FixedBalance {
    balance: BigUint,
    reads: Mutex<usize>,
}

impl FixedBalance {
    pub fn new(value: u64) -> Self {
        Self {
            balance: amount(value),
            reads: Mutex::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl BalanceReader for FixedBalance {
    async fn get_balance(&self, _identity: &str, _address: &str) -> Result<BigUint, ConnectorError> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.balance.clone())
    }
}

/// Entity store that yields to the scheduler after every read
///
/// Gives other tasks a chance to run between a read and the write that
/// follows it, so unserialized read-modify-write cycles show up in tests.
#[derive(Default)]
pub struct YieldingStore {
    inner: MemoryEntityStore,
}

impl YieldingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl EntityStore for YieldingStore {
    async fn get(&self, address: &str) -> Result<Option<AddressRecord>, StorageError> {
        let record = self.inner.get(address).await?;
        tokio::task::yield_now().await;
        Ok(record)
    }

    async fn set(&self, record: &AddressRecord) -> Result<(), StorageError> {
        self.inner.set(record).await
    }

    async fn set_many(&self, records: &[AddressRecord]) -> Result<(), StorageError> {
        self.inner.set_many(records).await
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<AddressRecord>, StorageError> {
        let records = self.inner.query(filter).await?;
        tokio::task::yield_now().await;
        Ok(records)
    }
}

/// In-process stand-in for a ledger node
///
/// Balance reads follow a per-address script whose last value repeats.
#[derive(Default)]
pub struct MockLedgerClient {
    balances: Mutex<HashMap<String, VecDeque<BigUint>>>,
    submitted: Mutex<Vec<SignedTransfer>>,
    faucet_requests: Mutex<Vec<(String, String)>>,
    decline_faucet: Mutex<bool>,
    fail_submissions: Mutex<bool>,
}

impl MockLedgerClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_balances(&self, address: &str, values: &[u64]) {
        self.balances.lock().unwrap().insert(
            address.to_string(),
            values.iter().map(|v| amount(*v)).collect(),
        );
    }

    pub fn decline_faucet(&self) {
        *self.decline_faucet.lock().unwrap() = true;
    }

    pub fn fail_submissions(&self) {
        *self.fail_submissions.lock().unwrap() = true;
    }

    pub fn submitted(&self) -> Vec<SignedTransfer> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn faucet_requests(&self) -> Vec<(String, String)> {
        self.faucet_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn get_balance(&self, address: &str) -> Result<BigUint, ClientError> {
        let mut balances = self.balances.lock().unwrap();
        let Some(script) = balances.get_mut(address) else {
            return Ok(amount(0));
        };
        if script.len() > 1 {
            Ok(script.pop_front().unwrap())
        } else {
            Ok(script.front().cloned().unwrap_or_default())
        }
    }

    async fn submit_transfer(&self, transfer: &SignedTransfer) -> Result<String, ClientError> {
        if *self.fail_submissions.lock().unwrap() {
            return Err(ClientError::Status {
                status: 503,
                body: "node unavailable".to_string(),
            });
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(transfer.clone());
        Ok(format!("tx-{}", submitted.len()))
    }

    async fn request_faucet_funds(
        &self,
        endpoint: &str,
        address: &str,
    ) -> Result<FaucetAck, ClientError> {
        self.faucet_requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), address.to_string()));
        let declined = *self.decline_faucet.lock().unwrap();
        Ok(FaucetAck {
            accepted: !declined,
            message: declined.then(|| "rate limited".to_string()),
        })
    }
}

pub fn test_policy() -> FundingPolicy {
    FundingPolicy {
        max_attempts: 10,
        backoff: Duration::from_millis(500),
        default_timeout_secs: 60,
    }
}

pub fn test_coordinator(sleeper: Arc<RecordingSleeper>) -> FundingCoordinator {
    crate::connectors::init_test_logger();
    FundingCoordinator::with_sleeper(test_policy(), sleeper)
}

/// In-memory connector wired to a minting faucet
pub struct MemoryHarness {
    pub vault: Arc<MemoryKeyVault>,
    pub store: Arc<MemoryEntityStore>,
    pub ledger: Arc<LedgerAccount>,
    pub sleeper: Arc<RecordingSleeper>,
    pub connector: MemoryWalletConnector,
}

impl MemoryHarness {
    pub fn new(fund_amount: u64) -> Self {
        Self::build(Some(MemoryFaucetParams {
            fund_amount,
            balance_cap: None,
        }))
    }

    pub fn with_cap(fund_amount: u64, cap: u64) -> Self {
        Self::build(Some(MemoryFaucetParams {
            fund_amount,
            balance_cap: Some(cap),
        }))
    }

    pub fn without_faucet() -> Self {
        Self::build(None)
    }

    fn build(faucet: Option<MemoryFaucetParams>) -> Self {
        crate::connectors::init_test_logger();

        let vault = Arc::new(MemoryKeyVault::new());
        let store = Arc::new(MemoryEntityStore::new());
        let ledger = Arc::new(LedgerAccount::new(store.clone()));
        let sleeper = RecordingSleeper::new();

        let mut connector = MemoryWalletConnector::new(
            vault.clone(),
            Arc::new(F1r3flyDeriver::default()),
            ledger.clone(),
            test_coordinator(sleeper.clone()),
        );
        if let Some(params) = faucet {
            let mut faucet = MemoryFaucetConnector::new(ledger.clone(), amount(params.fund_amount));
            if let Some(cap) = params.balance_cap {
                faucet = faucet.with_balance_cap(amount(cap));
            }
            connector = connector.with_faucet(Arc::new(faucet));
        }

        Self {
            vault,
            store,
            ledger,
            sleeper,
            connector,
        }
    }
}

struct MemoryFaucetParams {
    fund_amount: u64,
    balance_cap: Option<u64>,
}

//! Wallet manager tests
//!
//! Builds managers from configuration and drives the operations the CLI
//! exposes against the in-memory backend.

use std::sync::Arc;

use f1r3fly_wallet_connectors::config::{ConnectorKind, GlobalConfig, NetworkType};
use f1r3fly_wallet_connectors::funding::FundingOutcome;
use f1r3fly_wallet_connectors::manager::{ManagerError, WalletManager};
use f1r3fly_wallet_connectors::storage::{MemoryEntityStore, MemoryKeyVault};
use tempfile::TempDir;

use crate::common::{amount, test_coordinator, RecordingSleeper, TEST_MNEMONIC};

fn memory_manager() -> WalletManager {
    let config = GlobalConfig::default_regtest();
    WalletManager::assemble(
        config,
        Arc::new(MemoryKeyVault::new()),
        Arc::new(MemoryEntityStore::new()),
        test_coordinator(RecordingSleeper::new()),
    )
    .expect("Manager should build")
}

#[tokio::test]
async fn test_manager_fund_and_transfer_flow() {
    let manager = memory_manager();
    assert_eq!(manager.wallet().name(), "memory");
    assert!(manager.has_faucet());

    manager.create_identity("alice").await.unwrap();
    let addresses = manager.addresses("alice", 0, 0, 2, false).await.unwrap();
    let (first, second) = (&addresses[0], &addresses[1]);

    let report = manager
        .ensure_balance("alice", first, &amount(1_500_000_000), None)
        .await
        .unwrap();
    assert_eq!(report.outcome, FundingOutcome::Reached);
    assert_eq!(report.attempts, 2);

    let txid = manager
        .transfer("alice", first, second, &amount(400))
        .await
        .unwrap();
    assert!(txid.is_none());

    assert_eq!(
        manager.balance("alice", first).await.unwrap(),
        amount(1_999_999_600)
    );
    assert_eq!(manager.balance("alice", second).await.unwrap(), amount(400));
}

#[tokio::test]
async fn test_manager_single_fund_request() {
    let manager = memory_manager();

    let received = manager.fund("bob", "0xbob", None).await.unwrap();
    assert_eq!(received, amount(1_000_000_000));
    assert_eq!(
        manager.balance("bob", "0xbob").await.unwrap(),
        amount(1_000_000_000)
    );
}

#[tokio::test]
async fn test_duplicate_identity_is_reported() {
    let manager = memory_manager();
    manager.create_identity("alice").await.unwrap();

    let again = manager.create_identity("alice").await;
    assert!(matches!(again, Err(ManagerError::IdentityExists(_))));

    let imported = manager.import_identity("alice", TEST_MNEMONIC).await;
    assert!(matches!(imported, Err(ManagerError::IdentityExists(_))));
}

#[tokio::test]
async fn test_import_identity_validates_mnemonic() {
    let manager = memory_manager();

    let bad = manager.import_identity("carol", "twelve words that are not bip39").await;
    assert!(matches!(bad, Err(ManagerError::InvalidMnemonic(_))));

    manager.import_identity("carol", TEST_MNEMONIC).await.unwrap();
    let addresses = manager.addresses("carol", 0, 0, 1, false).await.unwrap();
    assert!(addresses[0].starts_with("0x"));
}

#[tokio::test]
async fn test_manager_persists_memory_ledger_to_sqlite() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut config = GlobalConfig::default_regtest();
    config.data_dir = Some(temp_dir.path().to_string_lossy().to_string());

    let identity = format!("dave_{}", uuid::Uuid::new_v4());
    let address = format!("0x{}", uuid::Uuid::new_v4().simple());

    {
        let manager = WalletManager::new(config.clone(), Arc::new(MemoryKeyVault::new())).unwrap();
        manager.fund(&identity, &address, None).await.unwrap();
    }
    assert!(temp_dir.path().join("ledger.db").exists());

    let reopened = WalletManager::new(config, Arc::new(MemoryKeyVault::new())).unwrap();
    assert_eq!(
        reopened.balance(&identity, &address).await.unwrap(),
        amount(1_000_000_000),
        "Ledger should survive a restart"
    );
}

#[tokio::test]
async fn test_network_backends_build_from_config() {
    let mut config = GlobalConfig::for_network(NetworkType::Signet);
    config.connector = ConnectorKind::Bitcoin;
    let bitcoin = WalletManager::new(config, Arc::new(MemoryKeyVault::new())).unwrap();
    assert_eq!(bitcoin.wallet().name(), "bitcoin");
    assert!(!bitcoin.has_faucet(), "Signet has no default faucet");

    let mut config = GlobalConfig::default_regtest();
    config.connector = ConnectorKind::F1r3fly;
    config.f1r3fly.faucet_url = Some("http://localhost:40410/faucet".to_string());
    let f1r3fly = WalletManager::new(config, Arc::new(MemoryKeyVault::new())).unwrap();
    assert_eq!(f1r3fly.wallet().name(), "f1r3fly");
    assert!(f1r3fly.has_faucet());

    let mut config = GlobalConfig::for_network(NetworkType::Mainnet);
    config.connector = ConnectorKind::Bitcoin;
    let mainnet = WalletManager::new(config, Arc::new(MemoryKeyVault::new())).unwrap();
    let report = mainnet
        .ensure_balance("eve", "bc1pany", &amount(1), None)
        .await
        .unwrap();
    assert_eq!(
        report.outcome,
        FundingOutcome::Unavailable,
        "Mainnet has no faucet to fund from"
    );
}

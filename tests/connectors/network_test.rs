//! Network connector tests
//!
//! Bitcoin and F1r3fly connectors against an in-process ledger client:
//! local signing, source-key lookup, faucet polling and error mapping.

use std::sync::Arc;
use std::time::Duration;

use bitcoin::secp256k1::{ecdsa, schnorr, Message, PublicKey, Secp256k1, XOnlyPublicKey};
use sha2::{Digest, Sha256};

use f1r3fly_wallet_connectors::client::SignedTransfer;
use f1r3fly_wallet_connectors::config::NetworkType;
use f1r3fly_wallet_connectors::connectors::{
    BalanceReader, BitcoinWalletConnector, ConnectorError, F1r3flyWalletConnector,
    FaucetConnector, NetworkFaucetConnector, WalletConnector,
};
use f1r3fly_wallet_connectors::derivation::{Blake2b256, F1r3flyDeriver, TaprootDeriver};
use f1r3fly_wallet_connectors::storage::{KeyVault, MemoryKeyVault};

use crate::common::{amount, test_coordinator, MockLedgerClient, RecordingSleeper, TEST_MNEMONIC};

const FAUCET_URL: &str = "http://localhost:3003/faucet";

async fn vault_with_alice() -> Arc<MemoryKeyVault> {
    let vault = Arc::new(MemoryKeyVault::new());
    vault
        .set_secret("alice/mnemonic", TEST_MNEMONIC)
        .await
        .expect("Seeding the vault should succeed");
    vault
}

fn f1r3fly_connector(
    vault: Arc<MemoryKeyVault>,
    client: Arc<MockLedgerClient>,
) -> F1r3flyWalletConnector {
    F1r3flyWalletConnector::new(
        vault,
        client,
        F1r3flyDeriver::default(),
        test_coordinator(RecordingSleeper::new()),
        20,
    )
}

fn bitcoin_connector(
    vault: Arc<MemoryKeyVault>,
    client: Arc<MockLedgerClient>,
) -> BitcoinWalletConnector {
    BitcoinWalletConnector::new(
        vault,
        client,
        TaprootDeriver::new(NetworkType::Regtest),
        test_coordinator(RecordingSleeper::new()),
        20,
    )
}

#[tokio::test]
async fn test_f1r3fly_transfer_is_signed_with_source_key() {
    let client = MockLedgerClient::new();
    let connector = f1r3fly_connector(vault_with_alice().await, client.clone());

    let addresses = connector.get_addresses("alice", 0, 0, 5, false).await.unwrap();
    let source = &addresses[3];

    let txid = connector
        .transfer("alice", source, "0xdestination", &amount(1_234))
        .await
        .expect("Transfer should succeed");
    assert_eq!(txid.as_deref(), Some("tx-1"));

    let submitted = client.submitted();
    assert_eq!(submitted.len(), 1);
    let transfer = &submitted[0];
    assert_eq!(transfer.network, "f1r3fly");
    assert_eq!(&transfer.from, source);
    assert_eq!(transfer.to, "0xdestination");
    assert_eq!(transfer.amount, amount(1_234));

    let public_key_bytes = hex::decode(&transfer.public_key).unwrap();
    assert_eq!(
        F1r3flyDeriver::address_for_public_key(&public_key_bytes),
        *source,
        "Public key should hash to the source address"
    );

    let secp = Secp256k1::verification_only();
    let public_key = PublicKey::from_slice(&public_key_bytes).unwrap();
    let signature =
        ecdsa::Signature::from_compact(&hex::decode(&transfer.signature).unwrap()).unwrap();
    let payload = SignedTransfer::signing_message("f1r3fly", source, "0xdestination", &amount(1_234));
    let digest: [u8; 32] = Blake2b256::digest(&payload).into();
    secp.verify_ecdsa(&Message::from_digest(digest), &signature, &public_key)
        .expect("Signature should verify");
}

#[tokio::test]
async fn test_bitcoin_transfer_from_change_address() {
    let client = MockLedgerClient::new();
    let connector = bitcoin_connector(vault_with_alice().await, client.clone());

    let change = connector.get_addresses("alice", 0, 0, 2, true).await.unwrap();
    let source = &change[1];
    assert!(source.starts_with("bcrt1p"));

    connector
        .transfer("alice", source, "bcrt1qdest", &amount(5_000))
        .await
        .unwrap();

    let transfer = client.submitted().remove(0);
    assert_eq!(transfer.network, "bitcoin");

    let secp = Secp256k1::verification_only();
    let public_key = XOnlyPublicKey::from_slice(&hex::decode(&transfer.public_key).unwrap()).unwrap();
    let signature =
        schnorr::Signature::from_slice(&hex::decode(&transfer.signature).unwrap()).unwrap();
    let payload = SignedTransfer::signing_message("bitcoin", source, "bcrt1qdest", &amount(5_000));
    let digest: [u8; 32] = Sha256::digest(&payload).into();
    secp.verify_schnorr(&signature, &Message::from_digest(digest), &public_key)
        .expect("Schnorr signature should verify");
}

#[tokio::test]
async fn test_transfer_from_foreign_address_is_rejected() {
    let client = MockLedgerClient::new();
    let connector = f1r3fly_connector(vault_with_alice().await, client.clone());

    let result = connector
        .transfer("alice", "0xnotmine", "0xdest", &amount(1))
        .await;

    assert!(matches!(
        result,
        Err(ConnectorError::SourceAddressNotFound { scanned: 20, .. })
    ));
    assert!(client.submitted().is_empty(), "Nothing should be submitted");
}

#[tokio::test]
async fn test_node_rejection_maps_to_transport_error() {
    let client = MockLedgerClient::new();
    client.fail_submissions();
    let connector = f1r3fly_connector(vault_with_alice().await, client.clone());
    let source = connector.get_addresses("alice", 0, 0, 1, false).await.unwrap().remove(0);

    let result = connector.transfer("alice", &source, "0xdest", &amount(1)).await;

    match result {
        Err(ConnectorError::Transport { operation, .. }) => {
            assert_eq!(operation, "transfer submission")
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_balance_comes_from_node() {
    let client = MockLedgerClient::new();
    client.script_balances("0xabc", &[777]);
    let connector = f1r3fly_connector(vault_with_alice().await, client);

    assert_eq!(
        connector.get_balance("alice", "0xabc").await.unwrap(),
        amount(777)
    );
}

#[tokio::test]
async fn test_faucet_waits_for_balance_to_move() {
    let client = MockLedgerClient::new();
    client.script_balances("addr", &[100, 100, 100, 350]);
    let sleeper = RecordingSleeper::new();
    let faucet = NetworkFaucetConnector::new(
        client.clone(),
        FAUCET_URL,
        Duration::from_millis(1_000),
        60,
    )
    .with_sleeper(sleeper.clone());

    let received = faucet.fund_address("alice", "addr", None).await.unwrap();

    assert_eq!(received, amount(250), "Only the delta counts as funding");
    assert_eq!(sleeper.delays().len(), 3);
    assert_eq!(
        client.faucet_requests(),
        vec![(FAUCET_URL.to_string(), "addr".to_string())]
    );
}

#[tokio::test]
async fn test_faucet_gives_up_after_timeout() {
    let client = MockLedgerClient::new();
    client.script_balances("addr", &[5]);
    let sleeper = RecordingSleeper::new();
    let faucet = NetworkFaucetConnector::new(
        client.clone(),
        FAUCET_URL,
        Duration::from_millis(1_000),
        60,
    )
    .with_sleeper(sleeper.clone());

    let received = faucet.fund_address("alice", "addr", Some(3)).await.unwrap();

    assert_eq!(received, amount(0));
    assert_eq!(sleeper.delays().len(), 3, "3s timeout at 1s polls");
}

#[tokio::test]
async fn test_declined_faucet_request_returns_zero() {
    let client = MockLedgerClient::new();
    client.decline_faucet();
    let sleeper = RecordingSleeper::new();
    let faucet = NetworkFaucetConnector::new(
        client.clone(),
        FAUCET_URL,
        Duration::from_millis(1_000),
        60,
    )
    .with_sleeper(sleeper.clone());

    let received = faucet.fund_address("alice", "addr", None).await.unwrap();

    assert_eq!(received, amount(0));
    assert!(sleeper.delays().is_empty(), "No polling after a refusal");
}

#[tokio::test]
async fn test_ensure_balance_through_network_faucet() {
    let client = MockLedgerClient::new();
    client.script_balances("addr", &[0, 0, 500]);
    let faucet = NetworkFaucetConnector::new(
        client.clone(),
        FAUCET_URL,
        Duration::from_millis(10),
        60,
    )
    .with_sleeper(RecordingSleeper::new());

    let connector = f1r3fly_connector(vault_with_alice().await, client.clone())
        .with_faucet(Arc::new(faucet));

    let funded = connector
        .ensure_balance("alice", "addr", &amount(500), None)
        .await
        .unwrap();
    assert!(funded);
    assert_eq!(client.faucet_requests().len(), 1);
}

#[tokio::test]
async fn test_network_connector_without_faucet() {
    let client = MockLedgerClient::new();
    let connector = bitcoin_connector(vault_with_alice().await, client.clone());

    let funded = connector
        .ensure_balance("alice", "bcrt1pany", &amount(1), None)
        .await
        .unwrap();

    assert!(!funded);
    assert!(client.faucet_requests().is_empty());
}

//! Wallet and faucet connectors
//!
//! A wallet connector provisions identities, derives their addresses,
//! reads balances, tops addresses up through a faucet and moves value.
//! The in-memory backend settles against a simulated ledger; the network
//! backends sign transfers locally and hand them to a ledger node.

pub mod bitcoin;
pub mod f1r3fly;
pub mod memory;
pub mod network;

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::storage::keys::{generate_mnemonic, mnemonic_to_seed};
use crate::storage::vault::{secret_key, KeyVault, MNEMONIC_PURPOSE};

pub use crate::error::ConnectorError;
pub use self::bitcoin::{BitcoinScheme, BitcoinWalletConnector};
pub use f1r3fly::{F1r3flyScheme, F1r3flyWalletConnector};
pub use memory::{MemoryFaucetConnector, MemoryWalletConnector};
pub use network::{NetworkFaucetConnector, NetworkScheme, NetworkWalletConnector};

/// Reads the balance held at an address
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn get_balance(&self, identity: &str, address: &str) -> Result<BigUint, ConnectorError>;
}

/// Source of free funds on a test network
#[async_trait]
pub trait FaucetConnector: Send + Sync {
    /// Request funds for `address` and return how much arrived
    ///
    /// Zero means the faucet gave nothing this time. `timeout_secs` falls
    /// back to the connector's own default.
    async fn fund_address(
        &self,
        identity: &str,
        address: &str,
        timeout_secs: Option<u64>,
    ) -> Result<BigUint, ConnectorError>;
}

#[async_trait]
pub trait WalletConnector: BalanceReader {
    /// Short backend name for logs and CLI output
    fn name(&self) -> &str;

    /// Provision key material for a new identity
    async fn create(&self, identity: &str) -> Result<(), ConnectorError>;

    /// Derive `count` addresses for an identity
    async fn get_addresses(
        &self,
        identity: &str,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, ConnectorError>;

    /// Top `address` up to `target` through the faucet
    ///
    /// Returns `false` when the faucet is missing, runs dry or the attempt
    /// budget runs out.
    async fn ensure_balance(
        &self,
        identity: &str,
        address: &str,
        target: &BigUint,
        timeout_secs: Option<u64>,
    ) -> Result<bool, ConnectorError>;

    /// Move `amount` from `source` to `destination`
    ///
    /// Returns the transaction id when the backend produces one.
    async fn transfer(
        &self,
        identity: &str,
        source: &str,
        destination: &str,
        amount: &BigUint,
    ) -> Result<Option<String>, ConnectorError>;
}

/// Generate and store a fresh mnemonic for `identity`
///
/// Refuses to replace an existing one.
pub(crate) async fn provision_identity(
    vault: &dyn KeyVault,
    identity: &str,
) -> Result<(), ConnectorError> {
    let key = secret_key(identity, MNEMONIC_PURPOSE);
    if vault.get_secret(&key).await?.is_some() {
        return Err(ConnectorError::IdentityExists(identity.to_string()));
    }

    let mnemonic = generate_mnemonic()?;
    vault.set_secret(&key, &mnemonic.to_string()).await?;

    log::info!("✓ Created identity '{}'", identity);
    Ok(())
}

/// Seed bytes for a provisioned identity
pub(crate) async fn load_seed(
    vault: &dyn KeyVault,
    identity: &str,
) -> Result<[u8; 64], ConnectorError> {
    let key = secret_key(identity, MNEMONIC_PURPOSE);
    let phrase = vault
        .get_secret(&key)
        .await?
        .ok_or_else(|| ConnectorError::IdentityNotFound(identity.to_string()))?;
    Ok(mnemonic_to_seed(&phrase)?)
}

//! Wallet manager - Main integration layer
//!
//! Builds the configured wallet connector and its faucet from
//! [`GlobalConfig`] and exposes the operations the CLI drives.

use std::sync::Arc;

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::client::{ClientError, HttpLedgerClient, LedgerClient};
use crate::config::{ConfigError, ConnectorKind, GlobalConfig};
use crate::connectors::{
    BalanceReader, BitcoinWalletConnector, ConnectorError, F1r3flyWalletConnector, FaucetConnector,
    MemoryFaucetConnector, MemoryWalletConnector, NetworkFaucetConnector, WalletConnector,
};
use crate::derivation::{F1r3flyDeriver, TaprootDeriver};
use crate::funding::{FundingCoordinator, FundingPolicy, FundingReport};
use crate::ledger::LedgerAccount;
use crate::storage::vault::{secret_key, MNEMONIC_PURPOSE};
use crate::storage::{
    EntityStore, KeyVault, MemoryEntityStore, SqliteEntityStore, StorageError, VaultError,
};

/// Errors that can occur in the wallet manager
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Connector(#[from] ConnectorError),

    #[error("Identity already exists: {0}")]
    IdentityExists(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Main wallet manager
///
/// Holds one wallet connector, chosen by `config.connector`, plus the
/// faucet it funds through.
pub struct WalletManager {
    config: GlobalConfig,
    vault: Arc<dyn KeyVault>,
    wallet: Arc<dyn WalletConnector>,
    faucet: Option<Arc<dyn FaucetConnector>>,
    coordinator: FundingCoordinator,
}

impl WalletManager {
    /// Create a manager for the configured backend
    ///
    /// The memory backend keeps its ledger in the SQLite file at
    /// [`GlobalConfig::ledger_database_path`]; network backends never touch
    /// the store.
    pub fn new(config: GlobalConfig, vault: Arc<dyn KeyVault>) -> Result<Self, ManagerError> {
        let store: Arc<dyn EntityStore> = match config.connector {
            ConnectorKind::Memory => {
                Arc::new(SqliteEntityStore::open(config.ledger_database_path()?)?)
            }
            ConnectorKind::Bitcoin | ConnectorKind::F1r3fly => Arc::new(MemoryEntityStore::new()),
        };
        Self::with_store(config, vault, store)
    }

    /// Create a manager with an explicit ledger store
    pub fn with_store(
        config: GlobalConfig,
        vault: Arc<dyn KeyVault>,
        store: Arc<dyn EntityStore>,
    ) -> Result<Self, ManagerError> {
        let coordinator = FundingCoordinator::new(FundingPolicy::from(&config.funding));
        Self::assemble(config, vault, store, coordinator)
    }

    /// Create a manager with an explicit ledger store and funding coordinator
    pub fn assemble(
        config: GlobalConfig,
        vault: Arc<dyn KeyVault>,
        store: Arc<dyn EntityStore>,
        coordinator: FundingCoordinator,
    ) -> Result<Self, ManagerError> {
        let (wallet, faucet): (Arc<dyn WalletConnector>, Option<Arc<dyn FaucetConnector>>) =
            match config.connector {
                ConnectorKind::Memory => {
                    let ledger = Arc::new(LedgerAccount::new(store));
                    let mut faucet =
                        MemoryFaucetConnector::new(ledger.clone(), config.memory.fund_amount.clone());
                    if let Some(cap) = &config.memory.balance_cap {
                        faucet = faucet.with_balance_cap(cap.clone());
                    }
                    let faucet: Arc<dyn FaucetConnector> = Arc::new(faucet);

                    let wallet = MemoryWalletConnector::new(
                        vault.clone(),
                        Arc::new(F1r3flyDeriver::new(config.f1r3fly.coin_type)),
                        ledger,
                        coordinator.clone(),
                    )
                    .with_faucet(faucet.clone());

                    (Arc::new(wallet), Some(faucet))
                }

                ConnectorKind::Bitcoin => {
                    let client: Arc<dyn LedgerClient> =
                        Arc::new(HttpLedgerClient::new(&config.bitcoin.node_url)?);
                    let faucet = network_faucet(
                        &client,
                        config.bitcoin.faucet_url.as_deref(),
                        config.bitcoin.faucet_poll_ms,
                        &config,
                    );

                    let mut wallet = BitcoinWalletConnector::new(
                        vault.clone(),
                        client,
                        TaprootDeriver::new(config.bitcoin.network),
                        coordinator.clone(),
                        config.bitcoin.address_scan_limit,
                    );
                    if let Some(faucet) = &faucet {
                        wallet = wallet.with_faucet(faucet.clone());
                    }

                    (Arc::new(wallet), faucet)
                }

                ConnectorKind::F1r3fly => {
                    let client: Arc<dyn LedgerClient> =
                        Arc::new(HttpLedgerClient::new(&config.f1r3fly.node_url())?);
                    let faucet = network_faucet(
                        &client,
                        config.f1r3fly.faucet_url.as_deref(),
                        config.f1r3fly.faucet_poll_ms,
                        &config,
                    );

                    let mut wallet = F1r3flyWalletConnector::new(
                        vault.clone(),
                        client,
                        F1r3flyDeriver::new(config.f1r3fly.coin_type),
                        coordinator.clone(),
                        config.f1r3fly.address_scan_limit,
                    );
                    if let Some(faucet) = &faucet {
                        wallet = wallet.with_faucet(faucet.clone());
                    }

                    (Arc::new(wallet), faucet)
                }
            };

        log::debug!(
            "Wallet manager ready (connector: {}, faucet: {})",
            wallet.name(),
            if faucet.is_some() { "yes" } else { "none" }
        );

        Ok(Self {
            config,
            vault,
            wallet,
            faucet,
            coordinator,
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Arc<dyn WalletConnector> {
        &self.wallet
    }

    pub fn has_faucet(&self) -> bool {
        self.faucet.is_some()
    }

    /// Create a new identity with a fresh mnemonic
    pub async fn create_identity(&self, identity: &str) -> Result<(), ManagerError> {
        self.wallet.create(identity).await.map_err(|e| match e {
            ConnectorError::IdentityExists(name) => ManagerError::IdentityExists(name),
            other => other.into(),
        })
    }

    /// Store an existing BIP39 mnemonic under `identity`
    pub async fn import_identity(&self, identity: &str, mnemonic: &str) -> Result<(), ManagerError> {
        crate::error::validate_identity(identity)?;
        let mnemonic = bip39::Mnemonic::parse(mnemonic)
            .map_err(|e| ManagerError::InvalidMnemonic(e.to_string()))?;

        let key = secret_key(identity, MNEMONIC_PURPOSE);
        if self.vault.get_secret(&key).await?.is_some() {
            return Err(ManagerError::IdentityExists(identity.to_string()));
        }
        self.vault.set_secret(&key, &mnemonic.to_string()).await?;

        log::info!("✓ Imported identity '{}'", identity);
        Ok(())
    }

    pub async fn addresses(
        &self,
        identity: &str,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, ManagerError> {
        Ok(self
            .wallet
            .get_addresses(identity, account_index, start_index, count, internal)
            .await?)
    }

    pub async fn balance(&self, identity: &str, address: &str) -> Result<BigUint, ManagerError> {
        Ok(self.wallet.get_balance(identity, address).await?)
    }

    /// One faucet request; zero when no faucet is configured
    pub async fn fund(
        &self,
        identity: &str,
        address: &str,
        timeout_secs: Option<u64>,
    ) -> Result<BigUint, ManagerError> {
        match &self.faucet {
            Some(faucet) => Ok(faucet.fund_address(identity, address, timeout_secs).await?),
            None => {
                log::warn!("No faucet configured for the {} connector", self.wallet.name());
                Ok(BigUint::default())
            }
        }
    }

    /// Top up `address` and report how the funding loop ended
    pub async fn ensure_balance(
        &self,
        identity: &str,
        address: &str,
        target: &BigUint,
        timeout_secs: Option<u64>,
    ) -> Result<FundingReport, ManagerError> {
        Ok(self
            .coordinator
            .ensure_balance_report(
                self.faucet.as_deref(),
                &WalletBalances(self.wallet.as_ref()),
                identity,
                address,
                target,
                timeout_secs,
            )
            .await?)
    }

    pub async fn transfer(
        &self,
        identity: &str,
        source: &str,
        destination: &str,
        amount: &BigUint,
    ) -> Result<Option<String>, ManagerError> {
        Ok(self
            .wallet
            .transfer(identity, source, destination, amount)
            .await?)
    }
}

struct WalletBalances<'a>(&'a dyn WalletConnector);

#[async_trait]
impl BalanceReader for WalletBalances<'_> {
    async fn get_balance(&self, identity: &str, address: &str) -> Result<BigUint, ConnectorError> {
        self.0.get_balance(identity, address).await
    }
}

fn network_faucet(
    client: &Arc<dyn LedgerClient>,
    faucet_url: Option<&str>,
    poll_ms: u64,
    config: &GlobalConfig,
) -> Option<Arc<dyn FaucetConnector>> {
    faucet_url.map(|url| {
        Arc::new(NetworkFaucetConnector::new(
            client.clone(),
            url,
            std::time::Duration::from_millis(poll_ms),
            config.funding.default_timeout_secs,
        )) as Arc<dyn FaucetConnector>
    })
}

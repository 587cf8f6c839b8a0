//! Connectors backed by a remote ledger node
//!
//! Keys never leave the process: a transfer is signed locally with the
//! source address's derived key and submitted through a [`LedgerClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::secp256k1::SecretKey;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::client::{LedgerClient, SignedTransfer};
use crate::derivation::{AddressDeriver, KeyPosition};
use crate::error::{validate_address, validate_identity, validate_timeout, ConnectorError};
use crate::funding::{FundingCoordinator, Sleeper, TokioSleeper};
use crate::storage::KeyVault;

use super::{load_seed, provision_identity, BalanceReader, FaucetConnector, WalletConnector};

/// Address format and signature scheme of one network
pub trait NetworkScheme: AddressDeriver {
    fn network_name(&self) -> &str;

    /// Sign a transfer from `from` with the key behind it
    fn sign_transfer(
        &self,
        secret: &SecretKey,
        from: &str,
        to: &str,
        amount: &BigUint,
    ) -> Result<SignedTransfer, ConnectorError>;
}

pub struct NetworkWalletConnector<S: NetworkScheme> {
    vault: Arc<dyn KeyVault>,
    client: Arc<dyn LedgerClient>,
    scheme: S,
    faucet: Option<Arc<dyn FaucetConnector>>,
    coordinator: FundingCoordinator,
    address_scan_limit: u32,
}

impl<S: NetworkScheme> NetworkWalletConnector<S> {
    pub fn new(
        vault: Arc<dyn KeyVault>,
        client: Arc<dyn LedgerClient>,
        scheme: S,
        coordinator: FundingCoordinator,
        address_scan_limit: u32,
    ) -> Self {
        Self {
            vault,
            client,
            scheme,
            faucet: None,
            coordinator,
            address_scan_limit,
        }
    }

    pub fn with_faucet(mut self, faucet: Arc<dyn FaucetConnector>) -> Self {
        self.faucet = Some(faucet);
        self
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// Find the derivation position of `address` in account 0
    ///
    /// Scans external then internal chains up to the scan limit.
    fn locate_source(
        &self,
        seed: &[u8],
        identity: &str,
        address: &str,
    ) -> Result<KeyPosition, ConnectorError> {
        let coin_type = self.scheme.coin_type();
        for internal in [false, true] {
            let addresses = self.scheme.derive_addresses(
                seed,
                coin_type,
                0,
                0,
                self.address_scan_limit,
                internal,
            )?;
            if let Some(index) = addresses.iter().position(|a| a == address) {
                return Ok(KeyPosition {
                    coin_type,
                    account_index: 0,
                    internal,
                    address_index: index as u32,
                });
            }
        }

        Err(ConnectorError::SourceAddressNotFound {
            identity: identity.to_string(),
            address: address.to_string(),
            scanned: self.address_scan_limit,
        })
    }
}

#[async_trait]
impl<S: NetworkScheme> BalanceReader for NetworkWalletConnector<S> {
    async fn get_balance(&self, identity: &str, address: &str) -> Result<BigUint, ConnectorError> {
        validate_identity(identity)?;
        validate_address("address", address)?;
        self.client
            .get_balance(address)
            .await
            .map_err(ConnectorError::transport("balance query"))
    }
}

#[async_trait]
impl<S: NetworkScheme> WalletConnector for NetworkWalletConnector<S> {
    fn name(&self) -> &str {
        self.scheme.network_name()
    }

    async fn create(&self, identity: &str) -> Result<(), ConnectorError> {
        validate_identity(identity)?;
        provision_identity(self.vault.as_ref(), identity).await
    }

    async fn get_addresses(
        &self,
        identity: &str,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, ConnectorError> {
        validate_identity(identity)?;
        let seed = load_seed(self.vault.as_ref(), identity).await?;
        Ok(self.scheme.derive_addresses(
            &seed,
            self.scheme.coin_type(),
            account_index,
            start_index,
            count,
            internal,
        )?)
    }

    async fn ensure_balance(
        &self,
        identity: &str,
        address: &str,
        target: &BigUint,
        timeout_secs: Option<u64>,
    ) -> Result<bool, ConnectorError> {
        self.coordinator
            .ensure_balance(
                self.faucet.as_deref(),
                self,
                identity,
                address,
                target,
                timeout_secs,
            )
            .await
    }

    async fn transfer(
        &self,
        identity: &str,
        source: &str,
        destination: &str,
        amount: &BigUint,
    ) -> Result<Option<String>, ConnectorError> {
        validate_identity(identity)?;
        validate_address("source address", source)?;
        validate_address("destination address", destination)?;
        if amount.is_zero() {
            return Err(ConnectorError::Validation(
                "transfer amount must be greater than zero".to_string(),
            ));
        }

        let seed = load_seed(self.vault.as_ref(), identity).await?;
        let position = self.locate_source(&seed, identity, source)?;
        let secret = self.scheme.derive_secret_key(&seed, position)?;
        let signed = self
            .scheme
            .sign_transfer(&secret, source, destination, amount)?;

        let txid = self
            .client
            .submit_transfer(&signed)
            .await
            .map_err(ConnectorError::transport("transfer submission"))?;

        log::info!(
            "✓ {} transfer {} -> {} submitted: {}",
            self.scheme.network_name(),
            source,
            destination,
            txid
        );
        Ok(Some(txid))
    }
}

/// Faucet reached over HTTP, confirmed by polling the balance
pub struct NetworkFaucetConnector {
    client: Arc<dyn LedgerClient>,
    endpoint: String,
    poll_interval: Duration,
    default_timeout_secs: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl NetworkFaucetConnector {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        endpoint: impl Into<String>,
        poll_interval: Duration,
        default_timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            poll_interval,
            default_timeout_secs,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn max_polls(&self, timeout_secs: u64) -> u64 {
        let poll_ms = self.poll_interval.as_millis().max(1) as u64;
        let timeout_ms = timeout_secs.saturating_mul(1000);
        timeout_ms.div_ceil(poll_ms).max(1)
    }
}

#[async_trait]
impl FaucetConnector for NetworkFaucetConnector {
    async fn fund_address(
        &self,
        identity: &str,
        address: &str,
        timeout_secs: Option<u64>,
    ) -> Result<BigUint, ConnectorError> {
        validate_identity(identity)?;
        validate_address("address", address)?;
        validate_timeout(timeout_secs)?;

        let before = self
            .client
            .get_balance(address)
            .await
            .map_err(ConnectorError::transport("balance query"))?;

        let ack = self
            .client
            .request_faucet_funds(&self.endpoint, address)
            .await
            .map_err(ConnectorError::transport("faucet request"))?;
        if !ack.accepted {
            log::warn!(
                "Faucet declined {}: {}",
                address,
                ack.message.as_deref().unwrap_or("no reason given")
            );
            return Ok(BigUint::zero());
        }

        let polls = self.max_polls(timeout_secs.unwrap_or(self.default_timeout_secs));
        for _ in 0..polls {
            self.sleeper.sleep(self.poll_interval).await;
            let now = self
                .client
                .get_balance(address)
                .await
                .map_err(ConnectorError::transport("balance query"))?;
            if now > before {
                let received = now - &before;
                log::info!("Faucet delivered {} to {}", received, address);
                return Ok(received);
            }
        }

        log::warn!("No faucet funds reached {} within the timeout", address);
        Ok(BigUint::zero())
    }
}

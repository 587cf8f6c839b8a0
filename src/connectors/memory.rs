//! Wallet and faucet connectors over the simulated ledger

use std::sync::Arc;

use async_trait::async_trait;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::derivation::AddressDeriver;
use crate::error::{validate_address, validate_identity, ConnectorError};
use crate::funding::FundingCoordinator;
use crate::ledger::LedgerAccount;
use crate::storage::KeyVault;

use super::{load_seed, provision_identity, BalanceReader, FaucetConnector, WalletConnector};

/// Wallet connector that settles on a [`LedgerAccount`]
///
/// Transfers draw from every address the identity owns; the named source
/// is drained first.
pub struct MemoryWalletConnector {
    vault: Arc<dyn KeyVault>,
    deriver: Arc<dyn AddressDeriver>,
    ledger: Arc<LedgerAccount>,
    faucet: Option<Arc<dyn FaucetConnector>>,
    coordinator: FundingCoordinator,
}

impl MemoryWalletConnector {
    pub fn new(
        vault: Arc<dyn KeyVault>,
        deriver: Arc<dyn AddressDeriver>,
        ledger: Arc<LedgerAccount>,
        coordinator: FundingCoordinator,
    ) -> Self {
        Self {
            vault,
            deriver,
            ledger,
            faucet: None,
            coordinator,
        }
    }

    pub fn with_faucet(mut self, faucet: Arc<dyn FaucetConnector>) -> Self {
        self.faucet = Some(faucet);
        self
    }

    pub fn ledger(&self) -> &Arc<LedgerAccount> {
        &self.ledger
    }
}

#[async_trait]
impl BalanceReader for MemoryWalletConnector {
    async fn get_balance(&self, identity: &str, address: &str) -> Result<BigUint, ConnectorError> {
        validate_identity(identity)?;
        validate_address("address", address)?;
        Ok(self.ledger.balance(address).await?)
    }
}

#[async_trait]
impl WalletConnector for MemoryWalletConnector {
    fn name(&self) -> &str {
        "memory"
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
        Ok(self.deriver.derive_addresses(
            &seed,
            self.deriver.coin_type(),
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

        self.ledger
            .transfer(identity, destination, amount, Some(source))
            .await?;
        Ok(None)
    }
}

/// Faucet that mints a fixed amount on the simulated ledger
pub struct MemoryFaucetConnector {
    ledger: Arc<LedgerAccount>,
    fund_amount: BigUint,
    balance_cap: Option<BigUint>,
}

impl MemoryFaucetConnector {
    pub fn new(ledger: Arc<LedgerAccount>, fund_amount: BigUint) -> Self {
        Self {
            ledger,
            fund_amount,
            balance_cap: None,
        }
    }

    /// Stop funding addresses once they hold `cap`
    pub fn with_balance_cap(mut self, cap: BigUint) -> Self {
        self.balance_cap = Some(cap);
        self
    }
}

#[async_trait]
impl FaucetConnector for MemoryFaucetConnector {
    async fn fund_address(
        &self,
        identity: &str,
        address: &str,
        _timeout_secs: Option<u64>,
    ) -> Result<BigUint, ConnectorError> {
        validate_identity(identity)?;
        validate_address("address", address)?;

        if self.fund_amount.is_zero() {
            return Ok(BigUint::zero());
        }

        match &self.balance_cap {
            Some(cap) => Ok(self
                .ledger
                .mint_capped(identity, address, &self.fund_amount, cap)
                .await?),
            None => {
                self.ledger
                    .mint(identity, address, &self.fund_amount)
                    .await?;
                Ok(self.fund_amount.clone())
            }
        }
    }
}

//! Simulated ledger over an entity store
//!
//! Records are keyed by address and carry an owner and a balance. Faucet
//! credits and transfers are the only mutations, and both go through one
//! writer lock so read-modify-write cycles never interleave.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use tokio::sync::Mutex;

use crate::storage::{AddressRecord, EntityStore, RecordFilter, StorageError};

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: BigUint,
        available: BigUint,
    },
}

/// Amount taken from one source record during a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debit {
    pub address: String,
    pub amount: BigUint,
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Debits in the order they were taken
    pub debits: Vec<Debit>,
    pub destination: String,
    /// Amount credited to the destination
    pub credited: BigUint,
}

impl TransferReceipt {
    /// Sum of all debits
    pub fn total_debited(&self) -> BigUint {
        self.debits.iter().map(|d| &d.amount).sum()
    }
}

/// Address ledger with greedy multi-source transfers
pub struct LedgerAccount {
    store: Arc<dyn EntityStore>,
    write_lock: Mutex<()>,
}

impl LedgerAccount {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Balance of `address`; unknown addresses hold zero
    pub async fn balance(&self, address: &str) -> Result<BigUint, LedgerError> {
        Ok(self
            .store
            .get(address)
            .await?
            .map(|record| record.balance)
            .unwrap_or_default())
    }

    /// Fetch a record without creating it
    pub async fn record(&self, address: &str) -> Result<Option<AddressRecord>, LedgerError> {
        Ok(self.store.get(address).await?)
    }

    /// Records owned by `identity`, in storage order
    pub async fn owned_records(&self, identity: &str) -> Result<Vec<AddressRecord>, LedgerError> {
        Ok(self.store.query(&RecordFilter::owned_by(identity)).await?)
    }

    /// Credit freshly minted funds to `address`
    ///
    /// An unseen address is created owned by `identity`; an existing record
    /// keeps its owner.
    pub async fn mint(
        &self,
        identity: &str,
        address: &str,
        amount: &BigUint,
    ) -> Result<AddressRecord, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let record = self.load_or_create(identity, address).await?;
        self.credit(record, amount).await
    }

    /// Mint at most `amount` without taking `address` past `cap`
    ///
    /// The cap check and the credit happen under the writer lock, so
    /// concurrent callers can never overshoot the cap together.
    ///
    /// # Returns
    ///
    /// The amount actually credited. Zero when the address already holds
    /// `cap` or more, in which case nothing is written.
    pub async fn mint_capped(
        &self,
        identity: &str,
        address: &str,
        amount: &BigUint,
        cap: &BigUint,
    ) -> Result<BigUint, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let record = self.load_or_create(identity, address).await?;
        if record.balance >= *cap {
            log::debug!("{} is at the faucet cap of {}", address, cap);
            return Ok(BigUint::zero());
        }

        let added = (cap - &record.balance).min(amount.clone());
        if added.is_zero() {
            return Ok(added);
        }
        self.credit(record, &added).await?;
        Ok(added)
    }

    async fn load_or_create(
        &self,
        identity: &str,
        address: &str,
    ) -> Result<AddressRecord, LedgerError> {
        Ok(self
            .store
            .get(address)
            .await?
            .unwrap_or_else(|| AddressRecord::new(address, identity)))
    }

    // Caller must hold the writer lock
    async fn credit(
        &self,
        mut record: AddressRecord,
        amount: &BigUint,
    ) -> Result<AddressRecord, LedgerError> {
        record.balance += amount;
        self.store.set(&record).await?;

        log::info!(
            "Minted {} to {} (balance now {})",
            amount,
            record.address,
            record.balance
        );

        Ok(record)
    }

    /// Move `amount` from `identity`'s records to `destination`
    ///
    /// Owned records are drained in storage order, skipping empty ones; a
    /// `preferred_source` owned by `identity` is visited first. Nothing is
    /// written unless the full amount is covered. Debits and the credit are
    /// persisted as one batch.
    ///
    /// When the destination is one of the debited records, the credit is
    /// applied on top of the debit, leaving that record's balance unchanged.
    pub async fn transfer(
        &self,
        identity: &str,
        destination: &str,
        amount: &BigUint,
        preferred_source: Option<&str>,
    ) -> Result<TransferReceipt, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut candidates = self.store.query(&RecordFilter::owned_by(identity)).await?;
        if let Some(source) = preferred_source {
            if let Some(position) = candidates.iter().position(|r| r.address == source) {
                let preferred = candidates.remove(position);
                candidates.insert(0, preferred);
            }
        }

        let mut remaining = amount.clone();
        let mut staged: Vec<AddressRecord> = Vec::new();
        let mut debits = Vec::new();

        for mut record in candidates {
            if remaining.is_zero() {
                break;
            }
            if record.balance.is_zero() {
                continue;
            }

            let take = if remaining < record.balance {
                remaining.clone()
            } else {
                record.balance.clone()
            };
            record.balance -= &take;
            remaining -= &take;

            debits.push(Debit {
                address: record.address.clone(),
                amount: take,
            });
            staged.push(record);
        }

        if !remaining.is_zero() {
            let available = amount - &remaining;
            log::warn!(
                "Transfer of {} for identity '{}' rejected: only {} available",
                amount,
                identity,
                available
            );
            return Err(LedgerError::InsufficientFunds {
                requested: amount.clone(),
                available,
            });
        }

        let mut target = match staged.iter().position(|r| r.address == destination) {
            Some(position) => staged.remove(position),
            None => self
                .store
                .get(destination)
                .await?
                .unwrap_or_else(|| AddressRecord::new(destination, "")),
        };
        target.balance += amount;
        staged.push(target);

        self.store.set_many(&staged).await?;

        for debit in &debits {
            log::debug!("Debited {} from {}", debit.amount, debit.address);
        }
        log::info!(
            "Transferred {} to {} from {} source record(s)",
            amount,
            destination,
            debits.len()
        );

        Ok(TransferReceipt {
            debits,
            destination: destination.to_string(),
            credited: amount.clone(),
        })
    }
}

//! Storage data models
//!
//! Defines the persisted unit of the in-memory ledger and the filter used
//! to scan it.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// One address in the simulated ledger
///
/// Serialized as `{"address": "...", "owner": "...", "balance": "123"}`.
/// `owner` is empty for addresses first seen as a transfer destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Address string (primary key)
    pub address: String,

    /// Identity that owns the record
    pub owner: String,

    /// Current balance, never negative
    #[serde(with = "crate::amount::decimal_string")]
    pub balance: BigUint,
}

impl AddressRecord {
    /// Create a zero-balance record
    pub fn new(address: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            owner: owner.into(),
            balance: BigUint::zero(),
        }
    }

    /// Create a record with an explicit balance
    pub fn with_balance(
        address: impl Into<String>,
        owner: impl Into<String>,
        balance: BigUint,
    ) -> Self {
        Self {
            address: address.into(),
            owner: owner.into(),
            balance,
        }
    }

    /// Balance rendered as a base-10 string
    pub fn balance_string(&self) -> String {
        self.balance.to_str_radix(10)
    }
}

/// Filter for [`EntityStore::query`](crate::storage::entity_store::EntityStore::query)
///
/// An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only records owned by this identity
    pub owner: Option<String>,
}

impl RecordFilter {
    /// Match every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records owned by `identity`
    pub fn owned_by(identity: &str) -> Self {
        Self {
            owner: Some(identity.to_string()),
        }
    }

    /// Check whether a record satisfies the filter
    pub fn matches(&self, record: &AddressRecord) -> bool {
        self.owner
            .as_deref()
            .map_or(true, |owner| record.owner == owner)
    }
}

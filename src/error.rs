//! Connector-level error type
//!
//! Aggregates the errors of every layer a connector touches. Business
//! outcomes of funding (no faucet, faucet dry, retry cap) are not errors;
//! they surface as `false` from `ensure_balance`.

use num_bigint::BigUint;

use crate::amount::AmountError;
use crate::client::ClientError;
use crate::derivation::DerivationError;
use crate::ledger::LedgerError;
use crate::storage::keys::KeyError;
use crate::storage::{StorageError, VaultError};

/// Errors returned by wallet and faucet connectors
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: BigUint,
        available: BigUint,
    },

    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        source: ClientError,
    },

    #[error("Identity '{0}' has not been created")]
    IdentityNotFound(String),

    #[error("Identity '{0}' already exists")]
    IdentityExists(String),

    #[error("Address {address} is not among the first {scanned} addresses of identity '{identity}'")]
    SourceAddressNotFound {
        identity: String,
        address: String,
        scanned: u32,
    },

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Signing error: {0}")]
    Signing(String),
}

impl ConnectorError {
    /// Wrap a ledger client failure with the operation that hit it
    pub fn transport(operation: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |source| ConnectorError::Transport { operation, source }
    }

    /// True for the insufficient-funds precondition failure
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, ConnectorError::InsufficientFunds { .. })
    }
}

impl From<LedgerError> for ConnectorError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(e) => ConnectorError::Storage(e),
            LedgerError::InsufficientFunds {
                requested,
                available,
            } => ConnectorError::InsufficientFunds {
                requested,
                available,
            },
        }
    }
}

/// Reject empty or whitespace-only identities
pub fn validate_identity(identity: &str) -> Result<(), ConnectorError> {
    if identity.trim().is_empty() {
        return Err(ConnectorError::Validation(
            "identity must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject empty or whitespace-only addresses
pub fn validate_address(field: &str, address: &str) -> Result<(), ConnectorError> {
    if address.trim().is_empty() {
        return Err(ConnectorError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

/// Reject a zero timeout when one is given
pub fn validate_timeout(timeout_secs: Option<u64>) -> Result<(), ConnectorError> {
    if timeout_secs == Some(0) {
        return Err(ConnectorError::Validation(
            "timeout must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

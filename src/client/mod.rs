//! Ledger node client used by the network-backed connectors

pub mod http;

use async_trait::async_trait;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

pub use http::HttpLedgerClient;

/// Ledger client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Node returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode node response: {0}")]
    Decode(String),

    #[error("Invalid node URL: {0}")]
    InvalidUrl(String),
}

/// A signed value transfer ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransfer {
    pub network: String,
    pub from: String,
    pub to: String,
    #[serde(with = "crate::amount::decimal_string")]
    pub amount: BigUint,
    /// Hex-encoded public key of the source address
    pub public_key: String,
    /// Hex-encoded signature over [`SignedTransfer::signing_message`]
    pub signature: String,
}

impl SignedTransfer {
    /// Bytes a source key signs for a transfer
    pub fn signing_message(network: &str, from: &str, to: &str, amount: &BigUint) -> Vec<u8> {
        format!("{}:{}:{}:{}", network, from, to, amount).into_bytes()
    }
}

/// Faucet acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetAck {
    #[serde(default = "accepted_by_default")]
    pub accepted: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn accepted_by_default() -> bool {
    true
}

/// Read balances, submit transfers and request faucet funds on a ledger node
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_balance(&self, address: &str) -> Result<BigUint, ClientError>;

    /// Returns the node's transaction id
    async fn submit_transfer(&self, transfer: &SignedTransfer) -> Result<String, ClientError>;

    async fn request_faucet_funds(
        &self,
        endpoint: &str,
        address: &str,
    ) -> Result<FaucetAck, ClientError>;
}

//! JSON-over-HTTP ledger client
//!
//! Endpoints, relative to the node base URL:
//!
//! - `GET  /balance/{address}` returns `{"balance": "<decimal>"}`
//! - `POST /transfers` takes a [`SignedTransfer`] and returns
//!   `{"transaction_id": "..."}`
//!
//! Faucet requests go to an absolute endpoint with `{"address": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use super::{ClientError, FaucetAck, LedgerClient, SignedTransfer};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(with = "crate::amount::decimal_string")]
    balance: BigUint,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    transaction_id: String,
}

#[derive(Debug, Serialize)]
struct FaucetRequest<'a> {
    address: &'a str,
}

pub struct HttpLedgerClient {
    base_url: String,
    client: Client,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Balance endpoint for `address`, with the address percent-encoded
    /// as a single path segment
    pub fn balance_url(&self, address: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("balance")
            .push(address);
        Ok(url)
    }

    async fn check_status(response: Response) -> Result<Response, ClientError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_balance(&self, address: &str) -> Result<BigUint, ClientError> {
        let url = self.balance_url(address)?;
        log::debug!("GET {}", url);

        let response = Self::check_status(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        let parsed: BalanceResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(parsed.balance)
    }

    async fn submit_transfer(&self, transfer: &SignedTransfer) -> Result<String, ClientError> {
        let url = format!("{}/transfers", self.base_url);
        log::debug!("POST {} ({} -> {})", url, transfer.from, transfer.to);

        let response =
            Self::check_status(self.client.post(&url).json(transfer).send().await?).await?;
        let body = response.text().await?;
        let parsed: TransferResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        log::info!("Transfer submitted: {}", parsed.transaction_id);
        Ok(parsed.transaction_id)
    }

    async fn request_faucet_funds(
        &self,
        endpoint: &str,
        address: &str,
    ) -> Result<FaucetAck, ClientError> {
        log::debug!("POST {} for {}", endpoint, address);

        let response = Self::check_status(
            self.client
                .post(endpoint)
                .json(&FaucetRequest { address })
                .send()
                .await?,
        )
        .await?;
        let body = response.text().await?;

        // Some faucets answer 2xx with an empty body
        if body.trim().is_empty() {
            return Ok(FaucetAck {
                accepted: true,
                message: None,
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

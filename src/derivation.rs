//! Deterministic address derivation from BIP39 seeds
//!
//! Every deriver walks a BIP32 path of the form
//! `m/purpose'/coin_type'/account'/change/index` and encodes the child
//! public key in its network's address format. The same path yields the
//! signing key for that address.

use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::Network as BitcoinNetwork;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::config::NetworkType;

/// Blake2b with a 256-bit output
pub type Blake2b256 = Blake2b<U32>;

/// Upper bound on addresses derived per request
pub const MAX_DERIVATION_COUNT: u32 = 1000;

/// Derivation errors
#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    #[error("BIP32 derivation error: {0}")]
    Bip32(String),

    #[error("Invalid derivation request: {0}")]
    InvalidRequest(String),
}

/// Position of one key in an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    pub coin_type: u32,
    pub account_index: u32,
    pub internal: bool,
    pub address_index: u32,
}

/// Turns a seed into addresses, deterministically
pub trait AddressDeriver: Send + Sync {
    /// Default coin type for this deriver's network
    fn coin_type(&self) -> u32;

    /// Derive `count` consecutive addresses starting at `start_index`
    fn derive_addresses(
        &self,
        seed: &[u8],
        coin_type: u32,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, DerivationError>;

    /// Derive the private key behind one address
    fn derive_secret_key(
        &self,
        seed: &[u8],
        position: KeyPosition,
    ) -> Result<SecretKey, DerivationError>;
}

/// Validate the window of a derivation request
pub fn check_window(start_index: u32, count: u32) -> Result<(), DerivationError> {
    if count == 0 || count > MAX_DERIVATION_COUNT {
        return Err(DerivationError::InvalidRequest(format!(
            "count must be between 1 and {}, got {}",
            MAX_DERIVATION_COUNT, count
        )));
    }
    if start_index.checked_add(count).is_none() || start_index + count > 0x8000_0000 {
        return Err(DerivationError::InvalidRequest(format!(
            "index window {}..{} leaves the non-hardened range",
            start_index,
            u64::from(start_index) + u64::from(count)
        )));
    }
    Ok(())
}

fn derive_xpriv(
    seed: &[u8],
    purpose: u32,
    position: KeyPosition,
    network: BitcoinNetwork,
) -> Result<Xpriv, DerivationError> {
    let secp = Secp256k1::new();
    let master_key = Xpriv::new_master(network, seed)
        .map_err(|e| DerivationError::Bip32(format!("Failed to create master key: {}", e)))?;

    let path_str = format!(
        "m/{}'/{}'/{}'/{}/{}",
        purpose,
        position.coin_type,
        position.account_index,
        u32::from(position.internal),
        position.address_index
    );
    let derivation_path = DerivationPath::from_str(&path_str)
        .map_err(|e| DerivationError::Bip32(format!("Invalid derivation path: {}", e)))?;

    master_key
        .derive_priv(&secp, &derivation_path)
        .map_err(|e| DerivationError::Bip32(format!("Derivation failed: {}", e)))
}

/// Bitcoin P2TR addresses on BIP86 paths
///
/// Produces `bc1p…`, `tb1p…` or `bcrt1p…` addresses using the untweaked
/// child key as the taproot internal key.
#[derive(Debug, Clone, Copy)]
pub struct TaprootDeriver {
    network: NetworkType,
}

impl TaprootDeriver {
    pub fn new(network: NetworkType) -> Self {
        Self { network }
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    fn bitcoin_network(&self) -> BitcoinNetwork {
        match self.network {
            NetworkType::Mainnet => BitcoinNetwork::Bitcoin,
            NetworkType::Testnet => BitcoinNetwork::Testnet,
            NetworkType::Signet => BitcoinNetwork::Signet,
            NetworkType::Regtest => BitcoinNetwork::Regtest,
        }
    }
}

impl AddressDeriver for TaprootDeriver {
    fn coin_type(&self) -> u32 {
        match self.network {
            NetworkType::Mainnet => 0,
            NetworkType::Testnet | NetworkType::Signet | NetworkType::Regtest => 1,
        }
    }

    fn derive_addresses(
        &self,
        seed: &[u8],
        coin_type: u32,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, DerivationError> {
        check_window(start_index, count)?;

        let secp = Secp256k1::new();
        let network = self.bitcoin_network();

        (start_index..start_index + count)
            .map(|address_index| {
                let position = KeyPosition {
                    coin_type,
                    account_index,
                    internal,
                    address_index,
                };
                let child = derive_xpriv(seed, 86, position, network)?;
                let (x_only, _parity) = child.private_key.public_key(&secp).x_only_public_key();
                Ok(bitcoin::Address::p2tr(&secp, x_only, None, network).to_string())
            })
            .collect()
    }

    fn derive_secret_key(
        &self,
        seed: &[u8],
        position: KeyPosition,
    ) -> Result<SecretKey, DerivationError> {
        Ok(derive_xpriv(seed, 86, position, self.bitcoin_network())?.private_key)
    }
}

/// F1r3fly addresses on BIP44 paths
///
/// The address is `0x` followed by the hex Blake2b-256 digest of the
/// compressed child public key.
#[derive(Debug, Clone, Copy)]
pub struct F1r3flyDeriver {
    coin_type: u32,
}

/// Default BIP44 coin type used for F1r3fly keys
pub const F1R3FLY_COIN_TYPE: u32 = 60;

impl F1r3flyDeriver {
    pub fn new(coin_type: u32) -> Self {
        Self { coin_type }
    }

    /// Address for a compressed secp256k1 public key
    pub fn address_for_public_key(public_key: &[u8]) -> String {
        let digest = Blake2b256::digest(public_key);
        format!("0x{}", hex::encode(digest))
    }
}

impl Default for F1r3flyDeriver {
    fn default() -> Self {
        Self::new(F1R3FLY_COIN_TYPE)
    }
}

impl AddressDeriver for F1r3flyDeriver {
    fn coin_type(&self) -> u32 {
        self.coin_type
    }

    fn derive_addresses(
        &self,
        seed: &[u8],
        coin_type: u32,
        account_index: u32,
        start_index: u32,
        count: u32,
        internal: bool,
    ) -> Result<Vec<String>, DerivationError> {
        check_window(start_index, count)?;

        let secp = Secp256k1::new();

        (start_index..start_index + count)
            .map(|address_index| {
                let position = KeyPosition {
                    coin_type,
                    account_index,
                    internal,
                    address_index,
                };
                let secret = self.derive_secret_key(seed, position)?;
                let public_key = secret.public_key(&secp);
                Ok(Self::address_for_public_key(&public_key.serialize()))
            })
            .collect()
    }

    fn derive_secret_key(
        &self,
        seed: &[u8],
        position: KeyPosition,
    ) -> Result<SecretKey, DerivationError> {
        // Network only affects xprv serialization, not the derived key bytes.
        Ok(derive_xpriv(seed, 44, position, BitcoinNetwork::Testnet)?.private_key)
    }
}

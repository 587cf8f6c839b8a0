//! F1r3fly wallet connector
//!
//! Blake2b-derived `0x` addresses; transfers carry a compact ECDSA
//! signature over the Blake2b-256 digest of the transfer message.

use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use blake2::Digest;
use num_bigint::BigUint;

use crate::client::SignedTransfer;
use crate::derivation::{Blake2b256, F1r3flyDeriver};
use crate::error::ConnectorError;

use super::network::{NetworkScheme, NetworkWalletConnector};

pub type F1r3flyScheme = F1r3flyDeriver;

pub type F1r3flyWalletConnector = NetworkWalletConnector<F1r3flyScheme>;

impl NetworkScheme for F1r3flyDeriver {
    fn network_name(&self) -> &str {
        "f1r3fly"
    }

    fn sign_transfer(
        &self,
        secret: &SecretKey,
        from: &str,
        to: &str,
        amount: &BigUint,
    ) -> Result<SignedTransfer, ConnectorError> {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, secret);
        if F1r3flyDeriver::address_for_public_key(&public_key.serialize()) != from {
            return Err(ConnectorError::Signing(format!(
                "derived key does not control {}",
                from
            )));
        }

        let payload = SignedTransfer::signing_message(self.network_name(), from, to, amount);
        let digest: [u8; 32] = Blake2b256::digest(&payload).into();
        let signature = secp.sign_ecdsa(&Message::from_digest(digest), secret);

        Ok(SignedTransfer {
            network: self.network_name().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.clone(),
            public_key: hex::encode(public_key.serialize()),
            signature: hex::encode(signature.serialize_compact()),
        })
    }
}

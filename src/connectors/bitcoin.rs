//! Bitcoin wallet connector
//!
//! Taproot addresses; transfers carry a BIP340 Schnorr signature over the
//! SHA-256 digest of the transfer message.

use bitcoin::secp256k1::{Keypair, Message, Secp256k1, SecretKey};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::client::SignedTransfer;
use crate::derivation::TaprootDeriver;
use crate::error::ConnectorError;

use super::network::{NetworkScheme, NetworkWalletConnector};

pub type BitcoinScheme = TaprootDeriver;

pub type BitcoinWalletConnector = NetworkWalletConnector<BitcoinScheme>;

impl NetworkScheme for TaprootDeriver {
    fn network_name(&self) -> &str {
        "bitcoin"
    }

    fn sign_transfer(
        &self,
        secret: &SecretKey,
        from: &str,
        to: &str,
        amount: &BigUint,
    ) -> Result<SignedTransfer, ConnectorError> {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, secret);
        let (x_only, _parity) = keypair.x_only_public_key();

        let payload = SignedTransfer::signing_message(self.network_name(), from, to, amount);
        let digest: [u8; 32] = Sha256::digest(&payload).into();
        let message = Message::from_digest(digest);
        let signature = secp.sign_schnorr_no_aux_rand(&message, &keypair);

        Ok(SignedTransfer {
            network: self.network_name().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.clone(),
            public_key: hex::encode(x_only.serialize()),
            signature: hex::encode(signature.serialize()),
        })
    }
}

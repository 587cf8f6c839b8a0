//! Mnemonic generation and secret encryption
//!
//! Provides BIP39 mnemonic generation for identity provisioning and the
//! AES-GCM envelope used by the file-backed key vault.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// PBKDF2-HMAC-SHA256 iteration count for vault secrets
pub const PBKDF2_ITERATIONS: u32 = 600_000;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Key generation and encryption errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("BIP39 error: {0}")]
    Bip39(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),
}

/// Generate a new BIP39 mnemonic (24 words)
///
/// Uses 256 bits of OS entropy. Identities provisioned through
/// `WalletConnector::create` receive one of these.
pub fn generate_mnemonic() -> Result<bip39::Mnemonic, KeyError> {
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);

    bip39::Mnemonic::from_entropy(&entropy).map_err(|e| KeyError::Bip39(e.to_string()))
}

/// Parse a mnemonic phrase and return its BIP39 seed
///
/// # Arguments
///
/// * `phrase` - 12 or 24 word BIP39 phrase; surrounding whitespace is ignored
///
/// # Returns
///
/// The 64-byte seed derived with an empty passphrase
pub fn mnemonic_to_seed(phrase: &str) -> Result<[u8; 64], KeyError> {
    let mnemonic =
        bip39::Mnemonic::parse(phrase.trim()).map_err(|e| KeyError::Bip39(e.to_string()))?;
    Ok(mnemonic.to_seed(""))
}

/// Encrypt data using AES-256-GCM with a password-derived key
///
/// Output layout, hex encoded: salt (16) || nonce (12) || ciphertext || tag (16).
/// The key is PBKDF2-HMAC-SHA256 over the password with a fresh random salt.
///
/// # Arguments
///
/// * `data` - Plaintext bytes to encrypt
/// * `password` - Password to derive the key from
///
/// # Returns
///
/// Hex-encoded salt, nonce and ciphertext
///
/// # Example
///
/// ```ignore
/// let encrypted = encrypt_data(b"secret", "my_password")?;
/// let decrypted = decrypt_data(&encrypted, "my_password")?;
/// ```
pub fn encrypt_data(data: &[u8], password: &str) -> Result<String, KeyError> {
    // Generate random salt
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    // Derive key from password using PBKDF2
    let cipher = cipher_for(password, &salt);

    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| KeyError::Encryption(e.to_string()))?;

    // Combine: salt || nonce || ciphertext
    let mut result = salt.to_vec();
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(hex::encode(result))
}

/// Decrypt data produced by [`encrypt_data`]
///
/// # Arguments
///
/// * `encrypted_hex` - Hex-encoded salt, nonce and ciphertext
/// * `password` - Password used for encryption
///
/// # Returns
///
/// Decrypted plaintext bytes
///
/// # Example
///
/// ```ignore
/// let encrypted = encrypt_data(b"secret", "password")?;
/// let decrypted = decrypt_data(&encrypted, "password")?;
/// assert_eq!(decrypted, b"secret");
/// ```
pub fn decrypt_data(encrypted_hex: &str, password: &str) -> Result<Vec<u8>, KeyError> {
    // Decode hex
    let encrypted_bytes =
        hex::decode(encrypted_hex).map_err(|e| KeyError::Decryption(e.to_string()))?;

    if encrypted_bytes.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(KeyError::Decryption(format!(
            "Data too short (minimum {} bytes required)",
            SALT_LEN + NONCE_LEN + TAG_LEN
        )));
    }

    // Extract salt, then nonce
    let (salt, rest) = encrypted_bytes.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    // Derive key from password using same PBKDF2 parameters
    let cipher = cipher_for(password, salt);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| KeyError::Decryption(format!("Decryption failed (wrong password?): {}", e)))
}

/// Encrypt a UTF-8 secret for storage
///
/// Convenience wrapper around encrypt_data for mnemonic phrases.
///
/// # Arguments
///
/// * `secret` - Secret text to encrypt
/// * `password` - Password for encryption
///
/// # Returns
///
/// Hex-encoded encrypted secret
pub fn encrypt_secret(secret: &str, password: &str) -> Result<String, KeyError> {
    encrypt_data(secret.as_bytes(), password)
}

/// Decrypt a UTF-8 secret produced by [`encrypt_secret`]
pub fn decrypt_secret(encrypted_hex: &str, password: &str) -> Result<String, KeyError> {
    let bytes = decrypt_data(encrypted_hex, password)?;
    String::from_utf8(bytes).map_err(|e| KeyError::Decryption(e.to_string()))
}

fn cipher_for(password: &str, salt: &[u8]) -> Aes256Gcm {
    let mut key_bytes = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key_bytes);
    let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes);
    Aes256Gcm::new(key)
}

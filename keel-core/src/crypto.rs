use crate::{Error, Result};
use aes_gcm::{
    Aes256Gcm, KeyInit,
    aead::{Aead, generic_array::GenericArray},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Symmetric cipher used for `encoded_string` and `encoded_json` columns.
///
/// The key is the SHA-256 digest of the configured secret. Every ciphertext is
/// prefixed with its 96 bit nonce and the whole is stored as base64 text. When
/// salts are disabled the nonce is derived from the key and the plaintext, so
/// equal inputs produce equal storage values (needed to filter on encrypted
/// columns and for fixtures).
#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
    disable_salts: bool,
}

impl Cipher {
    pub fn new(secret: &str, disable_salts: bool) -> Self {
        Self {
            key: Sha256::digest(secret.as_bytes()).into(),
            disable_salts,
        }
    }

    fn nonce(&self, plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        if self.disable_salts {
            let digest = Sha256::new()
                .chain_update(self.key)
                .chain_update(plaintext)
                .finalize();
            nonce.copy_from_slice(&digest[..NONCE_LEN]);
        } else {
            rand::thread_rng().fill_bytes(&mut nonce);
        }
        nonce
    }

    /// Encrypt `plaintext` into its storage text, quote characters doubled.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let nonce = self.nonce(plaintext.as_bytes());
        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| Error::msg(format!("Encryption failed: {e}")))?;
        let mut data = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(data).replace('\'', "''"))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let data = STANDARD
            .decode(stored.trim().replace("''", "'"))
            .map_err(|e| Error::new(e).context("Encrypted value is not valid base64"))?;
        if data.len() < NONCE_LEN {
            return Err(Error::msg("Encrypted data too short"));
        }
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(GenericArray::from_slice(&data[..NONCE_LEN]), &data[NONCE_LEN..])
            .map_err(|e| Error::msg(format!("Decryption failed: {e}")))?;
        String::from_utf8(plaintext)
            .map_err(|e| Error::new(e).context("Decrypted value is not valid utf-8"))
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &"<redacted>")
            .field("disable_salts", &self.disable_salts)
            .finish()
    }
}

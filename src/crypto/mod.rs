//! Content encryption at rest.
//!
//! Message bodies and conversation previews are encrypted with AES-256-GCM
//! before they reach the store and decrypted only when serving an authorized
//! participant. The key lives server-side (`CONTENT_KEY`, 32 bytes hex);
//! clients never handle key material. Plaintext exists only for the duration
//! of the request that produced it; nothing decrypted is cached.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, Aes256Gcm, Key, Nonce,
};

use crate::error::{AppError, Result};

const NONCE_LEN: usize = 12;

/// AES-256-GCM cipher over message content.
///
/// Ciphertext layout: `nonce (12 bytes) || ciphertext+tag`. A fresh random
/// nonce is drawn per encryption, so encrypting the same plaintext twice
/// yields different blobs.
#[derive(Clone)]
pub struct ContentCipher {
    cipher: Aes256Gcm,
}

impl ContentCipher {
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Parses a 64-char hex string into the 256-bit key.
    pub fn from_hex(key_hex: &str) -> std::result::Result<Self, String> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| format!("invalid hex key: {}", e))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "CONTENT_KEY must be exactly 32 bytes (64 hex chars)".to_string())?;
        Ok(Self::new(&key))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Decode("falha ao cifrar conteúdo".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<String> {
        if blob.len() <= NONCE_LEN {
            return Err(AppError::Decode("conteúdo cifrado truncado".to_string()));
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| AppError::Decode("falha ao decifrar conteúdo".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Decode("conteúdo decifrado não é UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ContentCipher {
        ContentCipher::new(&[7u8; 32])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let c = cipher();
        let blob = c.encrypt("Olá!").unwrap();
        assert_ne!(blob.as_slice(), "Olá!".as_bytes());
        assert_eq!(c.decrypt(&blob).unwrap(), "Olá!");
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let c = cipher();
        let a = c.encrypt("mesmo texto").unwrap();
        let b = c.encrypt("mesmo texto").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_blob_fails() {
        let c = cipher();
        let mut blob = c.encrypt("conteúdo sensível").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(c.decrypt(&blob).is_err());
    }

    #[test]
    fn test_truncated_blob_fails() {
        let c = cipher();
        assert!(c.decrypt(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_from_hex_rejects_bad_key() {
        assert!(ContentCipher::from_hex("zz").is_err());
        assert!(ContentCipher::from_hex("abcd").is_err());
        assert!(ContentCipher::from_hex(&"ab".repeat(32)).is_ok());
    }
}

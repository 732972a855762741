//! Authenticated encryption for report content.
//!
//! Report message text is encrypted with AES-256-GCM before it is persisted;
//! the plaintext never reaches the database. The ciphertext, nonce and
//! authentication tag are stored as separate base64 columns so a tag
//! mismatch on read (tampering or a key-rotation mismatch) is detected and
//! surfaced instead of yielding garbage plaintext.
//!
//! # Examples
//!
//! ```
//! use haven_common::crypto::ReportCipher;
//!
//! let cipher = ReportCipher::new([7u8; 32]);
//! let sealed = cipher.encrypt("confidential").expect("encrypt");
//! let plain = cipher.decrypt(&sealed).expect("decrypt");
//! assert_eq!(plain, "confidential");
//! ```

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{AeadInPlace, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

use crate::{AppError, AppResult};

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Encrypted report message as persisted: all fields base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    /// Ciphertext without the authentication tag.
    pub ciphertext: String,
    /// Per-message nonce; never reused across records.
    pub iv: String,
    /// Detached GCM authentication tag.
    pub auth_tag: String,
}

/// Symmetric cipher for report content.
///
/// Key material is process-wide configuration loaded once at startup. A
/// single active key is assumed; rotating the key invalidates decryption of
/// records sealed under the old key.
#[derive(Clone)]
pub struct ReportCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for ReportCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCipher").finish_non_exhaustive()
    }
}

impl ReportCipher {
    /// Create a cipher from raw 256-bit key material.
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Create a cipher from a hex-encoded 256-bit key (64 hex characters).
    pub fn from_hex_key(hex_key: &str) -> AppResult<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid encryption key hex: {e}")))?;

        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AppError::Config("Encryption key must be 32 bytes".to_string()))?;

        Ok(Self::new(key))
    }

    /// Encrypt plaintext with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> AppResult<EncryptedMessage> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|_| AppError::Internal("Encryption failed".to_string()))?;

        Ok(EncryptedMessage {
            ciphertext: BASE64.encode(&buffer),
            iv: BASE64.encode(nonce_bytes),
            auth_tag: BASE64.encode(tag),
        })
    }

    /// Decrypt a sealed message, verifying its authentication tag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decryption`] if the tag does not verify (tampered
    /// ciphertext or wrong key) or the stored fields are not valid base64.
    pub fn decrypt(&self, sealed: &EncryptedMessage) -> AppResult<String> {
        let mut buffer = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|e| AppError::Decryption(format!("Invalid ciphertext encoding: {e}")))?;
        let nonce_bytes = BASE64
            .decode(&sealed.iv)
            .map_err(|e| AppError::Decryption(format!("Invalid IV encoding: {e}")))?;
        let tag_bytes = BASE64
            .decode(&sealed.auth_tag)
            .map_err(|e| AppError::Decryption(format!("Invalid auth tag encoding: {e}")))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(AppError::Decryption("Invalid IV length".to_string()));
        }
        if tag_bytes.len() != 16 {
            return Err(AppError::Decryption("Invalid auth tag length".to_string()));
        }

        let nonce = Nonce::from_slice(&nonce_bytes);
        self.cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, tag_bytes.as_slice().into())
            .map_err(|_| {
                AppError::Decryption("Authentication tag mismatch".to_string())
            })?;

        String::from_utf8(buffer)
            .map_err(|e| AppError::Decryption(format!("Decrypted content is not UTF-8: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_cipher() -> ReportCipher {
        ReportCipher::new([42u8; 32])
    }

    #[test]
    fn test_round_trip() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("the message").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "the message");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();

        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = test_cipher();
        let mut sealed = cipher.encrypt("important").unwrap();

        let mut tag = BASE64.decode(&sealed.auth_tag).unwrap();
        tag[0] ^= 0xff;
        sealed.auth_tag = BASE64.encode(&tag);

        let err = cipher.decrypt(&sealed).unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = test_cipher();
        let mut sealed = cipher.encrypt("important").unwrap();

        let mut ct = BASE64.decode(&sealed.ciphertext).unwrap();
        ct[0] ^= 0x01;
        sealed.ciphertext = BASE64.encode(&ct);

        assert!(matches!(
            cipher.decrypt(&sealed),
            Err(AppError::Decryption(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = test_cipher().encrypt("secret").unwrap();
        let other = ReportCipher::new([1u8; 32]);

        assert!(matches!(other.decrypt(&sealed), Err(AppError::Decryption(_))));
    }

    #[test]
    fn test_from_hex_key() {
        let hex_key = "aa".repeat(32);
        let cipher = ReportCipher::from_hex_key(&hex_key).unwrap();
        let sealed = cipher.encrypt("x").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "x");

        assert!(ReportCipher::from_hex_key("deadbeef").is_err());
        assert!(ReportCipher::from_hex_key("not hex").is_err());
    }
}

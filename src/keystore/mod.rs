//! EIP-2335-style encrypted keystore codec.
//!
//! The core only depends on the [`Encryptor`] capability; [`ScryptAesGcmEncryptor`]
//! is one concrete, swappable implementation built from scrypt and AES-GCM.

use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use scrypt::Params as ScryptParams;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A password-based encrypt/decrypt primitive over octet strings.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<Cipher>;
    fn decrypt(&self, cipher: &Cipher, password: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// JSON-serializable encrypted envelope. Field names intentionally mirror
/// the EIP-2335 envelope shape (kdf/cipher sections) without claiming
/// byte-for-byte interop with the reference keystore schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cipher {
    pub kdf: KdfParams,
    pub cipher_params: CipherParams,
    pub ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    pub function: String,
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
    pub salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    pub function: String,
    pub nonce: String,
}

/// scrypt (KDF) + AES-256-GCM (AEAD) encryptor.
pub struct ScryptAesGcmEncryptor {
    log_n: u8,
    r: u32,
    p: u32,
}

impl ScryptAesGcmEncryptor {
    /// `log_n = 15` (N = 2^15) keeps tests fast; production callers wanting
    /// EIP-2335's mainnet-grade cost should raise this to 18.
    pub fn new(log_n: u8, r: u32, p: u32) -> Self {
        Self { log_n, r, p }
    }

    fn derive_key(&self, password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        let params = ScryptParams::new(self.log_n, self.r, self.p, 32)
            .map_err(|e| Error::Internal(format!("invalid scrypt params: {e}")))?;
        let mut key = Zeroizing::new([0u8; 32]);
        scrypt::scrypt(password, salt, &params, key.as_mut())
            .map_err(|e| Error::Internal(format!("scrypt derivation failed: {e}")))?;
        Ok(key)
    }
}

impl Default for ScryptAesGcmEncryptor {
    fn default() -> Self {
        Self::new(15, 8, 1)
    }
}

impl Encryptor for ScryptAesGcmEncryptor {
    fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<Cipher> {
        let mut salt = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let key = self.derive_key(password, &salt)?;

        let mut nonce_bytes = [0u8; 12];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: plaintext, aad: &[] })
            .map_err(|_| Error::Internal("AES-GCM encryption failed".into()))?;

        Ok(Cipher {
            kdf: KdfParams {
                function: "scrypt".to_string(),
                log_n: self.log_n,
                r: self.r,
                p: self.p,
                salt: hex::encode(salt),
            },
            cipher_params: CipherParams {
                function: "aes-256-gcm".to_string(),
                nonce: hex::encode(nonce_bytes),
            },
            ciphertext: hex::encode(ciphertext),
        })
    }

    fn decrypt(&self, cipher: &Cipher, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let salt = hex::decode(&cipher.kdf.salt).map_err(|_| Error::Corrupt("bad salt hex".into()))?;
        let nonce_bytes =
            hex::decode(&cipher.cipher_params.nonce).map_err(|_| Error::Corrupt("bad nonce hex".into()))?;
        let ciphertext =
            hex::decode(&cipher.ciphertext).map_err(|_| Error::Corrupt("bad ciphertext hex".into()))?;

        let params = ScryptParams::new(cipher.kdf.log_n, cipher.kdf.r, cipher.kdf.p, 32)
            .map_err(|e| Error::Corrupt(format!("invalid scrypt params: {e}")))?;
        let mut key = Zeroizing::new([0u8; 32]);
        scrypt::scrypt(password, &salt, &params, key.as_mut())
            .map_err(|e| Error::Corrupt(format!("scrypt derivation failed: {e}")))?;

        let aes_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = aes_cipher
            .decrypt(nonce, Payload { msg: &ciphertext, aad: &[] })
            .map_err(|_| Error::BadPassword)?;

        Ok(Zeroizing::new(plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let enc = ScryptAesGcmEncryptor::new(12, 8, 1);
        let secret = b"a very secret 32 byte scalar!!!!";
        let cipher = enc.encrypt(secret, b"hunter2").unwrap();
        let plain = enc.decrypt(&cipher, b"hunter2").unwrap();
        assert_eq!(plain.as_slice(), secret);
    }

    #[test]
    fn wrong_password_fails() {
        let enc = ScryptAesGcmEncryptor::new(12, 8, 1);
        let cipher = enc.encrypt(b"secret", b"correct horse").unwrap();
        let err = enc.decrypt(&cipher, b"wrong password").unwrap_err();
        assert!(matches!(err, Error::BadPassword));
    }

    #[test]
    fn corrupt_envelope_fails() {
        let enc = ScryptAesGcmEncryptor::new(12, 8, 1);
        let mut cipher = enc.encrypt(b"secret", b"pw").unwrap();
        cipher.ciphertext = "not-hex".to_string();
        assert!(matches!(enc.decrypt(&cipher, b"pw"), Err(Error::Corrupt(_))));
    }
}

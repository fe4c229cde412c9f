//! Thin adapter over the BLS12-381 pairing primitives.
//!
//! This module is the crate's only contact point with `blst`. Everything
//! upstream works with [`SecretKeyBytes`]/[`PublicKeyBytes`] newtypes so the
//! rest of the crate never has to know which pairing library is in use.

use crate::error::{Error, Result};
use blst::min_pk::{PublicKey as BlstPublicKey, SecretKey as BlstSecretKey, Signature as BlstSignature};
use blst::BLST_ERROR;
use zeroize::Zeroize;

/// Domain separation tag used for all signatures produced by this crate.
/// Matches the BLS "basic" ciphersuite used by Ethereum consensus signing.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// A 32-byte BLS12-381 scalar, big-endian, as specified by EIP-2333.
#[derive(Clone)]
pub struct SecretKeyBytes(pub [u8; 32]);

impl Drop for SecretKeyBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SecretKeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKeyBytes(..)")
    }
}

/// A 48-byte compressed G1 point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes(pub [u8; 48]);

impl std::fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl PublicKeyBytes {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::Corrupt(e.to_string()))?;
        let arr: [u8; 48] = bytes
            .try_into()
            .map_err(|_| Error::Corrupt("public key must be 48 bytes".into()))?;
        Ok(Self(arr))
    }
}

fn map_blst_error(e: BLST_ERROR) -> Error {
    Error::Internal(format!("blst error: {e:?}"))
}

/// Reduces `ikm` (with optional `key_info`) into a scalar mod the curve
/// order, per the `HKDF_mod_r` procedure shared by BLS keygen-from-IKM and
/// EIP-2333 (both master-key generation and `derive_child_SK` bottom out
/// here).
pub fn hkdf_mod_r(ikm: &[u8], key_info: &[u8]) -> Result<[u8; 32]> {
    let sk = BlstSecretKey::key_gen(ikm, key_info).map_err(map_blst_error)?;
    Ok(sk.to_bytes())
}

/// Derives the 48-byte compressed public key for a secret scalar.
pub fn secret_to_public(sk: &SecretKeyBytes) -> Result<PublicKeyBytes> {
    let blst_sk = BlstSecretKey::from_bytes(&sk.0).map_err(map_blst_error)?;
    let pk = blst_sk.sk_to_pk();
    Ok(PublicKeyBytes(pk.to_bytes()))
}

/// Signs `msg` with `sk`, returning a 96-byte compressed G2 signature.
pub fn sign(sk: &SecretKeyBytes, msg: &[u8]) -> Result<[u8; 96]> {
    let blst_sk = BlstSecretKey::from_bytes(&sk.0).map_err(map_blst_error)?;
    let sig: BlstSignature = blst_sk.sign(msg, DST, &[]);
    Ok(sig.to_bytes())
}

/// Verifies a signature produced by [`sign`]. Provided for completeness of
/// the adapter; the slashing protector never needs to verify its own
/// validator's signatures.
pub fn verify(pk: &PublicKeyBytes, msg: &[u8], sig: &[u8; 96]) -> Result<bool> {
    let blst_pk = BlstPublicKey::from_bytes(&pk.0).map_err(map_blst_error)?;
    let blst_sig = BlstSignature::from_bytes(sig).map_err(map_blst_error)?;
    let err = blst_sig.verify(true, msg, DST, &[], &blst_pk, true);
    Ok(err == BLST_ERROR::BLST_SUCCESS)
}

/// Process-wide one-shot BLS initialization latch.
///
/// `blst` itself requires no explicit global setup, but callers of this
/// crate's façade rely on a single idempotent init point regardless. The
/// latch keeps that contract true even if the underlying pairing library is
/// ever swapped for one that does need setup.
static BLS_INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();

pub fn ensure_initialized() {
    BLS_INIT.get_or_init(|| {
        tracing::debug!("BLS12-381 backend initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        ensure_initialized();
        let sk_bytes = hkdf_mod_r(b"01234567890123456789012345678901", b"").unwrap();
        let sk = SecretKeyBytes(sk_bytes);
        let pk = secret_to_public(&sk).unwrap();
        let sig = sign(&sk, b"hello").unwrap();
        assert!(verify(&pk, b"hello", &sig).unwrap());
        assert!(!verify(&pk, b"goodbye", &sig).unwrap());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let sk_bytes = hkdf_mod_r(b"01234567890123456789012345678901", b"").unwrap();
        let pk = secret_to_public(&SecretKeyBytes(sk_bytes)).unwrap();
        let hex = pk.to_hex();
        let back = PublicKeyBytes::from_hex(&hex).unwrap();
        assert_eq!(pk.0, back.0);
    }
}

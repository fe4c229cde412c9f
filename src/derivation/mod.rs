//! EIP-2333 BLS12-381 key derivation.
//!
//! Implements `derive_master_SK` and `derive_child_SK` from
//! <https://eips.ethereum.org/EIPS/eip-2333>, plus path resolution per
//! EIP-2334.

pub mod path;

use crate::bls::{hkdf_mod_r, SecretKeyBytes};
use crate::error::{Error, Result};
use hkdf::Hkdf;
use sha2::{Digest, Sha256};

pub use path::DerivationPath;

const LAMPORT_CHUNKS: usize = 255;
const CHUNK_LEN: usize = 32;

/// `IKM_to_lamport_SK`: expands `ikm` under `salt` into 255 32-byte chunks.
fn ikm_to_lamport_sk(ikm: &[u8; 32], salt: &[u8; 4]) -> Vec<[u8; CHUNK_LEN]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; CHUNK_LEN * LAMPORT_CHUNKS];
    hk.expand(&[], &mut okm)
        .expect("okm length is a valid HKDF-Expand output size");

    okm.chunks_exact(CHUNK_LEN)
        .map(|c| c.try_into().expect("chunk is exactly 32 bytes"))
        .collect()
}

fn flip_bits(ikm: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (o, i) in out.iter_mut().zip(ikm.iter()) {
        *o = !i;
    }
    out
}

/// `parent_SK_to_lamport_PK`: the compressed Lamport public key used as the
/// IKM for the final `HKDF_mod_r` reduction.
fn parent_sk_to_lamport_pk(parent_sk: &[u8; 32], index: u32) -> [u8; 32] {
    let salt = index.to_be_bytes();

    let lamport0 = ikm_to_lamport_sk(parent_sk, &salt);
    let not_ikm = flip_bits(parent_sk);
    let lamport1 = ikm_to_lamport_sk(&not_ikm, &salt);

    let mut hasher = Sha256::new();
    for chunk in lamport0.iter().chain(lamport1.iter()) {
        hasher.update(Sha256::digest(chunk));
    }
    hasher.finalize().into()
}

/// `derive_master_SK(seed)`.
pub fn derive_master_sk(seed: &[u8]) -> Result<SecretKeyBytes> {
    if seed.len() < 32 {
        return Err(Error::InvalidSeed(format!(
            "seed must be at least 32 octets, got {}",
            seed.len()
        )));
    }
    let sk = hkdf_mod_r(seed, b"")?;
    Ok(SecretKeyBytes(sk))
}

/// `derive_child_SK(parent_SK, index)`.
pub fn derive_child_sk(parent: &SecretKeyBytes, index: u32) -> Result<SecretKeyBytes> {
    let compressed_lamport_pk = parent_sk_to_lamport_pk(&parent.0, index);
    let sk = hkdf_mod_r(&compressed_lamport_pk, b"")?;
    Ok(SecretKeyBytes(sk))
}

/// `Derive(seed, path)`: iterated child derivation from the master key.
pub fn derive(seed: &[u8], path: &str) -> Result<SecretKeyBytes> {
    let parsed = DerivationPath::parse(path)?;
    let mut key = derive_master_sk(seed)?;
    for index in parsed.0 {
        key = derive_child_sk(&key, index)?;
    }
    Ok(key)
}

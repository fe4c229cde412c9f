//! EIP-2334 derivation path parsing.
//!
//! Grammar: `"/" index ("/" index)*` where each `index` is a decimal u32.
//! A leading `m` before the first `/` is accepted and ignored.

use crate::error::{Error, Result};

/// A parsed EIP-2334 path: an ordered list of unsigned 32-bit indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    pub fn parse(path: &str) -> Result<Self> {
        let mut rest = path.trim();
        if let Some(stripped) = rest.strip_prefix('m') {
            rest = stripped;
        }
        if rest.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        if !rest.starts_with('/') {
            return Err(Error::InvalidPath(path.to_string()));
        }

        let mut indices = Vec::new();
        for segment in rest.split('/').skip(1) {
            if segment.is_empty() {
                return Err(Error::InvalidPath(path.to_string()));
            }
            let index: u32 = segment
                .parse()
                .map_err(|_| Error::InvalidPath(path.to_string()))?;
            indices.push(index);
        }
        if indices.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(Self(indices))
    }

    /// The EIP-2334 validator base path `m/12381/3600/i`.
    pub fn validator_base(index: u32) -> String {
        format!("m/12381/3600/{index}")
    }

    /// The EIP-2334 withdrawal key path `m/12381/3600/i/0`.
    pub fn withdrawal(index: u32) -> String {
        format!("m/12381/3600/{index}/0")
    }

    /// The EIP-2334 validator signing key path `m/12381/3600/i/0/0`.
    pub fn validator(index: u32) -> String {
        format!("m/12381/3600/{index}/0/0")
    }

    /// Extracts the validator index `i` from a base path of shape
    /// `m/12381/3600/i` (with or without the leading `m`).
    pub fn index_from_base_path(base_path: &str) -> Result<u32> {
        let parsed = Self::parse(base_path)?;
        match parsed.0.as_slice() {
            [12381, 3600, i] => Ok(*i),
            _ => Err(Error::InvalidPath(base_path.to_string())),
        }
    }
}

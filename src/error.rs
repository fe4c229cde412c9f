//! Core error type shared by every module in this crate.

use thiserror::Error;

/// Unified error type for key derivation, storage, keystore and slashing
/// protection failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("bad password")]
    BadPassword,

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("storage io error: {0}")]
    StorageIo(String),

    #[error("conflicting record: {0}")]
    Conflict(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("refusing to sign: slashable attestation ({0})")]
    SlashableAttestation(String),

    #[error("refusing to sign: slashable proposal ({0})")]
    SlashableProposal(String),

    #[error("storage backend missing")]
    StorageMissing,

    #[error("storage backend invalid: {0}")]
    StorageInvalid(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

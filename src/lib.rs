//! Hierarchical-deterministic BLS12-381 key manager and slashing protector
//! for Ethereum validators.
//!
//! The façade is [`vault::KeyVault`]; it opens or creates an HD
//! [`wallet::Wallet`] against a pluggable [`storage::Storage`] backend.
//! Each [`wallet::Account`] derives its keys per EIP-2333/2334
//! ([`derivation`]) and signs only through the [`slashing`] protector.

pub mod bls;
pub mod derivation;
pub mod error;
pub mod keystore;
pub mod slashing;
pub mod storage;
pub mod vault;
pub mod wallet;

pub use error::{Error, Result};
pub use vault::{KeyVault, VaultConfig};

//! The pluggable persistence contract.
//!
//! The core depends only on [`Storage`]; [`memory::MemoryStore`] is the one
//! concrete backend shipped for tests and in-process use.

pub mod memory;

use crate::keystore::{Cipher, Encryptor};
use crate::slashing::types::{BeaconAttestation, BeaconBlockHeader};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Persisted wallet shape: `{ id, type, indexMapper }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub index_mapper: HashMap<String, Uuid>,
}

/// Persisted account shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub name: String,
    pub base_path: String,
    pub validation_key: Cipher,
    pub withdrawal_pub_key: [u8; 48],
    pub wallet_id: Uuid,
}

/// Abstract persistence of wallets, accounts and slashing history.
/// Implementations must provide durable atomicity at the granularity of a
/// single `save_*` call: a failed save leaves no trace, a successful one
/// survives a process restart (the in-memory backend is explicitly exempt
/// from the restart half of that contract).
pub trait Storage: Send + Sync {
    fn set_encryptor(&self, encryptor: Arc<dyn Encryptor>, password: Zeroizing<Vec<u8>>);
    fn encryptor(&self) -> Option<Arc<dyn Encryptor>>;
    fn password(&self) -> Option<Zeroizing<Vec<u8>>>;

    fn save_wallet(&self, wallet: &WalletRecord) -> Result<()>;
    fn open_wallet(&self) -> Result<WalletRecord>;

    fn save_account(&self, account: &AccountRecord) -> Result<()>;
    fn open_account(&self, id: Uuid) -> Result<Option<AccountRecord>>;
    fn delete_account(&self, id: Uuid) -> Result<()>;
    fn list_accounts(&self) -> Result<Vec<AccountRecord>>;

    /// Protected seed slot used by `ImportKeyVault`. The seed itself is
    /// never re-derived once supplied; it is only ever stored encrypted.
    fn save_seed(&self, cipher: &Cipher) -> Result<()>;
    fn retrieve_seed(&self) -> Result<Option<Cipher>>;

    fn save_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()>;
    fn list_attestations(
        &self,
        pubkey: &str,
        target_epoch_low: u64,
        target_epoch_high: u64,
    ) -> Result<Vec<BeaconAttestation>>;
    fn retrieve_attestation(&self, pubkey: &str, target_epoch: u64) -> Result<Option<BeaconAttestation>>;

    fn save_proposal(&self, pubkey: &str, hdr: &BeaconBlockHeader) -> Result<()>;
    fn retrieve_proposal(&self, pubkey: &str, slot: u64) -> Result<Option<BeaconBlockHeader>>;

    fn save_latest_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()>;
    fn retrieve_latest_attestation(&self, pubkey: &str) -> Result<Option<BeaconAttestation>>;
}

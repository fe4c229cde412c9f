//! In-process `Storage` backend.

use super::{AccountRecord, Storage, WalletRecord};
use crate::error::{Error, Result};
use crate::keystore::{Cipher, Encryptor};
use crate::slashing::types::{BeaconAttestation, BeaconBlockHeader};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

#[derive(Default)]
struct Inner {
    wallet: Option<WalletRecord>,
    accounts: HashMap<Uuid, AccountRecord>,
    seed: Option<Cipher>,
    attestations: HashMap<String, HashMap<u64, BeaconAttestation>>,
    latest_attestation: HashMap<String, BeaconAttestation>,
    proposals: HashMap<String, HashMap<u64, BeaconBlockHeader>>,
    encryptor: Option<Arc<dyn Encryptor>>,
    password: Option<Zeroizing<Vec<u8>>>,
}

/// Thread-safe in-memory `Storage` implementation. A vault stores exactly
/// one wallet at a time.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStore {
    fn set_encryptor(&self, encryptor: Arc<dyn Encryptor>, password: Zeroizing<Vec<u8>>) {
        let mut inner = self.inner.write();
        inner.encryptor = Some(encryptor);
        inner.password = Some(password);
    }

    fn encryptor(&self) -> Option<Arc<dyn Encryptor>> {
        self.inner.read().encryptor.clone()
    }

    fn password(&self) -> Option<Zeroizing<Vec<u8>>> {
        self.inner.read().password.clone()
    }

    fn save_wallet(&self, wallet: &WalletRecord) -> Result<()> {
        self.inner.write().wallet = Some(wallet.clone());
        Ok(())
    }

    fn open_wallet(&self) -> Result<WalletRecord> {
        self.inner
            .read()
            .wallet
            .clone()
            .ok_or_else(|| Error::NotFound("no wallet in storage".into()))
    }

    fn save_account(&self, account: &AccountRecord) -> Result<()> {
        self.inner
            .write()
            .accounts
            .insert(account.id, account.clone());
        Ok(())
    }

    fn open_account(&self, id: Uuid) -> Result<Option<AccountRecord>> {
        Ok(self.inner.read().accounts.get(&id).cloned())
    }

    fn delete_account(&self, id: Uuid) -> Result<()> {
        self.inner.write().accounts.remove(&id);
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        Ok(self.inner.read().accounts.values().cloned().collect())
    }

    fn save_seed(&self, cipher: &Cipher) -> Result<()> {
        self.inner.write().seed = Some(cipher.clone());
        Ok(())
    }

    fn retrieve_seed(&self) -> Result<Option<Cipher>> {
        Ok(self.inner.read().seed.clone())
    }

    fn save_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()> {
        self.inner
            .write()
            .attestations
            .entry(pubkey.to_string())
            .or_default()
            .insert(att.target.epoch, att.clone());
        Ok(())
    }

    fn list_attestations(
        &self,
        pubkey: &str,
        target_epoch_low: u64,
        target_epoch_high: u64,
    ) -> Result<Vec<BeaconAttestation>> {
        let inner = self.inner.read();
        let Some(by_epoch) = inner.attestations.get(pubkey) else {
            return Ok(Vec::new());
        };
        Ok(by_epoch
            .iter()
            .filter(|(epoch, _)| **epoch >= target_epoch_low && **epoch <= target_epoch_high)
            .map(|(_, att)| att.clone())
            .collect())
    }

    fn retrieve_attestation(&self, pubkey: &str, target_epoch: u64) -> Result<Option<BeaconAttestation>> {
        Ok(self
            .inner
            .read()
            .attestations
            .get(pubkey)
            .and_then(|by_epoch| by_epoch.get(&target_epoch))
            .cloned())
    }

    fn save_proposal(&self, pubkey: &str, hdr: &BeaconBlockHeader) -> Result<()> {
        let mut inner = self.inner.write();
        let by_slot = inner.proposals.entry(pubkey.to_string()).or_default();
        if let Some(existing) = by_slot.get(&hdr.slot) {
            if existing.conflicts_with(hdr) {
                return Err(Error::Conflict(format!(
                    "proposal at slot {} already recorded and differs",
                    hdr.slot
                )));
            }
        }
        by_slot.insert(hdr.slot, *hdr);
        Ok(())
    }

    fn retrieve_proposal(&self, pubkey: &str, slot: u64) -> Result<Option<BeaconBlockHeader>> {
        Ok(self
            .inner
            .read()
            .proposals
            .get(pubkey)
            .and_then(|by_slot| by_slot.get(&slot))
            .copied())
    }

    fn save_latest_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()> {
        self.inner
            .write()
            .latest_attestation
            .insert(pubkey.to_string(), att.clone());
        Ok(())
    }

    fn retrieve_latest_attestation(&self, pubkey: &str) -> Result<Option<BeaconAttestation>> {
        Ok(self.inner.read().latest_attestation.get(pubkey).cloned())
    }
}

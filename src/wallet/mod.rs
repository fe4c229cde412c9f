//! HD wallet and account model.

pub mod account;

use crate::bls::secret_to_public;
use crate::derivation::{self, path::DerivationPath};
use crate::error::{Error, Result};
use crate::keystore::Encryptor;
use crate::slashing::SlashingProtector;
use crate::storage::{AccountRecord, Storage, WalletRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

pub use account::Account;

/// Non-owning capability handle shared by a wallet and every account it
/// derives, breaking the wallet/account/storage reference cycle. The
/// `KeyVault` façade holds the only root `Arc`; wallet and accounts just
/// clone it.
pub struct VaultContext {
    pub storage: Arc<dyn Storage>,
    pub protector: Arc<SlashingProtector>,
}

impl VaultContext {
    pub fn new(storage: Arc<dyn Storage>) -> Arc<Self> {
        let protector = Arc::new(SlashingProtector::new(storage.clone()));
        Arc::new(Self { storage, protector })
    }

    pub(crate) fn encryptor(&self) -> Result<Arc<dyn Encryptor>> {
        self.storage
            .encryptor()
            .ok_or_else(|| Error::Internal("no encryptor installed on this vault".into()))
    }

    pub(crate) fn password(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.storage
            .password()
            .ok_or_else(|| Error::Internal("no password installed on this vault".into()))
    }
}

/// A single HD wallet (one per vault). `index` mirrors the persisted
/// `indexMapper`: hex validator pubkey -> account id.
pub struct Wallet {
    pub id: Uuid,
    index: Mutex<HashMap<String, Uuid>>,
    context: Arc<VaultContext>,
}

impl Wallet {
    pub fn new(context: Arc<VaultContext>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index: Mutex::new(HashMap::new()),
            context,
        }
    }

    pub fn from_record(record: WalletRecord, context: Arc<VaultContext>) -> Self {
        Self {
            id: record.id,
            index: Mutex::new(record.index_mapper),
            context,
        }
    }

    pub fn to_record(&self) -> WalletRecord {
        WalletRecord {
            id: self.id,
            wallet_type: "HD".to_string(),
            index_mapper: self.index.lock().clone(),
        }
    }

    /// `max(usedIndices) + 1`, or 0 if the wallet has no accounts yet.
    fn next_free_index(&self, index: &HashMap<String, Uuid>) -> Result<u32> {
        let mut max_used: Option<u32> = None;
        for id in index.values() {
            if let Some(record) = self.context.storage.open_account(*id)? {
                let used = DerivationPath::index_from_base_path(&record.base_path)?;
                max_used = Some(max_used.map_or(used, |m| m.max(used)));
            }
        }
        Ok(max_used.map_or(0, |m| m + 1))
    }

    /// Derives and persists a new validator account at `indexHint`, or at
    /// `max(usedIndices)+1` when absent.
    pub fn create_validator_account(
        &self,
        seed: &[u8],
        index_hint: Option<u32>,
        name: Option<String>,
    ) -> Result<Account> {
        let mut index = self.index.lock();

        let account_index = match index_hint {
            Some(i) => i,
            None => self.next_free_index(&index)?,
        };

        let base_path = DerivationPath::validator_base(account_index);
        let validator_sk = derivation::derive(seed, &DerivationPath::validator(account_index))?;
        let withdrawal_sk = derivation::derive(seed, &DerivationPath::withdrawal(account_index))?;

        let validator_pk = secret_to_public(&validator_sk)?;
        let withdrawal_pk = secret_to_public(&withdrawal_sk)?;
        let pubkey_hex = validator_pk.to_hex();

        if index.contains_key(&pubkey_hex) {
            return Err(Error::DuplicateKey(pubkey_hex));
        }

        let encryptor = self.context.encryptor()?;
        let password = self.context.password()?;
        let validation_key = encryptor.encrypt(&validator_sk.0, &password)?;

        let account_id = Uuid::new_v4();
        let record = AccountRecord {
            id: account_id,
            name: name.unwrap_or_else(|| format!("account-{account_index}")),
            base_path,
            validation_key,
            withdrawal_pub_key: withdrawal_pk.0,
            wallet_id: self.id,
        };

        index.insert(pubkey_hex.clone(), account_id);

        if let Err(e) = self.context.storage.save_account(&record) {
            index.remove(&pubkey_hex);
            return Err(e);
        }

        let wallet_record = WalletRecord {
            id: self.id,
            wallet_type: "HD".to_string(),
            index_mapper: index.clone(),
        };
        if let Err(e) = self.context.storage.save_wallet(&wallet_record) {
            index.remove(&pubkey_hex);
            let _ = self.context.storage.delete_account(account_id);
            return Err(e);
        }

        Ok(Account::from_record(record, self.context.clone()))
    }

    pub fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self
            .context
            .storage
            .open_account(id)?
            .map(|record| Account::from_record(record, self.context.clone())))
    }

    pub fn account_by_public_key(&self, pubkey_hex: &str) -> Result<Account> {
        let id = *self
            .index
            .lock()
            .get(pubkey_hex)
            .ok_or_else(|| Error::AccountNotFound(pubkey_hex.to_string()))?;
        self.account_by_id(id)?
            .ok_or_else(|| Error::AccountNotFound(pubkey_hex.to_string()))
    }

    /// Snapshots `indexMapper` under the wallet lock and returns a lazy
    /// iterator resolved through the store. Accounts that fail to open are
    /// skipped rather than aborting the whole enumeration.
    pub fn accounts(&self) -> AccountIter {
        let ids: Vec<Uuid> = self.index.lock().values().copied().collect();
        AccountIter {
            ids: ids.into_iter(),
            context: self.context.clone(),
        }
    }

    pub fn delete_account_by_public_key(&self, pubkey_hex: &str) -> Result<()> {
        let mut index = self.index.lock();
        let id = *index
            .get(pubkey_hex)
            .ok_or_else(|| Error::AccountNotFound(pubkey_hex.to_string()))?;

        self.context.storage.delete_account(id)?;
        index.remove(pubkey_hex);

        let wallet_record = WalletRecord {
            id: self.id,
            wallet_type: "HD".to_string(),
            index_mapper: index.clone(),
        };
        self.context.storage.save_wallet(&wallet_record)
    }
}

pub struct AccountIter {
    ids: std::vec::IntoIter<Uuid>,
    context: Arc<VaultContext>,
}

impl Iterator for AccountIter {
    type Item = Account;

    fn next(&mut self) -> Option<Account> {
        for id in self.ids.by_ref() {
            if let Ok(Some(record)) = self.context.storage.open_account(id) {
                return Some(Account::from_record(record, self.context.clone()));
            }
        }
        None
    }
}

//! `KeyVault` façade: lifecycle entry points over a `Storage` backend.

use crate::bls;
use crate::error::{Error, Result};
use crate::keystore::Encryptor;
use crate::storage::Storage;
use crate::wallet::{VaultContext, Wallet};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Configuration accepted by every façade entry point.
pub struct VaultConfig {
    pub storage: Arc<dyn Storage>,
    pub encryptor: Option<Arc<dyn Encryptor>>,
    pub password: Option<Zeroizing<Vec<u8>>>,
}

impl VaultConfig {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage, encryptor: None, password: None }
    }

    pub fn with_encryptor(mut self, encryptor: Arc<dyn Encryptor>, password: Zeroizing<Vec<u8>>) -> Self {
        self.encryptor = Some(encryptor);
        self.password = Some(password);
        self
    }
}

/// Owns the wallet and its `VaultContext`; the only strong root of the
/// wallet/account reference graph.
pub struct KeyVault {
    pub wallet: Wallet,
    context: Arc<VaultContext>,
}

impl KeyVault {
    /// `NewKeyVault(cfg)`: creates an empty HD wallet and persists it.
    pub fn new_key_vault(cfg: VaultConfig) -> Result<Self> {
        bls::ensure_initialized();

        if let (Some(encryptor), Some(password)) = (cfg.encryptor, cfg.password) {
            cfg.storage.set_encryptor(encryptor, password);
        }

        let context = VaultContext::new(cfg.storage);
        let wallet = Wallet::new(context.clone());
        context.storage.save_wallet(&wallet.to_record())?;

        Ok(Self { wallet, context })
    }

    /// `ImportKeyVault(cfg)`: persists `seed` through the store's protected
    /// seed slot and creates an HD wallet keyed to it.
    pub fn import_key_vault(cfg: VaultConfig, seed: &[u8]) -> Result<Self> {
        bls::ensure_initialized();

        let encryptor = cfg
            .encryptor
            .clone()
            .ok_or_else(|| Error::StorageInvalid("ImportKeyVault requires an encryptor".into()))?;
        let password = cfg
            .password
            .clone()
            .ok_or_else(|| Error::StorageInvalid("ImportKeyVault requires a password".into()))?;

        cfg.storage.set_encryptor(encryptor.clone(), password.clone());
        let seed_cipher = encryptor.encrypt(seed, &password)?;
        cfg.storage.save_seed(&seed_cipher)?;

        let context = VaultContext::new(cfg.storage);
        let wallet = Wallet::new(context.clone());
        context.storage.save_wallet(&wallet.to_record())?;

        Ok(Self { wallet, context })
    }

    /// `OpenKeyVault(cfg)`: opens the wallet from storage and attaches
    /// context. Fails with `NotFound` if no wallet is present.
    pub fn open_key_vault(cfg: VaultConfig) -> Result<Self> {
        bls::ensure_initialized();

        if let (Some(encryptor), Some(password)) = (cfg.encryptor, cfg.password) {
            cfg.storage.set_encryptor(encryptor, password);
        }

        let context = VaultContext::new(cfg.storage);
        let record = context.storage.open_wallet()?;
        let wallet = Wallet::from_record(record, context.clone());

        Ok(Self { wallet, context })
    }

    /// Decrypts the seed persisted by `ImportKeyVault`, if any.
    pub fn retrieve_seed(&self) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let Some(cipher) = self.context.storage.retrieve_seed()? else {
            return Ok(None);
        };
        let encryptor = self.context.encryptor()?;
        let password = self.context.password()?;
        Ok(Some(encryptor.decrypt(&cipher, &password)?))
    }
}

//! End-to-end wallet lifecycle scenarios.

use eth2_key_vault::keystore::ScryptAesGcmEncryptor;
use eth2_key_vault::storage::memory::MemoryStore;
use eth2_key_vault::{KeyVault, VaultConfig};
use std::sync::Arc;
use zeroize::Zeroizing;

const SEED: [u8; 32] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
    0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f, 0xff,
];

fn encryptor() -> Arc<ScryptAesGcmEncryptor> {
    Arc::new(ScryptAesGcmEncryptor::new(12, 8, 1))
}

/// Creating an account, closing the vault, and reopening it from the same
/// storage preserves the account's identity and derivation path.
#[test]
fn create_and_reopen_preserves_account() {
    let storage = Arc::new(MemoryStore::new());
    let cfg = VaultConfig::new(storage.clone())
        .with_encryptor(encryptor(), Zeroizing::new(b"hunter2".to_vec()));
    let vault = KeyVault::new_key_vault(cfg).unwrap();

    let account = vault.wallet.create_validator_account(&SEED, None, None).unwrap();
    let pubkey = account.validator_public_key().unwrap().to_hex();

    let reopened_cfg = VaultConfig::new(storage)
        .with_encryptor(encryptor(), Zeroizing::new(b"hunter2".to_vec()));
    let reopened = KeyVault::open_key_vault(reopened_cfg).unwrap();

    let found = reopened.wallet.account_by_public_key(&pubkey).unwrap();
    assert_eq!(found.id, account.id);
    assert_eq!(found.base_path, "m/12381/3600/0");
}

/// Importing a known seed and deriving account 0 produces the expected
/// validator and withdrawal public keys.
#[test]
fn import_vector_produces_known_keys() {
    let storage = Arc::new(MemoryStore::new());
    let cfg = VaultConfig::new(storage).with_encryptor(encryptor(), Zeroizing::new(b"pw".to_vec()));
    let vault = KeyVault::import_key_vault(cfg, &SEED).unwrap();

    let account = vault.wallet.create_validator_account(&SEED, None, None).unwrap();

    let expected_validator_sk = eth2_key_vault::derivation::derive(&SEED, "m/12381/3600/0/0/0").unwrap();
    let expected_withdrawal_sk = eth2_key_vault::derivation::derive(&SEED, "m/12381/3600/0/0").unwrap();
    let expected_validator_pk = eth2_key_vault::bls::secret_to_public(&expected_validator_sk).unwrap();
    let expected_withdrawal_pk = eth2_key_vault::bls::secret_to_public(&expected_withdrawal_sk).unwrap();

    assert_eq!(account.validator_public_key().unwrap().0, expected_validator_pk.0);
    assert_eq!(account.withdrawal_pub_key.0, expected_withdrawal_pk.0);
}

/// Index uniqueness under repeated create/delete.
#[test]
fn index_has_no_duplicate_values_after_create_and_delete() {
    let storage = Arc::new(MemoryStore::new());
    let cfg = VaultConfig::new(storage).with_encryptor(encryptor(), Zeroizing::new(b"pw".to_vec()));
    let vault = KeyVault::new_key_vault(cfg).unwrap();

    let mut pubkeys = Vec::new();
    for i in 0..5u8 {
        let seed = {
            let mut s = SEED;
            s[31] ^= i; // vary the seed per account so each index gets a distinct key
            s
        };
        let account = vault.wallet.create_validator_account(&seed, None, None).unwrap();
        pubkeys.push(account.validator_public_key().unwrap().to_hex());
    }

    vault.wallet.delete_account_by_public_key(&pubkeys[2]).unwrap();

    let remaining: Vec<_> = vault.wallet.accounts().map(|a| a.id).collect();
    let mut unique = remaining.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(remaining.len(), unique.len());
    assert_eq!(remaining.len(), 4);
}

/// Round-trip marshaling of the wallet record.
#[test]
fn wallet_record_round_trips_through_json() {
    let storage = Arc::new(MemoryStore::new());
    let cfg = VaultConfig::new(storage).with_encryptor(encryptor(), Zeroizing::new(b"pw".to_vec()));
    let vault = KeyVault::new_key_vault(cfg).unwrap();
    vault.wallet.create_validator_account(&SEED, None, None).unwrap();

    let record = vault.wallet.to_record();
    let json = serde_json::to_string(&record).unwrap();
    let back: eth2_key_vault::storage::WalletRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(back.id, record.id);
    assert_eq!(back.index_mapper, record.index_mapper);
}

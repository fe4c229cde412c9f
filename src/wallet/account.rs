//! A single validator account: name, derivation path, encrypted validation
//! key, withdrawal public key, and the sign operations gated by the
//! slashing protector.

use super::VaultContext;
use crate::bls::{secret_to_public, sign, PublicKeyBytes, SecretKeyBytes};
use crate::error::{Error, Result};
use crate::slashing::{AttestationSlashFinding, BeaconAttestation, BeaconBlockHeader, ProposalSlashFinding};
use crate::storage::AccountRecord;
use std::sync::Arc;
use uuid::Uuid;

pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub base_path: String,
    pub withdrawal_pub_key: PublicKeyBytes,
    pub wallet_id: Uuid,
    record: AccountRecord,
    context: Arc<VaultContext>,
}

impl Account {
    pub(crate) fn from_record(record: AccountRecord, context: Arc<VaultContext>) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            base_path: record.base_path.clone(),
            withdrawal_pub_key: PublicKeyBytes(record.withdrawal_pub_key),
            wallet_id: record.wallet_id,
            record,
            context,
        }
    }

    fn decrypt_validation_key(&self) -> Result<SecretKeyBytes> {
        let encryptor = self.context.encryptor()?;
        let password = self.context.password()?;
        let plaintext = encryptor.decrypt(&self.record.validation_key, &password)?;
        let arr: [u8; 32] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| Error::Corrupt("validation key must be 32 octets".into()))?;
        Ok(SecretKeyBytes(arr))
    }

    /// Re-derives the validator public key by decrypting the validation key.
    /// The account record does not persist the validator pubkey directly
    /// (only its hex form lives in the wallet's `indexMapper`).
    pub fn validator_public_key(&self) -> Result<PublicKeyBytes> {
        secret_to_public(&self.decrypt_validation_key()?)
    }

    /// Query-only slashing check; does not sign or record.
    pub fn is_slashable_attestation(&self, candidate: &BeaconAttestation) -> Result<Vec<AttestationSlashFinding>> {
        let pubkey = self.validator_public_key()?.to_hex();
        self.context.protector.is_slashable_attestation(&pubkey, candidate)
    }

    /// Query-only slashing check; does not sign or record.
    pub fn is_slashable_proposal(&self, candidate: &BeaconBlockHeader) -> Result<Option<ProposalSlashFinding>> {
        let pubkey = self.validator_public_key()?.to_hex();
        self.context.protector.is_slashable_proposal(&pubkey, candidate)
    }

    /// Signs `candidate` iff the protector finds it safe, recording it
    /// atomically with the signature under the per-account lock.
    pub fn sign_attestation(&self, candidate: &BeaconAttestation) -> Result<[u8; 96]> {
        let sk = self.decrypt_validation_key()?;
        let pubkey = secret_to_public(&sk)?.to_hex();
        let message = attestation_signing_root(candidate);
        self.context
            .protector
            .guarded_sign_attestation(&pubkey, candidate, || sign(&sk, &message))
    }

    /// Signs `candidate` iff the protector finds it safe, recording it
    /// atomically with the signature under the per-account lock.
    pub fn sign_proposal(&self, candidate: &BeaconBlockHeader) -> Result<[u8; 96]> {
        let sk = self.decrypt_validation_key()?;
        let pubkey = secret_to_public(&sk)?.to_hex();
        let message = proposal_signing_root(candidate);
        self.context
            .protector
            .guarded_sign_proposal(&pubkey, candidate, || sign(&sk, &message))
    }
}

/// Flattened big-endian concatenation of the attestation's fields. SSZ
/// tree-hashing the real beacon-chain signing root is out of scope here;
/// callers needing that should hash it themselves and sign through
/// `bls::sign` directly.
fn attestation_signing_root(att: &BeaconAttestation) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + 8 + 32 + 8 + 32 + 8 + 32);
    buf.extend_from_slice(&att.slot.to_be_bytes());
    buf.extend_from_slice(&att.committee_index.to_be_bytes());
    buf.extend_from_slice(&att.beacon_block_root);
    buf.extend_from_slice(&att.source.epoch.to_be_bytes());
    buf.extend_from_slice(&att.source.root);
    buf.extend_from_slice(&att.target.epoch.to_be_bytes());
    buf.extend_from_slice(&att.target.root);
    buf
}

fn proposal_signing_root(hdr: &BeaconBlockHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + 8 + 32 + 32 + 32);
    buf.extend_from_slice(&hdr.slot.to_be_bytes());
    buf.extend_from_slice(&hdr.proposer_index.to_be_bytes());
    buf.extend_from_slice(&hdr.parent_root);
    buf.extend_from_slice(&hdr.state_root);
    buf.extend_from_slice(&hdr.body_root);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::ScryptAesGcmEncryptor;
    use crate::slashing::Checkpoint;
    use crate::storage::memory::MemoryStore;
    use crate::storage::Storage as _;
    use crate::wallet::Wallet;
    use zeroize::Zeroizing;

    const SEED: [u8; 32] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
        0x1f, 0xff,
    ];

    fn account() -> Account {
        let storage: Arc<dyn crate::storage::Storage> = Arc::new(MemoryStore::new());
        storage.set_encryptor(
            Arc::new(ScryptAesGcmEncryptor::new(12, 8, 1)),
            Zeroizing::new(b"hunter2".to_vec()),
        );
        let ctx = crate::wallet::VaultContext::new(storage);
        let wallet = Wallet::new(ctx);
        wallet.create_validator_account(&SEED, None, None).unwrap()
    }

    fn attestation(source_epoch: u64, target_epoch: u64) -> BeaconAttestation {
        BeaconAttestation {
            slot: target_epoch * 32,
            committee_index: 0,
            beacon_block_root: [1; 32],
            source: Checkpoint { epoch: source_epoch, root: [1; 32] },
            target: Checkpoint { epoch: target_epoch, root: [1; 32] },
        }
    }

    #[test]
    fn sign_attestation_succeeds_and_records_history() {
        let account = account();
        let sig = account.sign_attestation(&attestation(1, 2)).unwrap();
        assert_eq!(sig.len(), 96);
        assert!(!account.is_slashable_attestation(&attestation(1, 2)).unwrap().is_empty());
    }

    #[test]
    fn double_vote_is_refused() {
        let account = account();
        account.sign_attestation(&attestation(1, 2)).unwrap();

        let mut conflicting = attestation(1, 2);
        conflicting.beacon_block_root = [9; 32];
        assert!(account.sign_attestation(&conflicting).is_err());
    }

    #[test]
    fn sign_proposal_succeeds_and_refuses_conflict() {
        let account = account();
        let hdr = BeaconBlockHeader {
            slot: 10,
            proposer_index: 0,
            parent_root: [1; 32],
            state_root: [1; 32],
            body_root: [1; 32],
        };
        account.sign_proposal(&hdr).unwrap();

        let mut conflicting = hdr;
        conflicting.state_root = [2; 32];
        assert!(account.sign_proposal(&conflicting).is_err());
    }
}

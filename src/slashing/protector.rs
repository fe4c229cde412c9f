//! Double/surround attestation detection, double-proposal detection, and
//! history retention.

use super::types::{BeaconAttestation, BeaconBlockHeader};
use crate::error::{Error, Result};
use crate::storage::Storage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Epochs to look back when bounding the attestation history query. Bounds
/// storage and computation while still covering any surround relation a
/// validator client could plausibly need to check.
const EPOCH_LOOKBACK: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationSlashStatus {
    DoubleVote,
    Surrounded,
    Surrounding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationSlashFinding {
    pub status: AttestationSlashStatus,
    pub offending: BeaconAttestation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalSlashStatus {
    DoubleProposal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalSlashFinding {
    pub status: ProposalSlashStatus,
    pub offending: BeaconBlockHeader,
}

/// Guards the `(check -> sign -> record)` sequence per account so two
/// concurrent attestations can't each pass the check individually and
/// together violate a surround rule.
pub struct SlashingProtector {
    storage: Arc<dyn Storage>,
    account_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SlashingProtector {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    fn account_lock(&self, pubkey: &str) -> Arc<Mutex<()>> {
        self.account_locks
            .lock()
            .entry(pubkey.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Double/surround detection against history in the lookback window.
    /// An empty result means safe to sign.
    pub fn is_slashable_attestation(
        &self,
        pubkey: &str,
        candidate: &BeaconAttestation,
    ) -> Result<Vec<AttestationSlashFinding>> {
        let lookup_start = candidate.source.epoch.saturating_sub(EPOCH_LOOKBACK);
        let mut lookup_end = candidate.target.epoch;
        if let Some(latest) = self.storage.retrieve_latest_attestation(pubkey)? {
            if latest.target.epoch > lookup_end {
                lookup_end = latest.target.epoch;
            }
        }

        let history = self.storage.list_attestations(pubkey, lookup_start, lookup_end)?;
        Ok(Self::find_attestation_slashes(candidate, &history))
    }

    fn find_attestation_slashes(
        candidate: &BeaconAttestation,
        history: &[BeaconAttestation],
    ) -> Vec<AttestationSlashFinding> {
        history
            .iter()
            .filter_map(|past| {
                if past == candidate {
                    return None; // self is never slashable against itself
                }
                if past.target.epoch == candidate.target.epoch {
                    return Some(AttestationSlashFinding {
                        status: AttestationSlashStatus::DoubleVote,
                        offending: past.clone(),
                    });
                }
                if past.source.epoch < candidate.source.epoch && past.target.epoch > candidate.target.epoch {
                    return Some(AttestationSlashFinding {
                        status: AttestationSlashStatus::Surrounded,
                        offending: past.clone(),
                    });
                }
                if past.source.epoch > candidate.source.epoch && past.target.epoch < candidate.target.epoch {
                    return Some(AttestationSlashFinding {
                        status: AttestationSlashStatus::Surrounding,
                        offending: past.clone(),
                    });
                }
                None
            })
            .collect()
    }

    /// Double-proposal detection. `None` means safe (including the
    /// idempotent re-submission case).
    pub fn is_slashable_proposal(
        &self,
        pubkey: &str,
        candidate: &BeaconBlockHeader,
    ) -> Result<Option<ProposalSlashFinding>> {
        let Some(existing) = self.storage.retrieve_proposal(pubkey, candidate.slot)? else {
            return Ok(None);
        };
        if existing.conflicts_with(candidate) {
            Ok(Some(ProposalSlashFinding {
                status: ProposalSlashStatus::DoubleProposal,
                offending: existing,
            }))
        } else {
            Ok(None)
        }
    }

    /// Records a signed attestation and advances the latest-attestation
    /// pointer iff `att.target.epoch` is strictly newer. Retrieval errors are
    /// surfaced rather than swallowed, since silently keeping a stale
    /// pointer could mask storage corruption.
    pub fn save_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()> {
        self.storage.save_attestation(pubkey, att)?;
        self.save_latest_attestation(pubkey, att)
    }

    pub fn save_latest_attestation(&self, pubkey: &str, att: &BeaconAttestation) -> Result<()> {
        match self.storage.retrieve_latest_attestation(pubkey)? {
            None => self.storage.save_latest_attestation(pubkey, att),
            Some(existing) if existing.target.epoch < att.target.epoch => {
                self.storage.save_latest_attestation(pubkey, att)
            }
            Some(_) => Ok(()),
        }
    }

    pub fn retrieve_latest_attestation(&self, pubkey: &str) -> Result<Option<BeaconAttestation>> {
        self.storage.retrieve_latest_attestation(pubkey)
    }

    pub fn save_proposal(&self, pubkey: &str, hdr: &BeaconBlockHeader) -> Result<()> {
        self.storage.save_proposal(pubkey, hdr)
    }

    /// Runs `(check -> sign -> record)` under the per-account lock so the
    /// decision and the write are atomic with respect to other signers of
    /// the same account.
    pub fn guarded_sign_attestation<F>(
        &self,
        pubkey: &str,
        candidate: &BeaconAttestation,
        sign: F,
    ) -> Result<[u8; 96]>
    where
        F: FnOnce() -> Result<[u8; 96]>,
    {
        let lock = self.account_lock(pubkey);
        let _guard = lock.lock();

        let findings = self.is_slashable_attestation(pubkey, candidate)?;
        if !findings.is_empty() {
            return Err(Error::SlashableAttestation(format!(
                "{} conflicting attestation(s), first status {:?}",
                findings.len(),
                findings[0].status
            )));
        }

        let signature = sign()?;
        self.save_attestation(pubkey, candidate)?;
        Ok(signature)
    }

    pub fn guarded_sign_proposal<F>(
        &self,
        pubkey: &str,
        candidate: &BeaconBlockHeader,
        sign: F,
    ) -> Result<[u8; 96]>
    where
        F: FnOnce() -> Result<[u8; 96]>,
    {
        let lock = self.account_lock(pubkey);
        let _guard = lock.lock();

        if let Some(finding) = self.is_slashable_proposal(pubkey, candidate)? {
            return Err(Error::SlashableProposal(format!(
                "conflicts with proposal at slot {}",
                finding.offending.slot
            )));
        }

        let signature = sign()?;
        self.save_proposal(pubkey, candidate)?;
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slashing::types::Checkpoint;
    use crate::storage::memory::MemoryStore;

    fn checkpoint(epoch: u64) -> Checkpoint {
        Checkpoint { epoch, root: [epoch as u8; 32] }
    }

    fn attestation(source_epoch: u64, target_epoch: u64, root: u8) -> BeaconAttestation {
        BeaconAttestation {
            slot: target_epoch * 32,
            committee_index: 0,
            beacon_block_root: [root; 32],
            source: checkpoint(source_epoch),
            target: checkpoint(target_epoch),
        }
    }

    fn protector() -> SlashingProtector {
        SlashingProtector::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn double_vote_is_detected() {
        let p = protector();
        let first = attestation(1, 2, b'A');
        p.save_attestation("pk", &first).unwrap();

        let candidate = attestation(1, 2, b'B');
        let findings = p.is_slashable_attestation("pk", &candidate).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, AttestationSlashStatus::DoubleVote);
    }

    #[test]
    fn surrounding_is_detected() {
        let p = protector();
        p.save_attestation("pk", &attestation(2, 5, b'A')).unwrap();

        let candidate = attestation(1, 6, b'A');
        let findings = p.is_slashable_attestation("pk", &candidate).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, AttestationSlashStatus::Surrounding);
    }

    #[test]
    fn surrounded_is_detected_symmetrically() {
        let p = protector();
        p.save_attestation("pk", &attestation(1, 6, b'A')).unwrap();

        let candidate = attestation(2, 5, b'A');
        let findings = p.is_slashable_attestation("pk", &candidate).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, AttestationSlashStatus::Surrounded);
    }

    #[test]
    fn self_is_never_slashable() {
        let p = protector();
        let att = attestation(1, 2, b'A');
        p.save_attestation("pk", &att).unwrap();
        assert!(p.is_slashable_attestation("pk", &att).unwrap().is_empty());
    }

    #[test]
    fn safe_past_the_lookback_window_is_ignored() {
        let p = protector();
        // stored target epoch is far below candidate.source.epoch - 128
        p.save_attestation("pk", &attestation(0, 1, b'A')).unwrap();

        let candidate = attestation(200, 201, b'A');
        assert!(p.is_slashable_attestation("pk", &candidate).unwrap().is_empty());
    }

    #[test]
    fn double_proposal_is_detected_and_idempotent_resave_is_safe() {
        let p = protector();
        let hdr = BeaconBlockHeader {
            slot: 10,
            proposer_index: 1,
            parent_root: [1; 32],
            state_root: [1; 32],
            body_root: [1; 32],
        };
        p.save_proposal("pk", &hdr).unwrap();

        assert!(p.is_slashable_proposal("pk", &hdr).unwrap().is_none());

        let mut conflicting = hdr;
        conflicting.state_root = [2; 32];
        let finding = p.is_slashable_proposal("pk", &conflicting).unwrap().unwrap();
        assert_eq!(finding.status, ProposalSlashStatus::DoubleProposal);
    }

    #[test]
    fn latest_attestation_pointer_is_monotonic() {
        let p = protector();
        p.save_latest_attestation("pk", &attestation(1, 5, b'A')).unwrap();
        p.save_latest_attestation("pk", &attestation(1, 3, b'A')).unwrap(); // older, ignored
        p.save_latest_attestation("pk", &attestation(1, 9, b'A')).unwrap();

        let latest = p.retrieve_latest_attestation("pk").unwrap().unwrap();
        assert_eq!(latest.target.epoch, 9);
    }

    #[test]
    fn guarded_sign_refuses_on_double_vote() {
        let p = protector();
        p.save_attestation("pk", &attestation(1, 2, b'A')).unwrap();

        let result = p.guarded_sign_attestation("pk", &attestation(1, 2, b'B'), || Ok([0u8; 96]));
        assert!(matches!(result, Err(Error::SlashableAttestation(_))));
    }

    #[test]
    fn guarded_sign_records_on_success() {
        let p = protector();
        let att = attestation(1, 2, b'A');
        let sig = p.guarded_sign_attestation("pk", &att, || Ok([7u8; 96])).unwrap();
        assert_eq!(sig, [7u8; 96]);
        assert!(p.retrieve_latest_attestation("pk").unwrap().is_some());
    }
}

//! Slashing protection engine.
//!
//! Decides whether a candidate attestation or block proposal is safe to
//! sign, and maintains the history that decision depends on.

pub mod protector;
pub mod types;

pub use protector::{AttestationSlashFinding, AttestationSlashStatus, ProposalSlashFinding, ProposalSlashStatus, SlashingProtector};
pub use types::{BeaconAttestation, BeaconBlockHeader, Checkpoint};

//! Protected-object data model: attestations and block headers.

use serde::{Deserialize, Serialize};

/// `(epoch, root)` checkpoint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconAttestation {
    pub slot: u64,
    pub committee_index: u64,
    pub beacon_block_root: [u8; 32],
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}

impl BeaconBlockHeader {
    /// Equality over exactly `{proposerIndex, parentRoot, stateRoot, bodyRoot}`.
    /// Slot equality is a lookup precondition, not a discriminator.
    pub fn conflicts_with(&self, other: &BeaconBlockHeader) -> bool {
        self.proposer_index != other.proposer_index
            || self.parent_root != other.parent_root
            || self.state_root != other.state_root
            || self.body_root != other.body_root
    }
}

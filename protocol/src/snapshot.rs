//! Persisting the full protocol state through a [`StateStore`].
//!
//! The state is written as one bincode blob next to its Blake2b-256 digest
//! and a format version. Loading recomputes the digest before decoding.

use crate::error::ProtocolError;
use crate::host::Protocol;
use crate::state::ProtocolState;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use puddel_store::{StateStore, StoreError};
use tracing::{debug, info, warn};

type Blake2b256 = Blake2b<U32>;

pub const SNAPSHOT_VERSION: u32 = 1;

const KEY_VERSION: &str = "protocol/snapshot_version";
const KEY_STATE: &str = "protocol/state";
const KEY_DIGEST: &str = "protocol/state_digest";

fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

impl Protocol {
    /// Write the committed state to `store`. Refused while an entry point runs.
    pub fn save(&self, store: &dyn StateStore) -> Result<(), ProtocolError> {
        if self.guard.is_entered() {
            return Err(ProtocolError::Reentrancy);
        }
        let bytes = bincode::serialize(&self.state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let hash = digest(&bytes);
        store.put(KEY_STATE, &bytes)?;
        store.put(KEY_DIGEST, &hash)?;
        store.put(KEY_VERSION, &SNAPSHOT_VERSION.to_be_bytes())?;
        info!(target: "protocol", bytes = bytes.len(), digest = %hex_prefix(&hash), "snapshot saved");
        Ok(())
    }

    /// Rebuild a protocol from a snapshot written by [`Protocol::save`].
    ///
    /// The event log is not part of the snapshot and starts empty.
    pub fn load(store: &dyn StateStore) -> Result<Self, ProtocolError> {
        let version = store.require(KEY_VERSION)?;
        let version: [u8; 4] = version
            .as_slice()
            .try_into()
            .map_err(|_| ProtocolError::SnapshotCorrupted("malformed version".to_string()))?;
        let version = u32::from_be_bytes(version);
        if version != SNAPSHOT_VERSION {
            return Err(ProtocolError::SnapshotCorrupted(format!(
                "unsupported version {version}, expected {SNAPSHOT_VERSION}"
            )));
        }

        let bytes = store.require(KEY_STATE)?;
        let expected = store.require(KEY_DIGEST)?;
        let actual = digest(&bytes);
        if expected.as_slice() != actual.as_slice() {
            warn!(target: "protocol", stored = %hex_prefix(&expected), computed = %hex_prefix(&actual), "snapshot digest mismatch");
            return Err(ProtocolError::SnapshotCorrupted("digest mismatch".to_string()));
        }
        let state: ProtocolState =
            bincode::deserialize(&bytes).map_err(|e| ProtocolError::SnapshotCorrupted(e.to_string()))?;
        debug!(target: "protocol", bytes = bytes.len(), pairs = state.registry.all_pairs_length(), "snapshot loaded");
        Ok(Self::from_state(state))
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

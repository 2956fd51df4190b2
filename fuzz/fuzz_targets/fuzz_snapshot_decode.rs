#![no_main]

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use libfuzzer_sys::fuzz_target;

use puddel_nullables::NullStateStore;
use puddel_protocol::{Protocol, ProtocolState, SNAPSHOT_VERSION};
use puddel_store::StateStore;

// Feed arbitrary bytes through snapshot loading, once with a matching digest
// so decoding itself is reached. Loading must fail cleanly, never panic, and
// anything that does decode must be a state the checks can walk.
fuzz_target!(|data: &[u8]| {
    let _ = bincode::deserialize::<ProtocolState>(data);

    let digest: [u8; 32] = Blake2b::<U32>::digest(data).into();
    let store = NullStateStore::new();
    store.put("protocol/snapshot_version", &SNAPSHOT_VERSION.to_be_bytes()).unwrap();
    store.put("protocol/state", data).unwrap();
    store.put("protocol/state_digest", &digest).unwrap();
    if let Ok(protocol) = Protocol::load(&store) {
        let _ = protocol.state().invariant_violations();
    }

    store.put("protocol/state_digest", &[0u8; 32]).unwrap();
    assert!(Protocol::load(&store).is_err() || digest == [0u8; 32]);
});

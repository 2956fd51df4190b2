//! Abstract storage for the Puddel exchange core.
//!
//! The protocol host persists its state as opaque byte blobs under string
//! keys. Backends (in-memory for tests, LMDB for the simulator) implement
//! [`StateStore`]; nothing else in the workspace knows how bytes are kept.

pub mod error;
pub mod state;

pub use error::StoreError;
pub use state::StateStore;

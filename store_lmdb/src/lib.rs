//! LMDB storage backend for Puddel.
//!
//! Implements [`puddel_store::StateStore`] on top of the `heed` bindings. One
//! environment per snapshot directory, holding a single `state` database
//! keyed by the snapshot key.

pub mod environment;
pub mod error;
pub mod state;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use state::LmdbStateStore;

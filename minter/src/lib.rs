//! Emission scheduler.
//!
//! Anyone may roll the epoch once the clock has moved past the last processed
//! one. A roll mints `emission_per_epoch` governance tokens split by the
//! previous epoch's vote snapshot and notifies each pool's gauge with its
//! share. An epoch nobody voted in is recorded with zero emission and still
//! advances the counter. Decay shrinks the emission after every roll that
//! distributed something.

pub mod error;
pub mod minter;

pub use error::MinterError;
pub use minter::{EmissionRecord, Minter};

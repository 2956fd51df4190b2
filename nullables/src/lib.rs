//! Nullable infrastructure for deterministic testing.
//!
//! The exchange core never reads a wall clock or touches the filesystem: time
//! arrives as an explicit `now` argument and snapshots go through
//! [`puddel_store::StateStore`]. This crate provides controllable stand-ins:
//! - [`NullClock`]: time only moves when a test moves it
//! - [`NullStateStore`]: in-memory bytes, with switchable write failures

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::NullStateStore;

//! Fundamental types for the Puddel exchange core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, timestamps, epochs, protocol parameters and the reentrancy guard.

pub mod address;
pub mod amount_serde;
pub mod error;
pub mod guard;
pub mod params;
pub mod time;

pub use address::Address;
pub use error::ParamsError;
pub use guard::ReentrancyGuard;
pub use params::{FeeSplits, LockTierParams, ProtocolParams, TOKEN_UNIT};
pub use time::{Epoch, Timestamp};

//! Vote allocator ("Voter").
//!
//! A position holder splits the position's power across registered pools with
//! relative weights ("60/40"), not raw power units. Voting again fully replaces
//! the previous allocation. The allocator keeps:
//!
//! - live per-pool weights and a live total
//! - per-epoch snapshots keyed by (epoch, pool) plus a per-epoch total
//! - per-epoch per-position weights, used to pro-rate incentive claims
//!
//! Only the epoch containing `now` is ever written, so a past epoch's snapshot
//! is frozen by construction. The current epoch is `floor(now / epoch_length)`.

pub mod error;
pub mod ledger;
pub mod voter;

pub use error::VoterError;
pub use ledger::{EpochVoteLedger, GaugeRegistry};
pub use voter::{GaugeInfo, VoteRecord, Voter};

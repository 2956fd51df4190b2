//! Incentive vaults, one per pool.
//!
//! Third parties deposit any token earmarked for the current or a future
//! epoch. Once that epoch has ended its vote snapshot is frozen, and each
//! position that voted for the pool may claim
//! `deposited × position weight / pool weight`. A claim records the full
//! entitlement for its (epoch, token, position) key, so asking again pays
//! nothing. Deposits for an epoch nobody voted on can be refunded.

pub mod error;
pub mod vault;

pub use error::BribeError;
pub use vault::{Bribe, BribeSet, Claim};

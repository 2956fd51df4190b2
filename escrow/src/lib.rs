//! Voting escrow: governance tokens locked for a duration tier.
//!
//! Each lock mints a non-fungible [`Position`]. Its voting power is
//! `amount × (tier multiplier + activity bonus) / 10000` while the lock runs
//! and exactly zero from `lock_end` on. There is no linear decay.
//!
//! Lifecycle: `Active` → `Expired` (power zero, principal withdrawable) →
//! `Closed` (withdrawn, record deleted).
//!
//! `total_power` is an aggregate maintained incrementally: every mutation
//! subtracts the position's `recorded_power` and adds its fresh power. An
//! expired position keeps its stale recorded power until poked or withdrawn.

pub mod engine;
pub mod error;
pub mod position;
pub mod tier;

pub use engine::{PositionOwnership, VotingEscrow};
pub use error::EscrowError;
pub use position::{Position, PositionId, PositionState};
pub use tier::TierTable;

//! The composed protocol ledger.
//!
//! [`Protocol`] owns the token ledger and every component: pair registry,
//! voting escrow, vote allocator, gauges, incentive vaults, minter and fee
//! distributor. Each state-mutating entry point is non-reentrant and atomic.
//! It either commits all of its effects and events or leaves the state
//! exactly as it found it.
//!
//! - [`host`]: the guard, checkpoint/rollback and role-gated administration
//! - [`trading`]: token ledger calls, liquidity, routed and low-level swaps
//! - [`staking`]: locks, votes, reward streams and incentives
//! - [`emissions`]: epoch rolls and fee harvests
//! - [`snapshot`]: save/load through a [`puddel_store::StateStore`]
//! - [`invariants`]: conservation checks

pub mod emissions;
pub mod error;
pub mod events;
pub mod host;
pub mod invariants;
pub mod roles;
pub mod snapshot;
pub mod staking;
pub mod state;
pub mod trading;

pub use error::ProtocolError;
pub use events::{AdminParam, ParamValue, ProtocolEvent};
pub use host::Protocol;
pub use roles::{Role, RoleSet};
pub use snapshot::SNAPSHOT_VERSION;
pub use state::{Contracts, GenesisAllocation, GenesisConfig, ProtocolState, GOV_SYMBOL};
pub use trading::SwapCallee;

//! Reward streamer ("Gauge"), one per pool.
//!
//! Liquidity providers stake a pool's LP shares; emissions notified by the
//! scheduler stream linearly over a fixed window using the standard
//! reward-per-token accumulator:
//!
//! ```text
//! reward_per_token = stored + (min(now, period_finish) − last_update) × rate × 1e18 / total_staked
//! earned(account)  = balance × (reward_per_token − paid_per_token[account]) / 1e18 + rewards[account]
//! ```
//!
//! Every mutating entry point rolls the accumulator forward and settles the
//! account it touches before changing balances.

pub mod error;
pub mod gauge;
pub mod set;

pub use error::GaugeError;
pub use gauge::{Gauge, PRECISION};
pub use set::GaugeSet;

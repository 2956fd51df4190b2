//! Parameter validation errors shared across crates.

use thiserror::Error;

/// A protocol parameter is outside its allowed bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("epoch length must be non-zero")]
    ZeroEpochLength,

    #[error("reward duration must be non-zero")]
    ZeroRewardDuration,

    #[error("expected {expected} lock tiers, found {found}")]
    TierCount { expected: usize, found: usize },

    #[error("lock tier {tier} duration must be non-zero and not shorter than the previous tier")]
    TierDuration { tier: usize },

    #[error("lock tier {tier} multiplier {bps} bps outside {min}..={max}")]
    MultiplierOutOfBounds { tier: usize, bps: u32, min: u32, max: u32 },

    #[error("fee splits sum to {sum} bps, must be exactly 10000")]
    InvalidSplits { sum: u64 },

    #[error("emission {emission} exceeds ceiling {ceiling}")]
    EmissionAboveCeiling { emission: u128, ceiling: u128 },

    #[error("decay {decay_bps} bps exceeds ceiling {ceiling_bps} bps")]
    DecayAboveCeiling { decay_bps: u32, ceiling_bps: u32 },

    #[error("{field} = {value} bps exceeds {max} bps")]
    BpsOutOfRange { field: &'static str, value: u32, max: u32 },
}

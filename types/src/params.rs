//! Protocol parameters: epoch length, emission schedule, lock tiers and fee splits.
//!
//! Every field has a serde default so a partial TOML table only overrides what
//! it names. Runtime changes go through the role-gated setters of the owning
//! component; these values are the genesis configuration.

use crate::error::ParamsError;
use serde::{Deserialize, Serialize};

/// Raw units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

const DAY: u64 = 24 * 3600;

/// Basis-point denominator (100%).
pub const BPS: u32 = 10_000;

/// Number of lock tiers.
pub const TIER_COUNT: usize = 6;

/// Tier multipliers are bounded to 1x..=10x.
pub const MIN_TIER_MULTIPLIER_BPS: u32 = 10_000;
pub const MAX_TIER_MULTIPLIER_BPS: u32 = 100_000;

/// Hard cap on the per-position activity bonus (10%).
pub const MAX_ACTIVITY_BONUS_BPS: u32 = 1_000;

/// One lock tier: how long tokens are locked and how much power they earn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTierParams {
    pub duration_secs: u64,
    pub multiplier_bps: u32,
}

/// How harvested protocol fees are split. Must sum to exactly 10000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplits {
    pub stakers_bps: u32,
    pub treasury_bps: u32,
    pub burn_bps: u32,
    pub emergency_bps: u32,
}

impl FeeSplits {
    pub fn sum(&self) -> u64 {
        self.stakers_bps as u64
            + self.treasury_bps as u64
            + self.burn_bps as u64
            + self.emergency_bps as u64
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let sum = self.sum();
        if sum != BPS as u64 {
            return Err(ParamsError::InvalidSplits { sum });
        }
        Ok(())
    }
}

impl Default for FeeSplits {
    fn default() -> Self {
        Self {
            stakers_bps: 5_000,
            treasury_bps: 2_000,
            burn_bps: 2_000,
            emergency_bps: 1_000,
        }
    }
}

/// Genesis configuration for the whole protocol core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Epochs ───────────────────────────────────────────────────────────
    /// Length of one voting / emission epoch. Default: 7 days.
    #[serde(default = "default_epoch_length")]
    pub epoch_length_secs: u64,

    // ── Reward streaming ─────────────────────────────────────────────────
    /// Window over which a notified gauge reward is streamed. Default: 7 days.
    #[serde(default = "default_epoch_length")]
    pub reward_duration_secs: u64,

    // ── Emissions ────────────────────────────────────────────────────────
    /// Governance tokens minted per epoch roll. Default: 1,000,000 tokens.
    #[serde(default = "default_emission_per_epoch", with = "crate::amount_serde")]
    pub emission_per_epoch: u128,

    /// Hard ceiling the operations role can never raise emissions above.
    #[serde(default = "default_emission_ceiling", with = "crate::amount_serde")]
    pub emission_ceiling: u128,

    /// Per-epoch decay of `emission_per_epoch` (basis points). Default: 1%.
    #[serde(default = "default_decay_bps")]
    pub emission_decay_bps: u32,

    /// Safety ceiling for the decay rate. Default: 5%.
    #[serde(default = "default_decay_ceiling_bps")]
    pub decay_ceiling_bps: u32,

    // ── Bribes ───────────────────────────────────────────────────────────
    /// How many epochs ahead a bribe may be earmarked.
    #[serde(default = "default_max_future_bribe_epochs")]
    pub max_future_bribe_epochs: u64,

    // ── Voting escrow ────────────────────────────────────────────────────
    /// Upper bound for a position's activity bonus (basis points).
    #[serde(default = "default_max_activity_bonus")]
    pub max_activity_bonus_bps: u32,

    /// Lock tiers 0–5, shortest first.
    #[serde(default = "default_lock_tiers")]
    pub lock_tiers: Vec<LockTierParams>,

    // ── Fees ─────────────────────────────────────────────────────────────
    #[serde(default)]
    pub fee_splits: FeeSplits,
}

fn default_epoch_length() -> u64 {
    7 * DAY
}

fn default_emission_per_epoch() -> u128 {
    1_000_000 * TOKEN_UNIT
}

fn default_emission_ceiling() -> u128 {
    10_000_000 * TOKEN_UNIT
}

fn default_decay_bps() -> u32 {
    100
}

fn default_decay_ceiling_bps() -> u32 {
    500
}

fn default_lock_tiers() -> Vec<LockTierParams> {
    [
        (30, 10_000),
        (90, 15_000),
        (180, 20_000),
        (365, 30_000),
        (730, 40_000),
        (1460, 50_000),
    ]
    .into_iter()
    .map(|(days, multiplier_bps)| LockTierParams {
        duration_secs: days * DAY,
        multiplier_bps,
    })
    .collect()
}

fn default_max_activity_bonus() -> u32 {
    MAX_ACTIVITY_BONUS_BPS
}

fn default_max_future_bribe_epochs() -> u64 {
    52
}

impl ProtocolParams {
    /// Check every bound. Called once at genesis; setters re-check their own field.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.epoch_length_secs == 0 {
            return Err(ParamsError::ZeroEpochLength);
        }
        if self.reward_duration_secs == 0 {
            return Err(ParamsError::ZeroRewardDuration);
        }
        if self.lock_tiers.len() != TIER_COUNT {
            return Err(ParamsError::TierCount {
                expected: TIER_COUNT,
                found: self.lock_tiers.len(),
            });
        }
        let mut previous = 0u64;
        for (tier, params) in self.lock_tiers.iter().enumerate() {
            if params.duration_secs == 0 || params.duration_secs < previous {
                return Err(ParamsError::TierDuration { tier });
            }
            previous = params.duration_secs;
            if !(MIN_TIER_MULTIPLIER_BPS..=MAX_TIER_MULTIPLIER_BPS).contains(&params.multiplier_bps)
            {
                return Err(ParamsError::MultiplierOutOfBounds {
                    tier,
                    bps: params.multiplier_bps,
                    min: MIN_TIER_MULTIPLIER_BPS,
                    max: MAX_TIER_MULTIPLIER_BPS,
                });
            }
        }
        if self.max_activity_bonus_bps > MAX_ACTIVITY_BONUS_BPS {
            return Err(ParamsError::BpsOutOfRange {
                field: "max_activity_bonus_bps",
                value: self.max_activity_bonus_bps,
                max: MAX_ACTIVITY_BONUS_BPS,
            });
        }
        if self.emission_per_epoch > self.emission_ceiling {
            return Err(ParamsError::EmissionAboveCeiling {
                emission: self.emission_per_epoch,
                ceiling: self.emission_ceiling,
            });
        }
        if self.decay_ceiling_bps > BPS {
            return Err(ParamsError::BpsOutOfRange {
                field: "decay_ceiling_bps",
                value: self.decay_ceiling_bps,
                max: BPS,
            });
        }
        if self.emission_decay_bps > self.decay_ceiling_bps {
            return Err(ParamsError::DecayAboveCeiling {
                decay_bps: self.emission_decay_bps,
                ceiling_bps: self.decay_ceiling_bps,
            });
        }
        self.fee_splits.validate()
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            epoch_length_secs: default_epoch_length(),
            reward_duration_secs: default_epoch_length(),
            emission_per_epoch: default_emission_per_epoch(),
            emission_ceiling: default_emission_ceiling(),
            emission_decay_bps: default_decay_bps(),
            decay_ceiling_bps: default_decay_ceiling_bps(),
            lock_tiers: default_lock_tiers(),
            max_activity_bonus_bps: default_max_activity_bonus(),
            max_future_bribe_epochs: default_max_future_bribe_epochs(),
            fee_splits: FeeSplits::default(),
        }
    }
}

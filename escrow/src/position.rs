//! Voting-power positions.

use crate::error::EscrowError;
use puddel_math::{mul_div, BPS_DENOMINATOR};
use puddel_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Unique identifier for a position. Ids start at 1 and are never reused.
pub type PositionId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    /// `now < lock_end`, power > 0.
    Active,
    /// Lock ran out: power is zero, principal can be withdrawn.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: Address,
    pub amount: u128,
    pub lock_start: Timestamp,
    pub lock_end: Timestamp,
    pub tier: u8,
    /// Tier multiplier captured when the lock was created or last extended.
    pub multiplier_bps: u32,
    pub activity_bonus_bps: u32,
    /// Power last folded into the escrow's `total_power`.
    pub recorded_power: u128,
}

impl Position {
    pub fn state(&self, now: Timestamp) -> PositionState {
        if now < self.lock_end {
            PositionState::Active
        } else {
            PositionState::Expired
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.state(now) == PositionState::Active
    }

    /// Voting power at `now`; exactly zero at and after `lock_end`.
    pub fn power_at(&self, now: Timestamp) -> Result<u128, EscrowError> {
        if !self.is_active(now) {
            return Ok(0);
        }
        let bps = self.multiplier_bps as u128 + self.activity_bonus_bps as u128;
        Ok(mul_div(self.amount, bps, BPS_DENOMINATOR)?)
    }
}

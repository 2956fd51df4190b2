//! Voting-escrow errors.

use crate::position::PositionId;
use puddel_math::MathError;
use puddel_token::TokenError;
use puddel_types::{Address, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("lock tier {0} is not configured")]
    UnknownTier(u8),

    #[error("position {0} not found")]
    UnknownPosition(PositionId),

    #[error("{caller} does not own position {id}")]
    NotOwner { id: PositionId, caller: Address },

    #[error("lock expired at {lock_end} (now {now})")]
    LockExpired { lock_end: Timestamp, now: Timestamp },

    #[error("lock has not expired: ends at {lock_end}, now {now}")]
    LockNotExpired { lock_end: Timestamp, now: Timestamp },

    #[error("cannot move from tier {current} to shorter tier {requested}")]
    TierDowngrade { current: u8, requested: u8 },

    #[error("new lock end {new_end} is earlier than current end {current_end}")]
    LockEndDecrease {
        current_end: Timestamp,
        new_end: Timestamp,
    },

    #[error("activity bonus {bps} bps exceeds maximum {max} bps")]
    BonusTooHigh { bps: u32, max: u32 },

    #[error("tier multiplier {bps} bps outside {min}..={max}")]
    MultiplierOutOfBounds { bps: u32, min: u32, max: u32 },

    #[error("cannot transfer a position to the zero address")]
    ZeroRecipient,

    #[error("arithmetic overflow in escrow accounting")]
    Overflow,

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

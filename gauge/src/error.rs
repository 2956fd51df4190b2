//! Reward-streamer errors.

use puddel_math::MathError;
use puddel_token::TokenError;
use puddel_types::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GaugeError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("reward duration must be non-zero")]
    ZeroDuration,

    #[error("{caller} is not the emission scheduler")]
    NotMinter { caller: Address },

    #[error("cannot withdraw {requested}: only {staked} staked")]
    InsufficientStake { requested: u128, staked: u128 },

    #[error("reward rate {rate}/s exceeds what the balance covers ({max_rate}/s)")]
    RewardTooHigh { rate: u128, max_rate: u128 },

    #[error("no gauge for pool {0}")]
    UnknownGauge(Address),

    #[error("pool {0} already has a gauge")]
    GaugeExists(Address),

    #[error("arithmetic overflow in reward accounting")]
    Overflow,

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

//! Incentive-vault errors.

use puddel_escrow::PositionId;
use puddel_math::MathError;
use puddel_token::TokenError;
use puddel_types::{Address, Epoch};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BribeError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("{epoch} is in the past (current {current})")]
    PastEpoch { epoch: Epoch, current: Epoch },

    #[error("{epoch} is too far ahead (latest accepted {latest})")]
    TooFarAhead { epoch: Epoch, latest: Epoch },

    #[error("{epoch} has not ended yet (current {current})")]
    EpochNotElapsed { epoch: Epoch, current: Epoch },

    #[error("{tokens} tokens but {epochs} epochs")]
    LengthMismatch { tokens: usize, epochs: usize },

    #[error("position {0} does not exist")]
    UnknownPosition(PositionId),

    #[error("{caller} does not own position {id}")]
    NotOwner { id: PositionId, caller: Address },

    #[error("{epoch} received {weight} votes; deposits are claimable, not refundable")]
    EpochHasVotes { epoch: Epoch, weight: u128 },

    #[error("nothing to refund for {depositor} in {epoch}")]
    NothingToRefund { epoch: Epoch, depositor: Address },

    #[error("no incentive vault for pool {0}")]
    UnknownBribe(Address),

    #[error("pool {0} already has an incentive vault")]
    BribeExists(Address),

    #[error("arithmetic overflow in incentive accounting")]
    Overflow,

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

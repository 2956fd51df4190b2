//! Vote-allocator errors.

use puddel_escrow::PositionId;
use puddel_math::MathError;
use puddel_types::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoterError {
    #[error("vote must name at least one pool")]
    EmptyVote,

    #[error("{pools} pools but {weights} weights")]
    LengthMismatch { pools: usize, weights: usize },

    #[error("pool {0} has no gauge")]
    UnknownPool(Address),

    #[error("pool {0} listed twice")]
    DuplicatePool(Address),

    #[error("zero weight for pool {0}")]
    ZeroWeight(Address),

    #[error("position {0} not found")]
    UnknownPosition(PositionId),

    #[error("{caller} does not own position {id}")]
    NotOwner { id: PositionId, caller: Address },

    #[error("position {0} has no voting power")]
    NoVotingPower(PositionId),

    #[error("pool {0} already has a gauge")]
    GaugeExists(Address),

    #[error("arithmetic overflow in vote accounting")]
    Overflow,

    #[error(transparent)]
    Math(#[from] MathError),
}

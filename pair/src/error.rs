//! Pair engine errors.

use puddel_math::{MathError, U256};
use puddel_token::TokenError;
use puddel_types::{Address, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PairError {
    #[error("identical tokens")]
    IdenticalTokens,

    #[error("zero address is not a token")]
    ZeroAddress,

    #[error("pair {0} already exists")]
    PairExists(Address),

    #[error("no pair at {0}")]
    UnknownPair(Address),

    #[error("caller is not the fee-to setter")]
    Forbidden,

    #[error("insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    #[error("insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    #[error("insufficient output amount")]
    InsufficientOutputAmount,

    #[error("insufficient input amount")]
    InsufficientInputAmount,

    #[error("insufficient liquidity: requested {requested}, reserve {reserve}")]
    InsufficientLiquidity { requested: u128, reserve: u128 },

    #[error("insufficient amount")]
    InsufficientAmount,

    #[error("swap recipient may not be one of the pair's tokens")]
    InvalidRecipient,

    #[error("invalid path: a route needs at least two tokens")]
    InvalidPath,

    #[error("constant-product invariant violated: k before {before}, fee-adjusted k after {after}")]
    InvariantViolated { before: U256, after: U256 },

    #[error("reserve {0} exceeds the 112-bit cap")]
    ReserveOverflow(u128),

    #[error("slippage exceeded: got {actual}, limit {limit}")]
    SlippageExceeded { actual: u128, limit: u128 },

    #[error("deadline {deadline} passed at {now}")]
    Expired { deadline: Timestamp, now: Timestamp },

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

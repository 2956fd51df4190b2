//! Fee-distributor errors.

use puddel_math::MathError;
use puddel_pair::PairError;
use puddel_token::TokenError;
use puddel_types::ParamsError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("{0} destination must not be the zero address")]
    ZeroDestination(&'static str),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Pair(#[from] PairError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

//! Emission-scheduler errors.

use puddel_gauge::GaugeError;
use puddel_math::MathError;
use puddel_token::TokenError;
use puddel_types::{Address, Epoch, ParamsError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinterError {
    #[error("{current} already processed (last roll {last})")]
    EpochNotAdvanced { current: Epoch, last: Epoch },

    #[error("pool {0} has votes but no reward streamer")]
    MissingGauge(Address),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Gauge(#[from] GaugeError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

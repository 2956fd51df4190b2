//! Errors surfaced by protocol entry points.

use crate::roles::Role;
use puddel_bribe::BribeError;
use puddel_escrow::EscrowError;
use puddel_fees::FeeError;
use puddel_gauge::GaugeError;
use puddel_math::MathError;
use puddel_minter::MinterError;
use puddel_pair::PairError;
use puddel_store::StoreError;
use puddel_token::TokenError;
use puddel_types::{Address, ParamsError};
use puddel_voter::VoterError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("re-entrant call while another entry point is in progress")]
    Reentrancy,

    #[error("{caller} lacks the {role} role")]
    Unauthorized { caller: Address, role: Role },

    #[error("{0} is a protocol account and cannot act as a caller")]
    ProtocolAccount(Address),

    #[error("pool {0} is not a registered pair")]
    UnknownPool(Address),

    #[error("snapshot integrity check failed: {0}")]
    SnapshotCorrupted(String),

    #[error("invariant broken: {0}")]
    InvariantBroken(String),

    #[error("swap callback failed: {0}")]
    Callback(String),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Pair(#[from] PairError),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Voter(#[from] VoterError),

    #[error(transparent)]
    Gauge(#[from] GaugeError),

    #[error(transparent)]
    Bribe(#[from] BribeError),

    #[error(transparent)]
    Minter(#[from] MinterError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

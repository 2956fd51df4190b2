//! Token-ledger errors.

use puddel_types::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token {0} does not exist")]
    UnknownToken(Address),

    #[error("token {0} already exists")]
    TokenExists(Address),

    #[error("insufficient balance of {token}: need {needed}, have {available}")]
    InsufficientBalance {
        token: Address,
        needed: u128,
        available: u128,
    },

    #[error("insufficient allowance of {token}: need {needed}, have {available}")]
    InsufficientAllowance {
        token: Address,
        needed: u128,
        available: u128,
    },

    #[error("{caller} is not the minter of {token}")]
    NotMinter { token: Address, caller: Address },

    #[error("transfer to the zero address")]
    ZeroRecipient,

    #[error("token supply overflow")]
    SupplyOverflow,
}

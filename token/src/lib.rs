//! Fungible tokens: the transfer interface every component consumes.
//!
//! Components never touch balances directly. They move value through the
//! [`TokenBank`] trait (`transfer`, `transfer_from`, `approve`, `balance_of`,
//! plus `mint`/`burn` for tokens whose minter they are). Any failure is a hard
//! failure of the enclosing operation.
//!
//! [`TokenLedger`] is the in-memory implementation holding every token on the
//! ledger: the governance token, the pool tokens and each pair's LP shares.

pub mod bank;
pub mod error;
pub mod ledger;

pub use bank::TokenBank;
pub use error::TokenError;
pub use ledger::{TokenAccounts, TokenLedger};

//! The fungible-token interface.

use crate::error::TokenError;
use puddel_types::Address;

/// Token operations available to protocol components.
///
/// `spender`, `owner`, `from` and `minter` are always explicit: the caller
/// identity is whatever address the invoking component acts as.
pub trait TokenBank {
    /// Deploy a new token whose only minter is `minter`.
    fn create_token(&mut self, token: Address, symbol: &str, minter: Address)
        -> Result<(), TokenError>;

    fn exists(&self, token: &Address) -> bool;

    /// Balance of `account`; zero for unknown tokens or accounts.
    fn balance_of(&self, token: &Address, account: &Address) -> u128;

    fn total_supply(&self, token: &Address) -> u128;

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128;

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    /// An allowance of `u128::MAX` is treated as unlimited.
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    fn mint(
        &mut self,
        token: &Address,
        minter: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    fn burn(&mut self, token: &Address, holder: &Address, amount: u128) -> Result<(), TokenError>;
}

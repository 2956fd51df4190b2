//! In-memory multi-asset token ledger.

use crate::bank::TokenBank;
use crate::error::TokenError;
use puddel_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Balances, allowances and supply of a single token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenAccounts {
    pub symbol: String,
    /// The only address allowed to mint new supply.
    pub minter: Address,
    pub total_supply: u128,
    pub balances: BTreeMap<Address, u128>,
    /// (owner, spender) → remaining allowance.
    pub allowances: BTreeMap<(Address, Address), u128>,
}

impl TokenAccounts {
    fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn debit(&mut self, token: &Address, account: &Address, amount: u128) -> Result<(), TokenError> {
        let available = self.balance(account);
        let remaining = available
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                token: *token,
                needed: amount,
                available,
            })?;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: u128) -> Result<(), TokenError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self
            .balance(account)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    /// Sum of every holder's balance. Equals `total_supply` on a healthy ledger.
    pub fn holder_sum(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
    }
}

/// Every token known to the protocol, keyed by token address.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    tokens: BTreeMap<Address, TokenAccounts>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self, token: &Address) -> Option<&TokenAccounts> {
        self.tokens.get(token)
    }

    pub fn symbol(&self, token: &Address) -> Option<&str> {
        self.tokens.get(token).map(|t| t.symbol.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&Address, &TokenAccounts)> {
        self.tokens.iter()
    }

    /// Tokens whose holder balances do not add up to their recorded supply.
    pub fn unbalanced_tokens(&self) -> Vec<Address> {
        self.tokens
            .iter()
            .filter(|(_, t)| t.holder_sum() != Some(t.total_supply))
            .map(|(addr, _)| *addr)
            .collect()
    }

    fn token_mut(&mut self, token: &Address) -> Result<&mut TokenAccounts, TokenError> {
        self.tokens
            .get_mut(token)
            .ok_or(TokenError::UnknownToken(*token))
    }
}

impl TokenBank for TokenLedger {
    fn create_token(
        &mut self,
        token: Address,
        symbol: &str,
        minter: Address,
    ) -> Result<(), TokenError> {
        if self.tokens.contains_key(&token) {
            return Err(TokenError::TokenExists(token));
        }
        self.tokens.insert(
            token,
            TokenAccounts {
                symbol: symbol.to_string(),
                minter,
                ..TokenAccounts::default()
            },
        );
        info!(target: "token", %token, symbol, %minter, "token created");
        Ok(())
    }

    fn exists(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    fn balance_of(&self, token: &Address, account: &Address) -> u128 {
        self.tokens.get(token).map_or(0, |t| t.balance(account))
    }

    fn total_supply(&self, token: &Address) -> u128 {
        self.tokens.get(token).map_or(0, |t| t.total_supply)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128 {
        self.tokens
            .get(token)
            .and_then(|t| t.allowances.get(&(*owner, *spender)).copied())
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }
        let accounts = self.token_mut(token)?;
        accounts.debit(token, from, amount)?;
        accounts.credit(to, amount)?;
        debug!(target: "token", %token, %from, %to, amount, "transfer");
        Ok(())
    }

    fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let accounts = self.token_mut(token)?;
        if amount == 0 {
            accounts.allowances.remove(&(*owner, *spender));
        } else {
            accounts.allowances.insert((*owner, *spender), amount);
        }
        debug!(target: "token", %token, %owner, %spender, amount, "approve");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(token, from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                token: *token,
                needed: amount,
                available: allowed,
            });
        }
        self.transfer(token, from, to, amount)?;
        if allowed != u128::MAX {
            self.approve(token, from, spender, allowed - amount)?;
        }
        Ok(())
    }

    fn mint(
        &mut self,
        token: &Address,
        minter: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let accounts = self.token_mut(token)?;
        if accounts.minter != *minter {
            return Err(TokenError::NotMinter {
                token: *token,
                caller: *minter,
            });
        }
        accounts.total_supply = accounts
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        // The zero address may receive supply: locked minimum liquidity lives there.
        accounts.credit(to, amount)?;
        debug!(target: "token", %token, %to, amount, "mint");
        Ok(())
    }

    fn burn(&mut self, token: &Address, holder: &Address, amount: u128) -> Result<(), TokenError> {
        let accounts = self.token_mut(token)?;
        accounts.debit(token, holder, amount)?;
        // Supply always covers any single balance.
        accounts.total_supply -= amount;
        debug!(target: "token", %token, %holder, amount, "burn");
        Ok(())
    }
}

//! Pair registry: deterministic pair addresses and pair creation.

use crate::error::PairError;
use crate::pair::{Pair, SwapOutcome};
use puddel_token::TokenBank;
use puddel_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Canonical ordering of a token pair. Rejects identical tokens and the zero address.
pub fn sort_tokens(a: &Address, b: &Address) -> Result<(Address, Address), PairError> {
    if a == b {
        return Err(PairError::IdenticalTokens);
    }
    let (token0, token1) = if a < b { (*a, *b) } else { (*b, *a) };
    if token0.is_zero() {
        return Err(PairError::ZeroAddress);
    }
    Ok((token0, token1))
}

/// Address of the pair for canonically ordered `(token0, token1)`.
pub fn pair_address(token0: &Address, token1: &Address) -> Address {
    Address::derive("puddel/pair", &[token0.as_bytes(), token1.as_bytes()])
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PairRegistry {
    pairs: BTreeMap<Address, Pair>,
    by_tokens: BTreeMap<(Address, Address), Address>,
    all_pairs: Vec<Address>,
    /// Recipient of the protocol's LP fee share; `None` turns the fee off.
    fee_to: Option<Address>,
    fee_to_setter: Address,
}

impl PairRegistry {
    pub fn new(fee_to_setter: Address) -> Self {
        Self {
            pairs: BTreeMap::new(),
            by_tokens: BTreeMap::new(),
            all_pairs: Vec::new(),
            fee_to: None,
            fee_to_setter,
        }
    }

    /// Create the pair for `(a, b)` and register its LP share token.
    pub fn create_pair<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        a: &Address,
        b: &Address,
    ) -> Result<Address, PairError> {
        let (token0, token1) = sort_tokens(a, b)?;
        if let Some(existing) = self.by_tokens.get(&(token0, token1)) {
            return Err(PairError::PairExists(*existing));
        }
        let address = pair_address(&token0, &token1);
        bank.create_token(address, "PDL-LP", address)?;
        self.pairs.insert(address, Pair::new(address, token0, token1));
        self.by_tokens.insert((token0, token1), address);
        self.all_pairs.push(address);
        info!(target: "pair", pair = %address, %token0, %token1, index = self.all_pairs.len() - 1, "pair created");
        Ok(address)
    }

    /// Order-insensitive lookup.
    pub fn get_pair(&self, a: &Address, b: &Address) -> Option<Address> {
        let (token0, token1) = sort_tokens(a, b).ok()?;
        self.by_tokens.get(&(token0, token1)).copied()
    }

    pub fn pair(&self, address: &Address) -> Result<&Pair, PairError> {
        self.pairs
            .get(address)
            .ok_or(PairError::UnknownPair(*address))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.pairs.contains_key(address)
    }

    /// Pairs in creation order.
    pub fn all_pairs(&self) -> &[Address] {
        &self.all_pairs
    }

    pub fn all_pairs_length(&self) -> usize {
        self.all_pairs.len()
    }

    pub fn fee_to(&self) -> Option<Address> {
        self.fee_to
    }

    pub fn fee_to_setter(&self) -> Address {
        self.fee_to_setter
    }

    /// Returns the previous recipient.
    pub fn set_fee_to(
        &mut self,
        caller: &Address,
        fee_to: Option<Address>,
    ) -> Result<Option<Address>, PairError> {
        if *caller != self.fee_to_setter {
            return Err(PairError::Forbidden);
        }
        Ok(std::mem::replace(&mut self.fee_to, fee_to))
    }

    pub fn set_fee_to_setter(
        &mut self,
        caller: &Address,
        setter: Address,
    ) -> Result<Address, PairError> {
        if *caller != self.fee_to_setter {
            return Err(PairError::Forbidden);
        }
        Ok(std::mem::replace(&mut self.fee_to_setter, setter))
    }

    fn pair_mut(&mut self, address: &Address) -> Result<&mut Pair, PairError> {
        self.pairs
            .get_mut(address)
            .ok_or(PairError::UnknownPair(*address))
    }

    pub fn mint<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        pair: &Address,
        to: &Address,
        now: Timestamp,
    ) -> Result<u128, PairError> {
        let fee_to = self.fee_to;
        self.pair_mut(pair)?.mint(bank, fee_to.as_ref(), to, now)
    }

    pub fn burn<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        pair: &Address,
        to: &Address,
        now: Timestamp,
    ) -> Result<(u128, u128), PairError> {
        let fee_to = self.fee_to;
        self.pair_mut(pair)?.burn(bank, fee_to.as_ref(), to, now)
    }

    pub fn swap<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        pair: &Address,
        amount0_out: u128,
        amount1_out: u128,
        to: &Address,
        now: Timestamp,
    ) -> Result<SwapOutcome, PairError> {
        self.pair_mut(pair)?
            .swap(bank, amount0_out, amount1_out, to, now)
    }

    pub fn skim<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        pair: &Address,
        to: &Address,
    ) -> Result<(u128, u128), PairError> {
        self.pair_mut(pair)?.skim(bank, to)
    }

    pub fn sync<B: TokenBank + ?Sized>(
        &mut self,
        bank: &B,
        pair: &Address,
        now: Timestamp,
    ) -> Result<(), PairError> {
        self.pair_mut(pair)?.sync(bank, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_token::TokenLedger;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn sort_tokens_is_canonical() {
        let (a, b) = (addr("a"), addr("b"));
        assert_eq!(sort_tokens(&a, &b).unwrap(), sort_tokens(&b, &a).unwrap());
        let (t0, t1) = sort_tokens(&a, &b).unwrap();
        assert!(t0 < t1);
    }

    #[test]
    fn sort_tokens_rejects_identical_and_zero() {
        let a = addr("a");
        assert_eq!(sort_tokens(&a, &a), Err(PairError::IdenticalTokens));
        assert_eq!(sort_tokens(&a, &Address::ZERO), Err(PairError::ZeroAddress));
    }

    #[test]
    fn create_pair_registers_lp_token_and_rejects_duplicates() {
        let mut bank = TokenLedger::new();
        let mut registry = PairRegistry::new(addr("admin"));
        let (a, b) = (addr("a"), addr("b"));
        let pair = registry.create_pair(&mut bank, &a, &b).unwrap();

        let (t0, t1) = sort_tokens(&a, &b).unwrap();
        assert_eq!(pair, pair_address(&t0, &t1));
        assert!(bank.exists(&pair));
        assert_eq!(registry.get_pair(&b, &a), Some(pair));
        assert_eq!(registry.all_pairs(), &[pair]);
        assert_eq!(
            registry.create_pair(&mut bank, &b, &a),
            Err(PairError::PairExists(pair))
        );
    }

    #[test]
    fn pair_address_depends_on_both_tokens() {
        let (a, b, c) = (addr("a"), addr("b"), addr("c"));
        assert_ne!(pair_address(&a, &b), pair_address(&a, &c));
        assert_eq!(pair_address(&a, &b), pair_address(&a, &b));
    }

    #[test]
    fn fee_to_is_setter_gated() {
        let mut registry = PairRegistry::new(addr("admin"));
        assert_eq!(
            registry.set_fee_to(&addr("mallory"), Some(addr("mallory"))),
            Err(PairError::Forbidden)
        );
        let previous = registry.set_fee_to(&addr("admin"), Some(addr("fees"))).unwrap();
        assert_eq!(previous, None);
        assert_eq!(registry.fee_to(), Some(addr("fees")));

        registry.set_fee_to_setter(&addr("admin"), addr("ops")).unwrap();
        assert_eq!(
            registry.set_fee_to(&addr("admin"), None),
            Err(PairError::Forbidden)
        );
    }

    #[test]
    fn operations_on_unknown_pair_fail() {
        let mut bank = TokenLedger::new();
        let mut registry = PairRegistry::new(addr("admin"));
        let ghost = addr("ghost");
        assert_eq!(
            registry.mint(&mut bank, &ghost, &addr("lp"), Timestamp::EPOCH),
            Err(PairError::UnknownPair(ghost))
        );
    }
}

//! A single constant-product trading pair.
//!
//! Amounts deposited into the pair are inferred from the pair's own token
//! balances minus its last recorded reserves, so callers first transfer tokens
//! to [`Pair::address`] and then call `mint` or `swap`. The swap invariant is
//! checked against the *expected* post-transfer balances before any output
//! leaves the pair, and reserves are re-synced from the actual balances after.

use crate::error::PairError;
use puddel_math::{mul_div, product, sqrt_product, to_u128, SafeMath, U256};
use puddel_token::TokenBank;
use puddel_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Swap fee in basis points (0.25%).
pub const FEE_BPS: u128 = 25;

const FEE_DENOMINATOR: u128 = 10_000;

/// Shares permanently locked at the zero address on the first deposit.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Reserves are capped at 112 bits so `reserve0 * reserve1` fits 224 bits.
pub const MAX_RESERVE: u128 = (1u128 << 112) - 1;

/// What a swap actually took in and paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub amount0_in: u128,
    pub amount1_in: u128,
    pub amount0_out: u128,
    pub amount1_out: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// Pair address; also the id of its LP share token.
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: Timestamp,
    /// `reserve0 * reserve1` as of the last liquidity event, while the protocol fee is on.
    #[serde(with = "puddel_math::serde_u256")]
    pub k_last: U256,
}

impl Pair {
    pub fn new(address: Address, token0: Address, token1: Address) -> Self {
        Self {
            address,
            token0,
            token1,
            reserve0: 0,
            reserve1: 0,
            block_timestamp_last: Timestamp::EPOCH,
            k_last: U256::zero(),
        }
    }

    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve0, self.reserve1)
    }

    /// Reserves ordered to match `(token_a, token_b)`.
    pub fn reserves_for(&self, token_a: &Address) -> (u128, u128) {
        if *token_a == self.token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    pub fn lp_token(&self) -> Address {
        self.address
    }

    fn balances<B: TokenBank + ?Sized>(&self, bank: &B) -> (u128, u128) {
        (
            bank.balance_of(&self.token0, &self.address),
            bank.balance_of(&self.token1, &self.address),
        )
    }

    fn update(&mut self, balance0: u128, balance1: u128, now: Timestamp) -> Result<(), PairError> {
        if balance0 > MAX_RESERVE {
            return Err(PairError::ReserveOverflow(balance0));
        }
        if balance1 > MAX_RESERVE {
            return Err(PairError::ReserveOverflow(balance1));
        }
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        self.block_timestamp_last = now;
        Ok(())
    }

    /// Mint the protocol's share of fee growth to `fee_to`.
    ///
    /// Mints `supply * (√k − √kLast) / (5·√k + √kLast)` shares, i.e. one sixth of
    /// the growth in `√k` since the last liquidity event. Returns whether the fee is on.
    fn mint_fee<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        fee_to: Option<&Address>,
    ) -> Result<bool, PairError> {
        let Some(fee_to) = fee_to else {
            self.k_last = U256::zero();
            return Ok(false);
        };
        if self.k_last.is_zero() {
            return Ok(true);
        }
        let root_k = sqrt_product(self.reserve0, self.reserve1);
        let root_k_last = self.k_last.integer_sqrt().low_u128();
        if root_k > root_k_last {
            let supply = bank.total_supply(&self.address);
            let numerator = product(supply, root_k - root_k_last);
            let denominator = U256::from(root_k) * U256::from(5u8) + U256::from(root_k_last);
            let liquidity = to_u128(numerator / denominator)?;
            if liquidity > 0 {
                bank.mint(&self.address, &self.address, fee_to, liquidity)?;
                debug!(target: "pair", pair = %self.address, %fee_to, liquidity, "protocol fee minted");
            }
        }
        Ok(true)
    }

    /// Mint LP shares for whatever was deposited since the last reserve update.
    pub fn mint<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        fee_to: Option<&Address>,
        to: &Address,
        now: Timestamp,
    ) -> Result<u128, PairError> {
        let (balance0, balance1) = self.balances(&*bank);
        let amount0 = balance0.safe_sub(self.reserve0)?;
        let amount1 = balance1.safe_sub(self.reserve1)?;

        let fee_on = self.mint_fee(bank, fee_to)?;
        let supply = bank.total_supply(&self.address);
        let liquidity = if supply == 0 {
            let liquidity = sqrt_product(amount0, amount1)
                .checked_sub(MINIMUM_LIQUIDITY)
                .ok_or(PairError::InsufficientLiquidityMinted)?;
            bank.mint(&self.address, &self.address, &Address::ZERO, MINIMUM_LIQUIDITY)?;
            liquidity
        } else {
            mul_div(amount0, supply, self.reserve0)?.min(mul_div(amount1, supply, self.reserve1)?)
        };
        if liquidity == 0 {
            return Err(PairError::InsufficientLiquidityMinted);
        }
        bank.mint(&self.address, &self.address, to, liquidity)?;

        self.update(balance0, balance1, now)?;
        if fee_on {
            self.k_last = product(self.reserve0, self.reserve1);
        }
        info!(target: "pair", pair = %self.address, %to, amount0, amount1, liquidity, "liquidity minted");
        Ok(liquidity)
    }

    /// Burn the LP shares held by the pair itself and pay out both tokens pro rata.
    pub fn burn<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        fee_to: Option<&Address>,
        to: &Address,
        now: Timestamp,
    ) -> Result<(u128, u128), PairError> {
        let (balance0, balance1) = self.balances(&*bank);
        let liquidity = bank.balance_of(&self.address, &self.address);

        let fee_on = self.mint_fee(bank, fee_to)?;
        let supply = bank.total_supply(&self.address);
        if supply == 0 {
            return Err(PairError::InsufficientLiquidityBurned);
        }
        let amount0 = mul_div(liquidity, balance0, supply)?;
        let amount1 = mul_div(liquidity, balance1, supply)?;
        if amount0 == 0 || amount1 == 0 {
            return Err(PairError::InsufficientLiquidityBurned);
        }
        bank.burn(&self.address, &self.address, liquidity)?;

        // Effects first: reserves reflect the payout before any token leaves.
        self.update(balance0 - amount0, balance1 - amount1, now)?;
        if fee_on {
            self.k_last = product(self.reserve0, self.reserve1);
        }

        bank.transfer(&self.token0, &self.address, to, amount0)?;
        bank.transfer(&self.token1, &self.address, to, amount1)?;
        self.sync(&*bank, now)?;

        info!(target: "pair", pair = %self.address, %to, amount0, amount1, liquidity, "liquidity burned");
        Ok((amount0, amount1))
    }

    /// Pay out `amount0_out`/`amount1_out` against input already sent to the pair.
    pub fn swap<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        amount0_out: u128,
        amount1_out: u128,
        to: &Address,
        now: Timestamp,
    ) -> Result<SwapOutcome, PairError> {
        if amount0_out == 0 && amount1_out == 0 {
            return Err(PairError::InsufficientOutputAmount);
        }
        if amount0_out >= self.reserve0 {
            return Err(PairError::InsufficientLiquidity {
                requested: amount0_out,
                reserve: self.reserve0,
            });
        }
        if amount1_out >= self.reserve1 {
            return Err(PairError::InsufficientLiquidity {
                requested: amount1_out,
                reserve: self.reserve1,
            });
        }
        if *to == self.token0 || *to == self.token1 {
            return Err(PairError::InvalidRecipient);
        }

        let (balance0, balance1) = self.balances(&*bank);
        let expected0 = balance0.safe_sub(amount0_out)?;
        let expected1 = balance1.safe_sub(amount1_out)?;
        let amount0_in = expected0.saturating_sub(self.reserve0 - amount0_out);
        let amount1_in = expected1.saturating_sub(self.reserve1 - amount1_out);
        if amount0_in == 0 && amount1_in == 0 {
            return Err(PairError::InsufficientInputAmount);
        }

        let scale = U256::from(FEE_DENOMINATOR);
        let adjusted0 = U256::from(expected0) * scale - U256::from(amount0_in) * U256::from(FEE_BPS);
        let adjusted1 = U256::from(expected1) * scale - U256::from(amount1_in) * U256::from(FEE_BPS);
        let before = product(self.reserve0, self.reserve1);
        let after = adjusted0 * adjusted1;
        if after < before * scale * scale {
            return Err(PairError::InvariantViolated {
                before,
                after: after / (scale * scale),
            });
        }

        self.update(expected0, expected1, now)?;
        if amount0_out > 0 {
            bank.transfer(&self.token0, &self.address, to, amount0_out)?;
        }
        if amount1_out > 0 {
            bank.transfer(&self.token1, &self.address, to, amount1_out)?;
        }
        self.sync(&*bank, now)?;

        let outcome = SwapOutcome {
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
        };
        debug!(target: "pair", pair = %self.address, %to, ?outcome, "swap");
        Ok(outcome)
    }

    /// Send any balance above the reserves to `to`.
    pub fn skim<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        to: &Address,
    ) -> Result<(u128, u128), PairError> {
        let (balance0, balance1) = self.balances(&*bank);
        let excess0 = balance0.safe_sub(self.reserve0)?;
        let excess1 = balance1.safe_sub(self.reserve1)?;
        if excess0 > 0 {
            bank.transfer(&self.token0, &self.address, to, excess0)?;
        }
        if excess1 > 0 {
            bank.transfer(&self.token1, &self.address, to, excess1)?;
        }
        debug!(target: "pair", pair = %self.address, %to, excess0, excess1, "skim");
        Ok((excess0, excess1))
    }

    /// Force reserves to match the pair's actual balances.
    pub fn sync<B: TokenBank + ?Sized>(
        &mut self,
        bank: &B,
        now: Timestamp,
    ) -> Result<(), PairError> {
        let (balance0, balance1) = self.balances(&*bank);
        self.update(balance0, balance1, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_token::TokenLedger;

    const NOW: Timestamp = Timestamp::EPOCH;

    struct Fixture {
        bank: TokenLedger,
        pair: Pair,
        lp: Address,
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn fixture() -> Fixture {
        let mut bank = TokenLedger::new();
        let (t0, t1) = crate::registry::sort_tokens(&addr("tokenA"), &addr("tokenB")).unwrap();
        let pair_addr = crate::registry::pair_address(&t0, &t1);
        let minter = addr("faucet");
        bank.create_token(t0, "A", minter).unwrap();
        bank.create_token(t1, "B", minter).unwrap();
        bank.create_token(pair_addr, "LP", pair_addr).unwrap();
        bank.mint(&t0, &minter, &addr("lp"), 1_000_000_000).unwrap();
        bank.mint(&t1, &minter, &addr("lp"), 1_000_000_000).unwrap();
        bank.mint(&t0, &minter, &addr("trader"), 1_000_000_000).unwrap();
        bank.mint(&t1, &minter, &addr("trader"), 1_000_000_000).unwrap();
        Fixture {
            bank,
            pair: Pair::new(pair_addr, t0, t1),
            lp: addr("lp"),
        }
    }

    fn deposit(f: &mut Fixture, amount0: u128, amount1: u128) -> u128 {
        let (t0, t1, p) = (f.pair.token0, f.pair.token1, f.pair.address);
        f.bank.transfer(&t0, &f.lp, &p, amount0).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, amount1).unwrap();
        f.pair.mint(&mut f.bank, None, &f.lp, NOW).unwrap()
    }

    #[test]
    fn first_mint_locks_minimum_liquidity() {
        let mut f = fixture();
        let liquidity = deposit(&mut f, 1_000_000, 4_000_000);
        assert_eq!(liquidity, 2_000_000 - MINIMUM_LIQUIDITY);
        assert_eq!(f.bank.balance_of(&f.pair.address, &Address::ZERO), MINIMUM_LIQUIDITY);
        assert_eq!(f.bank.total_supply(&f.pair.address), 2_000_000);
        assert_eq!(f.pair.reserves(), (1_000_000, 4_000_000));
    }

    #[test]
    fn first_mint_below_minimum_fails() {
        let mut f = fixture();
        let (t0, t1, p) = (f.pair.token0, f.pair.token1, f.pair.address);
        f.bank.transfer(&t0, &f.lp, &p, 1_000).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, 1_000).unwrap();
        assert_eq!(
            f.pair.mint(&mut f.bank, None, &f.lp, NOW),
            Err(PairError::InsufficientLiquidityMinted)
        );
    }

    #[test]
    fn later_mint_takes_the_smaller_ratio() {
        let mut f = fixture();
        deposit(&mut f, 1_000_000, 1_000_000);
        let liquidity = deposit(&mut f, 500_000, 1_000_000);
        assert_eq!(liquidity, 500_000);
    }

    #[test]
    fn burn_returns_pro_rata_share() {
        let mut f = fixture();
        let liquidity = deposit(&mut f, 1_000_000, 1_000_000);
        let p = f.pair.address;
        f.bank.transfer(&p, &f.lp, &p, liquidity).unwrap();
        let (a0, a1) = f.pair.burn(&mut f.bank, None, &f.lp, NOW).unwrap();
        assert_eq!((a0, a1), (999_000, 999_000));
        assert_eq!(f.pair.reserves(), (1_000, 1_000));
        assert_eq!(f.bank.total_supply(&p), MINIMUM_LIQUIDITY);
    }

    #[test]
    fn burn_with_nothing_to_burn_fails() {
        let mut f = fixture();
        deposit(&mut f, 1_000_000, 1_000_000);
        assert_eq!(
            f.pair.burn(&mut f.bank, None, &f.lp, NOW),
            Err(PairError::InsufficientLiquidityBurned)
        );
    }

    #[test]
    fn swap_at_quoted_output_succeeds() {
        let mut f = fixture();
        deposit(&mut f, 5_000_000, 10_000_000);
        let (t0, p, trader) = (f.pair.token0, f.pair.address, addr("trader"));
        let out = crate::library::get_amount_out(1_000_000, 5_000_000, 10_000_000).unwrap();
        f.bank.transfer(&t0, &trader, &p, 1_000_000).unwrap();
        let outcome = f.pair.swap(&mut f.bank, 0, out, &trader, NOW).unwrap();
        assert_eq!(outcome.amount0_in, 1_000_000);
        assert_eq!(outcome.amount1_out, out);
        assert_eq!(f.pair.reserves(), (6_000_000, 10_000_000 - out));
    }

    #[test]
    fn swap_one_unit_above_quote_violates_invariant() {
        let mut f = fixture();
        deposit(&mut f, 5_000_000, 10_000_000);
        let (t0, p, trader) = (f.pair.token0, f.pair.address, addr("trader"));
        let out = crate::library::get_amount_out(1_000_000, 5_000_000, 10_000_000).unwrap();
        f.bank.transfer(&t0, &trader, &p, 1_000_000).unwrap();
        let before = f.bank.balance_of(&f.pair.token1, &trader);
        let err = f.pair.swap(&mut f.bank, 0, out + 1, &trader, NOW).unwrap_err();
        assert!(matches!(err, PairError::InvariantViolated { .. }));
        // Nothing left the pair.
        assert_eq!(f.bank.balance_of(&f.pair.token1, &trader), before);
        assert_eq!(f.pair.reserves(), (5_000_000, 10_000_000));
    }

    #[test]
    fn swap_without_input_fails() {
        let mut f = fixture();
        deposit(&mut f, 5_000_000, 10_000_000);
        assert_eq!(
            f.pair.swap(&mut f.bank, 0, 10, &addr("trader"), NOW),
            Err(PairError::InsufficientInputAmount)
        );
    }

    #[test]
    fn swap_rejects_zero_output_and_full_drain() {
        let mut f = fixture();
        deposit(&mut f, 5_000_000, 10_000_000);
        assert_eq!(
            f.pair.swap(&mut f.bank, 0, 0, &addr("trader"), NOW),
            Err(PairError::InsufficientOutputAmount)
        );
        assert!(matches!(
            f.pair.swap(&mut f.bank, 0, 10_000_000, &addr("trader"), NOW),
            Err(PairError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn swap_to_a_pair_token_rejected() {
        let mut f = fixture();
        deposit(&mut f, 5_000_000, 10_000_000);
        let t0 = f.pair.token0;
        assert_eq!(
            f.pair.swap(&mut f.bank, 0, 10, &t0, NOW),
            Err(PairError::InvalidRecipient)
        );
    }

    #[test]
    fn skim_and_sync_reconcile_direct_transfers() {
        let mut f = fixture();
        deposit(&mut f, 1_000_000, 1_000_000);
        let (t0, p) = (f.pair.token0, f.pair.address);
        f.bank.transfer(&t0, &f.lp, &p, 500).unwrap();
        let skimmed = f.pair.skim(&mut f.bank, &addr("sweeper")).unwrap();
        assert_eq!(skimmed, (500, 0));
        assert_eq!(f.bank.balance_of(&t0, &addr("sweeper")), 500);

        f.bank.transfer(&t0, &f.lp, &p, 700).unwrap();
        f.pair.sync(&f.bank, Timestamp::new(9)).unwrap();
        assert_eq!(f.pair.reserves(), (1_000_700, 1_000_000));
        assert_eq!(f.pair.block_timestamp_last, Timestamp::new(9));
    }

    #[test]
    fn protocol_fee_is_a_sixth_of_fee_growth() {
        let mut f = fixture();
        let fee_to = addr("fee_to");
        let (t0, t1, p, trader) = (f.pair.token0, f.pair.token1, f.pair.address, addr("trader"));
        f.bank.transfer(&t0, &f.lp, &p, 100_000_000).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, 100_000_000).unwrap();
        f.pair.mint(&mut f.bank, Some(&fee_to), &f.lp, NOW).unwrap();
        assert!(!f.pair.k_last.is_zero());

        // Trade back and forth to accrue fees.
        for _ in 0..10 {
            let (r0, r1) = f.pair.reserves();
            let out = crate::library::get_amount_out(10_000_000, r0, r1).unwrap();
            f.bank.transfer(&t0, &trader, &p, 10_000_000).unwrap();
            f.pair.swap(&mut f.bank, 0, out, &trader, NOW).unwrap();
            let (r0, r1) = f.pair.reserves();
            let back = crate::library::get_amount_out(out, r1, r0).unwrap();
            f.bank.transfer(&t1, &trader, &p, out).unwrap();
            f.pair.swap(&mut f.bank, back, 0, &trader, NOW).unwrap();
        }

        // A liquidity event crystallises the protocol share.
        f.bank.transfer(&t0, &f.lp, &p, 1_000).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, 1_000).unwrap();
        f.pair.mint(&mut f.bank, Some(&fee_to), &f.lp, NOW).unwrap();
        let fee_shares = f.bank.balance_of(&p, &fee_to);
        assert!(fee_shares > 0);
        assert!(f.bank.unbalanced_tokens().is_empty());
    }

    #[test]
    fn fee_off_clears_k_last() {
        let mut f = fixture();
        let fee_to = addr("fee_to");
        let (t0, t1, p) = (f.pair.token0, f.pair.token1, f.pair.address);
        f.bank.transfer(&t0, &f.lp, &p, 1_000_000).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, 1_000_000).unwrap();
        f.pair.mint(&mut f.bank, Some(&fee_to), &f.lp, NOW).unwrap();
        assert!(!f.pair.k_last.is_zero());
        deposit(&mut f, 1_000, 1_000);
        assert!(f.pair.k_last.is_zero());
    }

    #[test]
    fn reserve_cap_enforced() {
        let mut f = fixture();
        let (t0, t1, p) = (f.pair.token0, f.pair.token1, f.pair.address);
        f.bank.mint(&t0, &addr("faucet"), &p, MAX_RESERVE + 1).unwrap();
        f.bank.transfer(&t1, &f.lp, &p, 1_000_000).unwrap();
        assert_eq!(
            f.pair.mint(&mut f.bank, None, &f.lp, NOW),
            Err(PairError::ReserveOverflow(MAX_RESERVE + 1))
        );
    }
}

//! Harvesting and splitting protocol fees.

use crate::error::FeeError;
use puddel_math::{apply_bps, SafeMath};
use puddel_pair::library::get_amount_out;
use puddel_pair::{PairError, PairRegistry};
use puddel_token::TokenBank;
use puddel_types::{Address, FeeSplits, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Where each share of harvested fees goes. Burned value has no destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destinations {
    pub stakers: Address,
    pub treasury: Address,
    pub emergency: Address,
}

impl Destinations {
    fn validate(&self) -> Result<(), FeeError> {
        for (name, address) in [
            ("stakers", self.stakers),
            ("treasury", self.treasury),
            ("emergency", self.emergency),
        ] {
            if address.is_zero() {
                return Err(FeeError::ZeroDestination(name));
            }
        }
        Ok(())
    }
}

/// How one redeemed token was divided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSplit {
    pub token: Address,
    pub amount: u128,
    pub stakers: u128,
    /// Includes the rounding remainder, plus the burn share when it was forwarded.
    pub treasury: u128,
    pub emergency: u128,
    /// Burn share in units of `token`.
    pub burn: u128,
    /// Governance tokens actually destroyed.
    pub burned: u128,
    /// The burn share went to the treasury because no direct route to the
    /// governance token exists.
    pub burn_forwarded: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvest {
    pub pool: Address,
    /// LP shares redeemed. Zero means nothing was pending.
    pub liquidity: u128,
    pub splits: Vec<TokenSplit>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDistributor {
    /// Receives protocol LP fee shares; set as the registry's `fee_to`.
    address: Address,
    gov_token: Address,
    splits: FeeSplits,
    destinations: Destinations,
    /// token → lifetime harvested amount.
    harvested: BTreeMap<Address, u128>,
    total_burned: u128,
}

impl FeeDistributor {
    pub fn new(
        address: Address,
        gov_token: Address,
        splits: FeeSplits,
        destinations: Destinations,
    ) -> Result<Self, FeeError> {
        splits.validate()?;
        destinations.validate()?;
        Ok(Self {
            address,
            gov_token,
            splits,
            destinations,
            harvested: BTreeMap::new(),
            total_burned: 0,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn splits(&self) -> FeeSplits {
        self.splits
    }

    pub fn destinations(&self) -> Destinations {
        self.destinations
    }

    pub fn harvested(&self, token: &Address) -> u128 {
        self.harvested.get(token).copied().unwrap_or(0)
    }

    pub fn total_burned(&self) -> u128 {
        self.total_burned
    }

    /// LP shares of `pool` waiting to be harvested.
    pub fn pending<B: TokenBank + ?Sized>(&self, bank: &B, pool: &Address) -> u128 {
        bank.balance_of(pool, &self.address)
    }

    /// Redeem the distributor's LP shares of `pool` and split both tokens.
    pub fn harvest<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        registry: &mut PairRegistry,
        pool: &Address,
        now: Timestamp,
    ) -> Result<Harvest, FeeError> {
        let (token0, token1) = {
            let pair = registry.pair(pool)?;
            (pair.token0, pair.token1)
        };
        let liquidity = self.pending(&*bank, pool);
        if liquidity == 0 {
            debug!(target: "fees", %pool, "nothing to harvest");
            return Ok(Harvest {
                pool: *pool,
                ..Harvest::default()
            });
        }

        bank.transfer(pool, &self.address, pool, liquidity)?;
        let (amount0, amount1) = registry.burn(bank, pool, &self.address, now)?;

        let splits = vec![
            self.split(bank, registry, &token0, amount0, now)?,
            self.split(bank, registry, &token1, amount1, now)?,
        ];
        info!(target: "fees", %pool, liquidity, amount0, amount1, "fees harvested");
        Ok(Harvest {
            pool: *pool,
            liquidity,
            splits,
        })
    }

    fn split<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        registry: &mut PairRegistry,
        token: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<TokenSplit, FeeError> {
        let stakers = apply_bps(amount, self.splits.stakers_bps)?;
        let emergency = apply_bps(amount, self.splits.emergency_bps)?;
        let burn = apply_bps(amount, self.splits.burn_bps)?;
        let mut treasury = amount.safe_sub(stakers)?.safe_sub(emergency)?.safe_sub(burn)?;

        let (burned, burn_forwarded) = self.buy_and_burn(bank, registry, token, burn, now)?;
        if burn_forwarded {
            treasury = treasury.safe_add(burn)?;
        }

        let Destinations {
            stakers: to_stakers,
            treasury: to_treasury,
            emergency: to_emergency,
        } = self.destinations;
        for (to, share) in [(to_stakers, stakers), (to_treasury, treasury), (to_emergency, emergency)] {
            if share > 0 {
                bank.transfer(token, &self.address, &to, share)?;
            }
        }

        let harvested = self.harvested(token).safe_add(amount)?;
        self.harvested.insert(*token, harvested);
        self.total_burned = self.total_burned.safe_add(burned)?;
        Ok(TokenSplit {
            token: *token,
            amount,
            stakers,
            treasury,
            emergency,
            burn,
            burned,
            burn_forwarded,
        })
    }

    /// Burn `amount` of `token`, swapping it into the governance token first
    /// through the direct pair. Returns the governance tokens burned and
    /// whether the share has to be forwarded instead.
    fn buy_and_burn<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        registry: &mut PairRegistry,
        token: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(u128, bool), FeeError> {
        if amount == 0 {
            return Ok((0, false));
        }
        if *token == self.gov_token {
            bank.burn(token, &self.address, amount)?;
            return Ok((amount, false));
        }
        let Some(route) = registry.get_pair(token, &self.gov_token) else {
            warn!(target: "fees", %token, amount, "no direct pair to the governance token, burn share forwarded");
            return Ok((0, true));
        };
        let pair = registry.pair(&route)?;
        let (reserve_in, reserve_out) = pair.reserves_for(token);
        let out = match get_amount_out(amount, reserve_in, reserve_out) {
            Ok(0) => {
                warn!(target: "fees", %token, amount, "burn share too small to swap, forwarded");
                return Ok((0, true));
            }
            Ok(out) => out,
            Err(PairError::InsufficientLiquidity { .. }) => {
                warn!(target: "fees", %token, amount, %route, "direct pair is empty, burn share forwarded");
                return Ok((0, true));
            }
            Err(e) => return Err(e.into()),
        };
        let (out0, out1) = if pair.token0 == *token {
            (0, out)
        } else {
            (out, 0)
        };

        bank.transfer(token, &self.address, &route, amount)?;
        registry.swap(bank, &route, out0, out1, &self.address, now)?;
        bank.burn(&self.gov_token, &self.address, out)?;
        debug!(target: "fees", %token, amount, burned = out, "bought back and burned");
        Ok((out, false))
    }

    /// Returns the previous splits.
    pub fn set_splits(&mut self, splits: FeeSplits) -> Result<FeeSplits, FeeError> {
        splits.validate()?;
        let old = std::mem::replace(&mut self.splits, splits);
        info!(target: "fees", ?old, new = ?splits, "fee splits changed");
        Ok(old)
    }

    pub fn set_destinations(&mut self, destinations: Destinations) -> Result<Destinations, FeeError> {
        destinations.validate()?;
        let old = std::mem::replace(&mut self.destinations, destinations);
        info!(target: "fees", ?old, new = ?destinations, "fee destinations changed");
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_pair::router::{add_liquidity, swap_exact_tokens_for_tokens};
    use puddel_pair::{AddLiquidity, LiquidityAdded};
    use puddel_token::TokenLedger;
    use puddel_types::ParamsError;

    const NOW: Timestamp = Timestamp::EPOCH;
    const FOREVER: Timestamp = Timestamp::new(u64::MAX);

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn destinations() -> Destinations {
        Destinations {
            stakers: addr("stakers"),
            treasury: addr("treasury"),
            emergency: addr("emergency"),
        }
    }

    struct Fixture {
        bank: TokenLedger,
        registry: PairRegistry,
        fees: FeeDistributor,
    }

    fn fixture() -> Fixture {
        let mut bank = TokenLedger::new();
        for symbol in ["A", "B", "G"] {
            let token = addr(symbol);
            bank.create_token(token, symbol, addr("faucet")).unwrap();
            bank.mint(&token, &addr("faucet"), &addr("alice"), 1_000_000_000).unwrap();
        }
        let fees = FeeDistributor::new(addr("fees"), addr("G"), FeeSplits::default(), destinations()).unwrap();
        let mut registry = PairRegistry::new(addr("admin"));
        registry.set_fee_to(&addr("admin"), Some(fees.address())).unwrap();
        Fixture { bank, registry, fees }
    }

    fn add(f: &mut Fixture, a: &str, b: &str, amount: u128) -> LiquidityAdded {
        let request = AddLiquidity {
            token_a: addr(a),
            token_b: addr(b),
            amount_a_desired: amount,
            amount_b_desired: amount,
            amount_a_min: 0,
            amount_b_min: 0,
            to: addr("alice"),
            deadline: FOREVER,
        };
        add_liquidity(&mut f.registry, &mut f.bank, &addr("alice"), &request, NOW).unwrap()
    }

    #[test]
    fn harvest_splits_four_ways() {
        let mut f = fixture();
        let pool = add(&mut f, "A", "B", 1_000_000).pair;
        add(&mut f, "A", "G", 1_000_000);
        f.bank.transfer(&pool, &addr("alice"), &f.fees.address(), 10_000).unwrap();

        let harvest = f.fees.harvest(&mut f.bank, &mut f.registry, &pool, NOW).unwrap();
        assert_eq!(harvest.liquidity, 10_000);
        let split_of = |token: &str| *harvest.splits.iter().find(|s| s.token == addr(token)).unwrap();

        let a = split_of("A");
        assert_eq!((a.amount, a.stakers, a.treasury, a.emergency, a.burn), (10_000, 5_000, 2_000, 1_000, 2_000));
        assert!(!a.burn_forwarded);
        assert!(a.burned > 0);

        // B has no direct pair with G: its burn share lands in the treasury.
        let b = split_of("B");
        assert!(b.burn_forwarded);
        assert_eq!(b.treasury, 4_000);
        assert_eq!(f.bank.balance_of(&addr("B"), &addr("treasury")), 4_000);
        assert_eq!(f.bank.balance_of(&addr("A"), &addr("stakers")), 5_000);
        assert_eq!(f.bank.balance_of(&addr("A"), &f.fees.address()), 0);
        assert_eq!(f.bank.balance_of(&addr("G"), &f.fees.address()), 0);
        assert_eq!(f.bank.total_supply(&addr("G")), 1_000_000_000 - a.burned);
        assert_eq!(f.fees.total_burned(), a.burned);
    }

    #[test]
    fn governance_token_is_burned_directly() {
        let mut f = fixture();
        let pool = add(&mut f, "A", "G", 1_000_000).pair;
        f.bank.transfer(&pool, &addr("alice"), &f.fees.address(), 10_000).unwrap();
        let harvest = f.fees.harvest(&mut f.bank, &mut f.registry, &pool, NOW).unwrap();
        let g = harvest.splits.iter().find(|s| s.token == addr("G")).unwrap();
        assert_eq!(g.burned, 2_000);
        assert!(!g.burn_forwarded);
    }

    #[test]
    fn swap_fees_accrue_to_distributor() {
        let mut f = fixture();
        let pool = add(&mut f, "A", "B", 100_000_000).pair;
        for _ in 0..10 {
            swap_exact_tokens_for_tokens(
                &mut f.registry,
                &mut f.bank,
                &addr("alice"),
                1_000_000,
                0,
                &[addr("A"), addr("B")],
                &addr("alice"),
                FOREVER,
                NOW,
            )
            .unwrap();
        }
        // Fee shares are minted on the next liquidity event.
        add(&mut f, "A", "B", 1_000);
        assert!(f.fees.pending(&f.bank, &pool) > 0);
        let harvest = f.fees.harvest(&mut f.bank, &mut f.registry, &pool, NOW).unwrap();
        assert!(harvest.liquidity > 0);
        for split in &harvest.splits {
            assert_eq!(
                split.stakers + split.treasury + split.emergency + if split.burn_forwarded { 0 } else { split.burn },
                split.amount
            );
        }
    }

    #[test]
    fn burn_share_is_forwarded_when_the_swap_cannot_happen() {
        let mut f = fixture();
        let pool = add(&mut f, "A", "B", 1_000_000).pair;
        // B/G exists but holds nothing.
        f.registry.create_pair(&mut f.bank, &addr("B"), &addr("G")).unwrap();
        // A/G is so lopsided that A's burn share buys zero G.
        let lopsided = AddLiquidity {
            token_a: addr("A"),
            token_b: addr("G"),
            amount_a_desired: 900_000_000,
            amount_b_desired: 1_000,
            amount_a_min: 0,
            amount_b_min: 0,
            to: addr("alice"),
            deadline: FOREVER,
        };
        add_liquidity(&mut f.registry, &mut f.bank, &addr("alice"), &lopsided, NOW).unwrap();
        f.bank.transfer(&pool, &addr("alice"), &f.fees.address(), 10_000).unwrap();

        let harvest = f.fees.harvest(&mut f.bank, &mut f.registry, &pool, NOW).unwrap();
        for split in &harvest.splits {
            assert!(split.burn_forwarded, "{split:?}");
            assert_eq!(split.burned, 0);
            assert_eq!(split.treasury, 4_000);
        }
        assert_eq!(f.fees.total_burned(), 0);
        assert_eq!(f.bank.total_supply(&addr("G")), 1_000_000_000);
    }

    #[test]
    fn empty_harvest_is_a_no_op() {
        let mut f = fixture();
        let pool = add(&mut f, "A", "B", 1_000_000).pair;
        let harvest = f.fees.harvest(&mut f.bank, &mut f.registry, &pool, NOW).unwrap();
        assert_eq!(harvest.liquidity, 0);
        assert!(harvest.splits.is_empty());
    }

    #[test]
    fn splits_must_stay_at_one_hundred_percent() {
        let mut f = fixture();
        let bad = FeeSplits {
            stakers_bps: 9_000,
            ..FeeSplits::default()
        };
        assert_eq!(
            f.fees.set_splits(bad),
            Err(FeeError::Params(ParamsError::InvalidSplits { sum: 14_000 }))
        );
        let all_to_stakers = FeeSplits {
            stakers_bps: 10_000,
            treasury_bps: 0,
            burn_bps: 0,
            emergency_bps: 0,
        };
        assert_eq!(f.fees.set_splits(all_to_stakers).unwrap(), FeeSplits::default());
    }

    #[test]
    fn destinations_must_be_set() {
        let mut f = fixture();
        let mut d = destinations();
        d.treasury = Address::ZERO;
        assert_eq!(f.fees.set_destinations(d), Err(FeeError::ZeroDestination("treasury")));
    }
}

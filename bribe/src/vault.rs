//! The incentive vault of a single pool, and the set of all vaults.

use crate::error::BribeError;
use puddel_escrow::{PositionId, PositionOwnership};
use puddel_math::{mul_div, SafeMath};
use puddel_token::TokenBank;
use puddel_types::{Address, Epoch, Timestamp};
use puddel_voter::EpochVoteLedger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One (epoch, token) payout of a claim call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub epoch: Epoch,
    pub token: Address,
    pub amount: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bribe {
    /// Account holding deposited incentives.
    pub address: Address,
    pub pool: Address,
    epoch_length_secs: u64,
    max_future_epochs: u64,
    deposits: BTreeMap<(Epoch, Address), u128>,
    depositors: BTreeMap<(Epoch, Address, Address), u128>,
    claimed: BTreeMap<(Epoch, Address, PositionId), u128>,
}

impl Bribe {
    pub fn new(address: Address, pool: Address, epoch_length_secs: u64, max_future_epochs: u64) -> Self {
        Self {
            address,
            pool,
            epoch_length_secs,
            max_future_epochs,
            deposits: BTreeMap::new(),
            depositors: BTreeMap::new(),
            claimed: BTreeMap::new(),
        }
    }

    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        Epoch::at(now, self.epoch_length_secs)
    }

    pub fn deposited(&self, epoch: Epoch, token: &Address) -> u128 {
        self.deposits.get(&(epoch, *token)).copied().unwrap_or(0)
    }

    pub fn deposited_by(&self, epoch: Epoch, token: &Address, depositor: &Address) -> u128 {
        self.depositors
            .get(&(epoch, *token, *depositor))
            .copied()
            .unwrap_or(0)
    }

    pub fn claimed(&self, epoch: Epoch, token: &Address, id: PositionId) -> Option<u128> {
        self.claimed.get(&(epoch, *token, id)).copied()
    }

    /// Tokens with a deposit recorded for `epoch`.
    pub fn tokens_for(&self, epoch: Epoch) -> Vec<Address> {
        self.deposits
            .range((epoch, Address::ZERO)..)
            .take_while(|((e, _), _)| *e == epoch)
            .map(|((_, token), _)| *token)
            .collect()
    }

    /// Earmark `amount` of `token` for `epoch`'s voters. Pulled from the
    /// depositor with `transfer_from`.
    pub fn deposit_bribe<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        depositor: &Address,
        token: &Address,
        amount: u128,
        epoch: Epoch,
        now: Timestamp,
    ) -> Result<(), BribeError> {
        if amount == 0 {
            return Err(BribeError::ZeroAmount);
        }
        let current = self.current_epoch(now);
        if epoch < current {
            return Err(BribeError::PastEpoch { epoch, current });
        }
        let latest = Epoch::new(current.number().saturating_add(self.max_future_epochs));
        if epoch > latest {
            return Err(BribeError::TooFarAhead { epoch, latest });
        }
        let total = self.deposited(epoch, token).safe_add(amount)?;
        let own = self.deposited_by(epoch, token, depositor).safe_add(amount)?;
        self.deposits.insert((epoch, *token), total);
        self.depositors.insert((epoch, *token, *depositor), own);

        bank.transfer_from(token, &self.address, depositor, &self.address, amount)?;
        info!(target: "bribe", pool = %self.pool, %token, %epoch, %depositor, amount, total, "incentive deposited");
        Ok(())
    }

    /// What position `id` is owed for `(epoch, token)`, ignoring prior claims.
    pub fn entitlement<L: EpochVoteLedger + ?Sized>(
        &self,
        ledger: &L,
        id: PositionId,
        token: &Address,
        epoch: Epoch,
    ) -> Result<u128, BribeError> {
        let pool_weight = ledger.epoch_gauge_weight(epoch, &self.pool);
        if pool_weight == 0 {
            return Ok(0);
        }
        let weight = ledger.position_epoch_weight(epoch, &self.pool, id);
        Ok(mul_div(self.deposited(epoch, token), weight, pool_weight)?)
    }

    /// Pay position `id` its share for each `(tokens[i], epochs[i])`.
    ///
    /// Every listed epoch must have ended. A key already claimed, or one the
    /// position did not vote in, pays zero.
    #[allow(clippy::too_many_arguments)]
    pub fn claim<B, L, P>(
        &mut self,
        bank: &mut B,
        ledger: &L,
        escrow: &P,
        caller: &Address,
        id: PositionId,
        tokens: &[Address],
        epochs: &[Epoch],
        now: Timestamp,
    ) -> Result<Vec<Claim>, BribeError>
    where
        B: TokenBank + ?Sized,
        L: EpochVoteLedger + ?Sized,
        P: PositionOwnership + ?Sized,
    {
        if tokens.len() != epochs.len() {
            return Err(BribeError::LengthMismatch {
                tokens: tokens.len(),
                epochs: epochs.len(),
            });
        }
        match escrow.owner_of(id) {
            None => return Err(BribeError::UnknownPosition(id)),
            Some(owner) if owner != *caller => {
                return Err(BribeError::NotOwner { id, caller: *caller })
            }
            Some(_) => {}
        }
        let current = self.current_epoch(now);
        if let Some(epoch) = epochs.iter().find(|e| **e >= current) {
            return Err(BribeError::EpochNotElapsed {
                epoch: *epoch,
                current,
            });
        }

        let mut payouts = Vec::with_capacity(tokens.len());
        for (token, epoch) in tokens.iter().zip(epochs) {
            let key = (*epoch, *token, id);
            let amount = if self.claimed.contains_key(&key) {
                0
            } else {
                let owed = self.entitlement(ledger, id, token, *epoch)?;
                if owed > 0 {
                    self.claimed.insert(key, owed);
                }
                owed
            };
            payouts.push(Claim {
                epoch: *epoch,
                token: *token,
                amount,
            });
        }

        for payout in payouts.iter().filter(|p| p.amount > 0) {
            bank.transfer(&payout.token, &self.address, caller, payout.amount)?;
            debug!(
                target: "bribe",
                pool = %self.pool,
                id,
                token = %payout.token,
                epoch = %payout.epoch,
                amount = payout.amount,
                "incentive claimed"
            );
        }
        Ok(payouts)
    }

    /// Return `depositor`'s deposit for an ended epoch in which the pool
    /// received no votes.
    pub fn refund<B, L>(
        &mut self,
        bank: &mut B,
        ledger: &L,
        depositor: &Address,
        token: &Address,
        epoch: Epoch,
        now: Timestamp,
    ) -> Result<u128, BribeError>
    where
        B: TokenBank + ?Sized,
        L: EpochVoteLedger + ?Sized,
    {
        let current = self.current_epoch(now);
        if epoch >= current {
            return Err(BribeError::EpochNotElapsed { epoch, current });
        }
        let weight = ledger.epoch_gauge_weight(epoch, &self.pool);
        if weight > 0 {
            return Err(BribeError::EpochHasVotes { epoch, weight });
        }
        let Some(amount) = self.depositors.remove(&(epoch, *token, *depositor)) else {
            return Err(BribeError::NothingToRefund {
                epoch,
                depositor: *depositor,
            });
        };
        let remaining = self.deposited(epoch, token).safe_sub(amount)?;
        if remaining == 0 {
            self.deposits.remove(&(epoch, *token));
        } else {
            self.deposits.insert((epoch, *token), remaining);
        }

        bank.transfer(token, &self.address, depositor, amount)?;
        info!(target: "bribe", pool = %self.pool, %token, %epoch, %depositor, amount, "incentive refunded");
        Ok(amount)
    }
}

/// Every incentive vault, keyed by pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BribeSet {
    bribes: BTreeMap<Address, Bribe>,
}

impl BribeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bribe: Bribe) -> Result<(), BribeError> {
        if self.bribes.contains_key(&bribe.pool) {
            return Err(BribeError::BribeExists(bribe.pool));
        }
        self.bribes.insert(bribe.pool, bribe);
        Ok(())
    }

    pub fn get(&self, pool: &Address) -> Result<&Bribe, BribeError> {
        self.bribes.get(pool).ok_or(BribeError::UnknownBribe(*pool))
    }

    pub fn get_mut(&mut self, pool: &Address) -> Result<&mut Bribe, BribeError> {
        self.bribes
            .get_mut(pool)
            .ok_or(BribeError::UnknownBribe(*pool))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bribe> {
        self.bribes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_token::TokenLedger;
    use puddel_voter::Voter;

    const WEEK: u64 = 7 * 24 * 3600;

    #[derive(Default)]
    struct FixedPower(BTreeMap<PositionId, (Address, u128)>);

    impl PositionOwnership for FixedPower {
        fn owner_of(&self, id: PositionId) -> Option<Address> {
            self.0.get(&id).map(|(owner, _)| *owner)
        }

        fn voting_power(&self, id: PositionId, _now: Timestamp) -> u128 {
            self.0.get(&id).map_or(0, |(_, power)| *power)
        }
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    struct Fixture {
        bank: TokenLedger,
        voter: Voter,
        escrow: FixedPower,
        bribe: Bribe,
        usdc: Address,
    }

    fn fixture() -> Fixture {
        let (pool, usdc, sponsor) = (addr("pool"), addr("usdc"), addr("sponsor"));
        let bribe = Bribe::new(addr("bribe"), pool, WEEK, 52);
        let mut bank = TokenLedger::new();
        bank.create_token(usdc, "USDC", usdc).unwrap();
        bank.mint(&usdc, &usdc, &sponsor, 1_000_000).unwrap();
        bank.approve(&usdc, &sponsor, &bribe.address, u128::MAX).unwrap();
        let mut voter = Voter::new(WEEK);
        voter.create_gauge(pool, addr("gauge"), bribe.address, Timestamp::EPOCH).unwrap();
        let mut escrow = FixedPower::default();
        escrow.0.insert(1, (addr("alice"), 3_000));
        escrow.0.insert(2, (addr("bob"), 1_000));
        Fixture {
            bank,
            voter,
            escrow,
            bribe,
            usdc,
        }
    }

    fn deposit(f: &mut Fixture, amount: u128, epoch: u64, now: u64) -> Result<(), BribeError> {
        let usdc = f.usdc;
        f.bribe.deposit_bribe(
            &mut f.bank,
            &addr("sponsor"),
            &usdc,
            amount,
            Epoch::new(epoch),
            Timestamp::new(now),
        )
    }

    fn claim(f: &mut Fixture, who: &str, id: PositionId, epoch: u64, now: u64) -> Result<u128, BribeError> {
        let usdc = f.usdc;
        let payouts = f.bribe.claim(
            &mut f.bank,
            &f.voter,
            &f.escrow,
            &addr(who),
            id,
            &[usdc],
            &[Epoch::new(epoch)],
            Timestamp::new(now),
        )?;
        Ok(payouts.iter().map(|p| p.amount).sum())
    }

    #[test]
    fn voters_split_by_epoch_weight() {
        let mut f = fixture();
        let pool = f.bribe.pool;
        deposit(&mut f, 1_000, 0, 0).unwrap();
        f.voter.vote(&f.escrow, &addr("alice"), 1, &[pool], &[1], Timestamp::new(10)).unwrap();
        f.voter.vote(&f.escrow, &addr("bob"), 2, &[pool], &[1], Timestamp::new(10)).unwrap();

        assert_eq!(claim(&mut f, "alice", 1, 0, WEEK).unwrap(), 750);
        assert_eq!(claim(&mut f, "bob", 2, 0, WEEK).unwrap(), 250);
        assert_eq!(f.bank.balance_of(&f.usdc, &addr("alice")), 750);
        assert_eq!(f.bank.balance_of(&f.usdc, &f.bribe.address), 0);
    }

    #[test]
    fn second_claim_pays_nothing() {
        let mut f = fixture();
        let pool = f.bribe.pool;
        deposit(&mut f, 1_000, 0, 0).unwrap();
        f.voter.vote(&f.escrow, &addr("alice"), 1, &[pool], &[1], Timestamp::new(10)).unwrap();
        assert_eq!(claim(&mut f, "alice", 1, 0, WEEK).unwrap(), 1_000);
        assert_eq!(claim(&mut f, "alice", 1, 0, WEEK).unwrap(), 0);
        assert_eq!(f.bribe.claimed(Epoch::GENESIS, &f.usdc, 1), Some(1_000));
    }

    #[test]
    fn claims_wait_for_epoch_end() {
        let mut f = fixture();
        deposit(&mut f, 1_000, 0, 0).unwrap();
        assert_eq!(
            claim(&mut f, "alice", 1, 0, WEEK - 1),
            Err(BribeError::EpochNotElapsed {
                epoch: Epoch::GENESIS,
                current: Epoch::GENESIS
            })
        );
    }

    #[test]
    fn claim_requires_ownership() {
        let mut f = fixture();
        assert_eq!(
            claim(&mut f, "bob", 1, 0, WEEK),
            Err(BribeError::NotOwner { id: 1, caller: addr("bob") })
        );
        assert_eq!(claim(&mut f, "bob", 9, 0, WEEK), Err(BribeError::UnknownPosition(9)));
    }

    #[test]
    fn deposit_window_is_bounded() {
        let mut f = fixture();
        assert_eq!(
            deposit(&mut f, 1, 0, WEEK),
            Err(BribeError::PastEpoch {
                epoch: Epoch::GENESIS,
                current: Epoch::new(1)
            })
        );
        deposit(&mut f, 1, 53, WEEK).unwrap();
        assert_eq!(
            deposit(&mut f, 1, 54, WEEK),
            Err(BribeError::TooFarAhead {
                epoch: Epoch::new(54),
                latest: Epoch::new(53)
            })
        );
        assert_eq!(deposit(&mut f, 0, 1, WEEK), Err(BribeError::ZeroAmount));
    }

    #[test]
    fn unvoted_epoch_is_refundable_once() {
        let mut f = fixture();
        let (usdc, sponsor) = (f.usdc, addr("sponsor"));
        deposit(&mut f, 400, 0, 0).unwrap();
        let refunded = f
            .bribe
            .refund(&mut f.bank, &f.voter, &sponsor, &usdc, Epoch::GENESIS, Timestamp::new(WEEK))
            .unwrap();
        assert_eq!(refunded, 400);
        assert_eq!(f.bank.balance_of(&usdc, &sponsor), 1_000_000);
        assert_eq!(f.bribe.deposited(Epoch::GENESIS, &usdc), 0);
        assert!(matches!(
            f.bribe.refund(&mut f.bank, &f.voter, &sponsor, &usdc, Epoch::GENESIS, Timestamp::new(WEEK)),
            Err(BribeError::NothingToRefund { .. })
        ));
    }

    #[test]
    fn voted_epoch_is_not_refundable() {
        let mut f = fixture();
        let (pool, usdc, sponsor) = (f.bribe.pool, f.usdc, addr("sponsor"));
        deposit(&mut f, 400, 0, 0).unwrap();
        f.voter.vote(&f.escrow, &addr("bob"), 2, &[pool], &[1], Timestamp::new(10)).unwrap();
        assert_eq!(
            f.bribe
                .refund(&mut f.bank, &f.voter, &sponsor, &usdc, Epoch::GENESIS, Timestamp::new(WEEK)),
            Err(BribeError::EpochHasVotes {
                epoch: Epoch::GENESIS,
                weight: 1_000
            })
        );
    }

    #[test]
    fn tokens_for_lists_epoch_deposits() {
        let mut f = fixture();
        deposit(&mut f, 5, 2, 0).unwrap();
        assert_eq!(f.bribe.tokens_for(Epoch::new(2)), vec![f.usdc]);
        assert!(f.bribe.tokens_for(Epoch::new(1)).is_empty());
    }
}

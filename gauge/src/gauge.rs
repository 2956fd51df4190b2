//! A single reward stream.

use crate::error::GaugeError;
use puddel_math::{to_u128, SafeMath, U256};
use puddel_token::TokenBank;
use puddel_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fixed-point scale of the reward-per-token accumulator.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    /// Account holding staked LP shares and undistributed rewards.
    pub address: Address,
    /// The pool whose LP shares are staked.
    pub pool: Address,
    pub reward_token: Address,
    /// The only account allowed to notify rewards.
    pub minter: Address,
    duration_secs: u64,
    period_finish: Timestamp,
    reward_rate: u128,
    last_update_time: Timestamp,
    #[serde(with = "puddel_math::serde_u256")]
    reward_per_token_stored: U256,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    #[serde(with = "puddel_math::serde_u256::map")]
    user_reward_per_token_paid: BTreeMap<Address, U256>,
    rewards: BTreeMap<Address, u128>,
    total_notified: u128,
    total_paid: u128,
}

impl Gauge {
    pub fn new(
        address: Address,
        pool: Address,
        reward_token: Address,
        minter: Address,
        duration_secs: u64,
    ) -> Result<Self, GaugeError> {
        if duration_secs == 0 {
            return Err(GaugeError::ZeroDuration);
        }
        Ok(Self {
            address,
            pool,
            reward_token,
            minter,
            duration_secs,
            period_finish: Timestamp::EPOCH,
            reward_rate: 0,
            last_update_time: Timestamp::EPOCH,
            reward_per_token_stored: U256::zero(),
            total_supply: 0,
            balances: BTreeMap::new(),
            user_reward_per_token_paid: BTreeMap::new(),
            rewards: BTreeMap::new(),
            total_notified: 0,
            total_paid: 0,
        })
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn reward_rate(&self) -> u128 {
        self.reward_rate
    }

    pub fn period_finish(&self) -> Timestamp {
        self.period_finish
    }

    pub fn total_notified(&self) -> u128 {
        self.total_notified
    }

    pub fn total_paid(&self) -> u128 {
        self.total_paid
    }

    pub fn last_time_reward_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.period_finish)
    }

    pub fn reward_per_token(&self, now: Timestamp) -> U256 {
        if self.total_supply == 0 {
            return self.reward_per_token_stored;
        }
        let elapsed = self
            .last_update_time
            .elapsed_since(self.last_time_reward_applicable(now));
        self.reward_per_token_stored
            + U256::from(elapsed) * U256::from(self.reward_rate) * U256::from(PRECISION)
                / U256::from(self.total_supply)
    }

    /// Rewards `account` could claim at `now`.
    pub fn earned(&self, account: &Address, now: Timestamp) -> Result<u128, GaugeError> {
        let paid = self
            .user_reward_per_token_paid
            .get(account)
            .copied()
            .unwrap_or_default();
        let delta = self.reward_per_token(now) - paid;
        let accrued = to_u128(U256::from(self.balance_of(account)) * delta / U256::from(PRECISION))?;
        let pending = self.rewards.get(account).copied().unwrap_or(0);
        Ok(accrued.safe_add(pending)?)
    }

    /// Rewards still to be streamed in the current period.
    pub fn left(&self, now: Timestamp) -> u128 {
        if now >= self.period_finish {
            return 0;
        }
        (self.period_finish.as_secs() - now.as_secs()) as u128 * self.reward_rate
    }

    fn update_reward(&mut self, account: Option<&Address>, now: Timestamp) -> Result<(), GaugeError> {
        self.reward_per_token_stored = self.reward_per_token(now);
        self.last_update_time = self.last_time_reward_applicable(now);
        if let Some(account) = account {
            let earned = self.earned(account, now)?;
            if earned > 0 {
                self.rewards.insert(*account, earned);
            }
            self.user_reward_per_token_paid
                .insert(*account, self.reward_per_token_stored);
        }
        Ok(())
    }

    /// Stake `amount` LP shares from `account`. Pulled with `transfer_from`.
    pub fn deposit<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        account: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GaugeError> {
        if amount == 0 {
            return Err(GaugeError::ZeroAmount);
        }
        self.update_reward(Some(account), now)?;
        self.total_supply = self.total_supply.safe_add(amount)?;
        let balance = self.balance_of(account).safe_add(amount)?;
        self.balances.insert(*account, balance);

        bank.transfer_from(&self.pool, &self.address, account, &self.address, amount)?;
        debug!(target: "gauge", pool = %self.pool, %account, amount, total = self.total_supply, "staked");
        Ok(())
    }

    pub fn withdraw<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        account: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), GaugeError> {
        if amount == 0 {
            return Err(GaugeError::ZeroAmount);
        }
        let staked = self.balance_of(account);
        if amount > staked {
            return Err(GaugeError::InsufficientStake {
                requested: amount,
                staked,
            });
        }
        self.update_reward(Some(account), now)?;
        self.total_supply -= amount;
        if staked == amount {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, staked - amount);
        }

        bank.transfer(&self.pool, &self.address, account, amount)?;
        debug!(target: "gauge", pool = %self.pool, %account, amount, total = self.total_supply, "unstaked");
        Ok(())
    }

    /// Pay out everything `account` has earned. A zero claim is not an error.
    pub fn get_reward<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        account: &Address,
        now: Timestamp,
    ) -> Result<u128, GaugeError> {
        self.update_reward(Some(account), now)?;
        let Some(reward) = self.rewards.remove(account) else {
            return Ok(0);
        };
        self.total_paid = self.total_paid.safe_add(reward)?;

        bank.transfer(&self.reward_token, &self.address, account, reward)?;
        debug!(target: "gauge", pool = %self.pool, %account, reward, "reward paid");
        Ok(reward)
    }

    /// Start or top up a reward period. Only the emission scheduler may call
    /// this; the amount is pulled from it with `transfer_from`.
    ///
    /// A fresh period streams `amount / duration` per second. A notification
    /// during a running period folds the unstreamed remainder into the new
    /// rate. Either way the period then ends `duration` after `now`.
    pub fn notify_reward_amount<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        caller: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, GaugeError> {
        if *caller != self.minter {
            return Err(GaugeError::NotMinter { caller: *caller });
        }
        if amount == 0 {
            return Err(GaugeError::ZeroAmount);
        }
        let duration = self.duration_secs as u128;
        let period_finish = now
            .checked_add(self.duration_secs)
            .ok_or(GaugeError::Overflow)?;
        let rate = if now >= self.period_finish {
            amount / duration
        } else {
            amount.safe_add(self.left(now))? / duration
        };
        let total_notified = self.total_notified.safe_add(amount)?;

        bank.transfer_from(&self.reward_token, &self.address, caller, &self.address, amount)?;
        let max_rate = bank.balance_of(&self.reward_token, &self.address) / duration;
        if rate > max_rate {
            return Err(GaugeError::RewardTooHigh { rate, max_rate });
        }

        self.update_reward(None, now)?;
        self.reward_rate = rate;
        self.last_update_time = now;
        self.period_finish = period_finish;
        self.total_notified = total_notified;
        info!(
            target: "gauge",
            pool = %self.pool,
            amount,
            rate = self.reward_rate,
            period_finish = %self.period_finish,
            "reward notified"
        );
        Ok(self.reward_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_token::TokenLedger;

    const WEEK: u64 = 7 * 24 * 3600;

    struct Fixture {
        bank: TokenLedger,
        gauge: Gauge,
        minter: Address,
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn fixture() -> Fixture {
        let (lp, gov, minter, gauge_addr) = (addr("lp"), addr("gov"), addr("minter"), addr("gauge"));
        let mut bank = TokenLedger::new();
        bank.create_token(lp, "LP", lp).unwrap();
        bank.create_token(gov, "PDL", minter).unwrap();
        for who in ["alice", "bob"] {
            bank.mint(&lp, &lp, &addr(who), 1_000_000).unwrap();
            bank.approve(&lp, &addr(who), &gauge_addr, u128::MAX).unwrap();
        }
        bank.mint(&gov, &minter, &minter, u64::MAX as u128).unwrap();
        bank.approve(&gov, &minter, &gauge_addr, u128::MAX).unwrap();
        Fixture {
            bank,
            gauge: Gauge::new(gauge_addr, lp, gov, minter, WEEK).unwrap(),
            minter,
        }
    }

    fn notify(f: &mut Fixture, amount: u128, now: u64) {
        f.gauge
            .notify_reward_amount(&mut f.bank, &f.minter, amount, Timestamp::new(now))
            .unwrap();
    }

    #[test]
    fn only_minter_notifies() {
        let mut f = fixture();
        let err = f
            .gauge
            .notify_reward_amount(&mut f.bank, &addr("alice"), 1, Timestamp::EPOCH)
            .unwrap_err();
        assert_eq!(err, GaugeError::NotMinter { caller: addr("alice") });
    }

    #[test]
    fn sole_staker_earns_full_stream() {
        let mut f = fixture();
        let alice = addr("alice");
        f.gauge.deposit(&mut f.bank, &alice, 1_000, Timestamp::new(0)).unwrap();
        notify(&mut f, WEEK as u128 * 100, 0);
        assert_eq!(f.gauge.reward_rate(), 100);
        assert_eq!(f.gauge.earned(&alice, Timestamp::new(WEEK / 2)).unwrap(), WEEK as u128 * 50);
        // Nothing accrues past the period end.
        assert_eq!(f.gauge.earned(&alice, Timestamp::new(2 * WEEK)).unwrap(), WEEK as u128 * 100);
        let paid = f.gauge.get_reward(&mut f.bank, &alice, Timestamp::new(2 * WEEK)).unwrap();
        assert_eq!(paid, WEEK as u128 * 100);
        assert_eq!(f.bank.balance_of(&addr("gov"), &alice), paid);
        assert_eq!(f.gauge.get_reward(&mut f.bank, &alice, Timestamp::new(2 * WEEK)).unwrap(), 0);
    }

    #[test]
    fn stakers_share_pro_rata() {
        let mut f = fixture();
        let (alice, bob) = (addr("alice"), addr("bob"));
        f.gauge.deposit(&mut f.bank, &alice, 1_000, Timestamp::new(0)).unwrap();
        f.gauge.deposit(&mut f.bank, &bob, 3_000, Timestamp::new(0)).unwrap();
        notify(&mut f, WEEK as u128 * 400, 0);
        let end = Timestamp::new(WEEK);
        assert_eq!(f.gauge.earned(&alice, end).unwrap(), WEEK as u128 * 100);
        assert_eq!(f.gauge.earned(&bob, end).unwrap(), WEEK as u128 * 300);
    }

    #[test]
    fn late_staker_only_earns_from_entry() {
        let mut f = fixture();
        let (alice, bob) = (addr("alice"), addr("bob"));
        f.gauge.deposit(&mut f.bank, &alice, 1_000, Timestamp::new(0)).unwrap();
        notify(&mut f, WEEK as u128 * 100, 0);
        let half = WEEK / 2;
        f.gauge.deposit(&mut f.bank, &bob, 1_000, Timestamp::new(half)).unwrap();
        let end = Timestamp::new(WEEK);
        assert_eq!(f.gauge.earned(&alice, end).unwrap(), half as u128 * 100 + half as u128 * 50);
        assert_eq!(f.gauge.earned(&bob, end).unwrap(), half as u128 * 50);
    }

    #[test]
    fn notify_mid_period_folds_remainder() {
        let mut f = fixture();
        notify(&mut f, WEEK as u128 * 100, 0);
        let half = WEEK / 2;
        assert_eq!(f.gauge.left(Timestamp::new(half)), half as u128 * 100);
        notify(&mut f, WEEK as u128 * 100, half);
        // (100·week + 50·week) / week
        assert_eq!(f.gauge.reward_rate(), 150);
        assert_eq!(f.gauge.period_finish(), Timestamp::new(half + WEEK));
    }

    #[test]
    fn withdraw_settles_and_returns_shares() {
        let mut f = fixture();
        let alice = addr("alice");
        f.gauge.deposit(&mut f.bank, &alice, 1_000, Timestamp::new(0)).unwrap();
        notify(&mut f, WEEK as u128 * 10, 0);
        f.gauge.withdraw(&mut f.bank, &alice, 1_000, Timestamp::new(WEEK)).unwrap();
        assert_eq!(f.bank.balance_of(&addr("lp"), &alice), 1_000_000);
        assert_eq!(f.gauge.total_supply(), 0);
        assert_eq!(f.gauge.earned(&alice, Timestamp::new(2 * WEEK)).unwrap(), WEEK as u128 * 10);
        assert_eq!(
            f.gauge.withdraw(&mut f.bank, &alice, 1, Timestamp::new(WEEK)),
            Err(GaugeError::InsufficientStake { requested: 1, staked: 0 })
        );
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut f = fixture();
        let alice = addr("alice");
        assert_eq!(
            f.gauge.deposit(&mut f.bank, &alice, 0, Timestamp::EPOCH),
            Err(GaugeError::ZeroAmount)
        );
        assert_eq!(
            f.gauge
                .notify_reward_amount(&mut f.bank, &f.minter.clone(), 0, Timestamp::EPOCH),
            Err(GaugeError::ZeroAmount)
        );
    }

    #[test]
    fn zero_duration_rejected() {
        let a = Address::ZERO;
        assert_eq!(Gauge::new(a, a, a, a, 0), Err(GaugeError::ZeroDuration));
    }
}

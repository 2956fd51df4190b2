//! Epoch rolls and emission distribution.

use crate::error::MinterError;
use puddel_gauge::GaugeSet;
use puddel_math::{apply_bps, mul_div, SafeMath};
use puddel_token::TokenBank;
use puddel_types::params::BPS;
use puddel_types::{Address, Epoch, ParamsError, ProtocolParams, Timestamp};
use puddel_voter::GaugeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What one roll did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRecord {
    /// The epoch the roll opened.
    pub epoch: Epoch,
    /// The epoch whose votes directed the emission.
    pub source_epoch: Epoch,
    pub total_weight: u128,
    /// pool → tokens notified to its gauge.
    pub allocations: BTreeMap<Address, u128>,
    pub minted: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minter {
    /// Mints the governance token and notifies every gauge.
    address: Address,
    token: Address,
    epoch_length_secs: u64,
    last_epoch: Epoch,
    emission_per_epoch: u128,
    emission_ceiling: u128,
    decay_bps: u32,
    decay_ceiling_bps: u32,
    total_minted: u128,
    records: BTreeMap<Epoch, EmissionRecord>,
}

impl Minter {
    /// The epoch containing `now` counts as processed.
    pub fn new(address: Address, token: Address, params: &ProtocolParams, now: Timestamp) -> Self {
        Self {
            address,
            token,
            epoch_length_secs: params.epoch_length_secs,
            last_epoch: Epoch::at(now, params.epoch_length_secs),
            emission_per_epoch: params.emission_per_epoch,
            emission_ceiling: params.emission_ceiling,
            decay_bps: params.emission_decay_bps,
            decay_ceiling_bps: params.decay_ceiling_bps,
            total_minted: 0,
            records: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn last_epoch(&self) -> Epoch {
        self.last_epoch
    }

    pub fn emission_per_epoch(&self) -> u128 {
        self.emission_per_epoch
    }

    pub fn emission_ceiling(&self) -> u128 {
        self.emission_ceiling
    }

    pub fn decay_bps(&self) -> u32 {
        self.decay_bps
    }

    pub fn decay_ceiling_bps(&self) -> u32 {
        self.decay_ceiling_bps
    }

    pub fn total_minted(&self) -> u128 {
        self.total_minted
    }

    pub fn record(&self, epoch: Epoch) -> Option<&EmissionRecord> {
        self.records.get(&epoch)
    }

    pub fn records(&self) -> impl Iterator<Item = &EmissionRecord> {
        self.records.values()
    }

    /// Whether a roll at `now` would go through.
    pub fn can_update(&self, now: Timestamp) -> bool {
        Epoch::at(now, self.epoch_length_secs) > self.last_epoch
    }

    /// Roll into the epoch containing `now` and distribute emissions by the
    /// vote snapshot of the epoch before it.
    pub fn update_epoch<B, R>(
        &mut self,
        bank: &mut B,
        registry: &R,
        gauges: &mut GaugeSet,
        now: Timestamp,
    ) -> Result<EmissionRecord, MinterError>
    where
        B: TokenBank + ?Sized,
        R: GaugeRegistry + ?Sized,
    {
        let current = Epoch::at(now, self.epoch_length_secs);
        if current <= self.last_epoch {
            return Err(MinterError::EpochNotAdvanced {
                current,
                last: self.last_epoch,
            });
        }
        let source_epoch = current.previous().unwrap_or(Epoch::GENESIS);
        self.last_epoch = current;

        let total_weight = registry.epoch_total_weight(source_epoch);
        let mut record = EmissionRecord {
            epoch: current,
            source_epoch,
            total_weight,
            ..EmissionRecord::default()
        };
        if total_weight == 0 {
            warn!(target: "minter", epoch = %current, source = %source_epoch, "no votes, nothing emitted");
            self.records.insert(current, record.clone());
            return Ok(record);
        }

        let emission = self.emission_per_epoch;
        for pool in registry.gauges() {
            let weight = registry.epoch_gauge_weight(source_epoch, &pool);
            if weight == 0 {
                continue;
            }
            let share = mul_div(emission, weight, total_weight)?;
            if share == 0 {
                continue;
            }
            let gauge = gauges
                .get_mut(&pool)
                .map_err(|_| MinterError::MissingGauge(pool))?;
            bank.mint(&self.token, &self.address, &self.address, share)?;
            bank.approve(&self.token, &self.address, &gauge.address, share)?;
            gauge.notify_reward_amount(bank, &self.address, share, now)?;
            record.minted = record.minted.safe_add(share)?;
            record.allocations.insert(pool, share);
            debug!(target: "minter", %pool, weight, share, "emission notified");
        }
        self.total_minted = self.total_minted.safe_add(record.minted)?;

        let decay = apply_bps(self.emission_per_epoch, self.decay_bps)?;
        self.emission_per_epoch -= decay;
        info!(
            target: "minter",
            epoch = %current,
            source = %source_epoch,
            total_weight,
            minted = record.minted,
            pools = record.allocations.len(),
            next_emission = self.emission_per_epoch,
            "epoch rolled"
        );
        self.records.insert(current, record.clone());
        Ok(record)
    }

    /// Returns the previous value. Capped by the hard emission ceiling.
    pub fn set_emission_per_epoch(&mut self, amount: u128) -> Result<u128, MinterError> {
        if amount > self.emission_ceiling {
            return Err(ParamsError::EmissionAboveCeiling {
                emission: amount,
                ceiling: self.emission_ceiling,
            }
            .into());
        }
        let old = std::mem::replace(&mut self.emission_per_epoch, amount);
        info!(target: "minter", old, new = amount, "emission per epoch changed");
        Ok(old)
    }

    pub fn set_decay_bps(&mut self, bps: u32) -> Result<u32, MinterError> {
        if bps > self.decay_ceiling_bps {
            return Err(ParamsError::DecayAboveCeiling {
                decay_bps: bps,
                ceiling_bps: self.decay_ceiling_bps,
            }
            .into());
        }
        let old = std::mem::replace(&mut self.decay_bps, bps);
        info!(target: "minter", old, new = bps, "decay changed");
        Ok(old)
    }

    /// A ceiling below the current decay rate is rejected rather than clamped.
    pub fn set_decay_ceiling_bps(&mut self, bps: u32) -> Result<u32, MinterError> {
        if bps > BPS {
            return Err(ParamsError::BpsOutOfRange {
                field: "decay_ceiling_bps",
                value: bps,
                max: BPS,
            }
            .into());
        }
        if bps < self.decay_bps {
            return Err(ParamsError::DecayAboveCeiling {
                decay_bps: self.decay_bps,
                ceiling_bps: bps,
            }
            .into());
        }
        let old = std::mem::replace(&mut self.decay_ceiling_bps, bps);
        info!(target: "minter", old, new = bps, "decay ceiling changed");
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_gauge::Gauge;
    use puddel_token::TokenLedger;

    const WEEK: u64 = 7 * 24 * 3600;

    /// Snapshot weights set directly.
    #[derive(Default)]
    struct Snapshots {
        pools: Vec<Address>,
        weights: BTreeMap<(Epoch, Address), u128>,
    }

    impl GaugeRegistry for Snapshots {
        fn gauges(&self) -> Vec<Address> {
            self.pools.clone()
        }

        fn gauge_of(&self, pool: &Address) -> Option<Address> {
            self.pools.contains(pool).then(|| gauge_addr(pool))
        }

        fn epoch_gauge_weight(&self, epoch: Epoch, pool: &Address) -> u128 {
            self.weights.get(&(epoch, *pool)).copied().unwrap_or(0)
        }

        fn epoch_total_weight(&self, epoch: Epoch) -> u128 {
            self.weights
                .iter()
                .filter(|((e, _), _)| *e == epoch)
                .map(|(_, w)| *w)
                .sum()
        }
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn gauge_addr(pool: &Address) -> Address {
        Address::derive("test/gauge", &[pool.as_bytes()])
    }

    struct Fixture {
        bank: TokenLedger,
        minter: Minter,
        gauges: GaugeSet,
        snapshots: Snapshots,
        gov: Address,
    }

    fn fixture(emission: u128) -> Fixture {
        let (gov, minter_addr) = (addr("gov"), addr("minter"));
        let params = ProtocolParams {
            emission_per_epoch: emission,
            ..ProtocolParams::default()
        };
        let mut bank = TokenLedger::new();
        bank.create_token(gov, "PDL", minter_addr).unwrap();
        let mut snapshots = Snapshots::default();
        let mut gauges = GaugeSet::new();
        for label in ["p", "q"] {
            let pool = addr(label);
            snapshots.pools.push(pool);
            gauges
                .insert(Gauge::new(gauge_addr(&pool), pool, gov, minter_addr, WEEK).unwrap())
                .unwrap();
        }
        Fixture {
            bank,
            minter: Minter::new(minter_addr, gov, &params, Timestamp::EPOCH),
            gauges,
            snapshots,
            gov,
        }
    }

    fn roll(f: &mut Fixture, now: u64) -> Result<EmissionRecord, MinterError> {
        f.minter
            .update_epoch(&mut f.bank, &f.snapshots, &mut f.gauges, Timestamp::new(now))
    }

    #[test]
    fn same_epoch_cannot_roll_twice() {
        let mut f = fixture(1_000_000);
        assert_eq!(
            roll(&mut f, WEEK - 1),
            Err(MinterError::EpochNotAdvanced {
                current: Epoch::GENESIS,
                last: Epoch::GENESIS
            })
        );
        roll(&mut f, WEEK).unwrap();
        assert!(roll(&mut f, WEEK + 10).is_err());
        assert!(f.minter.can_update(Timestamp::new(2 * WEEK)));
    }

    #[test]
    fn emission_split_by_previous_epoch_weights() {
        let mut f = fixture(1_000_000);
        let (p, q) = (addr("p"), addr("q"));
        f.snapshots.weights.insert((Epoch::GENESIS, p), 3);
        f.snapshots.weights.insert((Epoch::GENESIS, q), 1);
        // Votes in the epoch being opened do not count.
        f.snapshots.weights.insert((Epoch::new(1), q), 100);

        let record = roll(&mut f, WEEK).unwrap();
        assert_eq!(record.source_epoch, Epoch::GENESIS);
        assert_eq!(record.allocations[&p], 750_000);
        assert_eq!(record.allocations[&q], 250_000);
        assert_eq!(record.minted, 1_000_000);
        assert_eq!(f.bank.balance_of(&f.gov, &gauge_addr(&p)), 750_000);
        assert_eq!(f.bank.total_supply(&f.gov), 1_000_000);
        assert_eq!(f.gauges.get(&p).unwrap().total_notified(), 750_000);
        // 1% decay after a distributing roll.
        assert_eq!(f.minter.emission_per_epoch(), 990_000);
    }

    #[test]
    fn unvoted_epoch_emits_nothing_but_advances() {
        let mut f = fixture(1_000_000);
        let record = roll(&mut f, WEEK).unwrap();
        assert_eq!(record.minted, 0);
        assert!(record.allocations.is_empty());
        assert_eq!(f.minter.last_epoch(), Epoch::new(1));
        assert_eq!(f.minter.record(Epoch::new(1)), Some(&record));
        assert_eq!(f.minter.emission_per_epoch(), 1_000_000);
        assert_eq!(f.bank.total_supply(&f.gov), 0);
    }

    #[test]
    fn dust_shares_are_skipped() {
        let mut f = fixture(3);
        let (p, q) = (addr("p"), addr("q"));
        f.snapshots.weights.insert((Epoch::GENESIS, p), 1_000);
        f.snapshots.weights.insert((Epoch::GENESIS, q), 1);
        let record = roll(&mut f, WEEK).unwrap();
        assert_eq!(record.allocations.get(&q), None);
        assert!(record.minted <= 3);
    }

    #[test]
    fn skipped_epochs_read_the_one_just_before() {
        let mut f = fixture(1_000);
        let p = addr("p");
        f.snapshots.weights.insert((Epoch::new(2), p), 1);
        let record = roll(&mut f, 3 * WEEK).unwrap();
        assert_eq!(record.source_epoch, Epoch::new(2));
        assert_eq!(record.minted, 1_000);
    }

    #[test]
    fn setters_respect_ceilings() {
        let mut f = fixture(1_000);
        let ceiling = f.minter.emission_ceiling();
        assert!(f.minter.set_emission_per_epoch(ceiling + 1).is_err());
        assert_eq!(f.minter.set_emission_per_epoch(5).unwrap(), 1_000);
        assert!(f.minter.set_decay_bps(501).is_err());
        assert_eq!(f.minter.set_decay_bps(500).unwrap(), 100);
        assert!(f.minter.set_decay_ceiling_bps(499).is_err());
        assert!(f.minter.set_decay_ceiling_bps(10_001).is_err());
        assert_eq!(f.minter.set_decay_ceiling_bps(10_000).unwrap(), 500);
    }
}

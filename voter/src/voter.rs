//! The vote allocator.

use crate::error::VoterError;
use crate::ledger::{EpochVoteLedger, GaugeRegistry};
use puddel_escrow::{PositionId, PositionOwnership};
use puddel_math::mul_div;
use puddel_types::{Address, Epoch, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A pool's reward streamer and incentive vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeInfo {
    pub pool: Address,
    pub gauge: Address,
    pub bribe: Address,
    pub created_at: Timestamp,
}

/// A position's current allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// Epoch the allocation was cast in.
    pub epoch: Epoch,
    /// pool → allocated power.
    pub allocations: BTreeMap<Address, u128>,
}

impl VoteRecord {
    pub fn used_weight(&self) -> u128 {
        self.allocations.values().sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Voter {
    epoch_length_secs: u64,
    gauges: BTreeMap<Address, GaugeInfo>,
    /// Pools in gauge-creation order.
    pools: Vec<Address>,
    votes: BTreeMap<PositionId, VoteRecord>,
    pool_weights: BTreeMap<Address, u128>,
    total_weight: u128,
    epoch_pool_weights: BTreeMap<(Epoch, Address), u128>,
    epoch_totals: BTreeMap<Epoch, u128>,
    epoch_position_weights: BTreeMap<(Epoch, Address, PositionId), u128>,
}

fn add(map_value: &mut u128, amount: u128) -> Result<(), VoterError> {
    *map_value = map_value.checked_add(amount).ok_or(VoterError::Overflow)?;
    Ok(())
}

fn sub(map_value: &mut u128, amount: u128) -> Result<(), VoterError> {
    *map_value = map_value.checked_sub(amount).ok_or(VoterError::Overflow)?;
    Ok(())
}

impl Voter {
    pub fn new(epoch_length_secs: u64) -> Self {
        Self {
            epoch_length_secs,
            gauges: BTreeMap::new(),
            pools: Vec::new(),
            votes: BTreeMap::new(),
            pool_weights: BTreeMap::new(),
            total_weight: 0,
            epoch_pool_weights: BTreeMap::new(),
            epoch_totals: BTreeMap::new(),
            epoch_position_weights: BTreeMap::new(),
        }
    }

    pub fn epoch_length_secs(&self) -> u64 {
        self.epoch_length_secs
    }

    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        Epoch::at(now, self.epoch_length_secs)
    }

    /// Register the gauge and bribe of `pool`. The caller checks that the pool exists.
    pub fn create_gauge(
        &mut self,
        pool: Address,
        gauge: Address,
        bribe: Address,
        now: Timestamp,
    ) -> Result<(), VoterError> {
        if self.gauges.contains_key(&pool) {
            return Err(VoterError::GaugeExists(pool));
        }
        self.gauges.insert(
            pool,
            GaugeInfo {
                pool,
                gauge,
                bribe,
                created_at: now,
            },
        );
        self.pools.push(pool);
        info!(target: "voter", %pool, %gauge, %bribe, "gauge created");
        Ok(())
    }

    pub fn gauge_info(&self, pool: &Address) -> Option<&GaugeInfo> {
        self.gauges.get(pool)
    }

    pub fn pool_weight(&self, pool: &Address) -> u128 {
        self.pool_weights.get(pool).copied().unwrap_or(0)
    }

    pub fn total_weight(&self) -> u128 {
        self.total_weight
    }

    pub fn votes_of(&self, id: PositionId) -> Option<&VoteRecord> {
        self.votes.get(&id)
    }

    fn ensure_owner<P: PositionOwnership + ?Sized>(
        escrow: &P,
        caller: &Address,
        id: PositionId,
    ) -> Result<(), VoterError> {
        match escrow.owner_of(id) {
            None => Err(VoterError::UnknownPosition(id)),
            Some(owner) if owner != *caller => Err(VoterError::NotOwner {
                id,
                caller: *caller,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Undo a position's allocation: live totals always, the snapshot only if
    /// the allocation was cast in the current epoch.
    fn reverse(&mut self, id: PositionId, now: Timestamp) -> Result<u128, VoterError> {
        let Some(record) = self.votes.remove(&id) else {
            return Ok(0);
        };
        let current = self.current_epoch(now);
        let mut released = 0u128;
        for (pool, weight) in &record.allocations {
            sub(self.pool_weights.entry(*pool).or_default(), *weight)?;
            sub(&mut self.total_weight, *weight)?;
            if record.epoch == current {
                sub(self.epoch_pool_weights.entry((current, *pool)).or_default(), *weight)?;
                sub(self.epoch_totals.entry(current).or_default(), *weight)?;
                self.epoch_position_weights.remove(&(current, *pool, id));
            }
            released = released.checked_add(*weight).ok_or(VoterError::Overflow)?;
        }
        Ok(released)
    }

    /// Apply `power` split by `weights` across `pools` into the live totals and
    /// the current epoch's snapshots.
    fn apply(
        &mut self,
        id: PositionId,
        pools: &[Address],
        weights: &[u128],
        power: u128,
        now: Timestamp,
    ) -> Result<u128, VoterError> {
        let weight_sum = weights
            .iter()
            .try_fold(0u128, |acc, w| acc.checked_add(*w))
            .ok_or(VoterError::Overflow)?;
        let epoch = self.current_epoch(now);
        let mut record = VoteRecord {
            epoch,
            allocations: BTreeMap::new(),
        };
        for (pool, weight) in pools.iter().zip(weights) {
            let allocated = mul_div(power, *weight, weight_sum)?;
            if allocated == 0 {
                continue;
            }
            add(self.pool_weights.entry(*pool).or_default(), allocated)?;
            add(&mut self.total_weight, allocated)?;
            add(self.epoch_pool_weights.entry((epoch, *pool)).or_default(), allocated)?;
            add(self.epoch_totals.entry(epoch).or_default(), allocated)?;
            add(self.epoch_position_weights.entry((epoch, *pool, id)).or_default(), allocated)?;
            record.allocations.insert(*pool, allocated);
        }
        let used = record.used_weight();
        if !record.allocations.is_empty() {
            self.votes.insert(id, record);
        }
        Ok(used)
    }

    /// Split position `id`'s current power across `pools` by relative `weights`.
    ///
    /// Returns the power actually allocated (≤ the position's power because of
    /// integer rounding).
    pub fn vote<P: PositionOwnership + ?Sized>(
        &mut self,
        escrow: &P,
        caller: &Address,
        id: PositionId,
        pools: &[Address],
        weights: &[u128],
        now: Timestamp,
    ) -> Result<u128, VoterError> {
        if pools.len() != weights.len() {
            return Err(VoterError::LengthMismatch {
                pools: pools.len(),
                weights: weights.len(),
            });
        }
        if pools.is_empty() {
            return Err(VoterError::EmptyVote);
        }
        Self::ensure_owner(escrow, caller, id)?;
        let mut seen = BTreeSet::new();
        for (pool, weight) in pools.iter().zip(weights) {
            if !self.gauges.contains_key(pool) {
                return Err(VoterError::UnknownPool(*pool));
            }
            if !seen.insert(*pool) {
                return Err(VoterError::DuplicatePool(*pool));
            }
            if *weight == 0 {
                return Err(VoterError::ZeroWeight(*pool));
            }
        }
        let power = escrow.voting_power(id, now);
        if power == 0 {
            return Err(VoterError::NoVotingPower(id));
        }

        self.reverse(id, now)?;
        let used = self.apply(id, pools, weights, power, now)?;
        info!(
            target: "voter",
            id,
            epoch = %self.current_epoch(now),
            pools = pools.len(),
            power,
            used,
            total_weight = self.total_weight,
            "vote cast"
        );
        Ok(used)
    }

    /// Withdraw position `id`'s allocation. Returns the power released.
    pub fn reset<P: PositionOwnership + ?Sized>(
        &mut self,
        escrow: &P,
        caller: &Address,
        id: PositionId,
        now: Timestamp,
    ) -> Result<u128, VoterError> {
        Self::ensure_owner(escrow, caller, id)?;
        let released = self.reverse(id, now)?;
        debug!(target: "voter", id, released, "votes reset");
        Ok(released)
    }

    /// Drop the allocation of a position that is being closed. Ownership is
    /// checked by the escrow withdrawal that triggers this.
    pub fn release(&mut self, id: PositionId, now: Timestamp) -> Result<u128, VoterError> {
        let released = self.reverse(id, now)?;
        if released > 0 {
            debug!(target: "voter", id, released, "votes released on withdrawal");
        }
        Ok(released)
    }

    /// Re-cast the existing allocation ratios with the position's current power
    /// into the current epoch.
    pub fn poke<P: PositionOwnership + ?Sized>(
        &mut self,
        escrow: &P,
        caller: &Address,
        id: PositionId,
        now: Timestamp,
    ) -> Result<u128, VoterError> {
        Self::ensure_owner(escrow, caller, id)?;
        let Some(record) = self.votes.get(&id) else {
            return Ok(0);
        };
        let (pools, weights): (Vec<Address>, Vec<u128>) =
            record.allocations.iter().map(|(p, w)| (*p, *w)).unzip();
        let power = escrow.voting_power(id, now);
        self.reverse(id, now)?;
        let used = if power == 0 {
            0
        } else {
            self.apply(id, &pools, &weights, power, now)?
        };
        debug!(target: "voter", id, power, used, "votes poked");
        Ok(used)
    }

    /// Live weights recomputed from the vote records, for invariant checks.
    pub fn recomputed_total(&self) -> Option<u128> {
        self.votes
            .values()
            .flat_map(|r| r.allocations.values())
            .try_fold(0u128, |acc, w| acc.checked_add(*w))
    }
}

impl GaugeRegistry for Voter {
    fn gauges(&self) -> Vec<Address> {
        self.pools.clone()
    }

    fn gauge_of(&self, pool: &Address) -> Option<Address> {
        self.gauges.get(pool).map(|g| g.gauge)
    }

    fn epoch_gauge_weight(&self, epoch: Epoch, pool: &Address) -> u128 {
        self.epoch_pool_weights
            .get(&(epoch, *pool))
            .copied()
            .unwrap_or(0)
    }

    fn epoch_total_weight(&self, epoch: Epoch) -> u128 {
        self.epoch_totals.get(&epoch).copied().unwrap_or(0)
    }
}

impl EpochVoteLedger for Voter {
    fn position_epoch_weight(&self, epoch: Epoch, pool: &Address, id: PositionId) -> u128 {
        self.epoch_position_weights
            .get(&(epoch, *pool, id))
            .copied()
            .unwrap_or(0)
    }
}

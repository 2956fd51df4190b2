//! The voting-escrow ledger.

use crate::error::EscrowError;
use crate::position::{Position, PositionId};
use crate::tier::TierTable;
use puddel_token::TokenBank;
use puddel_types::{Address, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Read access to positions for the vote allocator and the incentive vault.
pub trait PositionOwnership {
    fn owner_of(&self, id: PositionId) -> Option<Address>;

    /// Power of `id` at `now`; zero for unknown or expired positions.
    fn voting_power(&self, id: PositionId, now: Timestamp) -> u128;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingEscrow {
    /// Account holding every locked token.
    address: Address,
    /// The governance token being locked.
    token: Address,
    tiers: TierTable,
    max_activity_bonus_bps: u32,
    positions: BTreeMap<PositionId, Position>,
    next_id: PositionId,
    total_locked: u128,
    total_power: u128,
}

impl VotingEscrow {
    pub fn new(address: Address, token: Address, params: &ProtocolParams) -> Self {
        Self {
            address,
            token,
            tiers: TierTable::new(params.lock_tiers.clone()),
            max_activity_bonus_bps: params.max_activity_bonus_bps,
            positions: BTreeMap::new(),
            next_id: 1,
            total_locked: 0,
            total_power: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn total_locked(&self) -> u128 {
        self.total_locked
    }

    /// Aggregate recorded power. Stale for expired positions until they are poked.
    pub fn total_power(&self) -> u128 {
        self.total_power
    }

    pub fn position(&self, id: PositionId) -> Result<&Position, EscrowError> {
        self.positions
            .get(&id)
            .ok_or(EscrowError::UnknownPosition(id))
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn positions_of<'a>(&'a self, owner: &'a Address) -> impl Iterator<Item = &'a Position> + 'a {
        self.positions.values().filter(move |p| p.owner == *owner)
    }

    fn owned_mut(&mut self, id: PositionId, caller: &Address) -> Result<&mut Position, EscrowError> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EscrowError::UnknownPosition(id))?;
        if position.owner != *caller {
            return Err(EscrowError::NotOwner {
                id,
                caller: *caller,
            });
        }
        Ok(position)
    }

    /// Recompute a position's power and fold the difference into `total_power`.
    fn refresh(&mut self, id: PositionId, now: Timestamp) -> Result<u128, EscrowError> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EscrowError::UnknownPosition(id))?;
        let fresh = position.power_at(now)?;
        self.total_power = self
            .total_power
            .checked_sub(position.recorded_power)
            .and_then(|p| p.checked_add(fresh))
            .ok_or(EscrowError::Overflow)?;
        position.recorded_power = fresh;
        Ok(fresh)
    }

    /// Lock `amount` for `tier` and mint a new position to `owner`.
    ///
    /// Tokens are pulled with `transfer_from`, so `owner` must approve the
    /// escrow address first.
    pub fn create_lock<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        owner: &Address,
        amount: u128,
        tier: u8,
        now: Timestamp,
    ) -> Result<PositionId, EscrowError> {
        if amount == 0 {
            return Err(EscrowError::ZeroAmount);
        }
        let params = *self.tiers.get(tier)?;
        let lock_end = now
            .checked_add(params.duration_secs)
            .ok_or(EscrowError::Overflow)?;

        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).ok_or(EscrowError::Overflow)?;
        self.total_locked = self
            .total_locked
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        self.positions.insert(
            id,
            Position {
                id,
                owner: *owner,
                amount,
                lock_start: now,
                lock_end,
                tier,
                multiplier_bps: params.multiplier_bps,
                activity_bonus_bps: 0,
                recorded_power: 0,
            },
        );
        let power = self.refresh(id, now)?;

        bank.transfer_from(&self.token, &self.address, owner, &self.address, amount)?;
        info!(target: "escrow", id, %owner, amount, tier, %lock_end, power, "lock created");
        Ok(id)
    }

    /// Add `amount` to an active lock without changing its end.
    pub fn increase_lock_amount<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        caller: &Address,
        id: PositionId,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, EscrowError> {
        if amount == 0 {
            return Err(EscrowError::ZeroAmount);
        }
        let position = self.owned_mut(id, caller)?;
        if !position.is_active(now) {
            return Err(EscrowError::LockExpired {
                lock_end: position.lock_end,
                now,
            });
        }
        position.amount = position
            .amount
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        self.total_locked = self
            .total_locked
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        let power = self.refresh(id, now)?;

        bank.transfer_from(&self.token, &self.address, caller, &self.address, amount)?;
        info!(target: "escrow", id, amount, power, "lock amount increased");
        Ok(power)
    }

    /// Re-lock an active position from `now` under an equal or longer tier.
    pub fn extend_lock(
        &mut self,
        caller: &Address,
        id: PositionId,
        new_tier: u8,
        now: Timestamp,
    ) -> Result<u128, EscrowError> {
        let requested = *self.tiers.get(new_tier)?;
        let current_duration = {
            let position = self.position(id)?;
            self.tiers.get(position.tier)?.duration_secs
        };
        let position = self.owned_mut(id, caller)?;
        if !position.is_active(now) {
            return Err(EscrowError::LockExpired {
                lock_end: position.lock_end,
                now,
            });
        }
        if requested.duration_secs < current_duration {
            return Err(EscrowError::TierDowngrade {
                current: position.tier,
                requested: new_tier,
            });
        }
        let new_end = now
            .checked_add(requested.duration_secs)
            .ok_or(EscrowError::Overflow)?;
        if new_end < position.lock_end {
            return Err(EscrowError::LockEndDecrease {
                current_end: position.lock_end,
                new_end,
            });
        }
        position.tier = new_tier;
        position.multiplier_bps = requested.multiplier_bps;
        position.lock_start = now;
        position.lock_end = new_end;
        let power = self.refresh(id, now)?;
        info!(target: "escrow", id, tier = new_tier, %new_end, power, "lock extended");
        Ok(power)
    }

    /// Close an expired position and return its principal to the owner.
    pub fn withdraw<B: TokenBank + ?Sized>(
        &mut self,
        bank: &mut B,
        caller: &Address,
        id: PositionId,
        now: Timestamp,
    ) -> Result<u128, EscrowError> {
        let position = self.owned_mut(id, caller)?;
        if position.is_active(now) {
            return Err(EscrowError::LockNotExpired {
                lock_end: position.lock_end,
                now,
            });
        }
        let (amount, recorded) = (position.amount, position.recorded_power);
        self.positions.remove(&id);
        self.total_power = self
            .total_power
            .checked_sub(recorded)
            .ok_or(EscrowError::Overflow)?;
        self.total_locked = self
            .total_locked
            .checked_sub(amount)
            .ok_or(EscrowError::Overflow)?;

        bank.transfer(&self.token, &self.address, caller, amount)?;
        info!(target: "escrow", id, owner = %caller, amount, "position withdrawn");
        Ok(amount)
    }

    /// Refresh a position's recorded power. Permissionless.
    pub fn poke(&mut self, id: PositionId, now: Timestamp) -> Result<u128, EscrowError> {
        let power = self.refresh(id, now)?;
        debug!(target: "escrow", id, power, total_power = self.total_power, "position poked");
        Ok(power)
    }

    /// Set a position's activity bonus. Returns the previous bonus.
    pub fn set_activity_bonus(
        &mut self,
        id: PositionId,
        bps: u32,
        now: Timestamp,
    ) -> Result<u32, EscrowError> {
        if bps > self.max_activity_bonus_bps {
            return Err(EscrowError::BonusTooHigh {
                bps,
                max: self.max_activity_bonus_bps,
            });
        }
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EscrowError::UnknownPosition(id))?;
        let previous = std::mem::replace(&mut position.activity_bonus_bps, bps);
        self.refresh(id, now)?;
        info!(target: "escrow", id, previous, bps, "activity bonus set");
        Ok(previous)
    }

    /// Change a tier's multiplier for future locks and extensions. Returns the previous value.
    pub fn set_tier_multiplier(&mut self, tier: u8, bps: u32) -> Result<u32, EscrowError> {
        let previous = self.tiers.set_multiplier(tier, bps)?;
        info!(target: "escrow", tier, previous, bps, "tier multiplier set");
        Ok(previous)
    }

    /// Hand a position to a new owner.
    pub fn transfer_position(
        &mut self,
        caller: &Address,
        id: PositionId,
        to: &Address,
    ) -> Result<(), EscrowError> {
        if to.is_zero() {
            return Err(EscrowError::ZeroRecipient);
        }
        let position = self.owned_mut(id, caller)?;
        position.owner = *to;
        info!(target: "escrow", id, from = %caller, %to, "position transferred");
        Ok(())
    }

    /// Sum of every position's locked amount, for conservation checks.
    pub fn sum_of_positions(&self) -> Option<u128> {
        self.positions
            .values()
            .try_fold(0u128, |acc, p| acc.checked_add(p.amount))
    }

    /// Sum of every position's recorded power, for conservation checks.
    pub fn sum_of_recorded_power(&self) -> Option<u128> {
        self.positions
            .values()
            .try_fold(0u128, |acc, p| acc.checked_add(p.recorded_power))
    }
}

impl PositionOwnership for VotingEscrow {
    fn owner_of(&self, id: PositionId) -> Option<Address> {
        self.positions.get(&id).map(|p| p.owner)
    }

    fn voting_power(&self, id: PositionId, now: Timestamp) -> u128 {
        self.positions
            .get(&id)
            .and_then(|p| p.power_at(now).ok())
            .unwrap_or(0)
    }
}

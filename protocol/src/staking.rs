//! Locks, votes, reward streams and incentives.

use crate::error::ProtocolError;
use crate::events::ProtocolEvent;
use crate::host::Protocol;
use crate::state::Contracts;
use puddel_bribe::{Bribe, Claim};
use puddel_escrow::{PositionId, PositionOwnership};
use puddel_gauge::Gauge;
use puddel_types::{Address, Epoch, Timestamp};
use tracing::info;

impl Protocol {
    // ── Voting escrow ────────────────────────────────────────────────────

    /// Lock `amount` governance tokens from `caller` under `tier`. The caller
    /// must have approved the escrow account.
    pub fn create_lock(
        &mut self,
        caller: &Address,
        amount: u128,
        tier: u8,
        now: Timestamp,
    ) -> Result<PositionId, ProtocolError> {
        self.transact("create_lock", |state, events| {
            state.require_external(caller)?;
            let id = state.escrow.create_lock(&mut state.bank, caller, amount, tier, now)?;
            events.push(ProtocolEvent::LockCreated {
                id,
                owner: *caller,
                amount,
                tier,
                power: state.escrow.position(id)?.recorded_power,
            });
            Ok(id)
        })
    }

    pub fn increase_lock_amount(
        &mut self,
        caller: &Address,
        id: PositionId,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, ProtocolError> {
        self.transact("increase_lock_amount", |state, events| {
            let power = state
                .escrow
                .increase_lock_amount(&mut state.bank, caller, id, amount, now)?;
            events.push(ProtocolEvent::LockIncreased { id, amount, power });
            Ok(power)
        })
    }

    pub fn extend_lock(
        &mut self,
        caller: &Address,
        id: PositionId,
        tier: u8,
        now: Timestamp,
    ) -> Result<u128, ProtocolError> {
        self.transact("extend_lock", |state, events| {
            let power = state.escrow.extend_lock(caller, id, tier, now)?;
            events.push(ProtocolEvent::LockExtended { id, tier, power });
            Ok(power)
        })
    }

    /// Close an expired position: its live votes are released, then the
    /// principal goes back to the owner.
    pub fn withdraw_lock(&mut self, caller: &Address, id: PositionId, now: Timestamp) -> Result<u128, ProtocolError> {
        self.transact("withdraw_lock", |state, events| {
            let votes_released = state.voter.release(id, now)?;
            let amount = state.escrow.withdraw(&mut state.bank, caller, id, now)?;
            events.push(ProtocolEvent::LockWithdrawn {
                id,
                owner: *caller,
                amount,
                votes_released,
            });
            Ok(amount)
        })
    }

    pub fn transfer_position(
        &mut self,
        caller: &Address,
        id: PositionId,
        to: &Address,
    ) -> Result<(), ProtocolError> {
        self.transact("transfer_position", |state, events| {
            state.require_external(to)?;
            state.escrow.transfer_position(caller, id, to)?;
            events.push(ProtocolEvent::PositionTransferred {
                id,
                from: *caller,
                to: *to,
            });
            Ok(())
        })
    }

    /// Refresh the recorded power of `id`. Permissionless.
    pub fn poke_position(&mut self, id: PositionId, now: Timestamp) -> Result<u128, ProtocolError> {
        self.transact("poke_position", |state, events| {
            let power = state.escrow.poke(id, now)?;
            events.push(ProtocolEvent::PositionPoked { id, power });
            Ok(power)
        })
    }

    pub fn voting_power(&self, id: PositionId, now: Timestamp) -> u128 {
        self.state.escrow.voting_power(id, now)
    }

    // ── Votes ────────────────────────────────────────────────────────────

    /// Register the reward streamer and incentive vault of a registered pair.
    /// Permissionless. Returns `(gauge, bribe)` addresses.
    pub fn create_gauge(&mut self, pool: &Address, now: Timestamp) -> Result<(Address, Address), ProtocolError> {
        self.transact("create_gauge", |state, events| {
            if !state.registry.contains(pool) {
                return Err(ProtocolError::UnknownPool(*pool));
            }
            let (gauge, bribe) = (Contracts::gauge_for(pool), Contracts::bribe_for(pool));
            state.voter.create_gauge(*pool, gauge, bribe, now)?;
            state.gauges.insert(Gauge::new(
                gauge,
                *pool,
                state.contracts.gov_token,
                state.contracts.minter,
                state.params.reward_duration_secs,
            )?)?;
            state.bribes.insert(Bribe::new(
                bribe,
                *pool,
                state.params.epoch_length_secs,
                state.params.max_future_bribe_epochs,
            ))?;
            events.push(ProtocolEvent::GaugeCreated {
                pool: *pool,
                gauge,
                bribe,
            });
            Ok((gauge, bribe))
        })
    }

    /// Split the power of `id` across `pools` by relative `weights`.
    pub fn vote(
        &mut self,
        caller: &Address,
        id: PositionId,
        pools: &[Address],
        weights: &[u128],
        now: Timestamp,
    ) -> Result<u128, ProtocolError> {
        self.transact("vote", |state, events| {
            let used = state.voter.vote(&state.escrow, caller, id, pools, weights, now)?;
            events.push(ProtocolEvent::Voted {
                id,
                epoch: state.voter.current_epoch(now),
                pools: pools.to_vec(),
                used,
            });
            Ok(used)
        })
    }

    pub fn reset_votes(&mut self, caller: &Address, id: PositionId, now: Timestamp) -> Result<u128, ProtocolError> {
        self.transact("reset_votes", |state, events| {
            let released = state.voter.reset(&state.escrow, caller, id, now)?;
            events.push(ProtocolEvent::VotesReset { id, released });
            Ok(released)
        })
    }

    /// Re-cast the allocation of `id` with its current power.
    pub fn poke_votes(&mut self, caller: &Address, id: PositionId, now: Timestamp) -> Result<u128, ProtocolError> {
        self.transact("poke_votes", |state, events| {
            let used = state.voter.poke(&state.escrow, caller, id, now)?;
            events.push(ProtocolEvent::VotesPoked { id, used });
            Ok(used)
        })
    }

    // ── Reward streams ───────────────────────────────────────────────────

    /// Stake LP shares of `pool`. The caller must have approved the gauge.
    pub fn gauge_deposit(
        &mut self,
        caller: &Address,
        pool: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        self.transact("gauge_deposit", |state, events| {
            state.require_external(caller)?;
            state.gauges.get_mut(pool)?.deposit(&mut state.bank, caller, amount, now)?;
            events.push(ProtocolEvent::Staked {
                pool: *pool,
                account: *caller,
                amount,
            });
            Ok(())
        })
    }

    pub fn gauge_withdraw(
        &mut self,
        caller: &Address,
        pool: &Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        self.transact("gauge_withdraw", |state, events| {
            state.gauges.get_mut(pool)?.withdraw(&mut state.bank, caller, amount, now)?;
            events.push(ProtocolEvent::Unstaked {
                pool: *pool,
                account: *caller,
                amount,
            });
            Ok(())
        })
    }

    pub fn gauge_get_reward(&mut self, caller: &Address, pool: &Address, now: Timestamp) -> Result<u128, ProtocolError> {
        self.transact("gauge_get_reward", |state, events| {
            let amount = state.gauges.get_mut(pool)?.get_reward(&mut state.bank, caller, now)?;
            if amount > 0 {
                events.push(ProtocolEvent::RewardPaid {
                    pool: *pool,
                    account: *caller,
                    amount,
                });
            }
            Ok(amount)
        })
    }

    pub fn earned(&self, pool: &Address, account: &Address, now: Timestamp) -> Result<u128, ProtocolError> {
        Ok(self.state.gauges.get(pool)?.earned(account, now)?)
    }

    // ── Incentives ───────────────────────────────────────────────────────

    /// Earmark `amount` of `token` for the voters of `pool` in `epoch`. The
    /// caller must have approved the pool's incentive vault.
    #[allow(clippy::too_many_arguments)]
    pub fn deposit_bribe(
        &mut self,
        caller: &Address,
        pool: &Address,
        token: &Address,
        amount: u128,
        epoch: Epoch,
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        self.transact("deposit_bribe", |state, events| {
            state.require_external(caller)?;
            state
                .bribes
                .get_mut(pool)?
                .deposit_bribe(&mut state.bank, caller, token, amount, epoch, now)?;
            events.push(ProtocolEvent::BribeDeposited {
                pool: *pool,
                token: *token,
                epoch,
                depositor: *caller,
                amount,
            });
            Ok(())
        })
    }

    /// Pay position `id` its share of each `(tokens[i], epochs[i])` deposit.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_bribes(
        &mut self,
        caller: &Address,
        pool: &Address,
        id: PositionId,
        tokens: &[Address],
        epochs: &[Epoch],
        now: Timestamp,
    ) -> Result<Vec<Claim>, ProtocolError> {
        self.transact("claim_bribes", |state, events| {
            let claims = state.bribes.get_mut(pool)?.claim(
                &mut state.bank,
                &state.voter,
                &state.escrow,
                caller,
                id,
                tokens,
                epochs,
                now,
            )?;
            let total = claims.iter().fold(0u128, |acc, c| acc.saturating_add(c.amount));
            info!(target: "protocol", %pool, id, keys = claims.len(), total, "incentives claimed");
            events.push(ProtocolEvent::BribeClaimed {
                pool: *pool,
                id,
                claims: claims.clone(),
            });
            Ok(claims)
        })
    }

    /// Recover a deposit for an elapsed epoch in which `pool` got no votes.
    pub fn refund_bribe(
        &mut self,
        caller: &Address,
        pool: &Address,
        token: &Address,
        epoch: Epoch,
        now: Timestamp,
    ) -> Result<u128, ProtocolError> {
        self.transact("refund_bribe", |state, events| {
            let amount = state
                .bribes
                .get_mut(pool)?
                .refund(&mut state.bank, &state.voter, caller, token, epoch, now)?;
            events.push(ProtocolEvent::BribeRefunded {
                pool: *pool,
                token: *token,
                epoch,
                depositor: *caller,
                amount,
            });
            Ok(amount)
        })
    }
}

//! The protocol host: atomic execution, events and administration.

use crate::error::ProtocolError;
use crate::events::{AdminParam, ParamValue, ProtocolEvent};
use crate::roles::Role;
use crate::state::{GenesisConfig, ProtocolState};
use puddel_escrow::PositionId;
use puddel_fees::Destinations;
use puddel_types::{Address, FeeSplits, ReentrancyGuard, Timestamp};
use tracing::{debug, info, warn};

/// Every component plus the token ledger, behind one non-reentrant,
/// all-or-nothing entry surface.
///
/// Entry points take the acting `caller` and the current time explicitly.
pub struct Protocol {
    pub(crate) state: ProtocolState,
    pub(crate) guard: ReentrancyGuard,
    pub(crate) events: Vec<ProtocolEvent>,
}

impl Protocol {
    pub fn genesis(config: &GenesisConfig, now: Timestamp) -> Result<Self, ProtocolError> {
        let state = ProtocolState::genesis(config, now)?;
        info!(
            target: "protocol",
            admin = %config.admin,
            allocations = config.allocations.len(),
            genesis_supply = state.genesis_supply,
            "genesis"
        );
        Ok(Self::from_state(state))
    }

    pub(crate) fn from_state(state: ProtocolState) -> Self {
        Self {
            state,
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    /// Hand over committed events and clear the log.
    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `op` against the state as one atomic step.
    ///
    /// Re-entry while another step runs fails with [`ProtocolError::Reentrancy`].
    /// On error the state is restored and buffered events are dropped.
    pub(crate) fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut ProtocolState, &mut Vec<ProtocolEvent>) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        if !self.guard.try_enter() {
            warn!(target: "protocol", op, "re-entrant call rejected");
            return Err(ProtocolError::Reentrancy);
        }
        let checkpoint = self.state.clone();
        let mut pending = Vec::new();
        let result = f(&mut self.state, &mut pending);
        self.guard.exit();
        match &result {
            Ok(_) => {
                debug!(target: "protocol", op, events = pending.len(), "committed");
                self.events.append(&mut pending);
            }
            Err(error) => {
                self.state = checkpoint;
                debug!(target: "protocol", op, %error, "rolled back");
            }
        }
        result
    }

    // ── Roles ────────────────────────────────────────────────────────────

    pub fn has_role(&self, account: &Address, role: Role) -> bool {
        self.state.roles.has(account, role)
    }

    /// Admin only. Returns `false` if the role was already held.
    pub fn grant_role(&mut self, caller: &Address, account: &Address, role: Role) -> Result<bool, ProtocolError> {
        self.transact("grant_role", |state, events| {
            state.require_role(caller, Role::Admin)?;
            let granted = state.roles.grant(*account, role);
            if granted {
                info!(target: "protocol", %account, %role, by = %caller, "role granted");
                events.push(ProtocolEvent::RoleGranted {
                    account: *account,
                    role,
                    by: *caller,
                });
            }
            Ok(granted)
        })
    }

    /// Admin only. Returns `false` if the role was not held.
    pub fn revoke_role(&mut self, caller: &Address, account: &Address, role: Role) -> Result<bool, ProtocolError> {
        self.transact("revoke_role", |state, events| {
            state.require_role(caller, Role::Admin)?;
            let revoked = state.roles.revoke(account, role);
            if revoked {
                info!(target: "protocol", %account, %role, by = %caller, "role revoked");
                events.push(ProtocolEvent::RoleRevoked {
                    account: *account,
                    role,
                    by: *caller,
                });
            }
            Ok(revoked)
        })
    }

    // ── Administrative setters ───────────────────────────────────────────

    /// Operations role. Bounded by the hard emission ceiling.
    pub fn set_emission_per_epoch(&mut self, caller: &Address, amount: u128) -> Result<u128, ProtocolError> {
        self.transact("set_emission_per_epoch", |state, events| {
            state.require_role(caller, Role::Operations)?;
            let old = state.minter.set_emission_per_epoch(amount)?;
            events.push(param_changed(
                AdminParam::EmissionPerEpoch,
                ParamValue::Amount(old),
                ParamValue::Amount(amount),
                caller,
            ));
            Ok(old)
        })
    }

    /// Operations role. Bounded by the decay ceiling.
    pub fn set_decay_bps(&mut self, caller: &Address, bps: u32) -> Result<u32, ProtocolError> {
        self.transact("set_decay_bps", |state, events| {
            state.require_role(caller, Role::Operations)?;
            let old = state.minter.set_decay_bps(bps)?;
            events.push(param_changed(AdminParam::DecayBps, ParamValue::Bps(old), ParamValue::Bps(bps), caller));
            Ok(old)
        })
    }

    /// Operations role. Cannot drop below the current decay rate.
    pub fn set_decay_ceiling_bps(&mut self, caller: &Address, bps: u32) -> Result<u32, ProtocolError> {
        self.transact("set_decay_ceiling_bps", |state, events| {
            state.require_role(caller, Role::Operations)?;
            let old = state.minter.set_decay_ceiling_bps(bps)?;
            events.push(param_changed(
                AdminParam::DecayCeilingBps,
                ParamValue::Bps(old),
                ParamValue::Bps(bps),
                caller,
            ));
            Ok(old)
        })
    }

    /// Operations role. The four parts must still sum to 100%.
    pub fn set_fee_splits(&mut self, caller: &Address, splits: FeeSplits) -> Result<FeeSplits, ProtocolError> {
        self.transact("set_fee_splits", |state, events| {
            state.require_role(caller, Role::Operations)?;
            let old = state.fees.set_splits(splits)?;
            events.push(param_changed(
                AdminParam::FeeSplits,
                ParamValue::Splits(old),
                ParamValue::Splits(splits),
                caller,
            ));
            Ok(old)
        })
    }

    /// Admin role.
    pub fn set_fee_destinations(
        &mut self,
        caller: &Address,
        destinations: Destinations,
    ) -> Result<Destinations, ProtocolError> {
        self.transact("set_fee_destinations", |state, events| {
            state.require_role(caller, Role::Admin)?;
            let old = state.fees.set_destinations(destinations)?;
            events.push(param_changed(
                AdminParam::FeeDestinations,
                ParamValue::Destinations(old),
                ParamValue::Destinations(destinations),
                caller,
            ));
            Ok(old)
        })
    }

    /// Admin role. `None` switches the protocol fee off.
    pub fn set_fee_to(&mut self, caller: &Address, fee_to: Option<Address>) -> Result<Option<Address>, ProtocolError> {
        self.transact("set_fee_to", |state, events| {
            state.require_role(caller, Role::Admin)?;
            let host = state.contracts.host;
            let old = state.registry.set_fee_to(&host, fee_to)?;
            info!(target: "protocol", ?old, new = ?fee_to, "fee recipient changed");
            events.push(param_changed(
                AdminParam::FeeTo,
                ParamValue::Recipient(old),
                ParamValue::Recipient(fee_to),
                caller,
            ));
            Ok(old)
        })
    }

    /// Admin role. Affects new locks and extensions only.
    pub fn set_tier_multiplier(&mut self, caller: &Address, tier: u8, bps: u32) -> Result<u32, ProtocolError> {
        self.transact("set_tier_multiplier", |state, events| {
            state.require_role(caller, Role::Admin)?;
            let old = state.escrow.set_tier_multiplier(tier, bps)?;
            events.push(param_changed(
                AdminParam::TierMultiplier { tier },
                ParamValue::Bps(old),
                ParamValue::Bps(bps),
                caller,
            ));
            Ok(old)
        })
    }

    /// Operations role.
    pub fn set_activity_bonus(
        &mut self,
        caller: &Address,
        id: PositionId,
        bps: u32,
        now: Timestamp,
    ) -> Result<u32, ProtocolError> {
        self.transact("set_activity_bonus", |state, events| {
            state.require_role(caller, Role::Operations)?;
            let old = state.escrow.set_activity_bonus(id, bps, now)?;
            events.push(param_changed(
                AdminParam::ActivityBonus { id },
                ParamValue::Bps(old),
                ParamValue::Bps(bps),
                caller,
            ));
            Ok(old)
        })
    }
}

fn param_changed(param: AdminParam, old: ParamValue, new: ParamValue, by: &Address) -> ProtocolEvent {
    info!(target: "protocol", %param, ?old, ?new, %by, "parameter changed");
    ProtocolEvent::ParamChanged {
        param,
        old,
        new,
        by: *by,
    }
}

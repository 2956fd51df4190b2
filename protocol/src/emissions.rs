//! Epoch rolls and fee harvests. Both are permissionless.

use crate::error::ProtocolError;
use crate::events::ProtocolEvent;
use crate::host::Protocol;
use puddel_fees::Harvest;
use puddel_minter::EmissionRecord;
use puddel_types::{Address, Timestamp};

impl Protocol {
    /// Roll into the epoch containing `now` and stream its emissions into the
    /// gauges by the previous epoch's votes.
    pub fn update_epoch(&mut self, now: Timestamp) -> Result<EmissionRecord, ProtocolError> {
        self.transact("update_epoch", |state, events| {
            let record = state
                .minter
                .update_epoch(&mut state.bank, &state.voter, &mut state.gauges, now)?;
            events.push(ProtocolEvent::EpochRolled(record.clone()));
            Ok(record)
        })
    }

    /// Whether [`Protocol::update_epoch`] would advance at `now`.
    pub fn can_update_epoch(&self, now: Timestamp) -> bool {
        self.state.minter.can_update(now)
    }

    /// Redeem the protocol's LP fee shares of `pool` and split the proceeds.
    pub fn harvest_fees(&mut self, pool: &Address, now: Timestamp) -> Result<Harvest, ProtocolError> {
        self.transact("harvest_fees", |state, events| {
            if !state.registry.contains(pool) {
                return Err(ProtocolError::UnknownPool(*pool));
            }
            let harvest = state
                .fees
                .harvest(&mut state.bank, &mut state.registry, pool, now)?;
            for split in harvest.splits.iter().filter(|s| s.burn_forwarded) {
                events.push(ProtocolEvent::BurnForwarded {
                    pool: *pool,
                    token: split.token,
                    amount: split.burn,
                });
            }
            events.push(ProtocolEvent::FeesHarvested(harvest.clone()));
            Ok(harvest)
        })
    }

    /// LP shares of `pool` waiting to be harvested.
    pub fn pending_fees(&self, pool: &Address) -> u128 {
        self.state.fees.pending(&self.state.bank, pool)
    }
}

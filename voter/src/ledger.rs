//! Read interfaces the allocator exposes to the emission scheduler and the incentive vaults.

use puddel_escrow::PositionId;
use puddel_types::{Address, Epoch};

/// Consumed by the emission scheduler.
pub trait GaugeRegistry {
    /// Pools with a gauge, in creation order.
    fn gauges(&self) -> Vec<Address>;

    /// The gauge contract address of `pool`.
    fn gauge_of(&self, pool: &Address) -> Option<Address>;

    fn epoch_gauge_weight(&self, epoch: Epoch, pool: &Address) -> u128;

    fn epoch_total_weight(&self, epoch: Epoch) -> u128;
}

/// Consumed by the incentive vaults.
pub trait EpochVoteLedger: GaugeRegistry {
    /// Weight `id` contributed to `pool` during `epoch`.
    fn position_epoch_weight(&self, epoch: Epoch, pool: &Address, id: PositionId) -> u128;
}

//! Lock duration tiers.

use crate::error::EscrowError;
use puddel_types::params::{MAX_TIER_MULTIPLIER_BPS, MIN_TIER_MULTIPLIER_BPS};
use puddel_types::LockTierParams;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    tiers: Vec<LockTierParams>,
}

impl TierTable {
    /// Tiers are taken as validated by `ProtocolParams::validate`.
    pub fn new(tiers: Vec<LockTierParams>) -> Self {
        Self { tiers }
    }

    pub fn get(&self, tier: u8) -> Result<&LockTierParams, EscrowError> {
        self.tiers
            .get(tier as usize)
            .ok_or(EscrowError::UnknownTier(tier))
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LockTierParams> {
        self.tiers.iter()
    }

    /// Returns the previous multiplier.
    pub fn set_multiplier(&mut self, tier: u8, bps: u32) -> Result<u32, EscrowError> {
        if !(MIN_TIER_MULTIPLIER_BPS..=MAX_TIER_MULTIPLIER_BPS).contains(&bps) {
            return Err(EscrowError::MultiplierOutOfBounds {
                bps,
                min: MIN_TIER_MULTIPLIER_BPS,
                max: MAX_TIER_MULTIPLIER_BPS,
            });
        }
        let entry = self
            .tiers
            .get_mut(tier as usize)
            .ok_or(EscrowError::UnknownTier(tier))?;
        Ok(std::mem::replace(&mut entry.multiplier_bps, bps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puddel_types::ProtocolParams;

    #[test]
    fn unknown_tier_rejected() {
        let table = TierTable::new(ProtocolParams::default().lock_tiers);
        assert_eq!(table.get(6), Err(EscrowError::UnknownTier(6)));
        assert_eq!(table.get(3).unwrap().multiplier_bps, 30_000);
    }

    #[test]
    fn multiplier_bounds() {
        let mut table = TierTable::new(ProtocolParams::default().lock_tiers);
        assert!(matches!(
            table.set_multiplier(0, 9_999),
            Err(EscrowError::MultiplierOutOfBounds { .. })
        ));
        assert!(table.set_multiplier(0, 100_001).is_err());
        assert_eq!(table.set_multiplier(0, 100_000).unwrap(), 10_000);
        assert_eq!(table.get(0).unwrap().multiplier_bps, 100_000);
    }
}

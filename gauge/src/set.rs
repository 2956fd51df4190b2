//! All reward streamers, keyed by pool.

use crate::error::GaugeError;
use crate::gauge::Gauge;
use puddel_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeSet {
    gauges: BTreeMap<Address, Gauge>,
}

impl GaugeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gauge: Gauge) -> Result<(), GaugeError> {
        if self.gauges.contains_key(&gauge.pool) {
            return Err(GaugeError::GaugeExists(gauge.pool));
        }
        self.gauges.insert(gauge.pool, gauge);
        Ok(())
    }

    pub fn get(&self, pool: &Address) -> Result<&Gauge, GaugeError> {
        self.gauges.get(pool).ok_or(GaugeError::UnknownGauge(*pool))
    }

    pub fn get_mut(&mut self, pool: &Address) -> Result<&mut Gauge, GaugeError> {
        self.gauges
            .get_mut(pool)
            .ok_or(GaugeError::UnknownGauge(*pool))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gauge> {
        self.gauges.values()
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }
}

//! Timestamps and epochs.
//!
//! Timestamps are Unix seconds supplied by the host for every call; nothing in
//! the core reads a wall clock. An epoch is `floor(timestamp / epoch_length)`,
//! a pure function of time, so no component stores "the current epoch".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-supplied Unix seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `self` to `now`, zero if `now` is earlier.
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// True once `now` reaches `self + duration_secs`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }

    pub fn saturating_add(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn checked_add(&self, secs: u64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A fixed-length accounting window for votes, emissions and bribes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    pub const GENESIS: Self = Self(0);

    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// The epoch containing `now`. A zero epoch length maps everything to genesis.
    pub fn at(now: Timestamp, epoch_length_secs: u64) -> Self {
        Self(now.as_secs().checked_div(epoch_length_secs).unwrap_or(0))
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    pub fn previous(&self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// First second belonging to this epoch.
    pub fn start(&self, epoch_length_secs: u64) -> Timestamp {
        Timestamp::new(self.0.saturating_mul(epoch_length_secs))
    }

    /// First second of the following epoch.
    pub fn end(&self, epoch_length_secs: u64) -> Timestamp {
        self.next().start(epoch_length_secs)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: u64 = 7 * 24 * 3600;

    #[test]
    fn epoch_is_floor_of_time() {
        assert_eq!(Epoch::at(Timestamp::new(0), WEEK), Epoch::new(0));
        assert_eq!(Epoch::at(Timestamp::new(WEEK - 1), WEEK), Epoch::new(0));
        assert_eq!(Epoch::at(Timestamp::new(WEEK), WEEK), Epoch::new(1));
        assert_eq!(Epoch::at(Timestamp::new(10 * WEEK + 5), WEEK), Epoch::new(10));
    }

    #[test]
    fn epoch_bounds() {
        let e = Epoch::new(3);
        assert_eq!(e.start(WEEK), Timestamp::new(3 * WEEK));
        assert_eq!(e.end(WEEK), Timestamp::new(4 * WEEK));
        assert_eq!(Epoch::at(e.start(WEEK), WEEK), e);
        assert_eq!(Epoch::at(Timestamp::new(e.end(WEEK).as_secs() - 1), WEEK), e);
    }

    #[test]
    fn genesis_has_no_previous() {
        assert_eq!(Epoch::GENESIS.previous(), None);
        assert_eq!(Epoch::new(5).previous(), Some(Epoch::new(4)));
    }

    #[test]
    fn zero_length_maps_to_genesis() {
        assert_eq!(Epoch::at(Timestamp::new(12345), 0), Epoch::GENESIS);
    }

    #[test]
    fn timestamp_expiry() {
        let t = Timestamp::new(100);
        assert!(!t.has_expired(50, Timestamp::new(149)));
        assert!(t.has_expired(50, Timestamp::new(150)));
        assert_eq!(t.elapsed_since(Timestamp::new(90)), 0);
    }
}

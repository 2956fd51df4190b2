//! Hand-driven time source for tests and the simulator.

use puddel_types::{Epoch, Timestamp};
use std::cell::Cell;

/// Seconds counter that moves only through `advance*` and `set`.
pub struct NullClock {
    current: Cell<u64>,
    epoch_length_secs: u64,
}

impl NullClock {
    pub fn new(initial_secs: u64, epoch_length_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
            epoch_length_secs,
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    pub fn epoch(&self) -> Epoch {
        Epoch::at(self.now(), self.epoch_length_secs)
    }

    pub fn advance(&self, secs: u64) {
        self.current.set(self.current.get().saturating_add(secs));
    }

    /// Jump to the first second of the epoch `n` epochs ahead.
    pub fn advance_epochs(&self, n: u64) {
        let target = Epoch::new(self.epoch().number().saturating_add(n));
        self.current.set(target.start(self.epoch_length_secs).as_secs());
    }

    pub fn set(&self, secs: u64) {
        self.current.set(secs);
    }
}

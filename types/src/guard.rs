//! Non-reentrant guard: a single in-progress flag per call stack.

use serde::{Deserialize, Serialize};

/// Tracks whether a state-mutating entry point is currently executing.
///
/// An entry point calls [`ReentrancyGuard::try_enter`] before touching state
/// and [`ReentrancyGuard::exit`] when it returns, on success and failure alike.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an entry point as in progress. Returns `false` if one already is.
    pub fn try_enter(&mut self) -> bool {
        if self.entered {
            return false;
        }
        self.entered = true;
        true
    }

    pub fn exit(&mut self) {
        self.entered = false;
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

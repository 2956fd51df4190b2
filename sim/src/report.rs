//! The JSON report of a simulation run.
//!
//! Everything is keyed by scenario labels and symbols rather than addresses.
//! Amounts are whole-token strings from [`puddel_utils::format_amount`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub epochs: Vec<EpochReport>,
    pub balances: Vec<AccountBalances>,
    pub gov_supply: String,
    pub total_minted: String,
    pub total_burned: String,
    pub events: usize,
}

/// One replayed epoch: activity inside it, then the roll that closed it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: u64,
    /// Votes cast for the epoch.
    pub total_weight: String,
    pub bribes_deposited: String,
    pub swaps: usize,
    pub swap_volume: Vec<TokenAmount>,
    /// Emission minted when the next epoch opened.
    pub minted: String,
    pub allocations: Vec<PoolAmount>,
    pub bribes_claimed: Vec<TokenAmount>,
    pub rewards_paid: String,
    pub fees: Vec<FeeReport>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeReport {
    pub pool: String,
    pub token: String,
    pub amount: String,
    pub stakers: String,
    pub treasury: String,
    pub emergency: String,
    pub burned: String,
    pub burn_forwarded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAmount {
    pub pool: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub account: String,
    pub tokens: Vec<TokenAmount>,
    pub locked: String,
    pub voting_power: String,
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

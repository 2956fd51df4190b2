//! TOML scenario description.
//!
//! Amounts in a scenario are whole tokens; the runner scales them to raw
//! units. Pools always pair the governance token with one quote token and are
//! referred to by that token's symbol.
//!
//! ```toml
//! epochs = 4
//! tokens = ["USDX"]
//!
//! [params]
//! emission_per_epoch = "1000000000000000000000000"
//!
//! [[accounts]]
//! label = "alice"
//! gov = 10000
//! tokens = { USDX = 10000 }
//!
//! [[pools]]
//! token = "USDX"
//! provider = "alice"
//! gov_amount = 5000
//! token_amount = 5000
//! stake = true
//! ```

use crate::error::SimError;
use puddel_protocol::GOV_SYMBOL;
use puddel_types::ProtocolParams;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Epochs replayed after setup.
    #[serde(default = "default_epochs")]
    pub epochs: u64,
    /// Label of the account holding both administrative roles.
    #[serde(default = "default_admin")]
    pub admin: String,
    /// Quote token symbols, minted by the faucet account.
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub params: ProtocolParams,
    #[serde(default)]
    pub destinations: DestinationLabels,
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
    /// Created once, before the first epoch.
    #[serde(default)]
    pub locks: Vec<LockEntry>,
    /// Re-cast every epoch for each of the account's positions.
    #[serde(default)]
    pub votes: Vec<VoteEntry>,
    /// Deposited every epoch, earmarked for that epoch.
    #[serde(default)]
    pub bribes: Vec<BribeEntry>,
    /// Executed every epoch.
    #[serde(default)]
    pub swaps: Vec<SwapEntry>,
    /// Added every epoch after the swaps, which accrues the protocol's fee
    /// share for the next harvest.
    #[serde(default)]
    pub liquidity: Vec<LiquidityEntry>,
}

/// Labels of the fee distributor's payout accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationLabels {
    pub stakers: String,
    pub treasury: String,
    pub emergency: String,
}

impl Default for DestinationLabels {
    fn default() -> Self {
        Self {
            stakers: "stakers".to_string(),
            treasury: "treasury".to_string(),
            emergency: "emergency".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountEntry {
    pub label: String,
    /// Governance tokens allocated at genesis.
    #[serde(default)]
    pub gov: u64,
    /// Quote token symbol → amount minted from the faucet.
    #[serde(default)]
    pub tokens: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolEntry {
    /// Quote token paired with the governance token.
    pub token: String,
    /// Account seeding the pool.
    pub provider: String,
    pub gov_amount: u64,
    pub token_amount: u64,
    /// Stake the provider's shares in the pool's gauge.
    #[serde(default)]
    pub stake: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockEntry {
    pub account: String,
    pub amount: u64,
    pub tier: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteEntry {
    pub account: String,
    pub pools: Vec<String>,
    pub weights: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BribeEntry {
    pub account: String,
    pub pool: String,
    /// Incentive token symbol; the governance symbol is allowed.
    pub token: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwapEntry {
    pub account: String,
    pub pool: String,
    /// Symbol of the token sold into the pool.
    pub sell: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiquidityEntry {
    pub account: String,
    pub pool: String,
    pub gov_amount: u64,
    pub token_amount: u64,
}

fn default_epochs() -> u64 {
    4
}

fn default_admin() -> String {
    "admin".to_string()
}

impl Scenario {
    pub fn from_toml(text: &str) -> Result<Self, SimError> {
        let scenario: Self = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let scenario = Self::from_toml(&text)?;
        info!(
            target: "sim",
            path = %path.display(),
            epochs = scenario.epochs,
            accounts = scenario.accounts.len(),
            pools = scenario.pools.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// Check the params and that every reference names something declared.
    pub fn validate(&self) -> Result<(), SimError> {
        self.params.validate()?;
        if self.epochs == 0 {
            return Err(SimError::Invalid("epochs must be at least 1".to_string()));
        }

        let mut labels = BTreeSet::new();
        for account in &self.accounts {
            if !labels.insert(account.label.as_str()) {
                return Err(SimError::Invalid(format!("duplicate account {:?}", account.label)));
            }
        }
        let mut symbols = BTreeSet::new();
        for symbol in &self.tokens {
            if symbol == GOV_SYMBOL || !symbols.insert(symbol.as_str()) {
                return Err(SimError::Invalid(format!("duplicate token {symbol:?}")));
            }
        }
        let mut pools = BTreeSet::new();
        for pool in &self.pools {
            if !pools.insert(pool.token.as_str()) {
                return Err(SimError::Invalid(format!("duplicate pool {:?}", pool.token)));
            }
        }

        let account = |name: &str| known("account", name, labels.contains(name));
        let token = |name: &str| known("token", name, name == GOV_SYMBOL || symbols.contains(name));
        let pool = |name: &str| known("pool", name, pools.contains(name));

        for entry in &self.accounts {
            entry.tokens.keys().try_for_each(|s| known("token", s, symbols.contains(s.as_str())))?;
        }
        for entry in &self.pools {
            known("token", &entry.token, symbols.contains(entry.token.as_str()))?;
            account(&entry.provider)?;
        }
        for entry in &self.locks {
            account(&entry.account)?;
            if entry.tier as usize >= self.params.lock_tiers.len() {
                return Err(SimError::Invalid(format!("lock tier {} does not exist", entry.tier)));
            }
        }
        for entry in &self.votes {
            account(&entry.account)?;
            entry.pools.iter().try_for_each(|p| pool(p))?;
            if entry.pools.len() != entry.weights.len() {
                return Err(SimError::Invalid(format!(
                    "vote of {:?} names {} pools but {} weights",
                    entry.account,
                    entry.pools.len(),
                    entry.weights.len()
                )));
            }
        }
        for entry in &self.bribes {
            account(&entry.account)?;
            pool(&entry.pool)?;
            token(&entry.token)?;
        }
        for entry in &self.swaps {
            account(&entry.account)?;
            pool(&entry.pool)?;
            if entry.sell != GOV_SYMBOL && entry.sell != entry.pool {
                return Err(SimError::Invalid(format!(
                    "swap sells {:?} into pool {:?}",
                    entry.sell, entry.pool
                )));
            }
        }
        for entry in &self.liquidity {
            account(&entry.account)?;
            pool(&entry.pool)?;
        }
        Ok(())
    }

    /// A small four-account flywheel, printed by `puddel-sim defaults`.
    pub fn example() -> Self {
        let usd = "USDX".to_string();
        let funded = |label: &str, gov: u64, quote: u64| AccountEntry {
            label: label.to_string(),
            gov,
            tokens: BTreeMap::from([(usd.clone(), quote)]),
        };
        Self {
            epochs: 4,
            admin: default_admin(),
            tokens: vec![usd.clone()],
            params: ProtocolParams::default(),
            destinations: DestinationLabels::default(),
            accounts: vec![
                funded("alice", 100_000, 0),
                funded("bob", 100_000, 10_000),
                funded("lp", 60_000, 60_000),
                funded("trader", 0, 100_000),
            ],
            pools: vec![PoolEntry {
                token: usd.clone(),
                provider: "lp".to_string(),
                gov_amount: 50_000,
                token_amount: 50_000,
                stake: true,
            }],
            locks: vec![
                LockEntry {
                    account: "alice".to_string(),
                    amount: 30_000,
                    tier: 5,
                },
                LockEntry {
                    account: "bob".to_string(),
                    amount: 10_000,
                    tier: 2,
                },
            ],
            votes: vec![
                VoteEntry {
                    account: "alice".to_string(),
                    pools: vec![usd.clone()],
                    weights: vec![1],
                },
                VoteEntry {
                    account: "bob".to_string(),
                    pools: vec![usd.clone()],
                    weights: vec![1],
                },
            ],
            bribes: vec![BribeEntry {
                account: "bob".to_string(),
                pool: usd.clone(),
                token: usd.clone(),
                amount: 500,
            }],
            swaps: vec![SwapEntry {
                account: "trader".to_string(),
                pool: usd.clone(),
                sell: usd.clone(),
                amount: 1_000,
            }],
            liquidity: vec![LiquidityEntry {
                account: "lp".to_string(),
                pool: usd,
                gov_amount: 100,
                token_amount: 100,
            }],
        }
    }
}

fn known(kind: &'static str, name: &str, present: bool) -> Result<(), SimError> {
    if present {
        Ok(())
    } else {
        Err(SimError::Unknown {
            kind,
            name: name.to_string(),
        })
    }
}

//! Events appended by successful entry points.

use crate::roles::Role;
use puddel_bribe::Claim;
use puddel_escrow::PositionId;
use puddel_fees::{Destinations, Harvest};
use puddel_minter::EmissionRecord;
use puddel_pair::SwapOutcome;
use puddel_types::{Address, Epoch, FeeSplits};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A setting that only a role holder may change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminParam {
    EmissionPerEpoch,
    DecayBps,
    DecayCeilingBps,
    FeeSplits,
    FeeDestinations,
    FeeTo,
    TierMultiplier { tier: u8 },
    ActivityBonus { id: PositionId },
}

impl AdminParam {
    /// Stable name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmissionPerEpoch => "emission_per_epoch",
            Self::DecayBps => "decay_bps",
            Self::DecayCeilingBps => "decay_ceiling_bps",
            Self::FeeSplits => "fee_splits",
            Self::FeeDestinations => "fee_destinations",
            Self::FeeTo => "fee_to",
            Self::TierMultiplier { .. } => "tier_multiplier",
            Self::ActivityBonus { .. } => "activity_bonus",
        }
    }
}

impl fmt::Display for AdminParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierMultiplier { tier } => write!(f, "{}[{tier}]", self.name()),
            Self::ActivityBonus { id } => write!(f, "{}[{id}]", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    Amount(u128),
    Bps(u32),
    Splits(FeeSplits),
    Destinations(Destinations),
    Recipient(Option<Address>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    // Tokens
    TokenCreated { token: Address, symbol: String, minter: Address },
    Minted { token: Address, to: Address, amount: u128 },
    Transfer { token: Address, from: Address, to: Address, amount: u128 },
    Approval { token: Address, owner: Address, spender: Address, amount: u128 },

    // Pairs
    PairCreated { pair: Address, token0: Address, token1: Address },
    LiquidityAdded { pair: Address, provider: Address, amount_a: u128, amount_b: u128, liquidity: u128 },
    LiquidityRemoved { pair: Address, provider: Address, amount_a: u128, amount_b: u128, liquidity: u128 },
    Swapped { caller: Address, path: Vec<Address>, amounts: Vec<u128>, to: Address },
    PairSwap { pair: Address, caller: Address, outcome: SwapOutcome, to: Address },
    Synced { pair: Address, reserve0: u128, reserve1: u128 },

    // Escrow
    LockCreated { id: PositionId, owner: Address, amount: u128, tier: u8, power: u128 },
    LockIncreased { id: PositionId, amount: u128, power: u128 },
    LockExtended { id: PositionId, tier: u8, power: u128 },
    LockWithdrawn { id: PositionId, owner: Address, amount: u128, votes_released: u128 },
    PositionTransferred { id: PositionId, from: Address, to: Address },
    PositionPoked { id: PositionId, power: u128 },

    // Votes
    GaugeCreated { pool: Address, gauge: Address, bribe: Address },
    Voted { id: PositionId, epoch: Epoch, pools: Vec<Address>, used: u128 },
    VotesReset { id: PositionId, released: u128 },
    VotesPoked { id: PositionId, used: u128 },

    // Reward streams
    Staked { pool: Address, account: Address, amount: u128 },
    Unstaked { pool: Address, account: Address, amount: u128 },
    RewardPaid { pool: Address, account: Address, amount: u128 },

    // Incentives
    BribeDeposited { pool: Address, token: Address, epoch: Epoch, depositor: Address, amount: u128 },
    BribeClaimed { pool: Address, id: PositionId, claims: Vec<Claim> },
    BribeRefunded { pool: Address, token: Address, epoch: Epoch, depositor: Address, amount: u128 },

    // Emissions and fees
    EpochRolled(EmissionRecord),
    FeesHarvested(Harvest),
    /// The burn share of `token` went to the treasury: no direct pair to the
    /// governance token.
    BurnForwarded { pool: Address, token: Address, amount: u128 },

    // Administration
    RoleGranted { account: Address, role: Role, by: Address },
    RoleRevoked { account: Address, role: Role, by: Address },
    ParamChanged { param: AdminParam, old: ParamValue, new: ParamValue, by: Address },
}

impl ProtocolEvent {
    /// Short kind tag for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenCreated { .. } => "token_created",
            Self::Minted { .. } => "minted",
            Self::Transfer { .. } => "transfer",
            Self::Approval { .. } => "approval",
            Self::PairCreated { .. } => "pair_created",
            Self::LiquidityAdded { .. } => "liquidity_added",
            Self::LiquidityRemoved { .. } => "liquidity_removed",
            Self::Swapped { .. } => "swapped",
            Self::PairSwap { .. } => "pair_swap",
            Self::Synced { .. } => "synced",
            Self::LockCreated { .. } => "lock_created",
            Self::LockIncreased { .. } => "lock_increased",
            Self::LockExtended { .. } => "lock_extended",
            Self::LockWithdrawn { .. } => "lock_withdrawn",
            Self::PositionTransferred { .. } => "position_transferred",
            Self::PositionPoked { .. } => "position_poked",
            Self::GaugeCreated { .. } => "gauge_created",
            Self::Voted { .. } => "voted",
            Self::VotesReset { .. } => "votes_reset",
            Self::VotesPoked { .. } => "votes_poked",
            Self::Staked { .. } => "staked",
            Self::Unstaked { .. } => "unstaked",
            Self::RewardPaid { .. } => "reward_paid",
            Self::BribeDeposited { .. } => "bribe_deposited",
            Self::BribeClaimed { .. } => "bribe_claimed",
            Self::BribeRefunded { .. } => "bribe_refunded",
            Self::EpochRolled(_) => "epoch_rolled",
            Self::FeesHarvested(_) => "fees_harvested",
            Self::BurnForwarded { .. } => "burn_forwarded",
            Self::RoleGranted { .. } => "role_granted",
            Self::RoleRevoked { .. } => "role_revoked",
            Self::ParamChanged { .. } => "param_changed",
        }
    }
}

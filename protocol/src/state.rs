//! The complete ledger state and its genesis.

use crate::error::ProtocolError;
use crate::roles::{Role, RoleSet};
use puddel_bribe::BribeSet;
use puddel_escrow::VotingEscrow;
use puddel_fees::{Destinations, FeeDistributor};
use puddel_gauge::GaugeSet;
use puddel_math::SafeMath;
use puddel_minter::Minter;
use puddel_pair::PairRegistry;
use puddel_token::{TokenBank, TokenLedger};
use puddel_types::{Address, ProtocolParams, Timestamp};
use puddel_voter::Voter;
use serde::{Deserialize, Serialize};

/// Ticker of the governance token.
pub const GOV_SYMBOL: &str = "PDL";

/// Fixed addresses of the protocol's own accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    /// Administers the pair registry's fee recipient on behalf of the admin role.
    pub host: Address,
    pub gov_token: Address,
    pub escrow: Address,
    pub minter: Address,
    pub fees: Address,
}

impl Contracts {
    pub fn derive() -> Self {
        let contract = |name: &str| Address::derive("puddel/contract", &[name.as_bytes()]);
        Self {
            host: contract("host"),
            gov_token: Address::derive("puddel/token", &[GOV_SYMBOL.as_bytes()]),
            escrow: contract("escrow"),
            minter: contract("minter"),
            fees: contract("fees"),
        }
    }

    pub fn gauge_for(pool: &Address) -> Address {
        Address::derive("puddel/gauge", &[pool.as_bytes()])
    }

    pub fn bribe_for(pool: &Address) -> Address {
        Address::derive("puddel/bribe", &[pool.as_bytes()])
    }
}

/// Governance tokens minted to `account` at genesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub account: Address,
    #[serde(with = "puddel_types::amount_serde")]
    pub amount: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub params: ProtocolParams,
    /// Receives both roles.
    pub admin: Address,
    pub destinations: Destinations,
    #[serde(default)]
    pub allocations: Vec<GenesisAllocation>,
}

/// Everything a snapshot persists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolState {
    pub params: ProtocolParams,
    pub contracts: Contracts,
    /// Governance tokens minted outside the emission schedule.
    pub genesis_supply: u128,
    pub bank: TokenLedger,
    pub registry: PairRegistry,
    pub escrow: VotingEscrow,
    pub voter: Voter,
    pub gauges: GaugeSet,
    pub bribes: BribeSet,
    pub minter: Minter,
    pub fees: FeeDistributor,
    pub roles: RoleSet,
}

impl ProtocolState {
    pub fn genesis(config: &GenesisConfig, now: Timestamp) -> Result<Self, ProtocolError> {
        let params = config.params.clone();
        params.validate()?;
        let contracts = Contracts::derive();

        let mut bank = TokenLedger::new();
        bank.create_token(contracts.gov_token, GOV_SYMBOL, contracts.minter)?;
        let mut genesis_supply = 0u128;
        for allocation in &config.allocations {
            bank.mint(
                &contracts.gov_token,
                &contracts.minter,
                &allocation.account,
                allocation.amount,
            )?;
            genesis_supply = genesis_supply.safe_add(allocation.amount)?;
        }

        let mut registry = PairRegistry::new(contracts.host);
        registry.set_fee_to(&contracts.host, Some(contracts.fees))?;
        let fees = FeeDistributor::new(
            contracts.fees,
            contracts.gov_token,
            params.fee_splits,
            config.destinations,
        )?;

        Ok(Self {
            escrow: VotingEscrow::new(contracts.escrow, contracts.gov_token, &params),
            voter: Voter::new(params.epoch_length_secs),
            gauges: GaugeSet::new(),
            bribes: BribeSet::new(),
            minter: Minter::new(contracts.minter, contracts.gov_token, &params, now),
            roles: RoleSet::genesis(config.admin),
            params,
            contracts,
            genesis_supply,
            bank,
            registry,
            fees,
        })
    }

    /// Accounts owned by a component. They never act as a caller.
    pub fn is_protocol_account(&self, account: &Address) -> bool {
        let c = &self.contracts;
        [c.host, c.gov_token, c.escrow, c.minter, c.fees].contains(account)
            || self.registry.contains(account)
            || self.gauges.iter().any(|g| g.address == *account)
            || self.bribes.iter().any(|b| b.address == *account)
    }

    pub fn require_external(&self, caller: &Address) -> Result<(), ProtocolError> {
        if self.is_protocol_account(caller) {
            return Err(ProtocolError::ProtocolAccount(*caller));
        }
        Ok(())
    }

    pub fn require_role(&self, caller: &Address, role: Role) -> Result<(), ProtocolError> {
        if self.roles.has(caller, role) {
            Ok(())
        } else {
            Err(ProtocolError::Unauthorized {
                caller: *caller,
                role,
            })
        }
    }
}

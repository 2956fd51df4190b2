//! Replays a [`Scenario`] against the protocol, one epoch at a time.

use crate::error::SimError;
use crate::report::{AccountBalances, EpochReport, FeeReport, PoolAmount, Report, TokenAmount};
use crate::scenario::Scenario;
use puddel_escrow::PositionId;
use puddel_fees::Destinations;
use puddel_pair::AddLiquidity;
use puddel_protocol::{Contracts, GenesisAllocation, GenesisConfig, Protocol, GOV_SYMBOL};
use puddel_token::TokenBank;
use puddel_types::{Address, Epoch, Timestamp, TOKEN_UNIT};
use puddel_utils::{format_amount, format_duration};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Mints every quote token.
const FAUCET: &str = "faucet";

fn whole(amount: u64) -> u128 {
    (amount as u128).saturating_mul(TOKEN_UNIT)
}

pub struct Simulation {
    scenario: Scenario,
    protocol: Protocol,
    now: Timestamp,
    epoch_length: u64,
    /// Symbol → token address, the governance token included.
    tokens: BTreeMap<String, Address>,
    /// Quote symbol → pair address.
    pools: BTreeMap<String, Address>,
    positions: BTreeMap<String, Vec<PositionId>>,
    epochs: Vec<EpochReport>,
}

impl Simulation {
    /// Genesis, token faucet, pool seeding and locks. Time starts at the
    /// beginning of epoch 1.
    pub fn new(scenario: Scenario) -> Result<Self, SimError> {
        scenario.validate()?;
        let epoch_length = scenario.params.epoch_length_secs;
        let now = Epoch::new(1).start(epoch_length);

        let config = GenesisConfig {
            params: scenario.params.clone(),
            admin: Address::from_label(&scenario.admin),
            destinations: Destinations {
                stakers: Address::from_label(&scenario.destinations.stakers),
                treasury: Address::from_label(&scenario.destinations.treasury),
                emergency: Address::from_label(&scenario.destinations.emergency),
            },
            allocations: scenario
                .accounts
                .iter()
                .filter(|a| a.gov > 0)
                .map(|a| GenesisAllocation {
                    account: Address::from_label(&a.label),
                    amount: whole(a.gov),
                })
                .collect(),
        };
        let protocol = Protocol::genesis(&config, now).map_err(SimError::step("genesis"))?;
        let mut tokens = BTreeMap::new();
        tokens.insert(GOV_SYMBOL.to_string(), protocol.state().contracts.gov_token);

        let mut sim = Self {
            scenario,
            protocol,
            now,
            epoch_length,
            tokens,
            pools: BTreeMap::new(),
            positions: BTreeMap::new(),
            epochs: Vec::new(),
        };
        sim.fund_accounts()?;
        sim.seed_pools()?;
        sim.create_locks()?;
        info!(
            target: "sim",
            epoch_length = %format_duration(epoch_length),
            tokens = sim.tokens.len(),
            pools = sim.pools.len(),
            positions = sim.positions.values().map(Vec::len).sum::<usize>(),
            "setup complete"
        );
        Ok(sim)
    }

    /// Replay every scenario epoch and report.
    pub fn run(mut self) -> Result<(Protocol, Report), SimError> {
        for _ in 0..self.scenario.epochs {
            self.step_epoch()?;
        }
        let report = self.report();
        Ok((self.protocol, report))
    }

    fn fund_accounts(&mut self) -> Result<(), SimError> {
        let faucet = Address::from_label(FAUCET);
        for symbol in &self.scenario.tokens {
            let token = self
                .protocol
                .create_token(&faucet, symbol)
                .map_err(SimError::step(format!("create token {symbol}")))?;
            self.tokens.insert(symbol.clone(), token);
        }
        for account in &self.scenario.accounts {
            let to = Address::from_label(&account.label);
            for (symbol, &amount) in &account.tokens {
                let token = self.token(symbol)?;
                self.protocol
                    .mint_token(&faucet, &token, &to, whole(amount))
                    .map_err(SimError::step(format!("fund {} with {symbol}", account.label)))?;
            }
        }
        Ok(())
    }

    fn seed_pools(&mut self) -> Result<(), SimError> {
        let gov = self.token(GOV_SYMBOL)?;
        for entry in self.scenario.pools.clone() {
            let provider = Address::from_label(&entry.provider);
            let quote = self.token(&entry.token)?;
            let step = format!("seed pool {}", entry.token);
            let added = self
                .protocol
                .add_liquidity(
                    &provider,
                    &liquidity(gov, quote, whole(entry.gov_amount), whole(entry.token_amount), provider, self.now),
                    self.now,
                )
                .map_err(SimError::step(step.clone()))?;
            self.protocol
                .create_gauge(&added.pair, self.now)
                .map_err(SimError::step(step.clone()))?;
            if entry.stake {
                self.protocol
                    .approve(&provider, &added.pair, &Contracts::gauge_for(&added.pair), added.liquidity)
                    .map_err(SimError::step(step.clone()))?;
                self.protocol
                    .gauge_deposit(&provider, &added.pair, added.liquidity, self.now)
                    .map_err(SimError::step(step))?;
            }
            self.pools.insert(entry.token, added.pair);
        }
        Ok(())
    }

    fn create_locks(&mut self) -> Result<(), SimError> {
        let gov = self.token(GOV_SYMBOL)?;
        let escrow = self.protocol.state().contracts.escrow;
        for entry in self.scenario.locks.clone() {
            let owner = Address::from_label(&entry.account);
            let amount = whole(entry.amount);
            let step = format!("lock for {}", entry.account);
            self.protocol
                .approve(&owner, &gov, &escrow, amount)
                .map_err(SimError::step(step.clone()))?;
            let id = self
                .protocol
                .create_lock(&owner, amount, entry.tier, self.now)
                .map_err(SimError::step(step))?;
            self.positions.entry(entry.account).or_default().push(id);
        }
        Ok(())
    }

    /// Vote, deposit incentives, trade and provide liquidity inside the
    /// current epoch, then roll into the next one, claim and harvest.
    pub fn step_epoch(&mut self) -> Result<(), SimError> {
        let epoch = Epoch::at(self.now, self.epoch_length);
        let mut report = EpochReport {
            epoch: epoch.number(),
            ..EpochReport::default()
        };

        self.cast_votes()?;
        report.bribes_deposited = format_amount(self.deposit_bribes(epoch)?);
        let volume = self.swap()?;
        report.swaps = self.scenario.swaps.len();
        report.swap_volume = self.labelled_tokens(volume);
        self.add_liquidity()?;

        self.now = epoch.end(self.epoch_length);
        let record = self
            .protocol
            .update_epoch(self.now)
            .map_err(SimError::step(format!("roll into {}", epoch.next())))?;
        report.total_weight = format_amount(record.total_weight);
        report.minted = format_amount(record.minted);
        report.allocations = self
            .pools
            .iter()
            .map(|(symbol, pair)| PoolAmount {
                pool: symbol.clone(),
                amount: format_amount(record.allocations.get(pair).copied().unwrap_or(0)),
            })
            .collect();

        let claimed = self.claim_bribes(epoch)?;
        report.bribes_claimed = self.labelled_tokens(claimed);
        report.rewards_paid = format_amount(self.claim_rewards()?);
        report.fees = self.harvest()?;

        self.protocol
            .check_invariants()
            .map_err(SimError::step(format!("invariants after {epoch}")))?;
        info!(
            target: "sim",
            %epoch,
            minted = %report.minted,
            weight = %report.total_weight,
            "epoch replayed"
        );
        self.epochs.push(report);
        Ok(())
    }

    fn cast_votes(&mut self) -> Result<(), SimError> {
        for entry in self.scenario.votes.clone() {
            let voter = Address::from_label(&entry.account);
            let pools = entry
                .pools
                .iter()
                .map(|p| self.pool(p))
                .collect::<Result<Vec<_>, _>>()?;
            let weights: Vec<u128> = entry.weights.iter().map(|&w| w as u128).collect();
            for id in self.positions.get(&entry.account).cloned().unwrap_or_default() {
                if self.protocol.voting_power(id, self.now) == 0 {
                    debug!(target: "sim", account = %entry.account, id, "expired position skips the vote");
                    continue;
                }
                self.protocol
                    .vote(&voter, id, &pools, &weights, self.now)
                    .map_err(SimError::step(format!("vote of {} with position {id}", entry.account)))?;
            }
        }
        Ok(())
    }

    fn deposit_bribes(&mut self, epoch: Epoch) -> Result<u128, SimError> {
        let mut total = 0u128;
        for entry in self.scenario.bribes.clone() {
            let depositor = Address::from_label(&entry.account);
            let pool = self.pool(&entry.pool)?;
            let token = self.token(&entry.token)?;
            let amount = whole(entry.amount);
            let step = format!("bribe of {} on {}", entry.account, entry.pool);
            self.protocol
                .approve(&depositor, &token, &Contracts::bribe_for(&pool), amount)
                .map_err(SimError::step(step.clone()))?;
            self.protocol
                .deposit_bribe(&depositor, &pool, &token, amount, epoch, self.now)
                .map_err(SimError::step(step))?;
            total = total.saturating_add(amount);
        }
        Ok(total)
    }

    /// Volume sold per token.
    fn swap(&mut self) -> Result<BTreeMap<Address, u128>, SimError> {
        let gov = self.token(GOV_SYMBOL)?;
        let mut volume = BTreeMap::new();
        for entry in self.scenario.swaps.clone() {
            let trader = Address::from_label(&entry.account);
            let quote = self.token(&entry.pool)?;
            let path = if entry.sell == GOV_SYMBOL { [gov, quote] } else { [quote, gov] };
            let amounts = self
                .protocol
                .swap_exact_tokens_for_tokens(&trader, whole(entry.amount), 0, &path, &trader, self.now, self.now)
                .map_err(SimError::step(format!("swap of {} in {}", entry.account, entry.pool)))?;
            let sold = amounts.first().copied().unwrap_or(0);
            let slot: &mut u128 = volume.entry(path[0]).or_default();
            *slot = slot.saturating_add(sold);
        }
        Ok(volume)
    }

    fn add_liquidity(&mut self) -> Result<(), SimError> {
        let gov = self.token(GOV_SYMBOL)?;
        for entry in self.scenario.liquidity.clone() {
            let provider = Address::from_label(&entry.account);
            let quote = self.token(&entry.pool)?;
            let request = liquidity(gov, quote, whole(entry.gov_amount), whole(entry.token_amount), provider, self.now);
            self.protocol
                .add_liquidity(&provider, &request, self.now)
                .map_err(SimError::step(format!("liquidity of {} in {}", entry.account, entry.pool)))?;
        }
        Ok(())
    }

    /// Claim every voter's share of `epoch`'s incentives on the pools it voted for.
    fn claim_bribes(&mut self, epoch: Epoch) -> Result<BTreeMap<Address, u128>, SimError> {
        let mut claimed = BTreeMap::new();
        for entry in self.scenario.votes.clone() {
            let voter = Address::from_label(&entry.account);
            for symbol in &entry.pools {
                let pool = self.pool(symbol)?;
                let mut tokens = Vec::new();
                for bribe in self.scenario.bribes.iter().filter(|b| &b.pool == symbol) {
                    let token = self.token(&bribe.token)?;
                    if !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
                if tokens.is_empty() {
                    continue;
                }
                let epochs = vec![epoch; tokens.len()];
                for id in self.positions.get(&entry.account).cloned().unwrap_or_default() {
                    let claims = self
                        .protocol
                        .claim_bribes(&voter, &pool, id, &tokens, &epochs, self.now)
                        .map_err(SimError::step(format!("claim of {} on {symbol}", entry.account)))?;
                    for claim in claims {
                        let slot: &mut u128 = claimed.entry(claim.token).or_default();
                        *slot = slot.saturating_add(claim.amount);
                    }
                }
            }
        }
        Ok(claimed)
    }

    fn claim_rewards(&mut self) -> Result<u128, SimError> {
        let mut total = 0u128;
        for entry in self.scenario.pools.clone().into_iter().filter(|p| p.stake) {
            let provider = Address::from_label(&entry.provider);
            let pool = self.pool(&entry.token)?;
            let paid = self
                .protocol
                .gauge_get_reward(&provider, &pool, self.now)
                .map_err(SimError::step(format!("reward of {} on {}", entry.provider, entry.token)))?;
            total = total.saturating_add(paid);
        }
        Ok(total)
    }

    fn harvest(&mut self) -> Result<Vec<FeeReport>, SimError> {
        let mut fees = Vec::new();
        for (symbol, pool) in self.pools.clone() {
            let harvest = self
                .protocol
                .harvest_fees(&pool, self.now)
                .map_err(SimError::step(format!("harvest of {symbol}")))?;
            for split in harvest.splits.iter().filter(|s| s.amount > 0) {
                fees.push(FeeReport {
                    pool: symbol.clone(),
                    token: self.symbol_of(&split.token),
                    amount: format_amount(split.amount),
                    stakers: format_amount(split.stakers),
                    treasury: format_amount(split.treasury),
                    emergency: format_amount(split.emergency),
                    burned: format_amount(split.burned),
                    burn_forwarded: split.burn_forwarded,
                });
            }
        }
        Ok(fees)
    }

    pub fn report(&self) -> Report {
        let state = self.protocol.state();
        let balances = self
            .scenario
            .accounts
            .iter()
            .map(|account| {
                let owner = Address::from_label(&account.label);
                let (locked, power) = state.escrow.positions_of(&owner).fold((0u128, 0u128), |(l, p), pos| {
                    (
                        l.saturating_add(pos.amount),
                        p.saturating_add(self.protocol.voting_power(pos.id, self.now)),
                    )
                });
                AccountBalances {
                    account: account.label.clone(),
                    tokens: self
                        .tokens
                        .iter()
                        .map(|(symbol, token)| TokenAmount {
                            token: symbol.clone(),
                            amount: format_amount(self.protocol.balance_of(token, &owner)),
                        })
                        .collect(),
                    locked: format_amount(locked),
                    voting_power: format_amount(power),
                }
            })
            .collect();
        let gov = state.contracts.gov_token;
        Report {
            epochs: self.epochs.clone(),
            balances,
            gov_supply: format_amount(state.bank.total_supply(&gov)),
            total_minted: format_amount(state.minter.total_minted()),
            total_burned: format_amount(state.fees.total_burned()),
            events: self.protocol.events().len(),
        }
    }

    fn token(&self, symbol: &str) -> Result<Address, SimError> {
        self.tokens.get(symbol).copied().ok_or_else(|| SimError::Unknown {
            kind: "token",
            name: symbol.to_string(),
        })
    }

    fn pool(&self, symbol: &str) -> Result<Address, SimError> {
        self.pools.get(symbol).copied().ok_or_else(|| SimError::Unknown {
            kind: "pool",
            name: symbol.to_string(),
        })
    }

    fn symbol_of(&self, token: &Address) -> String {
        self.tokens
            .iter()
            .find(|(_, address)| *address == token)
            .map(|(symbol, _)| symbol.clone())
            .unwrap_or_else(|| token.to_string())
    }

    fn labelled_tokens(&self, amounts: BTreeMap<Address, u128>) -> Vec<TokenAmount> {
        amounts
            .iter()
            .map(|(token, amount)| TokenAmount {
                token: self.symbol_of(token),
                amount: format_amount(*amount),
            })
            .collect()
    }
}

fn liquidity(gov: Address, quote: Address, gov_amount: u128, quote_amount: u128, to: Address, deadline: Timestamp) -> AddLiquidity {
    AddLiquidity {
        token_a: gov,
        token_b: quote,
        amount_a_desired: gov_amount,
        amount_b_desired: quote_amount,
        amount_a_min: 0,
        amount_b_min: 0,
        to,
        deadline,
    }
}

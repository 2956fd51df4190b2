//! Token ledger operations, liquidity and swaps.

use crate::error::ProtocolError;
use crate::events::ProtocolEvent;
use crate::host::Protocol;
use puddel_pair::{pair_address, router, sort_tokens, AddLiquidity, LiquidityAdded, RemoveLiquidity, SwapOutcome};
use puddel_token::TokenBank;
use puddel_types::{Address, Timestamp};
use tracing::{debug, info, warn};

/// Receiver of a pair swap's callback data.
///
/// Runs after the outputs have been paid, while the swap still holds the
/// protocol's guard: guarded entry points called from here fail with
/// [`ProtocolError::Reentrancy`]. Token ledger operations stay available, and
/// the pair re-syncs its reserves once the callee returns.
pub trait SwapCallee {
    fn on_swap(
        &mut self,
        host: &mut Protocol,
        sender: &Address,
        amount0_out: u128,
        amount1_out: u128,
        data: &[u8],
    ) -> Result<(), ProtocolError>;
}

impl Protocol {
    // ── Token ledger ─────────────────────────────────────────────────────
    //
    // The ledger stands in for external token contracts, so these calls take
    // no guard and may run from inside a swap callback. Component accounts
    // move value only through their own entry points.

    /// Deploy a token whose only minter is `caller`.
    pub fn create_token(&mut self, caller: &Address, symbol: &str) -> Result<Address, ProtocolError> {
        self.state.require_external(caller)?;
        let token = Address::derive("puddel/token", &[caller.as_bytes(), symbol.as_bytes()]);
        self.state.bank.create_token(token, symbol, *caller)?;
        self.events.push(ProtocolEvent::TokenCreated {
            token,
            symbol: symbol.to_string(),
            minter: *caller,
        });
        Ok(token)
    }

    pub fn mint_token(
        &mut self,
        caller: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ProtocolError> {
        self.state.require_external(caller)?;
        self.state.bank.mint(token, caller, to, amount)?;
        self.events.push(ProtocolEvent::Minted {
            token: *token,
            to: *to,
            amount,
        });
        Ok(())
    }

    pub fn transfer(
        &mut self,
        caller: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ProtocolError> {
        self.state.require_external(caller)?;
        self.state.bank.transfer(token, caller, to, amount)?;
        self.events.push(ProtocolEvent::Transfer {
            token: *token,
            from: *caller,
            to: *to,
            amount,
        });
        Ok(())
    }

    pub fn approve(
        &mut self,
        caller: &Address,
        token: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), ProtocolError> {
        self.state.require_external(caller)?;
        self.state.bank.approve(token, caller, spender, amount)?;
        self.events.push(ProtocolEvent::Approval {
            token: *token,
            owner: *caller,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    pub fn balance_of(&self, token: &Address, account: &Address) -> u128 {
        self.state.bank.balance_of(token, account)
    }

    // ── Pairs ────────────────────────────────────────────────────────────

    pub fn create_pair(&mut self, token_a: &Address, token_b: &Address) -> Result<Address, ProtocolError> {
        self.transact("create_pair", |state, events| {
            let pair = state.registry.create_pair(&mut state.bank, token_a, token_b)?;
            let created = state.registry.pair(&pair)?;
            events.push(ProtocolEvent::PairCreated {
                pair,
                token0: created.token0,
                token1: created.token1,
            });
            Ok(pair)
        })
    }

    /// Deposit both tokens from `caller` at the pair's current ratio.
    pub fn add_liquidity(
        &mut self,
        caller: &Address,
        request: &AddLiquidity,
        now: Timestamp,
    ) -> Result<LiquidityAdded, ProtocolError> {
        self.transact("add_liquidity", |state, events| {
            state.require_external(caller)?;
            let known = state.registry.get_pair(&request.token_a, &request.token_b).is_some();
            let added = router::add_liquidity(&mut state.registry, &mut state.bank, caller, request, now)?;
            if !known {
                let created = state.registry.pair(&added.pair)?;
                events.push(ProtocolEvent::PairCreated {
                    pair: added.pair,
                    token0: created.token0,
                    token1: created.token1,
                });
            }
            events.push(ProtocolEvent::LiquidityAdded {
                pair: added.pair,
                provider: *caller,
                amount_a: added.amount_a,
                amount_b: added.amount_b,
                liquidity: added.liquidity,
            });
            Ok(added)
        })
    }

    pub fn remove_liquidity(
        &mut self,
        caller: &Address,
        request: &RemoveLiquidity,
        now: Timestamp,
    ) -> Result<(u128, u128), ProtocolError> {
        self.transact("remove_liquidity", |state, events| {
            state.require_external(caller)?;
            let (amount_a, amount_b) =
                router::remove_liquidity(&mut state.registry, &mut state.bank, caller, request, now)?;
            let (token0, token1) = sort_tokens(&request.token_a, &request.token_b)?;
            let pair = pair_address(&token0, &token1);
            events.push(ProtocolEvent::LiquidityRemoved {
                pair,
                provider: *caller,
                amount_a,
                amount_b,
                liquidity: request.liquidity,
            });
            Ok((amount_a, amount_b))
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        caller: &Address,
        amount_in: u128,
        amount_out_min: u128,
        path: &[Address],
        to: &Address,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Vec<u128>, ProtocolError> {
        self.transact("swap_exact_tokens_for_tokens", |state, events| {
            state.require_external(caller)?;
            let amounts = router::swap_exact_tokens_for_tokens(
                &mut state.registry,
                &mut state.bank,
                caller,
                amount_in,
                amount_out_min,
                path,
                to,
                deadline,
                now,
            )?;
            events.push(ProtocolEvent::Swapped {
                caller: *caller,
                path: path.to_vec(),
                amounts: amounts.clone(),
                to: *to,
            });
            Ok(amounts)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn swap_tokens_for_exact_tokens(
        &mut self,
        caller: &Address,
        amount_out: u128,
        amount_in_max: u128,
        path: &[Address],
        to: &Address,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Vec<u128>, ProtocolError> {
        self.transact("swap_tokens_for_exact_tokens", |state, events| {
            state.require_external(caller)?;
            let amounts = router::swap_tokens_for_exact_tokens(
                &mut state.registry,
                &mut state.bank,
                caller,
                amount_out,
                amount_in_max,
                path,
                to,
                deadline,
                now,
            )?;
            events.push(ProtocolEvent::Swapped {
                caller: *caller,
                path: path.to_vec(),
                amounts: amounts.clone(),
                to: *to,
            });
            Ok(amounts)
        })
    }

    /// Low-level swap against a single pair.
    ///
    /// The input must already sit in the pair. When `data` is non-empty and a
    /// `callee` is given, it is invoked after the outputs are paid; any error
    /// from the swap or the callee undoes the whole call.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        caller: &Address,
        pair: &Address,
        amount0_out: u128,
        amount1_out: u128,
        to: &Address,
        data: &[u8],
        callee: Option<&mut dyn SwapCallee>,
        now: Timestamp,
    ) -> Result<SwapOutcome, ProtocolError> {
        if !self.guard.try_enter() {
            warn!(target: "protocol", op = "swap", "re-entrant call rejected");
            return Err(ProtocolError::Reentrancy);
        }
        let checkpoint = self.state.clone();
        let mark = self.events.len();
        let result = self.swap_inner(caller, pair, amount0_out, amount1_out, to, data, callee, now);
        self.guard.exit();
        if let Err(error) = &result {
            self.state = checkpoint;
            self.events.truncate(mark);
            debug!(target: "protocol", op = "swap", %error, "rolled back");
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_inner(
        &mut self,
        caller: &Address,
        pair: &Address,
        amount0_out: u128,
        amount1_out: u128,
        to: &Address,
        data: &[u8],
        callee: Option<&mut dyn SwapCallee>,
        now: Timestamp,
    ) -> Result<SwapOutcome, ProtocolError> {
        self.state.require_external(caller)?;
        let outcome = self
            .state
            .registry
            .swap(&mut self.state.bank, pair, amount0_out, amount1_out, to, now)?;
        self.events.push(ProtocolEvent::PairSwap {
            pair: *pair,
            caller: *caller,
            outcome,
            to: *to,
        });
        if let Some(callee) = callee.filter(|_| !data.is_empty()) {
            debug!(target: "protocol", %pair, len = data.len(), "invoking swap callback");
            callee.on_swap(self, caller, amount0_out, amount1_out, data)?;
            self.state.registry.sync(&self.state.bank, pair, now)?;
            let (reserve0, reserve1) = self.state.registry.pair(pair)?.reserves();
            self.events.push(ProtocolEvent::Synced {
                pair: *pair,
                reserve0,
                reserve1,
            });
        }
        Ok(outcome)
    }

    /// Send balances above the reserves of `pair` to `to`.
    pub fn skim(&mut self, pair: &Address, to: &Address) -> Result<(u128, u128), ProtocolError> {
        self.transact("skim", |state, _| {
            let skimmed = state.registry.skim(&mut state.bank, pair, to)?;
            info!(target: "protocol", %pair, %to, amount0 = skimmed.0, amount1 = skimmed.1, "skimmed");
            Ok(skimmed)
        })
    }

    /// Force the reserves of `pair` to match its balances.
    pub fn sync(&mut self, pair: &Address, now: Timestamp) -> Result<(), ProtocolError> {
        self.transact("sync", |state, events| {
            state.registry.sync(&state.bank, pair, now)?;
            let (reserve0, reserve1) = state.registry.pair(pair)?.reserves();
            events.push(ProtocolEvent::Synced {
                pair: *pair,
                reserve0,
                reserve1,
            });
            Ok(())
        })
    }
}

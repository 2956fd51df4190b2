//! Slippage-checked liquidity and swap flows.
//!
//! The router moves the caller's tokens into the right pair and then calls the
//! pair engine, so callers never have to hand-compute deposit ratios or
//! intermediate hops.

use crate::error::PairError;
use crate::library::{get_amounts_in, get_amounts_out, quote};
use crate::registry::{pair_address, sort_tokens, PairRegistry};
use puddel_token::TokenBank;
use puddel_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: u128,
    pub amount_b_desired: u128,
    pub amount_a_min: u128,
    pub amount_b_min: u128,
    pub to: Address,
    pub deadline: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: u128,
    pub amount_a_min: u128,
    pub amount_b_min: u128,
    pub to: Address,
    pub deadline: Timestamp,
}

/// Amounts actually deposited and shares minted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub pair: Address,
    pub amount_a: u128,
    pub amount_b: u128,
    pub liquidity: u128,
}

fn ensure(deadline: Timestamp, now: Timestamp) -> Result<(), PairError> {
    if now > deadline {
        return Err(PairError::Expired { deadline, now });
    }
    Ok(())
}

fn at_least(actual: u128, limit: u128) -> Result<(), PairError> {
    if actual < limit {
        return Err(PairError::SlippageExceeded { actual, limit });
    }
    Ok(())
}

/// Deposit amounts for a pair with the given reserves, honouring both minima.
pub fn optimal_amounts(
    reserves: (u128, u128),
    desired: (u128, u128),
    minimum: (u128, u128),
) -> Result<(u128, u128), PairError> {
    let (reserve_a, reserve_b) = reserves;
    let (desired_a, desired_b) = desired;
    if reserve_a == 0 && reserve_b == 0 {
        return Ok(desired);
    }
    let b_optimal = quote(desired_a, reserve_a, reserve_b)?;
    if b_optimal <= desired_b {
        at_least(b_optimal, minimum.1)?;
        return Ok((desired_a, b_optimal));
    }
    let a_optimal = quote(desired_b, reserve_b, reserve_a)?;
    // a_optimal <= desired_a whenever b_optimal > desired_b
    at_least(a_optimal, minimum.0)?;
    Ok((a_optimal, desired_b))
}

/// Add liquidity from `caller`, creating the pair if it does not exist yet.
pub fn add_liquidity<B: TokenBank + ?Sized>(
    registry: &mut PairRegistry,
    bank: &mut B,
    caller: &Address,
    request: &AddLiquidity,
    now: Timestamp,
) -> Result<LiquidityAdded, PairError> {
    ensure(request.deadline, now)?;
    let pair = match registry.get_pair(&request.token_a, &request.token_b) {
        Some(pair) => pair,
        None => registry.create_pair(bank, &request.token_a, &request.token_b)?,
    };
    let reserves = registry.pair(&pair)?.reserves_for(&request.token_a);
    let (amount_a, amount_b) = optimal_amounts(
        reserves,
        (request.amount_a_desired, request.amount_b_desired),
        (request.amount_a_min, request.amount_b_min),
    )?;
    bank.transfer(&request.token_a, caller, &pair, amount_a)?;
    bank.transfer(&request.token_b, caller, &pair, amount_b)?;
    let liquidity = registry.mint(bank, &pair, &request.to, now)?;
    Ok(LiquidityAdded {
        pair,
        amount_a,
        amount_b,
        liquidity,
    })
}

/// Return `liquidity` LP shares from `caller` and receive both tokens.
pub fn remove_liquidity<B: TokenBank + ?Sized>(
    registry: &mut PairRegistry,
    bank: &mut B,
    caller: &Address,
    request: &RemoveLiquidity,
    now: Timestamp,
) -> Result<(u128, u128), PairError> {
    ensure(request.deadline, now)?;
    let (token0, token1) = sort_tokens(&request.token_a, &request.token_b)?;
    let pair = registry
        .get_pair(&token0, &token1)
        .ok_or(PairError::UnknownPair(pair_address(&token0, &token1)))?;
    bank.transfer(&pair, caller, &pair, request.liquidity)?;
    let (amount0, amount1) = registry.burn(bank, &pair, &request.to, now)?;
    let (amount_a, amount_b) = if request.token_a == token0 {
        (amount0, amount1)
    } else {
        (amount1, amount0)
    };
    at_least(amount_a, request.amount_a_min)?;
    at_least(amount_b, request.amount_b_min)?;
    Ok((amount_a, amount_b))
}

/// Walk `path` hop by hop; every pair sends its output straight into the next pair.
fn swap_along<B: TokenBank + ?Sized>(
    registry: &mut PairRegistry,
    bank: &mut B,
    amounts: &[u128],
    path: &[Address],
    to: &Address,
    now: Timestamp,
) -> Result<(), PairError> {
    for i in 0..path.len() - 1 {
        let (input, output) = (&path[i], &path[i + 1]);
        let (token0, _) = sort_tokens(input, output)?;
        let amount_out = amounts[i + 1];
        let (amount0_out, amount1_out) = if *input == token0 {
            (0, amount_out)
        } else {
            (amount_out, 0)
        };
        let recipient = if i + 2 < path.len() {
            registry
                .get_pair(output, &path[i + 2])
                .ok_or(PairError::InvalidPath)?
        } else {
            *to
        };
        let pair = registry.get_pair(input, output).ok_or(PairError::InvalidPath)?;
        registry.swap(bank, &pair, amount0_out, amount1_out, &recipient, now)?;
    }
    Ok(())
}

/// Swap an exact input along `path`, requiring at least `amount_out_min` at the end.
#[allow(clippy::too_many_arguments)]
pub fn swap_exact_tokens_for_tokens<B: TokenBank + ?Sized>(
    registry: &mut PairRegistry,
    bank: &mut B,
    caller: &Address,
    amount_in: u128,
    amount_out_min: u128,
    path: &[Address],
    to: &Address,
    deadline: Timestamp,
    now: Timestamp,
) -> Result<Vec<u128>, PairError> {
    ensure(deadline, now)?;
    let amounts = get_amounts_out(registry, amount_in, path)?;
    at_least(amounts[amounts.len() - 1], amount_out_min)?;
    let first = registry
        .get_pair(&path[0], &path[1])
        .ok_or(PairError::InvalidPath)?;
    bank.transfer(&path[0], caller, &first, amounts[0])?;
    swap_along(registry, bank, &amounts, path, to, now)?;
    debug!(target: "pair", %caller, hops = path.len() - 1, amount_in, amount_out = amounts[amounts.len() - 1], "routed swap");
    Ok(amounts)
}

/// Receive an exact output along `path`, spending at most `amount_in_max`.
#[allow(clippy::too_many_arguments)]
pub fn swap_tokens_for_exact_tokens<B: TokenBank + ?Sized>(
    registry: &mut PairRegistry,
    bank: &mut B,
    caller: &Address,
    amount_out: u128,
    amount_in_max: u128,
    path: &[Address],
    to: &Address,
    deadline: Timestamp,
    now: Timestamp,
) -> Result<Vec<u128>, PairError> {
    ensure(deadline, now)?;
    let amounts = get_amounts_in(registry, amount_out, path)?;
    if amounts[0] > amount_in_max {
        return Err(PairError::SlippageExceeded {
            actual: amounts[0],
            limit: amount_in_max,
        });
    }
    let first = registry
        .get_pair(&path[0], &path[1])
        .ok_or(PairError::InvalidPath)?;
    bank.transfer(&path[0], caller, &first, amounts[0])?;
    swap_along(registry, bank, &amounts, path, to, now)?;
    Ok(amounts)
}

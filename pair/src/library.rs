//! Pure quoting helpers over pair reserves.

use crate::error::PairError;
use crate::registry::{pair_address, sort_tokens, PairRegistry};
use puddel_math::{mul_div, product, to_u128, U256};
use puddel_types::Address;

/// Input multiplier after the 25 bps fee.
const FEE_MULTIPLIER: u128 = 9_975;
const FEE_DENOMINATOR: u128 = 10_000;

/// Equivalent amount of the other asset at the current reserve ratio.
pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, PairError> {
    if amount_a == 0 {
        return Err(PairError::InsufficientAmount);
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(PairError::InsufficientLiquidity {
            requested: amount_a,
            reserve: 0,
        });
    }
    Ok(mul_div(amount_a, reserve_b, reserve_a)?)
}

/// Maximum output for `amount_in`, net of the swap fee.
pub fn get_amount_out(amount_in: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, PairError> {
    if amount_in == 0 {
        return Err(PairError::InsufficientInputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(PairError::InsufficientLiquidity {
            requested: amount_in,
            reserve: 0,
        });
    }
    let amount_in_with_fee = product(amount_in, FEE_MULTIPLIER);
    let numerator = amount_in_with_fee * U256::from(reserve_out);
    let denominator = product(reserve_in, FEE_DENOMINATOR) + amount_in_with_fee;
    Ok(to_u128(numerator / denominator)?)
}

/// Minimum input needed to receive `amount_out`.
pub fn get_amount_in(amount_out: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, PairError> {
    if amount_out == 0 {
        return Err(PairError::InsufficientOutputAmount);
    }
    if reserve_in == 0 || amount_out >= reserve_out {
        return Err(PairError::InsufficientLiquidity {
            requested: amount_out,
            reserve: reserve_out,
        });
    }
    let numerator = product(reserve_in, amount_out) * U256::from(FEE_DENOMINATOR);
    let denominator = product(reserve_out - amount_out, FEE_MULTIPLIER);
    Ok(to_u128(numerator / denominator + U256::one())?)
}

/// Reserves of the `(a, b)` pair, ordered as asked.
pub fn get_reserves(
    registry: &PairRegistry,
    a: &Address,
    b: &Address,
) -> Result<(u128, u128), PairError> {
    let (token0, token1) = sort_tokens(a, b)?;
    let address = registry
        .get_pair(&token0, &token1)
        .ok_or(PairError::UnknownPair(pair_address(&token0, &token1)))?;
    Ok(registry.pair(&address)?.reserves_for(a))
}

/// Output amounts along `path` for an exact input. `amounts[0] == amount_in`.
pub fn get_amounts_out(
    registry: &PairRegistry,
    amount_in: u128,
    path: &[Address],
) -> Result<Vec<u128>, PairError> {
    if path.len() < 2 {
        return Err(PairError::InvalidPath);
    }
    let mut amounts = Vec::with_capacity(path.len());
    amounts.push(amount_in);
    for hop in path.windows(2) {
        let (reserve_in, reserve_out) = get_reserves(registry, &hop[0], &hop[1])?;
        let last = amounts[amounts.len() - 1];
        amounts.push(get_amount_out(last, reserve_in, reserve_out)?);
    }
    Ok(amounts)
}

/// Input amounts along `path` for an exact output. The last entry is `amount_out`.
pub fn get_amounts_in(
    registry: &PairRegistry,
    amount_out: u128,
    path: &[Address],
) -> Result<Vec<u128>, PairError> {
    if path.len() < 2 {
        return Err(PairError::InvalidPath);
    }
    let mut amounts = vec![0u128; path.len()];
    amounts[path.len() - 1] = amount_out;
    for i in (1..path.len()).rev() {
        let (reserve_in, reserve_out) = get_reserves(registry, &path[i - 1], &path[i])?;
        amounts[i - 1] = get_amount_in(amounts[i], reserve_in, reserve_out)?;
    }
    Ok(amounts)
}

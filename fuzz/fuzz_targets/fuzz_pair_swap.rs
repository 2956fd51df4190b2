#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use puddel_math::product;
use puddel_pair::{AddLiquidity, RemoveLiquidity};
use puddel_protocol::{GenesisConfig, Protocol};
use puddel_types::{Address, ProtocolParams, Timestamp};

#[derive(Arbitrary, Debug)]
enum Op {
    Donate { token1: bool, amount: u64 },
    Swap { out0: u64, out1: u64 },
    SwapExact { amount: u64, zero_for_one: bool },
    AddLiquidity { amount0: u64, amount1: u64 },
    RemoveLiquidity { share: u16 },
    Skim,
    Sync,
    Advance { secs: u32 },
}

// Drive one pair through arbitrary swaps, donations and liquidity changes.
// No sequence may panic, break conservation, or lower the reserve product
// through a swap.
fuzz_target!(|ops: Vec<Op>| {
    let mut now = Timestamp::new(1);
    let config = GenesisConfig {
        params: ProtocolParams::default(),
        admin: Address::from_label("admin"),
        destinations: destinations(),
        allocations: Vec::new(),
    };
    let Ok(mut protocol) = Protocol::genesis(&config, now) else {
        return;
    };
    let faucet = Address::from_label("faucet");
    let trader = Address::from_label("trader");
    let (Ok(a), Ok(b)) = (protocol.create_token(&faucet, "A"), protocol.create_token(&faucet, "B")) else {
        return;
    };
    for token in [a, b] {
        if protocol.mint_token(&faucet, &token, &trader, u64::MAX as u128 * 64).is_err() {
            return;
        }
    }
    let seeded = protocol.add_liquidity(&trader, &request(a, b, 1_000_000, 1_000_000, trader, now), now);
    let Ok(seeded) = seeded else {
        return;
    };
    let pair = seeded.pair;
    let (token0, token1) = {
        let p = protocol.state().registry.pair(&pair).unwrap();
        (p.token0, p.token1)
    };

    for op in ops.iter().take(64) {
        let before = protocol.state().registry.pair(&pair).unwrap().reserves();
        let swapped = match *op {
            Op::Donate { token1: one, amount } => {
                let token = if one { token1 } else { token0 };
                let _ = protocol.transfer(&trader, &token, &pair, amount as u128);
                false
            }
            Op::Swap { out0, out1 } => protocol
                .swap(&trader, &pair, out0 as u128, out1 as u128, &trader, &[], None, now)
                .is_ok(),
            Op::SwapExact { amount, zero_for_one } => {
                let path = if zero_for_one { [token0, token1] } else { [token1, token0] };
                protocol
                    .swap_exact_tokens_for_tokens(&trader, amount as u128, 0, &path, &trader, now, now)
                    .is_ok()
            }
            Op::AddLiquidity { amount0, amount1 } => {
                let _ = protocol.add_liquidity(
                    &trader,
                    &request(token0, token1, amount0 as u128, amount1 as u128, trader, now),
                    now,
                );
                false
            }
            Op::RemoveLiquidity { share } => {
                let held = protocol.balance_of(&pair, &trader);
                let liquidity = held / u16::MAX as u128 * share as u128;
                let request = RemoveLiquidity {
                    token_a: token0,
                    token_b: token1,
                    liquidity,
                    amount_a_min: 0,
                    amount_b_min: 0,
                    to: trader,
                    deadline: now,
                };
                let _ = protocol.remove_liquidity(&trader, &request, now);
                false
            }
            Op::Skim => {
                let _ = protocol.skim(&pair, &trader);
                false
            }
            Op::Sync => {
                let _ = protocol.sync(&pair, now);
                false
            }
            Op::Advance { secs } => {
                now = now.saturating_add(secs as u64);
                false
            }
        };

        if swapped {
            let after = protocol.state().registry.pair(&pair).unwrap().reserves();
            assert!(
                product(after.0, after.1) >= product(before.0, before.1),
                "swap lowered k: {before:?} -> {after:?}"
            );
        }
        let broken = protocol.state().invariant_violations();
        assert!(broken.is_empty(), "after {op:?}: {broken:?}");
    }
});

fn destinations() -> puddel_fees::Destinations {
    puddel_fees::Destinations {
        stakers: Address::from_label("stakers"),
        treasury: Address::from_label("treasury"),
        emergency: Address::from_label("emergency"),
    }
}

fn request(token_a: Address, token_b: Address, amount_a: u128, amount_b: u128, to: Address, deadline: Timestamp) -> AddLiquidity {
    AddLiquidity {
        token_a,
        token_b,
        amount_a_desired: amount_a,
        amount_b_desired: amount_b,
        amount_a_min: 0,
        amount_b_min: 0,
        to,
        deadline,
    }
}

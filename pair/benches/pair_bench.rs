use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use puddel_pair::library::{get_amount_out, get_amounts_out};
use puddel_pair::router::{add_liquidity, swap_exact_tokens_for_tokens};
use puddel_pair::{AddLiquidity, PairRegistry};
use puddel_token::{TokenBank, TokenLedger};
use puddel_types::{Address, Timestamp};

const NOW: Timestamp = Timestamp::EPOCH;
const FOREVER: Timestamp = Timestamp::new(u64::MAX);

fn token(i: usize) -> Address {
    Address::from_label(&format!("token{i}"))
}

/// A chain of pairs token0/token1, token1/token2, ... each seeded with deep liquidity.
fn make_chain(hops: usize) -> (PairRegistry, TokenLedger, Vec<Address>) {
    let trader = Address::from_label("trader");
    let faucet = Address::from_label("faucet");
    let mut bank = TokenLedger::new();
    let mut registry = PairRegistry::new(faucet);
    let path: Vec<Address> = (0..=hops).map(token).collect();
    for t in &path {
        bank.create_token(*t, "T", faucet).unwrap();
        bank.mint(t, &faucet, &trader, u64::MAX as u128).unwrap();
    }
    for hop in path.windows(2) {
        let request = AddLiquidity {
            token_a: hop[0],
            token_b: hop[1],
            amount_a_desired: 1_000_000_000_000,
            amount_b_desired: 1_000_000_000_000,
            amount_a_min: 0,
            amount_b_min: 0,
            to: trader,
            deadline: FOREVER,
        };
        add_liquidity(&mut registry, &mut bank, &trader, &request, NOW).unwrap();
    }
    (registry, bank, path)
}

fn bench_get_amount_out(c: &mut Criterion) {
    c.bench_function("get_amount_out", |b| {
        b.iter(|| {
            black_box(get_amount_out(
                black_box(1_000_000),
                black_box(1_000_000_000_000),
                black_box(2_000_000_000_000),
            ))
        })
    });
}

fn bench_quote_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_amounts_out");
    for hops in [1, 2, 4] {
        let (registry, _, path) = make_chain(hops);
        group.bench_with_input(BenchmarkId::from_parameter(hops), &hops, |b, _| {
            b.iter(|| black_box(get_amounts_out(&registry, black_box(1_000_000), &path)))
        });
    }
    group.finish();
}

fn bench_routed_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap_exact_tokens_for_tokens");
    let trader = Address::from_label("trader");
    for hops in [1, 2, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(hops), &hops, |b, &hops| {
            b.iter_batched(
                || make_chain(hops),
                |(mut registry, mut bank, path)| {
                    swap_exact_tokens_for_tokens(
                        &mut registry,
                        &mut bank,
                        &trader,
                        1_000_000,
                        0,
                        &path,
                        &trader,
                        FOREVER,
                        NOW,
                    )
                    .unwrap();
                    black_box(bank.balance_of(&path[hops], &trader))
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_amount_out, bench_quote_path, bench_routed_swap);
criterion_main!(benches);

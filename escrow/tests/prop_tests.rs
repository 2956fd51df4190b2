use proptest::prelude::*;

use puddel_escrow::{PositionOwnership, VotingEscrow};
use puddel_token::{TokenBank, TokenLedger};
use puddel_types::{Address, ProtocolParams, Timestamp};

fn setup() -> (TokenLedger, VotingEscrow, Address) {
    let gov = Address::from_label("gov");
    let owner = Address::from_label("owner");
    let escrow_addr = Address::from_label("escrow");
    let mut bank = TokenLedger::new();
    bank.create_token(gov, "PDL", gov).unwrap();
    bank.mint(&gov, &gov, &owner, u64::MAX as u128).unwrap();
    bank.approve(&gov, &owner, &escrow_addr, u128::MAX).unwrap();
    let escrow = VotingEscrow::new(escrow_addr, gov, &ProtocolParams::default());
    (bank, escrow, owner)
}

#[derive(Clone, Debug)]
enum Op {
    Lock { amount: u128, tier: u8 },
    Increase { pick: usize, amount: u128 },
    Extend { pick: usize, tier: u8 },
    Poke { pick: usize },
    Withdraw { pick: usize },
    Advance { days: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u128..1_000_000, 0u8..6).prop_map(|(amount, tier)| Op::Lock { amount, tier }),
        (any::<usize>(), 1u128..1_000_000).prop_map(|(pick, amount)| Op::Increase { pick, amount }),
        (any::<usize>(), 0u8..6).prop_map(|(pick, tier)| Op::Extend { pick, tier }),
        any::<usize>().prop_map(|pick| Op::Poke { pick }),
        any::<usize>().prop_map(|pick| Op::Withdraw { pick }),
        (1u64..400).prop_map(|days| Op::Advance { days }),
    ]
}

proptest! {
    /// Power is exactly `amount * multiplier / 10000` right after locking and zero after expiry.
    #[test]
    fn power_matches_tier_formula(amount in 1u128..1_000_000_000, tier in 0u8..6, start in 0u64..1_000_000) {
        let (mut bank, mut escrow, owner) = setup();
        let now = Timestamp::new(start);
        let id = escrow.create_lock(&mut bank, &owner, amount, tier, now).unwrap();
        let params = *escrow.tiers().get(tier).unwrap();
        prop_assert_eq!(
            escrow.voting_power(id, now),
            amount * params.multiplier_bps as u128 / 10_000
        );
        let end = escrow.position(id).unwrap().lock_end;
        prop_assert_eq!(escrow.voting_power(id, Timestamp::new(end.as_secs() + 1)), 0);
        prop_assert_eq!(escrow.voting_power(id, end), 0);
    }

    /// Incremental aggregates always equal the sums over live positions, and the
    /// escrow's token balance always equals the total locked.
    #[test]
    fn aggregates_stay_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let (mut bank, mut escrow, owner) = setup();
        let mut now = Timestamp::new(0);
        for op in ops {
            let ids: Vec<u64> = escrow.positions().map(|p| p.id).collect();
            let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
            let _ = match op {
                Op::Lock { amount, tier } => escrow.create_lock(&mut bank, &owner, amount, tier, now).map(|_| ()),
                Op::Increase { pick: i, amount } => match pick(i) {
                    Some(id) => escrow.increase_lock_amount(&mut bank, &owner, id, amount, now).map(|_| ()),
                    None => Ok(()),
                },
                Op::Extend { pick: i, tier } => match pick(i) {
                    Some(id) => escrow.extend_lock(&owner, id, tier, now).map(|_| ()),
                    None => Ok(()),
                },
                Op::Poke { pick: i } => match pick(i) {
                    Some(id) => escrow.poke(id, now).map(|_| ()),
                    None => Ok(()),
                },
                Op::Withdraw { pick: i } => match pick(i) {
                    Some(id) => escrow.withdraw(&mut bank, &owner, id, now).map(|_| ()),
                    None => Ok(()),
                },
                Op::Advance { days } => {
                    now = now.saturating_add(days * 86_400);
                    Ok(())
                }
            };
            prop_assert_eq!(escrow.sum_of_positions(), Some(escrow.total_locked()));
            prop_assert_eq!(escrow.sum_of_recorded_power(), Some(escrow.total_power()));
            prop_assert_eq!(bank.balance_of(&escrow.token(), &escrow.address()), escrow.total_locked());
        }
    }
}

use proptest::prelude::*;
use std::collections::BTreeMap;

use puddel_bribe::Bribe;
use puddel_escrow::{PositionId, PositionOwnership};
use puddel_token::{TokenBank, TokenLedger};
use puddel_types::{Address, Epoch, Timestamp};
use puddel_voter::Voter;

const WEEK: u64 = 7 * 24 * 3600;

struct FixedPower(BTreeMap<PositionId, u128>);

impl PositionOwnership for FixedPower {
    fn owner_of(&self, id: PositionId) -> Option<Address> {
        self.0.get(&id).map(|_| owner(id))
    }

    fn voting_power(&self, id: PositionId, _now: Timestamp) -> u128 {
        self.0.get(&id).copied().unwrap_or(0)
    }
}

fn owner(id: PositionId) -> Address {
    Address::from_label(&format!("voter{id}"))
}

proptest! {
    /// Claims across every voter pay out the deposit, losing at most one unit
    /// per voter to rounding, and never more.
    #[test]
    fn claims_are_bounded_by_deposit(
        powers in proptest::collection::vec(1..1_000_000_000u128, 1..12),
        amount in 1..u64::MAX as u128,
    ) {
        let (pool, token, sponsor) = (
            Address::from_label("pool"),
            Address::from_label("token"),
            Address::from_label("sponsor"),
        );
        let mut bribe = Bribe::new(Address::from_label("bribe"), pool, WEEK, 52);
        let mut bank = TokenLedger::new();
        bank.create_token(token, "TKN", token).unwrap();
        bank.mint(&token, &token, &sponsor, amount).unwrap();
        bank.approve(&token, &sponsor, &bribe.address, u128::MAX).unwrap();
        bribe
            .deposit_bribe(&mut bank, &sponsor, &token, amount, Epoch::GENESIS, Timestamp::EPOCH)
            .unwrap();

        let mut voter = Voter::new(WEEK);
        voter.create_gauge(pool, Address::ZERO, bribe.address, Timestamp::EPOCH).unwrap();
        let escrow = FixedPower(
            powers.iter().enumerate().map(|(i, p)| (i as PositionId + 1, *p)).collect(),
        );
        for id in escrow.0.keys() {
            voter.vote(&escrow, &owner(*id), *id, &[pool], &[1], Timestamp::new(1)).unwrap();
        }

        let mut paid = 0u128;
        for id in escrow.0.keys() {
            let payouts = bribe
                .claim(&mut bank, &voter, &escrow, &owner(*id), *id, &[token], &[Epoch::GENESIS], Timestamp::new(WEEK))
                .unwrap();
            paid += payouts[0].amount;
        }
        prop_assert!(paid <= amount);
        prop_assert!(amount - paid <= powers.len() as u128);
        prop_assert_eq!(bank.balance_of(&token, &bribe.address), amount - paid);
    }
}

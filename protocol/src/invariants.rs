//! Conservation checks over the whole state.

use crate::error::ProtocolError;
use crate::host::Protocol;
use crate::state::ProtocolState;
use puddel_pair::MINIMUM_LIQUIDITY;
use puddel_token::TokenBank;
use puddel_types::Address;
use tracing::error;

impl ProtocolState {
    /// Every conservation rule the state currently breaks, described.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut broken = Vec::new();
        let bank = &self.bank;

        for token in bank.unbalanced_tokens() {
            broken.push(format!("token {token}: holder balances do not sum to supply"));
        }

        for pair_address in self.registry.all_pairs() {
            let Ok(pair) = self.registry.pair(pair_address) else {
                broken.push(format!("pair {pair_address} listed but missing"));
                continue;
            };
            if bank.total_supply(pair_address) > 0 && bank.balance_of(pair_address, &Address::ZERO) < MINIMUM_LIQUIDITY {
                broken.push(format!("pair {pair_address}: minimum liquidity not locked"));
            }
            let (reserve0, reserve1) = pair.reserves();
            if bank.balance_of(&pair.token0, pair_address) < reserve0
                || bank.balance_of(&pair.token1, pair_address) < reserve1
            {
                broken.push(format!("pair {pair_address}: reserves exceed balances"));
            }
        }

        let escrow = &self.escrow;
        if escrow.sum_of_positions() != Some(escrow.total_locked()) {
            broken.push(format!(
                "escrow: total locked {} differs from the sum of positions {:?}",
                escrow.total_locked(),
                escrow.sum_of_positions()
            ));
        }
        // Direct transfers can leave the escrow holding more than is locked.
        let held = bank.balance_of(&self.contracts.gov_token, &escrow.address());
        if held < escrow.total_locked() {
            broken.push(format!("escrow: holds {held} below total locked {}", escrow.total_locked()));
        }
        if escrow.sum_of_recorded_power() != Some(escrow.total_power()) {
            broken.push(format!(
                "escrow: total power {} differs from recorded power {:?}",
                escrow.total_power(),
                escrow.sum_of_recorded_power()
            ));
        }

        if self.voter.recomputed_total() != Some(self.voter.total_weight()) {
            broken.push(format!(
                "voter: total weight {} differs from the vote records {:?}",
                self.voter.total_weight(),
                self.voter.recomputed_total()
            ));
        }

        for gauge in self.gauges.iter() {
            if gauge.total_paid() > gauge.total_notified() {
                broken.push(format!(
                    "gauge {}: paid {} of {} notified",
                    gauge.pool,
                    gauge.total_paid(),
                    gauge.total_notified()
                ));
            }
            let owed = gauge.total_notified().saturating_sub(gauge.total_paid());
            if bank.balance_of(&gauge.reward_token, &gauge.address) < owed {
                broken.push(format!("gauge {}: reward balance below {owed} outstanding", gauge.pool));
            }
            if bank.balance_of(&gauge.pool, &gauge.address) < gauge.total_supply() {
                broken.push(format!("gauge {}: staked shares not held", gauge.pool));
            }
        }

        let expected_supply = self
            .genesis_supply
            .checked_add(self.minter.total_minted())
            .and_then(|s| s.checked_sub(self.fees.total_burned()));
        let supply = bank.total_supply(&self.contracts.gov_token);
        if expected_supply != Some(supply) {
            broken.push(format!(
                "governance supply {supply} differs from genesis + minted - burned {expected_supply:?}"
            ));
        }

        broken
    }
}

impl Protocol {
    /// Fails with the first broken conservation rule.
    pub fn check_invariants(&self) -> Result<(), ProtocolError> {
        let broken = self.state.invariant_violations();
        for violation in &broken {
            error!(target: "protocol", %violation, "invariant broken");
        }
        match broken.into_iter().next() {
            Some(first) => Err(ProtocolError::InvariantBroken(first)),
            None => Ok(()),
        }
    }
}

//! Proptest strategies for outcomes, lifetimes, and scenarios.

use proptest::prelude::*;

use crate::actions::{Detection, Issuance, Outcome, Registration};
use crate::lifetime::RemainingLifetime;
use crate::params::{ProtocolScalars, RewardParams, Scenario};

const MAX_AMOUNT: u64 = 1_000_000;

pub fn arb_outcome() -> impl Strategy<Value = Outcome> {
    (
        prop_oneof![Just(Registration::Register), Just(Registration::NoRegister)],
        prop_oneof![Just(Issuance::IssueCompliant), Just(Issuance::IssueNonCompliant)],
        prop_oneof![Just(Detection::Report), Just(Detection::NoReport)],
    )
        .prop_map(|(r, i, d)| Outcome::new(r, i, d))
}

/// Lifetimes `num/den` with `den` up to 1000, endpoints included.
pub fn arb_lifetime() -> impl Strategy<Value = RemainingLifetime> {
    (1u64..=1000)
        .prop_flat_map(|den| (0..=den, Just(den)))
        .prop_filter_map("valid lifetime", |(num, den)| {
            RemainingLifetime::new(num, den).ok()
        })
}

/// Two lifetimes ordered low to high.
pub fn arb_lifetime_pair() -> impl Strategy<Value = (RemainingLifetime, RemainingLifetime)> {
    (arb_lifetime(), arb_lifetime()).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

/// Any reward parameters, feasible or not.
pub fn arb_reward_params() -> impl Strategy<Value = RewardParams> {
    (0..=MAX_AMOUNT, 0..=MAX_AMOUNT, 0..=MAX_AMOUNT, 0..=MAX_AMOUNT)
        .prop_map(|(price, aff, term, det)| RewardParams::new(price, aff, term, det))
}

/// Any scenario, feasible or not. Includes `u64` extremes.
pub fn arb_scenario() -> impl Strategy<Value = Scenario> {
    let amount = prop_oneof![
        4 => 0..=MAX_AMOUNT,
        1 => Just(u64::MAX),
        1 => Just(0u64),
    ];
    (
        amount.clone(),
        amount.clone(),
        amount.clone(),
        amount.clone(),
        amount.clone(),
        amount,
        arb_lifetime(),
    )
        .prop_map(|(price, aff, term, det, fee, min, life)| {
            Scenario::new(
                RewardParams::new(price, aff, term, det),
                ProtocolScalars::new(fee, min, life),
            )
        })
}

/// Scenarios satisfying all three feasibility predicates.
pub fn arb_feasible_scenario() -> impl Strategy<Value = Scenario> {
    (1..=MAX_AMOUNT, 2..=MAX_AMOUNT)
        .prop_flat_map(|(term, det)| {
            (
                Just(term),
                Just(det),
                1..=term,
                1..det,
                0..=MAX_AMOUNT,
                arb_lifetime(),
            )
        })
        .prop_flat_map(|(term, det, min, fee, extra, life)| {
            // aff + min must exceed term + 1 for some price to fit.
            let aff = term - min + 2 + extra;
            (
                Just((term, det, min, fee, aff, life)),
                (term + 1)..(aff + min),
            )
        })
        .prop_map(|((term, det, min, fee, aff, life), price)| {
            Scenario::new(
                RewardParams::new(price, aff, term, det),
                ProtocolScalars::new(fee, min, life),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn feasible_scenarios_are_feasible(s in arb_feasible_scenario()) {
            prop_assert!(s.reporting_fee_feasible());
            prop_assert!(s.min_term_payout_feasible());
            prop_assert!(s.price_feasible());
        }

        #[test]
        fn lifetime_pairs_are_ordered((lo, hi) in arb_lifetime_pair()) {
            prop_assert!(lo <= hi);
        }
    }
}

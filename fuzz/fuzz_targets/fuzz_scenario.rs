#![no_main]
use libfuzzer_sys::fuzz_target;
use rpcheck_model::{Outcome, Scenario};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    // Loading must reject bad input with an error, and every accepted
    // scenario must have total payoffs.
    let Ok(scenario) = toml::from_str::<Scenario>(s) else {
        return;
    };
    for outcome in Outcome::all() {
        let _ = scenario.payoffs(outcome);
    }
    if scenario.min_term_payout_feasible() {
        let split = scenario.termination_split();
        assert!(split >= i128::from(scenario.protocol.min_term_payout));
        assert!(split <= i128::from(scenario.reward.term_payout));
    }
});

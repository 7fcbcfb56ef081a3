//! Payout engine: what each participant gains or loses in one play.
//!
//! Every function here is pure and total. Amounts enter as `u64` and leave as
//! [`Payoff`] (`i128`), which holds any sum or difference of a handful of
//! `u64` values exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::actions::{Outcome, ParseChoiceError};
use crate::lifetime::RemainingLifetime;
use crate::params::{RewardParams, Scenario};

pub type Payoff = i128;

/// `floor(rem_life * (term_payout - min_term_payout)) + min_term_payout`.
///
/// Lies in `[min_term_payout, term_payout]` whenever the minimum termination
/// payout is feasible for `rp`. When it is not, the floor is still taken
/// toward negative infinity, so the result stays defined.
pub fn termination_split(
    rp: &RewardParams,
    rem_life: &RemainingLifetime,
    min_term_payout: u64,
) -> Payoff {
    let min = Payoff::from(min_term_payout);
    rem_life.floor_scale(Payoff::from(rp.term_payout) - min) + min
}

pub fn domain_payoff(outcome: Outcome, scenario: &Scenario) -> Payoff {
    let rp = &scenario.reward;
    let price = Payoff::from(rp.price);
    if !(outcome.is_non_compliant() && outcome.is_reported()) {
        return -price;
    }
    let split = scenario.termination_split();
    if outcome.is_registered() {
        Payoff::from(rp.aff_dom_payout) + split - price
    } else {
        split - price
    }
}

pub fn detector_payoff(outcome: Outcome, rp: &RewardParams, reporting_fee: u64) -> Payoff {
    if !outcome.is_reported() {
        return 0;
    }
    let fee = Payoff::from(reporting_fee);
    match (outcome.is_non_compliant(), outcome.is_registered()) {
        (false, _) => -fee,
        (true, true) => Payoff::from(rp.det_payout) - fee,
        // No reward path exists for catching an unregistered CA.
        (true, false) => 0,
    }
}

pub fn ca_payoff(outcome: Outcome, scenario: &Scenario) -> Payoff {
    if !(outcome.is_registered() && outcome.is_reported() && outcome.is_non_compliant()) {
        return 0;
    }
    let rp = &scenario.reward;
    Payoff::from(rp.price)
        - scenario.termination_split()
        - Payoff::from(rp.aff_dom_payout)
        - Payoff::from(rp.det_payout)
}

/// The three participants of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Player {
    Ca,
    Domain,
    Detector,
}

impl Player {
    pub const ALL: [Player; 3] = [Player::Ca, Player::Domain, Player::Detector];

    pub fn as_str(self) -> &'static str {
        match self {
            Player::Ca => "ca",
            Player::Domain => "domain",
            Player::Detector => "detector",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Player {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ca" => Ok(Player::Ca),
            "domain" => Ok(Player::Domain),
            "detector" => Ok(Player::Detector),
            _ => Err(ParseChoiceError {
                kind: "player",
                value: s.to_string(),
                expected: "ca, domain, detector",
            }),
        }
    }
}

/// Payoffs of all three participants for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payoffs {
    pub ca: Payoff,
    pub domain: Payoff,
    pub detector: Payoff,
}

impl Payoffs {
    pub fn get(&self, player: Player) -> Payoff {
        match player {
            Player::Ca => self.ca,
            Player::Domain => self.domain,
            Player::Detector => self.detector,
        }
    }

    /// Joint payoff of a coalition. Repeated players are counted once.
    pub fn coalition(&self, players: &[Player]) -> Payoff {
        Player::ALL
            .iter()
            .filter(|p| players.contains(p))
            .map(|&p| self.get(p))
            .sum()
    }
}

pub fn payoffs(outcome: Outcome, scenario: &Scenario) -> Payoffs {
    Payoffs {
        ca: ca_payoff(outcome, scenario),
        domain: domain_payoff(outcome, scenario),
        detector: detector_payoff(
            outcome,
            &scenario.reward,
            scenario.protocol.reporting_fee,
        ),
    }
}

use std::fmt;

use rpcheck_model::{Outcome, Payoff, Payoffs};
use serde::Serialize;

use crate::property::{ParameterPoint, Property, Violation};

/// Where a counterexample came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WitnessSource {
    /// One of the deterministic corner points.
    Boundary { index: usize },
    /// A pseudo-random sample drawn from the seeded generator.
    Sample { index: usize, seed: u64 },
    /// A solver model, replayed against the concrete payout engine.
    Solver { backend: String },
}

impl fmt::Display for WitnessSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WitnessSource::Boundary { index } => write!(f, "boundary point #{index}"),
            WitnessSource::Sample { index, seed } => {
                write!(f, "random sample #{index} (seed {seed})")
            }
            WitnessSource::Solver { backend } => write!(f, "{backend} model, replayed"),
        }
    }
}

/// A concrete parameter point and outcome at which a property fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counterexample {
    pub property: String,
    pub point: ParameterPoint,
    pub violation: Violation,
    /// Payoffs at every outcome the failed obligation reads.
    pub payoffs: Vec<(Outcome, Payoffs)>,
    pub source: WitnessSource,
}

impl Counterexample {
    pub fn new(
        property: &Property,
        point: ParameterPoint,
        violation: Violation,
        source: WitnessSource,
    ) -> Self {
        let payoffs = match violation.outcome {
            Some(bound) => property
                .referenced_outcomes(bound)
                .into_iter()
                .map(|o| (o, point.scenario.payoffs(o)))
                .collect(),
            None => Vec::new(),
        };
        Self {
            property: property.id.to_string(),
            point,
            violation,
            payoffs,
            source,
        }
    }

    pub fn lhs(&self) -> Payoff {
        self.violation.lhs
    }

    pub fn rhs(&self) -> Payoff {
        self.violation.rhs
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rp = &self.point.scenario.reward;
        let protocol = &self.point.scenario.protocol;
        writeln!(f, "Counterexample for {} ({}):", self.property, self.source)?;
        writeln!(
            f,
            "  reward: price={} aff_dom_payout={} term_payout={} det_payout={}",
            rp.price, rp.aff_dom_payout, rp.term_payout, rp.det_payout
        )?;
        writeln!(
            f,
            "  protocol: reporting_fee={} min_term_payout={} remaining_lifetime={}",
            protocol.reporting_fee, protocol.min_term_payout, protocol.remaining_lifetime
        )?;
        if self.point.higher_lifetime != protocol.remaining_lifetime {
            writeln!(f, "  higher lifetime: {}", self.point.higher_lifetime)?;
        }
        if let Some(outcome) = self.violation.outcome {
            writeln!(f, "  outcome: {outcome}")?;
        }
        for (outcome, p) in &self.payoffs {
            writeln!(
                f,
                "  payoffs at {outcome}: ca={} domain={} detector={}",
                p.ca, p.domain, p.detector
            )?;
        }
        write!(
            f,
            "  violated: {} (lhs={}, rhs={})",
            self.violation.obligation, self.violation.lhs, self.violation.rhs
        )
    }
}

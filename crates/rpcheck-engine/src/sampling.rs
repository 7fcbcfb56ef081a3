//! Finite fallback checker: corner points plus seeded random sampling.
//!
//! Points are generated feasible by construction for the property's
//! preconditions, so no sample is wasted on a vacuous check. Every outcome in
//! scope is evaluated at every point. A clean run is reported as
//! [`VerificationResult::NoCounterexample`] with a rule-of-three bound on the
//! violation rate, never as a proof.

use std::collections::HashSet;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rpcheck_model::{
    Outcome, ParamError, ProtocolScalars, RemainingLifetime, RewardParams, Scenario,
};
use tracing::{debug, warn};

use crate::counterexample::{Counterexample, WitnessSource};
use crate::property::{ParameterPoint, Precondition, Property};
use crate::result::VerificationResult;
use crate::timeout::deadline_exceeded;
use crate::verifier::VerifyError;

/// Samples between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Ranges drawn by one point, one bit per draw when enumerating corners.
const DRAWS_PER_POINT: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingChecker {
    pub samples: usize,
    pub seed: u64,
    /// Upper end of the unconstrained amount ranges.
    pub max_amount: u64,
    /// Largest remaining-lifetime denominator drawn.
    pub max_lifetime_den: u64,
}

impl Default for SamplingChecker {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: 0x5EED,
            max_amount: 1_000_000,
            max_lifetime_den: 1000,
        }
    }
}

/// Source of values for one draw from an inclusive range.
trait Pick {
    fn pick(&mut self, lo: u64, hi: u64) -> u64;
}

/// Uniform draws, with a quarter of them snapped to an endpoint.
struct RandomPick<'a>(&'a mut StdRng);

impl Pick for RandomPick<'_> {
    fn pick(&mut self, lo: u64, hi: u64) -> u64 {
        match self.0.gen_range(0u8..8) {
            0 => lo,
            1 => hi,
            _ => self.0.gen_range(lo..=hi),
        }
    }
}

/// Deterministic endpoints: draw `i` takes `hi` when bit `i` of the mask is set.
struct CornerPick {
    mask: u32,
    next: u32,
}

impl Pick for CornerPick {
    fn pick(&mut self, lo: u64, hi: u64) -> u64 {
        let bit = (self.mask >> self.next) & 1;
        self.next += 1;
        if bit == 0 {
            lo
        } else {
            hi
        }
    }
}

fn rule_of_three(samples: usize) -> f64 {
    if samples == 0 {
        1.0
    } else {
        (3.0 / samples as f64).min(1.0)
    }
}

impl SamplingChecker {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self {
            samples,
            seed,
            ..Self::default()
        }
    }

    pub fn with_max_amount(mut self, max_amount: u64) -> Self {
        self.max_amount = max_amount;
        self
    }

    pub fn with_max_lifetime_den(mut self, max_lifetime_den: u64) -> Self {
        self.max_lifetime_den = max_lifetime_den;
        self
    }

    /// Amount ceiling clamped so feasible-price arithmetic cannot overflow.
    fn amount_ceiling(&self) -> u64 {
        self.max_amount.clamp(2, u64::MAX / 4)
    }

    fn generate(&self, property: &Property, p: &mut impl Pick) -> Result<ParameterPoint, ParamError> {
        let max = self.amount_ceiling();

        let (term, min) = if property.requires(Precondition::MinTermPayoutFeasible) {
            let term = p.pick(1, max);
            (term, p.pick(1, term))
        } else {
            (p.pick(0, max), p.pick(0, max))
        };

        let (det, fee) = if property.requires(Precondition::ReportingFeeFeasible) {
            let det = p.pick(2, max);
            (det, p.pick(1, det - 1))
        } else {
            (p.pick(0, max), p.pick(0, max))
        };

        let (aff, price) = if property.requires(Precondition::PriceFeasible) {
            // term < price < aff + min needs aff + min >= term + 2
            let aff_lo = (term + 2).saturating_sub(min);
            let aff = p.pick(aff_lo, aff_lo + max);
            (aff, p.pick(term + 1, aff + min - 1))
        } else {
            (p.pick(0, max), p.pick(0, max))
        };

        let den = p.pick(1, self.max_lifetime_den.max(1));
        let lo = p.pick(0, den);
        let hi = p.pick(lo, den);

        let scenario = Scenario::new(
            RewardParams::new(price, aff, term, det),
            ProtocolScalars::new(fee, min, RemainingLifetime::new(lo, den)?),
        );
        Ok(ParameterPoint::new(scenario, RemainingLifetime::new(hi, den)?))
    }

    /// Every combination of range endpoints, deduplicated, in mask order.
    pub fn boundary_points(&self, property: &Property) -> Result<Vec<ParameterPoint>, ParamError> {
        let mut seen = HashSet::new();
        let mut points = Vec::new();
        for mask in 0..(1u32 << DRAWS_PER_POINT) {
            let point = self.generate(property, &mut CornerPick { mask, next: 0 })?;
            if seen.insert(point.clone()) {
                points.push(point);
            }
        }
        Ok(points)
    }

    /// `samples` pseudo-random points, reproducible from `seed`.
    pub fn random_points(&self, property: &Property) -> Result<Vec<ParameterPoint>, ParamError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.samples)
            .map(|_| self.generate(property, &mut RandomPick(&mut rng)))
            .collect()
    }

    fn evaluate(
        property: &Property,
        point: &ParameterPoint,
        bindings: &[Option<Outcome>],
        evaluations: &mut usize,
    ) -> Result<Option<crate::property::Violation>, VerifyError> {
        for &bound in bindings {
            *evaluations += 1;
            if let Some(violation) = property.check_binding(point, bound)? {
                return Ok(Some(violation));
            }
        }
        Ok(None)
    }

    pub fn check(
        &self,
        property: &Property,
        deadline: Option<Instant>,
    ) -> Result<VerificationResult, VerifyError> {
        property.validate()?;
        let bindings = property.scope.bindings();
        let mut evaluations = 0;

        let corners = self.boundary_points(property)?;
        for (index, point) in corners.iter().enumerate() {
            if let Some(violation) = Self::evaluate(property, point, &bindings, &mut evaluations)? {
                return Ok(VerificationResult::Falsified {
                    counterexample: Box::new(Counterexample::new(
                        property,
                        point.clone(),
                        violation,
                        WitnessSource::Boundary { index },
                    )),
                });
            }
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut drawn = 0;
        for index in 0..self.samples {
            if index % DEADLINE_CHECK_INTERVAL == 0 && deadline_exceeded(deadline) {
                debug!(property = %property.id, drawn, "sampling deadline reached");
                break;
            }
            let point = self.generate(property, &mut RandomPick(&mut rng))?;
            drawn += 1;
            if let Some(violation) = Self::evaluate(property, &point, &bindings, &mut evaluations)? {
                return Ok(VerificationResult::Falsified {
                    counterexample: Box::new(Counterexample::new(
                        property,
                        point,
                        violation,
                        WitnessSource::Sample {
                            index,
                            seed: self.seed,
                        },
                    )),
                });
            }
        }

        if drawn < self.samples {
            warn!(
                property = %property.id,
                drawn,
                requested = self.samples,
                "Sampling stopped at the deadline"
            );
        }
        debug!(
            property = %property.id,
            boundary_points = corners.len(),
            samples = drawn,
            evaluations,
            "sampling found no counterexample"
        );
        Ok(VerificationResult::NoCounterexample {
            samples: drawn,
            requested: self.samples,
            boundary_points: corners.len(),
            evaluations,
            violation_rate_bound: rule_of_three(drawn),
        })
    }
}

//! Symbolic encoding of properties and their discharge through an SMT solver.
//!
//! Reward amounts and protocol scalars become integer variables. The two
//! remaining lifetimes share one denominator (`life_num / life_den` and
//! `life_num_hi / life_den`), which loses no generality for a pair of
//! rationals, and each termination split is pinned by the exact floor
//! characterization
//!
//! ```text
//! den * (split - min) <= num * (term - min) < den * (split - min + 1)
//! ```
//!
//! One query is built per outcome in scope: domain constraints, the
//! preconditions, and the negated conjunction of obligations. UNSAT for every
//! query proves the property.

use std::time::Instant;

use num::integer::Integer;
use num::traits::ToPrimitive;
use rpcheck_model::{Outcome, Player, RemainingLifetime, Scenario};
use rpcheck_smt::backends::smtlib_printer::to_script;
use rpcheck_smt::eval::{Valuation, Value};
use rpcheck_smt::solver::{Model, SatResult, SmtSolver};
use rpcheck_smt::sorts::{SmtLogic, SmtSort};
use rpcheck_smt::terms::SmtTerm;
use tracing::debug;

use crate::counterexample::{Counterexample, WitnessSource};
use crate::property::{
    Obligation, Operand, ParameterPoint, Precondition, Property, PropertyError, Scope,
};
use crate::result::VerificationResult;
use crate::timeout::{deadline_exceeded, timeout_unknown_reason};
use crate::verifier::VerifyError;

pub const PRICE: &str = "price";
pub const AFF_DOM_PAYOUT: &str = "aff_dom_payout";
pub const TERM_PAYOUT: &str = "term_payout";
pub const DET_PAYOUT: &str = "det_payout";
pub const REPORTING_FEE: &str = "reporting_fee";
pub const MIN_TERM_PAYOUT: &str = "min_term_payout";
pub const LIFE_NUM: &str = "life_num";
pub const LIFE_NUM_HI: &str = "life_num_hi";
pub const LIFE_DEN: &str = "life_den";
pub const SPLIT: &str = "split";
pub const SPLIT_HI: &str = "split_hi";

const AMOUNTS: [&str; 6] = [
    PRICE,
    AFF_DOM_PAYOUT,
    TERM_PAYOUT,
    DET_PAYOUT,
    REPORTING_FEE,
    MIN_TERM_PAYOUT,
];

const ALL_VARS: [&str; 11] = [
    PRICE,
    AFF_DOM_PAYOUT,
    TERM_PAYOUT,
    DET_PAYOUT,
    REPORTING_FEE,
    MIN_TERM_PAYOUT,
    LIFE_NUM,
    LIFE_NUM_HI,
    LIFE_DEN,
    SPLIT,
    SPLIT_HI,
];

fn v(name: &str) -> SmtTerm {
    SmtTerm::var(name)
}

/// Integer declarations for every encoding variable.
pub fn declarations() -> Vec<(String, SmtSort)> {
    ALL_VARS
        .iter()
        .map(|name| (name.to_string(), SmtSort::Int))
        .collect()
}

fn floor_split(split: &str, num: &str) -> SmtTerm {
    let min = v(MIN_TERM_PAYOUT);
    let above_min = v(split).sub(min.clone());
    let scaled = v(num).mul(v(TERM_PAYOUT).sub(min));
    SmtTerm::and(vec![
        v(LIFE_DEN).mul(above_min.clone()).le(scaled.clone()),
        scaled.lt(v(LIFE_DEN).mul(above_min.add(SmtTerm::int(1)))),
    ])
}

/// Constraints every concrete parameter point satisfies.
pub fn domain_constraints() -> Vec<SmtTerm> {
    let mut out: Vec<SmtTerm> = AMOUNTS
        .iter()
        .map(|name| v(name).ge(SmtTerm::int(0)))
        .collect();
    out.push(v(LIFE_DEN).ge(SmtTerm::int(1)));
    out.push(v(LIFE_NUM).ge(SmtTerm::int(0)));
    out.push(v(LIFE_NUM).le(v(LIFE_NUM_HI)));
    out.push(v(LIFE_NUM_HI).le(v(LIFE_DEN)));
    out.push(floor_split(SPLIT, LIFE_NUM));
    out.push(floor_split(SPLIT_HI, LIFE_NUM_HI));
    out
}

pub fn precondition_term(precondition: Precondition) -> SmtTerm {
    let zero = || SmtTerm::int(0);
    match precondition {
        Precondition::ReportingFeeFeasible => SmtTerm::and(vec![
            zero().lt(v(REPORTING_FEE)),
            v(REPORTING_FEE).lt(v(DET_PAYOUT)),
        ]),
        Precondition::MinTermPayoutFeasible => SmtTerm::and(vec![
            zero().lt(v(MIN_TERM_PAYOUT)),
            v(MIN_TERM_PAYOUT).le(v(TERM_PAYOUT)),
        ]),
        Precondition::PriceFeasible => SmtTerm::and(vec![
            v(TERM_PAYOUT).lt(v(PRICE)),
            v(PRICE).lt(v(AFF_DOM_PAYOUT).add(v(MIN_TERM_PAYOUT))),
        ]),
    }
}

/// Symbolic payoff of `player` at a fixed outcome.
pub fn payoff_term(player: Player, outcome: Outcome) -> SmtTerm {
    let caught = outcome.is_non_compliant() && outcome.is_reported();
    match player {
        Player::Domain if !caught => v(PRICE).neg(),
        Player::Domain if outcome.is_registered() => {
            v(AFF_DOM_PAYOUT).add(v(SPLIT)).sub(v(PRICE))
        }
        Player::Domain => v(SPLIT).sub(v(PRICE)),
        Player::Detector if !outcome.is_reported() => SmtTerm::int(0),
        Player::Detector if !outcome.is_non_compliant() => v(REPORTING_FEE).neg(),
        Player::Detector if outcome.is_registered() => v(DET_PAYOUT).sub(v(REPORTING_FEE)),
        Player::Detector => SmtTerm::int(0),
        Player::Ca if caught && outcome.is_registered() => v(PRICE)
            .sub(v(SPLIT))
            .sub(v(AFF_DOM_PAYOUT))
            .sub(v(DET_PAYOUT)),
        Player::Ca => SmtTerm::int(0),
    }
}

pub fn operand_term(operand: &Operand, bound: Option<Outcome>) -> Option<SmtTerm> {
    match operand {
        Operand::Constant(c) => Some(SmtTerm::int(*c)),
        Operand::Payoff { coalition, outcome } => {
            let at = outcome.resolve(bound?);
            Some(SmtTerm::sum(
                Player::ALL
                    .into_iter()
                    .filter(|p| coalition.contains(p))
                    .map(|p| payoff_term(p, at)),
            ))
        }
    }
}

pub fn obligation_term(obligation: &Obligation, bound: Option<Outcome>) -> Option<SmtTerm> {
    use crate::property::Relation;
    Some(match obligation {
        Obligation::Compare { lhs, relation, rhs } => {
            let l = operand_term(lhs, bound)?;
            let r = operand_term(rhs, bound)?;
            match relation {
                Relation::Lt => l.lt(r),
                Relation::Le => l.le(r),
                Relation::Eq => l.eq(r),
                Relation::Ge => l.ge(r),
                Relation::Gt => l.gt(r),
            }
        }
        Obligation::SplitWithinBounds => SmtTerm::and(vec![
            v(MIN_TERM_PAYOUT).le(v(SPLIT)),
            v(SPLIT).le(v(TERM_PAYOUT)),
        ]),
        Obligation::SplitMonotone => v(SPLIT).le(v(SPLIT_HI)),
    })
}

/// One satisfiability query: SAT means a violation at `outcome`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub outcome: Option<Outcome>,
    pub assertions: Vec<SmtTerm>,
}

impl Query {
    /// File stem for dumped scripts.
    pub fn label(&self, property: &Property) -> String {
        match self.outcome {
            Some(o) => format!(
                "{}-{}-{}-{}",
                property.id, o.registration, o.issuance, o.detection
            ),
            None => property.id.to_string(),
        }
    }
}

pub fn queries(property: &Property) -> Result<Vec<Query>, PropertyError> {
    property.validate()?;
    let missing = || PropertyError::PayoffWithoutOutcome {
        property: property.id.to_string(),
    };
    property
        .scope
        .bindings()
        .into_iter()
        .map(|bound| {
            let obligations = property
                .obligations
                .iter()
                .map(|o| obligation_term(o, bound))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(missing)?;
            let mut assertions = domain_constraints();
            assertions.extend(property.preconditions.iter().map(|p| precondition_term(*p)));
            assertions.push(SmtTerm::and(obligations).not());
            Ok(Query {
                outcome: bound,
                assertions,
            })
        })
        .collect()
}

/// Self-contained SMT-LIB2 script for one query. `unsat` means the property
/// holds at that outcome.
pub fn render_script(property: &Property, query: &Query) -> String {
    let scope = match (property.scope, query.outcome) {
        (Scope::Outcomes(_), Some(o)) => format!("outcome: {o}"),
        _ => "outcome: none (parameters only)".to_string(),
    };
    let comments = vec![
        format!("property: {}", property.id),
        property.description.clone(),
        scope,
        property.closed_form(),
        "unsat => the property holds for this outcome".to_string(),
    ];
    to_script(
        SmtLogic::QfNia,
        &comments,
        &declarations(),
        &query.assertions,
    )
}

/// `(file stem, script)` for every query of `property`.
pub fn scripts(property: &Property) -> Result<Vec<(String, String)>, PropertyError> {
    Ok(queries(property)?
        .iter()
        .map(|q| (q.label(property), render_script(property, q)))
        .collect())
}

fn model_int(model: &Model, name: &str) -> Result<i64, VerifyError> {
    model
        .get_int(name)
        .ok_or_else(|| VerifyError::Model(format!("model has no integer value for `{name}`")))
}

fn model_u64(model: &Model, name: &str) -> Result<u64, VerifyError> {
    let n = model_int(model, name)?;
    u64::try_from(n).map_err(|_| VerifyError::Model(format!("`{name}` is negative ({n})")))
}

/// Concrete parameter point described by a solver model.
pub fn decode_point(model: &Model) -> Result<ParameterPoint, VerifyError> {
    let den = model_u64(model, LIFE_DEN)?;
    let lo = RemainingLifetime::new(model_u64(model, LIFE_NUM)?, den)?;
    let hi = RemainingLifetime::new(model_u64(model, LIFE_NUM_HI)?, den)?;
    let amounts = [
        model_int(model, PRICE)?,
        model_int(model, AFF_DOM_PAYOUT)?,
        model_int(model, TERM_PAYOUT)?,
        model_int(model, DET_PAYOUT)?,
        model_int(model, REPORTING_FEE)?,
        model_int(model, MIN_TERM_PAYOUT)?,
    ];
    let scenario = Scenario::try_from_signed(amounts, lo)?;
    Ok(ParameterPoint::new(scenario, hi))
}

/// Valuation of every encoding variable at a concrete point. `None` when
/// the lifetimes' common denominator does not fit in `i64`.
pub fn point_valuation(point: &ParameterPoint) -> Option<Valuation> {
    let lo = point.scenario.protocol.remaining_lifetime.as_ratio();
    let hi = point.higher_lifetime.as_ratio();
    let den = lo.denom().lcm(hi.denom());
    let num = lo.numer() * (&den / lo.denom());
    let num_hi = hi.numer() * (&den / hi.denom());

    let rp = &point.scenario.reward;
    let protocol = &point.scenario.protocol;
    let int = |n: i128| Value::Int(n);
    let entries = [
        (PRICE, int(rp.price.into())),
        (AFF_DOM_PAYOUT, int(rp.aff_dom_payout.into())),
        (TERM_PAYOUT, int(rp.term_payout.into())),
        (DET_PAYOUT, int(rp.det_payout.into())),
        (REPORTING_FEE, int(protocol.reporting_fee.into())),
        (MIN_TERM_PAYOUT, int(protocol.min_term_payout.into())),
        (LIFE_NUM, int(num.to_i64()?.into())),
        (LIFE_NUM_HI, int(num_hi.to_i64()?.into())),
        (LIFE_DEN, int(den.to_i64()?.into())),
        (SPLIT, int(point.scenario.termination_split())),
        (SPLIT_HI, int(point.higher_split())),
    ];
    Some(
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

/// Discharge every query of `property` on `solver`.
pub fn discharge<S: SmtSolver>(
    solver: &mut S,
    property: &Property,
    deadline: Option<Instant>,
) -> Result<VerificationResult, VerifyError> {
    let backend = solver.name();
    let solver_err = |e: S::Error| VerifyError::Solver(format!("{backend}: {e}"));
    let queries = queries(property)?;
    let decls = declarations();

    for query in &queries {
        if deadline_exceeded(deadline) {
            return Ok(VerificationResult::Unknown {
                reason: timeout_unknown_reason(&format!("{backend} on {}", property.id)),
            });
        }
        let at = query
            .outcome
            .map_or_else(|| "parameters".to_string(), |o| o.to_string());

        let (sat, model) = solver
            .check_in_scope(&decls, &query.assertions)
            .map_err(solver_err)?;
        debug!(property = %property.id, outcome = %at, result = %sat, "{backend} query");

        match sat {
            SatResult::Unsat => {}
            SatResult::Unknown(reason) => {
                return Ok(VerificationResult::Unknown {
                    reason: format!("{backend} returned unknown at {at}: {reason}"),
                });
            }
            SatResult::Sat => {
                let model = model
                    .ok_or_else(|| VerifyError::Model(format!("{backend} reported sat without a model")))?;
                let point = decode_point(&model)?;
                return Ok(match property.check_binding(&point, query.outcome)? {
                    Some(violation) => VerificationResult::Falsified {
                        counterexample: Box::new(Counterexample::new(
                            property,
                            point,
                            violation,
                            WitnessSource::Solver {
                                backend: backend.to_string(),
                            },
                        )),
                    },
                    None => VerificationResult::Unknown {
                        reason: format!(
                            "{backend} witness at {at} does not reproduce on the concrete payout engine"
                        ),
                    },
                });
            }
        }
    }

    Ok(VerificationResult::Proved {
        backend: backend.to_string(),
        queries: queries.len(),
    })
}

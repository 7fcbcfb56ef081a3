//! Discharge of symbolic queries against scripted and real solvers.

use std::collections::{HashMap, VecDeque};
use std::io;

use rpcheck_engine::property::{
    standard_property, Obligation, Operand, OutcomePattern, OutcomeRef, Precondition, Property,
    Relation, Scope, NO_COLLUSION_PROFITS, REPORTING_INCENTIVE,
};
use rpcheck_engine::symbolic::{self, discharge};
use rpcheck_engine::{VerificationResult, WitnessSource};
use rpcheck_model::{Detection, Issuance, Player, Registration};
use rpcheck_smt::solver::{Model, ModelValue, SatResult, SmtSolver};
use rpcheck_smt::sorts::SmtSort;
use rpcheck_smt::terms::SmtTerm;

/// Replays a fixed list of answers, one per `check_sat`.
struct ScriptedSolver {
    answers: VecDeque<(SatResult, Option<Model>)>,
    depth: usize,
    asserted: usize,
}

impl ScriptedSolver {
    fn new(answers: Vec<(SatResult, Option<Model>)>) -> Self {
        Self {
            answers: answers.into(),
            depth: 0,
            asserted: 0,
        }
    }
}

impl SmtSolver for ScriptedSolver {
    type Error = io::Error;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn declare_var(&mut self, _name: &str, _sort: &SmtSort) -> Result<(), Self::Error> {
        Ok(())
    }

    fn assert(&mut self, _term: &SmtTerm) -> Result<(), Self::Error> {
        self.asserted += 1;
        Ok(())
    }

    fn push(&mut self) -> Result<(), Self::Error> {
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Self::Error> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| io::Error::other("pop without push"))?;
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Self::Error> {
        Ok(self.check_sat_with_model(&[])?.0)
    }

    fn check_sat_with_model(
        &mut self,
        _var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error> {
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::other("no scripted answer left"))
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.depth = 0;
        Ok(())
    }
}

fn model(values: &[(&str, i64)]) -> Model {
    let values: HashMap<String, ModelValue> = values
        .iter()
        .map(|(k, n)| (k.to_string(), ModelValue::Int(*n)))
        .collect();
    Model { values }
}

/// A caught registered CA always loses money; this claims it profits.
fn caught_ca_profits() -> Property {
    Property {
        id: "caught-ca-profits".into(),
        description: "false on purpose".into(),
        scope: Scope::Outcomes(OutcomePattern {
            registration: Some(Registration::Register),
            issuance: Some(Issuance::IssueNonCompliant),
            detection: Some(Detection::Report),
        }),
        preconditions: vec![
            Precondition::MinTermPayoutFeasible,
            Precondition::PriceFeasible,
        ],
        obligations: vec![Obligation::compare(
            Operand::payoff(&[Player::Ca], OutcomeRef::Bound),
            Relation::Gt,
            Operand::Constant(0),
        )],
    }
}

fn witness() -> Model {
    model(&[
        (symbolic::PRICE, 7),
        (symbolic::AFF_DOM_PAYOUT, 10),
        (symbolic::TERM_PAYOUT, 3),
        (symbolic::DET_PAYOUT, 4),
        (symbolic::REPORTING_FEE, 2),
        (symbolic::MIN_TERM_PAYOUT, 2),
        (symbolic::LIFE_NUM, 1),
        (symbolic::LIFE_NUM_HI, 1),
        (symbolic::LIFE_DEN, 2),
        (symbolic::SPLIT, 2),
        (symbolic::SPLIT_HI, 2),
    ])
}

#[test]
fn unsat_for_every_outcome_proves_the_property() {
    let property = standard_property(NO_COLLUSION_PROFITS).unwrap();
    let mut solver = ScriptedSolver::new(vec![(SatResult::Unsat, None); 4]);
    let result = discharge(&mut solver, &property, None).unwrap();
    match result {
        VerificationResult::Proved { backend, queries } => {
            assert_eq!(backend, "scripted");
            assert_eq!(queries, 4);
        }
        other => panic!("expected proof, got {other}"),
    }
    assert_eq!(solver.depth, 0);
    assert!(solver.answers.is_empty());
    assert!(solver.asserted > 0);
}

#[test]
fn reproducing_model_falsifies() {
    let property = caught_ca_profits();
    let mut solver = ScriptedSolver::new(vec![(SatResult::Sat, Some(witness()))]);
    let result = discharge(&mut solver, &property, None).unwrap();
    let cex = result.counterexample().expect("falsified");
    assert_eq!(
        cex.source,
        WitnessSource::Solver {
            backend: "scripted".into()
        }
    );
    // 7 - 2 - 10 - 4
    assert_eq!(cex.lhs(), -9);
    assert_eq!(cex.point.scenario.reward.price, 7);
}

#[test]
fn spurious_model_is_reported_unknown() {
    // The witness satisfies every obligation of the real property.
    let property = standard_property(REPORTING_INCENTIVE).unwrap();
    let mut solver = ScriptedSolver::new(vec![(SatResult::Sat, Some(witness()))]);
    let result = discharge(&mut solver, &property, None).unwrap();
    match result {
        VerificationResult::Unknown { reason } => {
            assert!(reason.contains("does not reproduce"), "{reason}")
        }
        other => panic!("expected unknown, got {other}"),
    }
}

#[test]
fn solver_unknown_stops_discharge() {
    let property = standard_property(NO_COLLUSION_PROFITS).unwrap();
    let mut solver = ScriptedSolver::new(vec![
        (SatResult::Unsat, None),
        (SatResult::Unknown("timeout".into()), None),
    ]);
    let result = discharge(&mut solver, &property, None).unwrap();
    assert!(result.is_unknown());
    assert_eq!(solver.answers.len(), 0);
}

#[test]
fn incomplete_model_is_an_error() {
    let property = caught_ca_profits();
    let mut solver = ScriptedSolver::new(vec![(SatResult::Sat, Some(model(&[("price", 7)])))]);
    let err = discharge(&mut solver, &property, None).unwrap_err();
    assert!(err.to_string().contains("no integer value"), "{err}");
}

#[cfg(feature = "z3")]
mod z3_proofs {
    use super::*;
    use rpcheck_engine::standard_properties;
    use rpcheck_smt::backends::z3_backend::Z3Solver;

    #[test]
    fn all_standard_properties_are_proved() {
        for property in standard_properties() {
            let mut solver = Z3Solver::with_timeout_secs(60);
            let result = discharge(&mut solver, &property, None).unwrap();
            assert_eq!(result.verdict_class(), "proved", "{}: {result}", property.id);
        }
    }

    #[test]
    fn false_property_gets_a_replayed_witness() {
        let mut solver = Z3Solver::with_timeout_secs(60);
        let result = discharge(&mut solver, &caught_ca_profits(), None).unwrap();
        let cex = result.counterexample().expect("falsified");
        assert!(cex.lhs() <= 0);
        assert!(cex.point.scenario.price_feasible());
    }
}

#[test]
#[ignore = "requires cvc5 on PATH"]
fn cvc5_proves_standard_properties() {
    use rpcheck_engine::standard_properties;
    use rpcheck_smt::backends::cvc5_backend::Cvc5Solver;
    use rpcheck_smt::sorts::SmtLogic;

    for property in standard_properties() {
        let mut solver = Cvc5Solver::with_options("cvc5", SmtLogic::QfNia, Some(60_000)).unwrap();
        let result = discharge(&mut solver, &property, None).unwrap();
        assert_eq!(result.verdict_class(), "proved", "{}: {result}", property.id);
    }
}

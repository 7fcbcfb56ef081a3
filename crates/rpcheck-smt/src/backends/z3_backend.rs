//! In-process Z3 through the `z3` crate.

use std::collections::HashMap;

use thiserror::Error;
use z3::ast::{Bool, Int};

use crate::solver::{Model, ModelValue, SatResult, SmtSolver};
use crate::sorts::SmtSort;
use crate::terms::{ArithOp, CmpOp, SmtTerm};

#[derive(Debug, Error)]
pub enum Z3Error {
    #[error("Z3 error: {0}")]
    Internal(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Ill-sorted operands for `{0}`")]
    SortMismatch(&'static str),
}

#[derive(Clone)]
enum Z3Term {
    Int(Int),
    Bool(Bool),
}

/// Z3 picks its own tactic, so the configured logic is not forwarded.
pub struct Z3Solver {
    solver: z3::Solver,
    consts: HashMap<String, Z3Term>,
    timeout_ms: Option<u32>,
    scopes: usize,
}

impl Z3Solver {
    pub fn new() -> Self {
        Self::with_timeout_secs(0)
    }

    /// `0` means no per-check limit.
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        let timeout_ms = (timeout_secs > 0)
            .then(|| u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX));
        let solver = Self {
            solver: z3::Solver::new(),
            consts: HashMap::new(),
            timeout_ms,
            scopes: 0,
        };
        solver.apply_timeout();
        solver
    }

    fn apply_timeout(&self) {
        if let Some(ms) = self.timeout_ms {
            let mut params = z3::Params::new();
            params.set_u32("timeout", ms);
            self.solver.set_params(&params);
        }
    }

    fn lower(&self, term: &SmtTerm) -> Result<Z3Term, Z3Error> {
        Ok(match term {
            SmtTerm::Var(name) => self
                .consts
                .get(name)
                .cloned()
                .ok_or_else(|| Z3Error::UnknownVariable(name.clone()))?,
            SmtTerm::IntLit(n) => Z3Term::Int(Int::from_i64(*n)),
            SmtTerm::BoolLit(b) => Z3Term::Bool(Bool::from_bool(*b)),
            SmtTerm::Arith(op, l, r) => {
                let (l, r) = (self.lower_int(l, op.symbol())?, self.lower_int(r, op.symbol())?);
                Z3Term::Int(match op {
                    ArithOp::Add => &l + &r,
                    ArithOp::Sub => &l - &r,
                    ArithOp::Mul => &l * &r,
                })
            }
            SmtTerm::Neg(inner) => Z3Term::Int(self.lower_int(inner, "-")?.unary_minus()),
            SmtTerm::Cmp(op, l, r) => {
                let atom = match (self.lower(l)?, self.lower(r)?) {
                    (Z3Term::Int(a), Z3Term::Int(b)) => match op {
                        CmpOp::Eq => a.eq(&b),
                        CmpOp::Lt => a.lt(&b),
                        CmpOp::Le => a.le(&b),
                        CmpOp::Gt => a.gt(&b),
                        CmpOp::Ge => a.ge(&b),
                    },
                    (Z3Term::Bool(a), Z3Term::Bool(b)) if *op == CmpOp::Eq => a.eq(&b),
                    _ => return Err(Z3Error::SortMismatch(op.symbol())),
                };
                Z3Term::Bool(atom)
            }
            SmtTerm::And(terms) => {
                let operands = self.lower_all(terms, "and")?;
                Z3Term::Bool(Bool::and(&operands.iter().collect::<Vec<_>>()))
            }
            SmtTerm::Or(terms) => {
                let operands = self.lower_all(terms, "or")?;
                Z3Term::Bool(Bool::or(&operands.iter().collect::<Vec<_>>()))
            }
            SmtTerm::Not(inner) => Z3Term::Bool(self.lower_bool(inner, "not")?.not()),
        })
    }

    fn lower_int(&self, term: &SmtTerm, context: &'static str) -> Result<Int, Z3Error> {
        match self.lower(term)? {
            Z3Term::Int(i) => Ok(i),
            Z3Term::Bool(_) => Err(Z3Error::SortMismatch(context)),
        }
    }

    fn lower_bool(&self, term: &SmtTerm, context: &'static str) -> Result<Bool, Z3Error> {
        match self.lower(term)? {
            Z3Term::Bool(b) => Ok(b),
            Z3Term::Int(_) => Err(Z3Error::SortMismatch(context)),
        }
    }

    fn lower_all(&self, terms: &[SmtTerm], context: &'static str) -> Result<Vec<Bool>, Z3Error> {
        terms.iter().map(|t| self.lower_bool(t, context)).collect()
    }

    fn read_value(&self, model: &z3::Model, name: &str, sort: &SmtSort) -> Option<ModelValue> {
        match (self.consts.get(name)?, sort) {
            (Z3Term::Int(c), SmtSort::Int) => {
                model.eval::<Int>(c, true)?.as_i64().map(ModelValue::Int)
            }
            (Z3Term::Bool(c), SmtSort::Bool) => {
                model.eval::<Bool>(c, true)?.as_bool().map(ModelValue::Bool)
            }
            _ => None,
        }
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtSolver for Z3Solver {
    type Error = Z3Error;

    fn name(&self) -> &'static str {
        "z3"
    }

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Z3Error> {
        let constant = match sort {
            SmtSort::Int => Z3Term::Int(Int::new_const(name)),
            SmtSort::Bool => Z3Term::Bool(Bool::new_const(name)),
        };
        self.consts.insert(name.to_string(), constant);
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Z3Error> {
        let formula = self.lower_bool(term, "assert")?;
        self.solver.assert(&formula);
        Ok(())
    }

    fn push(&mut self) -> Result<(), Z3Error> {
        self.solver.push();
        self.scopes += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Z3Error> {
        if self.scopes == 0 {
            return Err(Z3Error::Internal("pop without matching push".into()));
        }
        self.solver.pop(1);
        self.scopes -= 1;
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Z3Error> {
        Ok(match self.solver.check() {
            z3::SatResult::Sat => SatResult::Sat,
            z3::SatResult::Unsat => SatResult::Unsat,
            z3::SatResult::Unknown => SatResult::Unknown(
                self.solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "Z3 returned unknown".into()),
            ),
        })
    }

    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Z3Error> {
        let result = self.check_sat()?;
        if result != SatResult::Sat {
            return Ok((result, None));
        }
        let model = self
            .solver
            .get_model()
            .ok_or_else(|| Z3Error::Internal("SAT but no model available".into()))?;
        let values = var_names
            .iter()
            .filter_map(|&(name, sort)| {
                Some((name.to_string(), self.read_value(&model, name, sort)?))
            })
            .collect();
        Ok((SatResult::Sat, Some(Model { values })))
    }

    fn reset(&mut self) -> Result<(), Z3Error> {
        self.solver.reset();
        // reset drops solver parameters
        self.apply_timeout();
        self.consts.clear();
        self.scopes = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn extracts_integer_model() -> TestResult {
        let mut solver = Z3Solver::new();
        solver.declare_var("price", &SmtSort::Int)?;
        solver.assert(&SmtTerm::var("price").eq(SmtTerm::int(42)))?;

        let (result, model) = solver.check_sat_with_model(&[("price", &SmtSort::Int)])?;
        assert_eq!(result, SatResult::Sat);
        let model = model.ok_or_else(|| std::io::Error::other("expected model"))?;
        assert_eq!(model.get_int("price"), Some(42));
        Ok(())
    }

    #[test]
    fn solves_non_linear_constraints() -> TestResult {
        let mut solver = Z3Solver::new();
        solver.declare_var("x", &SmtSort::Int)?;
        solver.declare_var("y", &SmtSort::Int)?;
        solver.assert(&SmtTerm::and(vec![
            SmtTerm::var("x").mul(SmtTerm::var("y")).eq(SmtTerm::int(12)),
            SmtTerm::var("y").gt(SmtTerm::int(0)),
            SmtTerm::var("x").neg().eq(SmtTerm::int(-4)),
        ]))?;
        let (result, model) =
            solver.check_sat_with_model(&[("x", &SmtSort::Int), ("y", &SmtSort::Int)])?;
        assert_eq!(result, SatResult::Sat);
        let model = model.ok_or_else(|| std::io::Error::other("expected model"))?;
        assert_eq!(model.get_int("y"), Some(3));
        Ok(())
    }

    #[test]
    fn timeout_survives_reset() -> TestResult {
        let mut solver = Z3Solver::with_timeout_secs(2);
        solver.push()?;
        solver.reset()?;
        assert_eq!(solver.timeout_ms, Some(2000));
        assert!(solver.pop().is_err());
        solver.declare_var("x", &SmtSort::Int)?;
        solver.assert(&SmtTerm::var("x").eq(SmtTerm::int(2)))?;
        assert_eq!(solver.check_sat()?, SatResult::Sat);
        Ok(())
    }

    #[test]
    fn rejects_undeclared_and_ill_sorted_terms() -> TestResult {
        let mut solver = Z3Solver::new();
        solver.declare_var("flag", &SmtSort::Bool)?;
        assert!(matches!(
            solver.assert(&SmtTerm::var("ghost").gt(SmtTerm::int(0))),
            Err(Z3Error::UnknownVariable(_))
        ));
        assert!(matches!(
            solver.assert(&SmtTerm::var("flag").add(SmtTerm::int(1)).gt(SmtTerm::int(0))),
            Err(Z3Error::SortMismatch("+"))
        ));
        Ok(())
    }
}

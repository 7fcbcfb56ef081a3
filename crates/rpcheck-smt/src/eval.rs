//! Concrete evaluation of terms.
//!
//! Used to replay solver witnesses and to check that symbolic encodings agree
//! with their concrete counterparts on sampled points.

use std::collections::HashMap;

use thiserror::Error;

use crate::terms::{CmpOp, SmtTerm};

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("Unbound variable: {0}")]
    Unbound(String),
    #[error("Sort mismatch: expected {expected}, got {got}")]
    SortMismatch {
        expected: &'static str,
        got: &'static str,
    },
    #[error("Arithmetic overflow")]
    Overflow,
}

/// A concrete value of an SMT sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i128),
    Bool(bool),
}

impl Value {
    fn sort_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
        }
    }

    pub fn as_int(self) -> Result<i128, EvalError> {
        match self {
            Value::Int(n) => Ok(n),
            Value::Bool(_) => Err(EvalError::SortMismatch {
                expected: "Int",
                got: self.sort_name(),
            }),
        }
    }

    pub fn as_bool(self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(b),
            Value::Int(_) => Err(EvalError::SortMismatch {
                expected: "Bool",
                got: self.sort_name(),
            }),
        }
    }
}

/// Variable assignment used by [`eval`].
pub type Valuation = HashMap<String, Value>;

/// Evaluate `term` under `env`. Integer arithmetic is exact over `i128`.
pub fn eval(term: &SmtTerm, env: &Valuation) -> Result<Value, EvalError> {
    Ok(match term {
        SmtTerm::Var(name) => *env
            .get(name)
            .ok_or_else(|| EvalError::Unbound(name.clone()))?,
        SmtTerm::IntLit(n) => Value::Int(i128::from(*n)),
        SmtTerm::BoolLit(b) => Value::Bool(*b),
        SmtTerm::Arith(op, l, r) => {
            let (a, b) = (eval_int(l, env)?, eval_int(r, env)?);
            Value::Int(op.apply(a, b).ok_or(EvalError::Overflow)?)
        }
        SmtTerm::Neg(inner) => Value::Int(
            eval_int(inner, env)?
                .checked_neg()
                .ok_or(EvalError::Overflow)?,
        ),
        SmtTerm::Cmp(op, l, r) => Value::Bool(compare(*op, eval(l, env)?, eval(r, env)?)?),
        SmtTerm::And(terms) => {
            let mut all = true;
            for t in terms {
                if !eval_bool(t, env)? {
                    all = false;
                    break;
                }
            }
            Value::Bool(all)
        }
        SmtTerm::Or(terms) => {
            let mut any = false;
            for t in terms {
                if eval_bool(t, env)? {
                    any = true;
                    break;
                }
            }
            Value::Bool(any)
        }
        SmtTerm::Not(inner) => Value::Bool(!eval_bool(inner, env)?),
    })
}

fn eval_int(term: &SmtTerm, env: &Valuation) -> Result<i128, EvalError> {
    eval(term, env)?.as_int()
}

fn eval_bool(term: &SmtTerm, env: &Valuation) -> Result<bool, EvalError> {
    eval(term, env)?.as_bool()
}

fn compare(op: CmpOp, lhs: Value, rhs: Value) -> Result<bool, EvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(op.holds(a, b)),
        (Value::Bool(a), Value::Bool(b)) if op == CmpOp::Eq => Ok(a == b),
        (Value::Bool(_), Value::Bool(_)) => Err(EvalError::SortMismatch {
            expected: "Int",
            got: "Bool",
        }),
        (a, b) => Err(EvalError::SortMismatch {
            expected: a.sort_name(),
            got: b.sort_name(),
        }),
    }
}

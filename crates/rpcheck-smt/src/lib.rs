//! SMT terms and solver integration for reward-protocol proof obligations.
//!
//! Obligations are built as solver-agnostic [`terms::SmtTerm`] trees over
//! integer and boolean variables, printed as SMT-LIB2 scripts, and discharged
//! through the [`solver::SmtSolver`] trait by a cvc5 child process or, with
//! the `z3` feature, by an in-process Z3 solver.

pub mod backends;
pub mod eval;
pub mod solver;
pub mod sorts;
pub mod terms;

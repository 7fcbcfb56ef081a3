use std::collections::HashMap;
use std::fmt;

use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

#[derive(Debug, Clone, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    /// Carries the backend's reason (timeout, incomplete theory, ...).
    Unknown(String),
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatResult::Sat => f.write_str("sat"),
            SatResult::Unsat => f.write_str("unsat"),
            SatResult::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    Int(i64),
    Bool(bool),
}

/// Assignment returned with a SAT answer. Variables the backend did not
/// report, or whose value does not fit, are absent.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub values: HashMap<String, ModelValue>,
}

impl Model {
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ModelValue::Int(n) => Some(*n),
            ModelValue::Bool(_) => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            ModelValue::Bool(b) => Some(*b),
            ModelValue::Int(_) => None,
        }
    }
}

/// Incremental SMT backend.
///
/// A proof obligation is discharged by asserting its negation inside a
/// scope and asking for a model: UNSAT means the obligation holds for every
/// assignment of the declared variables.
pub trait SmtSolver {
    type Error: std::error::Error;

    /// Short backend label used in reports (`z3`, `cvc5`, ...).
    fn name(&self) -> &'static str;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error>;

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error>;

    fn push(&mut self) -> Result<(), Self::Error>;

    /// Fails when no scope is open.
    fn pop(&mut self) -> Result<(), Self::Error>;

    fn check_sat(&mut self) -> Result<SatResult, Self::Error>;

    /// Like [`check_sat`](Self::check_sat), reading back `var_names` on SAT.
    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error>;

    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Declare, assert and check inside a fresh scope, which is closed again
    /// before returning. The model covers every declared variable.
    fn check_in_scope(
        &mut self,
        declarations: &[(String, SmtSort)],
        assertions: &[SmtTerm],
    ) -> Result<(SatResult, Option<Model>), Self::Error> {
        let vars: Vec<(&str, &SmtSort)> = declarations
            .iter()
            .map(|(name, sort)| (name.as_str(), sort))
            .collect();
        self.push()?;
        let checked = declarations
            .iter()
            .try_for_each(|(name, sort)| self.declare_var(name, sort))
            .and_then(|()| assertions.iter().try_for_each(|t| self.assert(t)))
            .and_then(|()| self.check_sat_with_model(&vars));
        self.pop()?;
        checked
    }
}

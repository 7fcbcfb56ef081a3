//! cvc5 as a child process over its incremental SMT-LIB2 interface.
//!
//! Commands are written one per line; only `check-sat`, `get-value` and
//! `get-info` produce output, and a response is read until its parentheses
//! balance, so multi-line models are handled.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};

use thiserror::Error;

use crate::backends::smtlib_printer::{sort_to_smtlib, to_smtlib};
use crate::solver::{Model, ModelValue, SatResult, SmtSolver};
use crate::sorts::{SmtLogic, SmtSort};
use crate::terms::SmtTerm;

#[derive(Debug, Error)]
pub enum Cvc5Error {
    #[error("cvc5 I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cvc5 not found: {0}")]
    NotFound(String),
    #[error("cvc5 error: {0}")]
    SolverError(String),
}

pub struct Cvc5Solver {
    process: Child,
    input: ChildStdin,
    output: BufReader<ChildStdout>,
    diagnostics: ChildStderr,
    logic: SmtLogic,
    scopes: usize,
}

impl Cvc5Solver {
    pub fn new() -> Result<Self, Cvc5Error> {
        Self::with_options("cvc5", SmtLogic::default(), None)
    }

    pub fn with_timeout_secs(timeout_secs: u64) -> Result<Self, Cvc5Error> {
        let timeout_ms = (timeout_secs > 0).then(|| timeout_secs.saturating_mul(1000));
        Self::with_options("cvc5", SmtLogic::default(), timeout_ms)
    }

    /// Launch `command` for `logic`. `timeout_ms` bounds each `check-sat`.
    pub fn with_options(
        command: &str,
        logic: SmtLogic,
        timeout_ms: Option<u64>,
    ) -> Result<Self, Cvc5Error> {
        let mut cmd = Command::new(command);
        cmd.args(["--lang", "smt2", "--incremental", "--produce-models"]);
        if let Some(ms) = timeout_ms {
            cmd.arg(format!("--tlimit-per={ms}"));
        }
        let mut process = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Cvc5Error::NotFound(format!("{command}: {e}")),
                _ => Cvc5Error::Io(e),
            })?;

        let missing = |stream: &str| Cvc5Error::SolverError(format!("no {stream} pipe to {command}"));
        let input = process.stdin.take().ok_or_else(|| missing("stdin"))?;
        let output = process.stdout.take().ok_or_else(|| missing("stdout"))?;
        let diagnostics = process.stderr.take().ok_or_else(|| missing("stderr"))?;

        let mut solver = Self {
            process,
            input,
            output: BufReader::new(output),
            diagnostics,
            logic,
            scopes: 0,
        };
        solver.send(&format!("(set-logic {logic})"))?;
        Ok(solver)
    }

    fn send(&mut self, command: &str) -> Result<(), Cvc5Error> {
        writeln!(self.input, "{command}")?;
        self.input.flush()?;
        Ok(())
    }

    /// Send `command` and read one complete s-expression or atom back.
    fn query(&mut self, command: &str) -> Result<String, Cvc5Error> {
        self.send(command)?;
        let mut response = String::new();
        loop {
            let mut line = String::new();
            if self.output.read_line(&mut line)? == 0 {
                return Err(self.died(command));
            }
            response.push_str(&line);
            if balanced(&response) && !response.trim().is_empty() {
                break;
            }
        }
        let response = response.trim().to_string();
        if response.starts_with("(error") {
            return Err(Cvc5Error::SolverError(format!("`{command}`: {response}")));
        }
        Ok(response)
    }

    /// The process closed stdout; collect whatever it said on stderr.
    fn died(&mut self, command: &str) -> Cvc5Error {
        let _ = self.process.try_wait();
        let mut stderr = String::new();
        let _ = self.diagnostics.read_to_string(&mut stderr);
        Cvc5Error::SolverError(format!(
            "no response to `{command}`; stderr: {}",
            stderr.trim()
        ))
    }

    fn reason_unknown(&mut self) -> String {
        self.query("(get-info :reason-unknown)")
            .ok()
            .and_then(|r| {
                r.trim_start_matches('(')
                    .trim_end_matches(')')
                    .strip_prefix(":reason-unknown")
                    .map(|s| s.trim().to_string())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "no reason given".to_string())
    }
}

impl Drop for Cvc5Solver {
    fn drop(&mut self) {
        let _ = self.send("(exit)");
        let _ = self.process.wait();
    }
}

impl SmtSolver for Cvc5Solver {
    type Error = Cvc5Error;

    fn name(&self) -> &'static str {
        "cvc5"
    }

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Cvc5Error> {
        self.send(&format!("(declare-const {name} {})", sort_to_smtlib(sort)))
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Cvc5Error> {
        self.send(&format!("(assert {})", to_smtlib(term)))
    }

    fn push(&mut self) -> Result<(), Cvc5Error> {
        self.send("(push 1)")?;
        self.scopes += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Cvc5Error> {
        if self.scopes == 0 {
            return Err(Cvc5Error::SolverError("pop without matching push".into()));
        }
        self.send("(pop 1)")?;
        self.scopes -= 1;
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Cvc5Error> {
        let answer = self.query("(check-sat)")?;
        match answer.as_str() {
            "sat" => Ok(SatResult::Sat),
            "unsat" => Ok(SatResult::Unsat),
            "unknown" => Ok(SatResult::Unknown(self.reason_unknown())),
            other => Err(Cvc5Error::SolverError(format!(
                "unexpected check-sat answer `{other}`"
            ))),
        }
    }

    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Cvc5Error> {
        let result = self.check_sat()?;
        if result != SatResult::Sat || var_names.is_empty() {
            return Ok((result, None));
        }
        let names: Vec<&str> = var_names.iter().map(|(n, _)| *n).collect();
        let response = self.query(&format!("(get-value ({}))", names.join(" ")))?;
        let raw = parse_value_list(&response);
        let values = var_names
            .iter()
            .filter_map(|&(name, sort)| {
                let value = parse_value(raw.get(name)?, sort)?;
                Some((name.to_string(), value))
            })
            .collect();
        Ok((SatResult::Sat, Some(Model { values })))
    }

    fn reset(&mut self) -> Result<(), Cvc5Error> {
        self.send("(reset)")?;
        self.scopes = 0;
        let logic = self.logic;
        self.send(&format!("(set-logic {logic})"))
    }
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i64;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

/// Split `((x 1) (y (- 2)) (b true))` into `x -> "1"`, `y -> "(- 2)"`, `b -> "true"`.
fn parse_value_list(response: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    let Some(body) = response
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    else {
        return pairs;
    };

    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in body.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(from) = start.take() {
                        if let Some((name, value)) = body[from..i].trim().split_once(char::is_whitespace) {
                            pairs.insert(name.to_string(), value.trim().to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    pairs
}

fn parse_value(text: &str, sort: &SmtSort) -> Option<ModelValue> {
    match sort {
        SmtSort::Int => {
            let text = text.trim();
            let n = match text.strip_prefix("(-").and_then(|s| s.strip_suffix(')')) {
                Some(magnitude) => magnitude.trim().parse::<i64>().ok()?.checked_neg()?,
                None => text.parse::<i64>().ok()?,
            };
            Some(ModelValue::Int(n))
        }
        SmtSort::Bool => match text.trim() {
            "true" => Some(ModelValue::Bool(true)),
            "false" => Some(ModelValue::Bool(false)),
            _ => None,
        },
    }
}

//! Verification orchestration: checker selection, SMT dumps, and fallback.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use rpcheck_model::ParamError;
use rpcheck_smt::backends::cvc5_backend::{Cvc5Error, Cvc5Solver};
use rpcheck_smt::sorts::SmtLogic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::property::{Property, PropertyError};
use crate::result::{PropertyVerdict, VerificationReport, VerificationResult};
use crate::sampling::SamplingChecker;
use crate::symbolic;
use crate::timeout::{deadline_from_timeout_secs, remaining_timeout_secs};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Could not decode solver model: {0}")]
    Model(String),
    #[error("Invalid parameters: {0}")]
    Param(#[from] ParamError),
    #[error("Invalid property: {0}")]
    Property(#[from] PropertyError),
    #[error("{backend} is unavailable: {reason}")]
    BackendUnavailable { backend: &'static str, reason: String },
    #[error("Could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which checker decides a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckerChoice {
    /// Corner points plus seeded random sampling.
    Sampling,
    /// In-process Z3 (requires the `z3` feature).
    Z3,
    /// cvc5 child process.
    Cvc5,
}

impl Default for CheckerChoice {
    fn default() -> Self {
        if cfg!(feature = "z3") {
            CheckerChoice::Z3
        } else {
            CheckerChoice::Sampling
        }
    }
}

impl CheckerChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckerChoice::Sampling => "sampling",
            CheckerChoice::Z3 => "z3",
            CheckerChoice::Cvc5 => "cvc5",
        }
    }
}

impl fmt::Display for CheckerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckerChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sampling" => Ok(CheckerChoice::Sampling),
            "z3" => Ok(CheckerChoice::Z3),
            "cvc5" => Ok(CheckerChoice::Cvc5),
            other => Err(format!(
                "unknown checker `{other}` (expected sampling, z3, cvc5)"
            )),
        }
    }
}

/// Options for a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    pub checker: CheckerChoice,
    pub samples: usize,
    pub seed: u64,
    pub max_amount: u64,
    pub max_lifetime_den: u64,
    /// Wall-clock budget per property in seconds; 0 means unlimited.
    pub timeout_secs: u64,
    /// Directory receiving one SMT-LIB2 script per query.
    pub dump_smt: Option<PathBuf>,
    pub cvc5_command: String,
    /// Fall back to sampling when the symbolic checker is inconclusive or
    /// its backend is missing.
    pub sampling_fallback: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        let sampling = SamplingChecker::default();
        Self {
            checker: CheckerChoice::default(),
            samples: sampling.samples,
            seed: sampling.seed,
            max_amount: sampling.max_amount,
            max_lifetime_den: sampling.max_lifetime_den,
            timeout_secs: 60,
            dump_smt: None,
            cvc5_command: "cvc5".to_string(),
            sampling_fallback: true,
        }
    }
}

impl VerifyOptions {
    pub fn sampling_checker(&self) -> SamplingChecker {
        SamplingChecker::new(self.samples, self.seed)
            .with_max_amount(self.max_amount)
            .with_max_lifetime_den(self.max_lifetime_den)
    }
}

/// Write one script per query of `property` into `dir`.
pub fn dump_smt_scripts(property: &Property, dir: &Path) -> Result<Vec<PathBuf>, VerifyError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| VerifyError::Io { path, source }
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;
    let mut written = Vec::new();
    for (label, script) in symbolic::scripts(property)? {
        let path = dir.join(format!("{label}.smt2"));
        std::fs::write(&path, script).map_err(io_err(&path))?;
        info!("SMT dump written to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn run_symbolic(
    property: &Property,
    options: &VerifyOptions,
    deadline: Option<Instant>,
) -> Result<VerificationResult, VerifyError> {
    let timeout_secs = remaining_timeout_secs(deadline).unwrap_or(0);
    match options.checker {
        CheckerChoice::Sampling => options.sampling_checker().check(property, deadline),
        CheckerChoice::Z3 => {
            #[cfg(feature = "z3")]
            {
                let mut solver =
                    rpcheck_smt::backends::z3_backend::Z3Solver::with_timeout_secs(timeout_secs);
                symbolic::discharge(&mut solver, property, deadline)
            }
            #[cfg(not(feature = "z3"))]
            {
                let _ = timeout_secs;
                Err(VerifyError::BackendUnavailable {
                    backend: "z3",
                    reason: "built without the `z3` feature".to_string(),
                })
            }
        }
        CheckerChoice::Cvc5 => {
            let timeout_ms = (timeout_secs > 0).then(|| timeout_secs.saturating_mul(1000));
            let mut solver =
                Cvc5Solver::with_options(&options.cvc5_command, SmtLogic::QfNia, timeout_ms)
                    .map_err(|e| match e {
                        Cvc5Error::NotFound(reason) => VerifyError::BackendUnavailable {
                            backend: "cvc5",
                            reason,
                        },
                        other => VerifyError::Solver(other.to_string()),
                    })?;
            symbolic::discharge(&mut solver, property, deadline)
        }
    }
}

/// Check one property with the configured checker.
pub fn verify_property(
    property: &Property,
    options: &VerifyOptions,
) -> Result<PropertyVerdict, VerifyError> {
    let started = Instant::now();
    let deadline = deadline_from_timeout_secs(options.timeout_secs);
    property.validate()?;
    info!(property = %property.id, checker = %options.checker, "Checking property...");

    if let Some(dir) = &options.dump_smt {
        dump_smt_scripts(property, dir)?;
    }

    let mut checker = options.checker.as_str().to_string();
    let mut note = None;
    let result = match run_symbolic(property, options, deadline) {
        Ok(result) => result,
        Err(
            e @ (VerifyError::BackendUnavailable { .. }
            | VerifyError::Solver(_)
            | VerifyError::Model(_)),
        ) if options.sampling_fallback => VerificationResult::Unknown {
            reason: e.to_string(),
        },
        Err(e) => return Err(e),
    };

    let result = match result {
        VerificationResult::Unknown { reason }
            if options.sampling_fallback && options.checker != CheckerChoice::Sampling =>
        {
            warn!(property = %property.id, %reason, "Symbolic check inconclusive; falling back to sampling");
            // The symbolic step may have used up the budget; sampling gets a fresh one.
            let fallback_deadline = deadline_from_timeout_secs(options.timeout_secs);
            note = Some(format!("{checker}: {reason}; fell back to sampling"));
            checker = CheckerChoice::Sampling.as_str().to_string();
            options.sampling_checker().check(property, fallback_deadline)?
        }
        other => other,
    };

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        property = %property.id,
        verdict = result.verdict_class(),
        elapsed_ms,
        "Property checked"
    );
    Ok(PropertyVerdict {
        property: property.id.to_string(),
        checker,
        result,
        note,
        elapsed_ms,
    })
}

/// Check every property independently, in order.
pub fn verify_all(
    properties: &[Property],
    options: &VerifyOptions,
) -> Result<VerificationReport, VerifyError> {
    let verdicts = properties
        .iter()
        .map(|p| verify_property(p, options))
        .collect::<Result<Vec<_>, _>>()?;
    let report = VerificationReport { verdicts };
    info!(overall = report.overall_verdict(), "Verification finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::standard_properties;

    fn sampling_options() -> VerifyOptions {
        VerifyOptions {
            checker: CheckerChoice::Sampling,
            samples: 200,
            ..VerifyOptions::default()
        }
    }

    #[test]
    fn checker_choice_parses_and_displays() {
        for c in [CheckerChoice::Sampling, CheckerChoice::Z3, CheckerChoice::Cvc5] {
            assert_eq!(c.to_string().parse::<CheckerChoice>(), Ok(c));
        }
        assert!("yices".parse::<CheckerChoice>().is_err());
    }

    #[test]
    fn sampling_run_holds_for_standard_properties() {
        let report = verify_all(&standard_properties(), &sampling_options()).unwrap();
        assert_eq!(report.verdicts.len(), 5);
        assert!(report.all_hold());
        assert_eq!(report.overall_verdict(), "holds");
        assert!(report.verdicts.iter().all(|v| v.checker == "sampling" && v.note.is_none()));
    }

    #[test]
    fn missing_cvc5_falls_back_to_sampling_with_note() {
        let options = VerifyOptions {
            checker: CheckerChoice::Cvc5,
            cvc5_command: "rpcheck-definitely-missing-solver".to_string(),
            ..sampling_options()
        };
        let verdict = verify_property(&standard_properties()[0], &options).unwrap();
        assert_eq!(verdict.checker, "sampling");
        assert!(verdict.result.holds());
        let note = verdict.note.unwrap();
        assert!(note.starts_with("cvc5: cvc5 is unavailable"), "{note}");
    }

    #[test]
    fn crashing_cvc5_falls_back_to_sampling_with_note() {
        let options = VerifyOptions {
            checker: CheckerChoice::Cvc5,
            cvc5_command: "false".to_string(),
            samples: 20,
            ..sampling_options()
        };
        let verdict = verify_property(&standard_properties()[0], &options).unwrap();
        assert_eq!(verdict.checker, "sampling");
        assert!(verdict.result.holds());
        let note = verdict.note.unwrap();
        assert!(note.starts_with("cvc5: Solver error"), "{note}");
        assert!(note.ends_with("fell back to sampling"), "{note}");
    }

    #[test]
    fn crashing_cvc5_without_fallback_is_an_error() {
        let options = VerifyOptions {
            checker: CheckerChoice::Cvc5,
            cvc5_command: "false".to_string(),
            sampling_fallback: false,
            ..sampling_options()
        };
        let err = verify_property(&standard_properties()[0], &options).unwrap_err();
        assert!(matches!(err, VerifyError::Solver(_)), "{err}");
    }

    #[test]
    fn missing_backend_without_fallback_is_an_error() {
        let options = VerifyOptions {
            checker: CheckerChoice::Cvc5,
            cvc5_command: "rpcheck-definitely-missing-solver".to_string(),
            sampling_fallback: false,
            ..sampling_options()
        };
        let err = verify_property(&standard_properties()[0], &options).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::BackendUnavailable {
                backend: "cvc5",
                ..
            }
        ));
    }

    #[test]
    fn dump_writes_one_script_per_query() {
        let dir = std::env::temp_dir().join(format!("rpcheck-dump-{}", std::process::id()));
        let options = VerifyOptions {
            dump_smt: Some(dir.clone()),
            ..sampling_options()
        };
        for property in standard_properties() {
            verify_property(&property, &options).unwrap();
        }
        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"split-bounds.smt2".to_string()));
        assert!(names.contains(&"reporting-incentive-register-non-compliant-report.smt2".to_string()));
        let _ = std::fs::remove_dir_all(dir);
    }
}

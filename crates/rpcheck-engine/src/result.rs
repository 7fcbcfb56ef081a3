use std::fmt;

use serde::Serialize;

use crate::counterexample::Counterexample;

/// Outcome of checking one property.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum VerificationResult {
    /// Every outcome query came back UNSAT.
    Proved { backend: String, queries: usize },
    /// Sampling found no violation. Not a proof.
    NoCounterexample {
        /// Pseudo-random points drawn.
        samples: usize,
        /// Pseudo-random points asked for. More than `samples` when the
        /// deadline cut the run short.
        requested: usize,
        /// Deterministic corner points checked before sampling.
        boundary_points: usize,
        /// Property evaluations (points times outcomes in scope).
        evaluations: usize,
        /// 95% upper bound on the violation rate under the sampling
        /// distribution (rule of three).
        violation_rate_bound: f64,
    },
    /// A concrete, replayed counterexample.
    Falsified { counterexample: Box<Counterexample> },
    Unknown { reason: String },
}

impl VerificationResult {
    /// Stable string that depends only on the variant.
    pub fn verdict_class(&self) -> &'static str {
        match self {
            VerificationResult::Proved { .. } => "proved",
            VerificationResult::NoCounterexample { .. } => "no_counterexample",
            VerificationResult::Falsified { .. } => "falsified",
            VerificationResult::Unknown { .. } => "unknown",
        }
    }

    /// Proved, or survived sampling.
    pub fn holds(&self) -> bool {
        matches!(
            self,
            VerificationResult::Proved { .. } | VerificationResult::NoCounterexample { .. }
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, VerificationResult::Unknown { .. })
    }

    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            VerificationResult::Falsified { counterexample } => Some(counterexample),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Proved { backend, queries } => {
                write!(f, "PROVED ({backend}, {queries} UNSAT queries)")
            }
            VerificationResult::NoCounterexample {
                samples,
                requested,
                boundary_points,
                evaluations,
                violation_rate_bound,
            } => {
                write!(
                    f,
                    "NO COUNTEREXAMPLE in {boundary_points} boundary points and {samples} samples \
                     ({evaluations} evaluations; violation rate <= {violation_rate_bound:.2e} at 95%)"
                )?;
                if samples < requested {
                    write!(f, " [TRUNCATED at deadline: {samples} of {requested} samples drawn]")?;
                }
                Ok(())
            }
            VerificationResult::Falsified { counterexample } => {
                writeln!(f, "FALSIFIED")?;
                write!(f, "{counterexample}")
            }
            VerificationResult::Unknown { reason } => write!(f, "UNKNOWN: {reason}"),
        }
    }
}

/// Verdict for a single property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyVerdict {
    pub property: String,
    /// Checker that produced `result` (`sampling`, `z3`, `cvc5`).
    pub checker: String,
    pub result: VerificationResult,
    /// Set when the requested checker was not the one that decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub elapsed_ms: u64,
}

impl fmt::Display for PropertyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.property, self.checker, self.result)?;
        if let Some(note) = &self.note {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Verdicts for several properties, checked independently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub verdicts: Vec<PropertyVerdict>,
}

impl VerificationReport {
    pub fn all_hold(&self) -> bool {
        self.verdicts.iter().all(|v| v.result.holds())
    }

    pub fn any_falsified(&self) -> bool {
        self.verdicts
            .iter()
            .any(|v| matches!(v.result, VerificationResult::Falsified { .. }))
    }

    /// "holds", "falsified", or "inconclusive".
    pub fn overall_verdict(&self) -> &'static str {
        if self.any_falsified() {
            "falsified"
        } else if self.all_hold() {
            "holds"
        } else {
            "inconclusive"
        }
    }

    /// Pretty JSON with the overall verdict first. Written straight to text
    /// so that `i128` payoffs outside the `i64` range survive.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Rendered<'a> {
            overall: &'static str,
            verdicts: &'a [PropertyVerdict],
        }
        serde_json::to_string_pretty(&Rendered {
            overall: self.overall_verdict(),
            verdicts: &self.verdicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(result: VerificationResult) -> PropertyVerdict {
        PropertyVerdict {
            property: "p".into(),
            checker: "sampling".into(),
            result,
            note: None,
            elapsed_ms: 0,
        }
    }

    fn sampled() -> VerificationResult {
        VerificationResult::NoCounterexample {
            samples: 300,
            requested: 300,
            boundary_points: 16,
            evaluations: 316,
            violation_rate_bound: 0.01,
        }
    }

    #[test]
    fn verdict_classes_are_stable() {
        let proved = VerificationResult::Proved {
            backend: "z3".into(),
            queries: 4,
        };
        assert_eq!(proved.verdict_class(), "proved");
        assert_eq!(sampled().verdict_class(), "no_counterexample");
        assert!(proved.holds() && sampled().holds());
        let unknown = VerificationResult::Unknown {
            reason: "timeout".into(),
        };
        assert!(!unknown.holds() && unknown.is_unknown());
    }

    #[test]
    fn overall_verdict_prefers_falsified_then_inconclusive() {
        let mut report = VerificationReport {
            verdicts: vec![verdict(sampled())],
        };
        assert_eq!(report.overall_verdict(), "holds");
        report.verdicts.push(verdict(VerificationResult::Unknown {
            reason: "solver gave up".into(),
        }));
        assert_eq!(report.overall_verdict(), "inconclusive");
        assert!(!report.all_hold());
        assert!(!report.any_falsified());
        assert_eq!(VerificationReport::default().overall_verdict(), "holds");
    }

    #[test]
    fn display_includes_note() {
        let mut v = verdict(sampled());
        v.note = Some("z3 unavailable".into());
        let text = v.to_string();
        assert!(text.starts_with("p [sampling]: NO COUNTEREXAMPLE in 16 boundary points and 300 samples"));
        assert!(text.ends_with("note: z3 unavailable"));
    }

    #[test]
    fn truncated_sampling_is_flagged() {
        let result = VerificationResult::NoCounterexample {
            samples: 64,
            requested: 300,
            boundary_points: 16,
            evaluations: 80,
            violation_rate_bound: 3.0 / 64.0,
        };
        assert!(result
            .to_string()
            .ends_with("[TRUNCATED at deadline: 64 of 300 samples drawn]"));
        assert!(!sampled().to_string().contains("TRUNCATED"));
    }

    #[test]
    fn json_report_carries_overall_verdict() {
        let report = VerificationReport {
            verdicts: vec![verdict(sampled())],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["overall"], "holds");
        assert_eq!(json["verdicts"][0]["result"]["verdict"], "no_counterexample");
        assert_eq!(json["verdicts"][0]["result"]["samples"], 300);
        assert_eq!(json["verdicts"][0]["result"]["requested"], 300);
        assert!(json["verdicts"][0].get("note").is_none());
    }
}

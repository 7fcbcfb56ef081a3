use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}` (expected one of: {expected})")]
pub struct ParseChoiceError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Whether the issuing CA registered with the oversight authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Registration {
    Register,
    NoRegister,
}

/// Whether the issued certificate conforms to the domain's certificate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Issuance {
    #[serde(rename = "compliant")]
    IssueCompliant,
    #[serde(rename = "non-compliant")]
    IssueNonCompliant,
}

/// Whether the detector flags the certificate as non-compliant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Detection {
    Report,
    NoReport,
}

impl Registration {
    pub const ALL: [Registration; 2] = [Registration::Register, Registration::NoRegister];

    pub fn as_str(self) -> &'static str {
        match self {
            Registration::Register => "register",
            Registration::NoRegister => "no-register",
        }
    }
}

impl Issuance {
    pub const ALL: [Issuance; 2] = [Issuance::IssueCompliant, Issuance::IssueNonCompliant];

    pub fn as_str(self) -> &'static str {
        match self {
            Issuance::IssueCompliant => "compliant",
            Issuance::IssueNonCompliant => "non-compliant",
        }
    }
}

impl Detection {
    pub const ALL: [Detection; 2] = [Detection::Report, Detection::NoReport];

    pub fn as_str(self) -> &'static str {
        match self {
            Detection::Report => "report",
            Detection::NoReport => "no-report",
        }
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Issuance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Registration {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "register" | "registered" => Ok(Registration::Register),
            "no-register" | "unregistered" => Ok(Registration::NoRegister),
            other => Err(ParseChoiceError {
                kind: "registration",
                value: other.to_string(),
                expected: "register, no-register",
            }),
        }
    }
}

impl FromStr for Issuance {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "compliant" => Ok(Issuance::IssueCompliant),
            "non-compliant" => Ok(Issuance::IssueNonCompliant),
            other => Err(ParseChoiceError {
                kind: "issuance",
                value: other.to_string(),
                expected: "compliant, non-compliant",
            }),
        }
    }
}

impl FromStr for Detection {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "report" => Ok(Detection::Report),
            "no-report" => Ok(Detection::NoReport),
            other => Err(ParseChoiceError {
                kind: "detection",
                value: other.to_string(),
                expected: "report, no-report",
            }),
        }
    }
}

/// One complete play of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Outcome {
    pub registration: Registration,
    pub issuance: Issuance,
    pub detection: Detection,
}

impl Outcome {
    pub const fn new(registration: Registration, issuance: Issuance, detection: Detection) -> Self {
        Self {
            registration,
            issuance,
            detection,
        }
    }

    /// All 8 plays, registration varying slowest and detection fastest.
    pub fn all() -> [Outcome; 8] {
        let mut out = [Outcome::new(
            Registration::Register,
            Issuance::IssueCompliant,
            Detection::Report,
        ); 8];
        let mut i = 0;
        for registration in Registration::ALL {
            for issuance in Issuance::ALL {
                for detection in Detection::ALL {
                    out[i] = Outcome::new(registration, issuance, detection);
                    i += 1;
                }
            }
        }
        out
    }

    pub fn is_registered(&self) -> bool {
        self.registration == Registration::Register
    }

    pub fn is_non_compliant(&self) -> bool {
        self.issuance == Issuance::IssueNonCompliant
    }

    pub fn is_reported(&self) -> bool {
        self.detection == Detection::Report
    }

    /// The same play with the detector's choice replaced.
    pub fn with_detection(self, detection: Detection) -> Outcome {
        Outcome { detection, ..self }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.registration, self.issuance, self.detection)
    }
}

impl FromStr for Outcome {
    type Err = ParseChoiceError;

    /// Accepts `register,non-compliant,report` or `register/non-compliant/report`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split([',', '/']).collect();
        match parts.as_slice() {
            [r, i, d] => Ok(Outcome::new(r.parse()?, i.parse()?, d.parse()?)),
            _ => Err(ParseChoiceError {
                kind: "outcome",
                value: s.to_string(),
                expected: "<registration>,<issuance>,<detection>",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enumerates_exactly_eight_distinct_outcomes() {
        let all = Outcome::all();
        let distinct: HashSet<Outcome> = all.iter().copied().collect();
        assert_eq!(distinct.len(), 8);
        assert_eq!(
            all[0],
            Outcome::new(
                Registration::Register,
                Issuance::IssueCompliant,
                Detection::Report
            )
        );
        assert_eq!(
            all[7],
            Outcome::new(
                Registration::NoRegister,
                Issuance::IssueNonCompliant,
                Detection::NoReport
            )
        );
    }

    #[test]
    fn predicates_follow_choices() {
        let o = Outcome::new(
            Registration::Register,
            Issuance::IssueNonCompliant,
            Detection::Report,
        );
        assert!(o.is_registered() && o.is_non_compliant() && o.is_reported());
        let quiet = o.with_detection(Detection::NoReport);
        assert!(!quiet.is_reported());
        assert_eq!(quiet.registration, o.registration);
        assert_eq!(quiet.issuance, o.issuance);
    }

    #[test]
    fn display_and_parse_agree() {
        for o in Outcome::all() {
            let text = o.to_string();
            assert_eq!(text.parse::<Outcome>(), Ok(o), "{text}");
        }
        assert_eq!(
            "no-register,compliant,report".parse::<Outcome>(),
            Ok(Outcome::new(
                Registration::NoRegister,
                Issuance::IssueCompliant,
                Detection::Report
            ))
        );
    }

    #[test]
    fn parse_rejects_unknown_choices() {
        let err = "register,maybe,report".parse::<Outcome>().unwrap_err();
        assert_eq!(err.kind, "issuance");
        assert_eq!(err.value, "maybe");
        assert!("register,compliant".parse::<Outcome>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case_names() {
        let o = Outcome::new(
            Registration::NoRegister,
            Issuance::IssueNonCompliant,
            Detection::NoReport,
        );
        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(
            json,
            r#"{"registration":"no-register","issuance":"non-compliant","detection":"no-report"}"#
        );
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, o);
    }
}

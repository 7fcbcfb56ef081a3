//! Properties as data: scope, preconditions, and obligations.
//!
//! A [`Property`] is a universally quantified statement over every scenario
//! satisfying its preconditions and every outcome in its scope. Checkers
//! never run ad-hoc code per property; they evaluate (or encode) these
//! structures.

use std::fmt;

use rpcheck_model::{
    Detection, Issuance, Outcome, Payoff, Player, Registration, RemainingLifetime, Scenario,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("property `{property}` compares payoffs but has no outcome scope")]
    PayoffWithoutOutcome { property: String },
    #[error("property `{property}` has no obligations")]
    NoObligations { property: String },
}

/// Stable kebab-case property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PropertyId(String);

impl PropertyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Matches outcomes by optional per-choice filters; `None` matches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OutcomePattern {
    pub registration: Option<Registration>,
    pub issuance: Option<Issuance>,
    pub detection: Option<Detection>,
}

impl OutcomePattern {
    pub const ANY: OutcomePattern = OutcomePattern {
        registration: None,
        issuance: None,
        detection: None,
    };

    pub fn matches(&self, outcome: &Outcome) -> bool {
        self.registration.map_or(true, |r| r == outcome.registration)
            && self.issuance.map_or(true, |i| i == outcome.issuance)
            && self.detection.map_or(true, |d| d == outcome.detection)
    }

    /// Matching outcomes in [`Outcome::all`] order.
    pub fn outcomes(&self) -> Vec<Outcome> {
        Outcome::all()
            .into_iter()
            .filter(|o| self.matches(o))
            .collect()
    }
}

impl fmt::Display for OutcomePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part<T: fmt::Display>(choice: Option<T>) -> String {
            choice.map_or_else(|| "*".to_string(), |c| c.to_string())
        }
        write!(
            f,
            "{}/{}/{}",
            part(self.registration),
            part(self.issuance),
            part(self.detection)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "pattern")]
pub enum Scope {
    /// Quantify over every outcome matching the pattern.
    Outcomes(OutcomePattern),
    /// Quantify over parameters only.
    ParametersOnly,
}

impl Scope {
    /// Outcome bindings a checker enumerates. `ParametersOnly` binds nothing
    /// and yields a single `None`.
    pub fn bindings(&self) -> Vec<Option<Outcome>> {
        match self {
            Scope::Outcomes(pattern) => pattern.outcomes().into_iter().map(Some).collect(),
            Scope::ParametersOnly => vec![None],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precondition {
    ReportingFeeFeasible,
    MinTermPayoutFeasible,
    PriceFeasible,
}

impl Precondition {
    pub fn holds(&self, scenario: &Scenario) -> bool {
        match self {
            Precondition::ReportingFeeFeasible => scenario.reporting_fee_feasible(),
            Precondition::MinTermPayoutFeasible => scenario.min_term_payout_feasible(),
            Precondition::PriceFeasible => scenario.price_feasible(),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::ReportingFeeFeasible => f.write_str("0 < reporting_fee < det_payout"),
            Precondition::MinTermPayoutFeasible => {
                f.write_str("0 < min_term_payout <= term_payout")
            }
            Precondition::PriceFeasible => {
                f.write_str("term_payout < price < aff_dom_payout + min_term_payout")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Relation {
    pub fn holds(&self, lhs: Payoff, rhs: Payoff) -> bool {
        match self {
            Relation::Lt => lhs < rhs,
            Relation::Le => lhs <= rhs,
            Relation::Eq => lhs == rhs,
            Relation::Ge => lhs >= rhs,
            Relation::Gt => lhs > rhs,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Eq => "=",
            Relation::Ge => ">=",
            Relation::Gt => ">",
        }
    }
}

/// Which outcome a payoff operand is read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detection")]
pub enum OutcomeRef {
    /// The outcome bound by the scope.
    Bound,
    /// The bound outcome with the detector's choice replaced.
    BoundWithDetection(Detection),
}

impl OutcomeRef {
    pub fn resolve(&self, bound: Outcome) -> Outcome {
        match self {
            OutcomeRef::Bound => bound,
            OutcomeRef::BoundWithDetection(d) => bound.with_detection(*d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operand {
    /// Joint payoff of a coalition at an outcome.
    Payoff {
        coalition: Vec<Player>,
        outcome: OutcomeRef,
    },
    Constant(i64),
}

impl Operand {
    pub fn payoff(coalition: &[Player], outcome: OutcomeRef) -> Self {
        Operand::Payoff {
            coalition: coalition.to_vec(),
            outcome,
        }
    }

    pub fn uses_outcome(&self) -> bool {
        matches!(self, Operand::Payoff { .. })
    }

    /// Concrete value at `bound`. `None` when a payoff is read without an
    /// outcome binding.
    pub fn evaluate(&self, bound: Option<Outcome>, scenario: &Scenario) -> Option<Payoff> {
        match self {
            Operand::Constant(c) => Some(Payoff::from(*c)),
            Operand::Payoff { coalition, outcome } => {
                let at = outcome.resolve(bound?);
                Some(scenario.payoffs(at).coalition(coalition))
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(c) => write!(f, "{c}"),
            Operand::Payoff { coalition, outcome } => {
                let names: Vec<&str> = coalition.iter().map(|p| p.as_str()).collect();
                let at = match outcome {
                    OutcomeRef::Bound => "o".to_string(),
                    OutcomeRef::BoundWithDetection(d) => format!("o[detection := {d}]"),
                };
                write!(f, "{}({at})", names.join("+"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Obligation {
    Compare {
        lhs: Operand,
        relation: Relation,
        rhs: Operand,
    },
    /// `min_term_payout <= split <= term_payout`.
    SplitWithinBounds,
    /// `split(life) <= split(higher_life)`.
    SplitMonotone,
}

impl Obligation {
    pub fn compare(lhs: Operand, relation: Relation, rhs: Operand) -> Self {
        Obligation::Compare { lhs, relation, rhs }
    }

    fn uses_outcome(&self) -> bool {
        match self {
            Obligation::Compare { lhs, rhs, .. } => lhs.uses_outcome() || rhs.uses_outcome(),
            Obligation::SplitWithinBounds | Obligation::SplitMonotone => false,
        }
    }
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obligation::Compare { lhs, relation, rhs } => {
                write!(f, "{lhs} {} {rhs}", relation.symbol())
            }
            Obligation::SplitWithinBounds => {
                f.write_str("min_term_payout <= split(life) <= term_payout")
            }
            Obligation::SplitMonotone => {
                f.write_str("life <= life_hi => split(life) <= split(life_hi)")
            }
        }
    }
}

/// A scenario plus the second, higher lifetime read by
/// [`Obligation::SplitMonotone`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterPoint {
    pub scenario: Scenario,
    pub higher_lifetime: RemainingLifetime,
}

impl ParameterPoint {
    pub fn new(scenario: Scenario, higher_lifetime: RemainingLifetime) -> Self {
        Self {
            scenario,
            higher_lifetime,
        }
    }

    /// A point whose two lifetimes coincide.
    pub fn single(scenario: Scenario) -> Self {
        let higher_lifetime = scenario.protocol.remaining_lifetime.clone();
        Self::new(scenario, higher_lifetime)
    }

    pub fn higher_split(&self) -> Payoff {
        rpcheck_model::payout::termination_split(
            &self.scenario.reward,
            &self.higher_lifetime,
            self.scenario.protocol.min_term_payout,
        )
    }
}

/// A failed obligation at a concrete point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub outcome: Option<Outcome>,
    pub obligation: String,
    pub lhs: Payoff,
    pub rhs: Payoff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub id: PropertyId,
    pub description: String,
    pub scope: Scope,
    pub preconditions: Vec<Precondition>,
    pub obligations: Vec<Obligation>,
}

impl Property {
    pub fn validate(&self) -> Result<(), PropertyError> {
        if self.obligations.is_empty() {
            return Err(PropertyError::NoObligations {
                property: self.id.to_string(),
            });
        }
        if self.scope == Scope::ParametersOnly && self.obligations.iter().any(|o| o.uses_outcome())
        {
            return Err(PropertyError::PayoffWithoutOutcome {
                property: self.id.to_string(),
            });
        }
        Ok(())
    }

    pub fn requires(&self, precondition: Precondition) -> bool {
        self.preconditions.contains(&precondition)
    }

    pub fn preconditions_hold(&self, scenario: &Scenario) -> bool {
        self.preconditions.iter().all(|p| p.holds(scenario))
    }

    /// Outcomes an obligation at `bound` reads payoffs from, `bound` first.
    pub fn referenced_outcomes(&self, bound: Outcome) -> Vec<Outcome> {
        let mut out = vec![bound];
        for obligation in &self.obligations {
            if let Obligation::Compare { lhs, rhs, .. } = obligation {
                for operand in [lhs, rhs] {
                    if let Operand::Payoff { outcome, .. } = operand {
                        let at = outcome.resolve(bound);
                        if !out.contains(&at) {
                            out.push(at);
                        }
                    }
                }
            }
        }
        out
    }

    /// Evaluate every obligation at `point` for one outcome binding. Points
    /// violating a precondition hold vacuously.
    pub fn check_binding(
        &self,
        point: &ParameterPoint,
        bound: Option<Outcome>,
    ) -> Result<Option<Violation>, PropertyError> {
        let scenario = &point.scenario;
        if !self.preconditions_hold(scenario) {
            return Ok(None);
        }
        for obligation in &self.obligations {
            let (holds, lhs, rhs) = match obligation {
                Obligation::Compare { lhs, relation, rhs } => {
                    let missing = || PropertyError::PayoffWithoutOutcome {
                        property: self.id.to_string(),
                    };
                    let l = lhs.evaluate(bound, scenario).ok_or_else(missing)?;
                    let r = rhs.evaluate(bound, scenario).ok_or_else(missing)?;
                    (relation.holds(l, r), l, r)
                }
                Obligation::SplitWithinBounds => {
                    let split = scenario.termination_split();
                    let min = Payoff::from(scenario.protocol.min_term_payout);
                    let term = Payoff::from(scenario.reward.term_payout);
                    if split < min {
                        (false, split, min)
                    } else {
                        (split <= term, split, term)
                    }
                }
                Obligation::SplitMonotone => {
                    let lo = scenario.termination_split();
                    let hi = point.higher_split();
                    let ordered =
                        scenario.protocol.remaining_lifetime <= point.higher_lifetime;
                    (!ordered || lo <= hi, lo, hi)
                }
            };
            if !holds {
                return Ok(Some(Violation {
                    outcome: bound,
                    obligation: obligation.to_string(),
                    lhs,
                    rhs,
                }));
            }
        }
        Ok(None)
    }

    /// Evaluate the property at `point` over every outcome in scope and
    /// return the first violation.
    pub fn check_point(&self, point: &ParameterPoint) -> Result<Option<Violation>, PropertyError> {
        for bound in self.scope.bindings() {
            if let Some(violation) = self.check_binding(point, bound)? {
                return Ok(Some(violation));
            }
        }
        Ok(None)
    }

    /// Human-readable universally quantified statement.
    pub fn closed_form(&self) -> String {
        let mut quantifiers = vec!["rp", "fee", "min_term_payout", "life"];
        if self
            .obligations
            .iter()
            .any(|o| matches!(o, Obligation::SplitMonotone))
        {
            quantifiers.push("life_hi");
        }
        let pre = if self.preconditions.is_empty() {
            "true".to_string()
        } else {
            self.preconditions
                .iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join(" && ")
        };
        let post = self
            .obligations
            .iter()
            .map(|o| format!("({o})"))
            .collect::<Vec<_>>()
            .join(" && ");
        let body = match self.scope {
            Scope::Outcomes(pattern) => format!("forall o in {pattern}. {post}"),
            Scope::ParametersOnly => post,
        };
        format!("forall {}. {pre} => {body}", quantifiers.join(", "))
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.description)
    }
}

pub const REPORTING_INCENTIVE: &str = "reporting-incentive";
pub const NO_SPURIOUS_REPORTS: &str = "no-spurious-reports";
pub const NO_COLLUSION_PROFITS: &str = "no-collusion-profits";
pub const SPLIT_BOUNDS: &str = "split-bounds";
pub const SPLIT_MONOTONICITY: &str = "split-monotonicity";

/// The five properties the reward protocol is expected to satisfy.
pub fn standard_properties() -> Vec<Property> {
    let detector = [Player::Detector];
    vec![
        Property {
            id: REPORTING_INCENTIVE.into(),
            description: "truthfully reporting a registered CA's non-compliant certificate \
                          pays the detector more than staying silent"
                .into(),
            scope: Scope::Outcomes(OutcomePattern {
                registration: Some(Registration::Register),
                issuance: Some(Issuance::IssueNonCompliant),
                detection: Some(Detection::Report),
            }),
            preconditions: vec![Precondition::ReportingFeeFeasible],
            obligations: vec![Obligation::compare(
                Operand::payoff(&detector, OutcomeRef::Bound),
                Relation::Gt,
                Operand::payoff(
                    &detector,
                    OutcomeRef::BoundWithDetection(Detection::NoReport),
                ),
            )],
        },
        Property {
            id: NO_SPURIOUS_REPORTS.into(),
            description: "falsely reporting a compliant certificate pays the detector less \
                          than staying silent"
                .into(),
            scope: Scope::Outcomes(OutcomePattern {
                registration: None,
                issuance: Some(Issuance::IssueCompliant),
                detection: Some(Detection::Report),
            }),
            preconditions: vec![Precondition::ReportingFeeFeasible],
            obligations: vec![Obligation::compare(
                Operand::payoff(&detector, OutcomeRef::Bound),
                Relation::Lt,
                Operand::payoff(
                    &detector,
                    OutcomeRef::BoundWithDetection(Detection::NoReport),
                ),
            )],
        },
        Property {
            id: NO_COLLUSION_PROFITS.into(),
            description: "no coalition including an unregistered CA has positive joint payoff"
                .into(),
            scope: Scope::Outcomes(OutcomePattern {
                registration: Some(Registration::NoRegister),
                issuance: None,
                detection: None,
            }),
            preconditions: vec![
                Precondition::MinTermPayoutFeasible,
                Precondition::PriceFeasible,
            ],
            obligations: [
                vec![Player::Ca, Player::Domain],
                vec![Player::Ca, Player::Detector],
                vec![Player::Ca, Player::Domain, Player::Detector],
            ]
            .into_iter()
            .map(|coalition| {
                Obligation::compare(
                    Operand::Payoff {
                        coalition,
                        outcome: OutcomeRef::Bound,
                    },
                    Relation::Le,
                    Operand::Constant(0),
                )
            })
            .collect(),
        },
        Property {
            id: SPLIT_BOUNDS.into(),
            description: "the termination split stays between the minimum and the full \
                          termination payout"
                .into(),
            scope: Scope::ParametersOnly,
            preconditions: vec![Precondition::MinTermPayoutFeasible],
            obligations: vec![Obligation::SplitWithinBounds],
        },
        Property {
            id: SPLIT_MONOTONICITY.into(),
            description: "the termination split never decreases as remaining lifetime grows"
                .into(),
            scope: Scope::ParametersOnly,
            preconditions: vec![Precondition::MinTermPayoutFeasible],
            obligations: vec![Obligation::SplitMonotone],
        },
    ]
}

/// Look up a standard property by id.
pub fn standard_property(id: &str) -> Option<Property> {
    standard_properties().into_iter().find(|p| p.id.as_str() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcheck_model::{ProtocolScalars, RewardParams};

    fn point(rp: RewardParams, fee: u64, min: u64, life: &str) -> ParameterPoint {
        ParameterPoint::single(Scenario::new(
            rp,
            ProtocolScalars::new(fee, min, life.parse().unwrap()),
        ))
    }

    #[test]
    fn standard_properties_are_well_formed() {
        let props = standard_properties();
        assert_eq!(props.len(), 5);
        for p in &props {
            p.validate().unwrap();
        }
        let ids: Vec<&str> = props.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                REPORTING_INCENTIVE,
                NO_SPURIOUS_REPORTS,
                NO_COLLUSION_PROFITS,
                SPLIT_BOUNDS,
                SPLIT_MONOTONICITY
            ]
        );
    }

    #[test]
    fn patterns_select_expected_outcomes() {
        assert_eq!(OutcomePattern::ANY.outcomes().len(), 8);
        let unregistered = OutcomePattern {
            registration: Some(Registration::NoRegister),
            ..OutcomePattern::ANY
        };
        assert_eq!(unregistered.outcomes().len(), 4);
        assert_eq!(unregistered.to_string(), "no-register/*/*");
        assert_eq!(Scope::ParametersOnly.bindings(), vec![None]);
    }

    #[test]
    fn worked_examples_hold() {
        let p = point(RewardParams::new(5, 10, 3, 4), 2, 1, "1/2");
        for id in [REPORTING_INCENTIVE, NO_SPURIOUS_REPORTS] {
            let prop = standard_property(id).unwrap();
            assert_eq!(prop.check_point(&p), Ok(None), "{id}");
        }
        let collusion = standard_property(NO_COLLUSION_PROFITS).unwrap();
        let p = point(RewardParams::new(7, 10, 3, 4), 1, 2, "1/3");
        assert_eq!(collusion.check_point(&p), Ok(None));
    }

    #[test]
    fn infeasible_points_hold_vacuously() {
        // fee == det_payout violates reporting-fee feasibility
        let p = point(RewardParams::new(5, 10, 3, 4), 4, 1, "1");
        let prop = standard_property(REPORTING_INCENTIVE).unwrap();
        assert_eq!(prop.check_point(&p), Ok(None));
    }

    #[test]
    fn violated_obligation_reports_both_sides() {
        let prop = Property {
            id: "detector-never-loses".into(),
            description: "false claim".into(),
            scope: Scope::Outcomes(OutcomePattern::ANY),
            preconditions: vec![Precondition::ReportingFeeFeasible],
            obligations: vec![Obligation::compare(
                Operand::payoff(&[Player::Detector], OutcomeRef::Bound),
                Relation::Ge,
                Operand::Constant(0),
            )],
        };
        let p = point(RewardParams::new(5, 10, 3, 4), 2, 1, "1");
        let v = prop.check_point(&p).unwrap().unwrap();
        assert_eq!(
            v.outcome,
            Some(Outcome::new(
                Registration::Register,
                Issuance::IssueCompliant,
                Detection::Report
            ))
        );
        assert_eq!((v.lhs, v.rhs), (-2, 0));
        assert_eq!(v.obligation, "detector(o) >= 0");
    }

    #[test]
    fn payoff_operands_need_an_outcome_scope() {
        let prop = Property {
            id: "broken".into(),
            description: String::new(),
            scope: Scope::ParametersOnly,
            preconditions: vec![],
            obligations: vec![Obligation::compare(
                Operand::payoff(&[Player::Ca], OutcomeRef::Bound),
                Relation::Le,
                Operand::Constant(0),
            )],
        };
        assert!(matches!(
            prop.validate(),
            Err(PropertyError::PayoffWithoutOutcome { .. })
        ));
    }

    #[test]
    fn referenced_outcomes_include_detection_variant() {
        let prop = standard_property(REPORTING_INCENTIVE).unwrap();
        let bound = prop.scope.bindings()[0].unwrap();
        let refs = prop.referenced_outcomes(bound);
        assert_eq!(refs, vec![bound, bound.with_detection(Detection::NoReport)]);
    }

    #[test]
    fn closed_form_mentions_scope_and_preconditions() {
        let prop = standard_property(SPLIT_MONOTONICITY).unwrap();
        let text = prop.closed_form();
        assert!(text.starts_with("forall rp, fee, min_term_payout, life, life_hi."));
        assert!(text.contains("0 < min_term_payout <= term_payout"));
        let collusion = standard_property(NO_COLLUSION_PROFITS).unwrap().closed_form();
        assert!(collusion.contains("forall o in no-register/*/*."));
        assert!(collusion.contains("ca+domain+detector(o) <= 0"));
    }
}

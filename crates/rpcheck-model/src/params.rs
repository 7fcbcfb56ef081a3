use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::Outcome;
use crate::lifetime::RemainingLifetime;
use crate::payout::{self, Payoffs};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("remaining lifetime denominator must be positive")]
    ZeroDenominator,
    #[error("remaining lifetime must lie in [0, 1], got {0}")]
    LifetimeOutOfRange(String),
    #[error("invalid remaining lifetime `{0}`")]
    InvalidLifetime(String),
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, ParamError> {
    u64::try_from(value).map_err(|_| ParamError::Negative { field, value })
}

/// Serialized amount. The whole `u64` range reads back; negative input is
/// kept long enough to be rejected with its field name.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireAmount {
    Unsigned(u64),
    Signed(i64),
}

impl WireAmount {
    fn check(self, field: &'static str) -> Result<u64, ParamError> {
        match self {
            WireAmount::Unsigned(n) => Ok(n),
            WireAmount::Signed(v) => non_negative(field, v),
        }
    }
}

/// Pricing scheme of one reward-protocol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRewardParams")]
pub struct RewardParams {
    /// Paid by the CA to participate.
    pub price: u64,
    /// Paid to the affected domain when a registered CA is caught.
    pub aff_dom_payout: u64,
    /// Allocable when the certificate is terminated.
    pub term_payout: u64,
    /// Paid to a successful detector.
    pub det_payout: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRewardParams {
    price: WireAmount,
    aff_dom_payout: WireAmount,
    term_payout: WireAmount,
    det_payout: WireAmount,
}

impl TryFrom<RawRewardParams> for RewardParams {
    type Error = ParamError;

    fn try_from(raw: RawRewardParams) -> Result<Self, Self::Error> {
        Ok(Self {
            price: raw.price.check("price")?,
            aff_dom_payout: raw.aff_dom_payout.check("aff_dom_payout")?,
            term_payout: raw.term_payout.check("term_payout")?,
            det_payout: raw.det_payout.check("det_payout")?,
        })
    }
}

impl RewardParams {
    pub const fn new(price: u64, aff_dom_payout: u64, term_payout: u64, det_payout: u64) -> Self {
        Self {
            price,
            aff_dom_payout,
            term_payout,
            det_payout,
        }
    }

    /// Build from signed values (config files, solver models), rejecting
    /// negative amounts.
    pub fn try_from_signed(
        price: i64,
        aff_dom_payout: i64,
        term_payout: i64,
        det_payout: i64,
    ) -> Result<Self, ParamError> {
        Ok(Self {
            price: non_negative("price", price)?,
            aff_dom_payout: non_negative("aff_dom_payout", aff_dom_payout)?,
            term_payout: non_negative("term_payout", term_payout)?,
            det_payout: non_negative("det_payout", det_payout)?,
        })
    }

    pub fn reporting_fee_feasible(&self, fee: u64) -> bool {
        reporting_fee_feasible(fee, self)
    }

    pub fn min_term_payout_feasible(&self, min_term_payout: u64) -> bool {
        min_term_payout_feasible(min_term_payout, self)
    }

    pub fn price_feasible(&self, min_term_payout: u64) -> bool {
        price_feasible(self, min_term_payout)
    }
}

/// `0 < fee < det_payout`.
pub fn reporting_fee_feasible(fee: u64, rp: &RewardParams) -> bool {
    0 < fee && fee < rp.det_payout
}

/// `0 < min_term_payout <= term_payout`.
pub fn min_term_payout_feasible(min_term_payout: u64, rp: &RewardParams) -> bool {
    0 < min_term_payout && min_term_payout <= rp.term_payout
}

/// `term_payout < price < aff_dom_payout + min_term_payout`.
pub fn price_feasible(rp: &RewardParams, min_term_payout: u64) -> bool {
    let ceiling = u128::from(rp.aff_dom_payout) + u128::from(min_term_payout);
    rp.term_payout < rp.price && u128::from(rp.price) < ceiling
}

/// Protocol scalars that accompany a pricing scheme in one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawProtocolScalars")]
pub struct ProtocolScalars {
    /// Charged to a detector for filing a report.
    pub reporting_fee: u64,
    /// Floor of the termination split.
    pub min_term_payout: u64,
    pub remaining_lifetime: RemainingLifetime,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProtocolScalars {
    reporting_fee: WireAmount,
    min_term_payout: WireAmount,
    remaining_lifetime: RemainingLifetime,
}

impl TryFrom<RawProtocolScalars> for ProtocolScalars {
    type Error = ParamError;

    fn try_from(raw: RawProtocolScalars) -> Result<Self, Self::Error> {
        Ok(Self {
            reporting_fee: raw.reporting_fee.check("reporting_fee")?,
            min_term_payout: raw.min_term_payout.check("min_term_payout")?,
            remaining_lifetime: raw.remaining_lifetime,
        })
    }
}

impl ProtocolScalars {
    pub fn new(
        reporting_fee: u64,
        min_term_payout: u64,
        remaining_lifetime: RemainingLifetime,
    ) -> Self {
        Self {
            reporting_fee,
            min_term_payout,
            remaining_lifetime,
        }
    }

    pub fn try_from_signed(
        reporting_fee: i64,
        min_term_payout: i64,
        remaining_lifetime: RemainingLifetime,
    ) -> Result<Self, ParamError> {
        Ok(Self {
            reporting_fee: non_negative("reporting_fee", reporting_fee)?,
            min_term_payout: non_negative("min_term_payout", min_term_payout)?,
            remaining_lifetime,
        })
    }
}

/// Everything the payout engine needs besides the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    pub reward: RewardParams,
    pub protocol: ProtocolScalars,
}

impl Scenario {
    pub fn new(reward: RewardParams, protocol: ProtocolScalars) -> Self {
        Self { reward, protocol }
    }

    /// Validating constructor for signed sources. Amounts are taken in the
    /// order `price, aff_dom_payout, term_payout, det_payout, reporting_fee,
    /// min_term_payout`.
    pub fn try_from_signed(
        amounts: [i64; 6],
        remaining_lifetime: RemainingLifetime,
    ) -> Result<Self, ParamError> {
        let [price, aff, term, det, fee, min] = amounts;
        Ok(Self {
            reward: RewardParams::try_from_signed(price, aff, term, det)?,
            protocol: ProtocolScalars::try_from_signed(fee, min, remaining_lifetime)?,
        })
    }

    pub fn reporting_fee_feasible(&self) -> bool {
        self.reward
            .reporting_fee_feasible(self.protocol.reporting_fee)
    }

    pub fn min_term_payout_feasible(&self) -> bool {
        self.reward
            .min_term_payout_feasible(self.protocol.min_term_payout)
    }

    pub fn price_feasible(&self) -> bool {
        self.reward.price_feasible(self.protocol.min_term_payout)
    }

    pub fn termination_split(&self) -> i128 {
        payout::termination_split(
            &self.reward,
            &self.protocol.remaining_lifetime,
            self.protocol.min_term_payout,
        )
    }

    pub fn payoffs(&self, outcome: Outcome) -> Payoffs {
        payout::payoffs(outcome, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(price: u64, aff: u64, term: u64, det: u64) -> RewardParams {
        RewardParams::new(price, aff, term, det)
    }

    #[test]
    fn reporting_fee_bounds_are_strict() {
        let p = rp(5, 10, 3, 4);
        assert!(!p.reporting_fee_feasible(0));
        assert!(p.reporting_fee_feasible(1));
        assert!(p.reporting_fee_feasible(3));
        assert!(!p.reporting_fee_feasible(4));
        assert!(!rp(5, 10, 3, 0).reporting_fee_feasible(0));
    }

    #[test]
    fn min_term_payout_upper_bound_is_inclusive() {
        let p = rp(5, 10, 3, 4);
        assert!(!p.min_term_payout_feasible(0));
        assert!(p.min_term_payout_feasible(3));
        assert!(!p.min_term_payout_feasible(4));
    }

    #[test]
    fn price_feasibility_matches_worked_example() {
        let p = rp(7, 10, 3, 4);
        assert!(p.price_feasible(2));
        // 3 < 12 < 10 + 2 fails on the upper bound
        assert!(!rp(12, 10, 3, 4).price_feasible(2));
        // price must exceed term_payout
        assert!(!rp(3, 10, 3, 4).price_feasible(2));
    }

    #[test]
    fn price_feasibility_does_not_overflow() {
        let p = rp(u64::MAX, u64::MAX, u64::MAX - 1, 0);
        assert!(p.price_feasible(1));
    }

    #[test]
    fn signed_construction_rejects_negative_amounts() {
        assert_eq!(
            RewardParams::try_from_signed(5, -1, 3, 4),
            Err(ParamError::Negative {
                field: "aff_dom_payout",
                value: -1
            })
        );
        let err = ProtocolScalars::try_from_signed(-2, 1, RemainingLifetime::one()).unwrap_err();
        assert_eq!(err.to_string(), "reporting_fee must be non-negative, got -2");
        assert_eq!(
            RewardParams::try_from_signed(5, 10, 3, 4),
            Ok(rp(5, 10, 3, 4))
        );
        assert_eq!(
            Scenario::try_from_signed([7, 10, 3, 4, 2, -1], RemainingLifetime::zero()),
            Err(ParamError::Negative {
                field: "min_term_payout",
                value: -1
            })
        );
    }

    #[test]
    fn scenario_loads_from_toml_tables() {
        let text = r#"
            [reward]
            price = 7
            aff_dom_payout = 10
            term_payout = 3
            det_payout = 4

            [protocol]
            reporting_fee = 2
            min_term_payout = 2
            remaining_lifetime = "1/2"
        "#;
        let scenario: Scenario = toml::from_str(text).unwrap();
        assert_eq!(scenario.reward, rp(7, 10, 3, 4));
        assert!(scenario.min_term_payout_feasible());
        assert!(scenario.price_feasible());
        assert!(scenario.reporting_fee_feasible());
    }

    #[test]
    fn amounts_above_i64_max_read_back_from_json() {
        let scenario = Scenario::new(
            rp(u64::MAX, u64::MAX - 1, 3, 4),
            ProtocolScalars::new(u64::MAX, 2, RemainingLifetime::new(1, 2).unwrap()),
        );
        let json = serde_json::to_string(&scenario).unwrap();
        assert!(json.contains("18446744073709551615"), "{json}");
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scenario);

        let negative = json.replacen("18446744073709551615", "-3", 1);
        let err = serde_json::from_str::<Scenario>(&negative).unwrap_err();
        assert!(err.to_string().contains("price must be non-negative, got -3"), "{err}");
    }

    #[test]
    fn scenario_rejects_negative_values_from_toml() {
        let text = r#"
            [reward]
            price = -7
            aff_dom_payout = 10
            term_payout = 3
            det_payout = 4

            [protocol]
            reporting_fee = 2
            min_term_payout = 2
            remaining_lifetime = 0.5
        "#;
        let err = toml::from_str::<Scenario>(text).unwrap_err();
        assert!(
            err.to_string().contains("price must be non-negative"),
            "{err}"
        );
    }
}

use std::fmt;
use std::str::FromStr;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::params::ParamError;

/// Fraction of a certificate's validity period left when it is reported.
///
/// Stored as an exact rational so that `floor(remLife * x)` has exact floor
/// semantics. Always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LifetimeRepr", into = "String")]
pub struct RemainingLifetime(BigRational);

#[derive(Deserialize)]
#[serde(untagged)]
enum LifetimeRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LifetimeRepr> for RemainingLifetime {
    type Error = ParamError;

    fn try_from(repr: LifetimeRepr) -> Result<Self, Self::Error> {
        match repr {
            LifetimeRepr::Number(x) => RemainingLifetime::from_f64(x),
            LifetimeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<RemainingLifetime> for String {
    fn from(lifetime: RemainingLifetime) -> Self {
        lifetime.to_string()
    }
}

impl RemainingLifetime {
    pub fn new(num: u64, den: u64) -> Result<Self, ParamError> {
        if den == 0 {
            return Err(ParamError::ZeroDenominator);
        }
        if num > den {
            return Err(ParamError::LifetimeOutOfRange(format!("{num}/{den}")));
        }
        Ok(Self(BigRational::new(BigInt::from(num), BigInt::from(den))))
    }

    /// Exact conversion of a finite float in `[0, 1]`.
    pub fn from_f64(x: f64) -> Result<Self, ParamError> {
        if !x.is_finite() {
            return Err(ParamError::InvalidLifetime(x.to_string()));
        }
        if !(0.0..=1.0).contains(&x) {
            return Err(ParamError::LifetimeOutOfRange(x.to_string()));
        }
        BigRational::from_float(x)
            .map(Self)
            .ok_or_else(|| ParamError::InvalidLifetime(x.to_string()))
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    /// `floor(self * value)`, rounding toward negative infinity.
    pub fn floor_scale(&self, value: i128) -> i128 {
        let scaled = &self.0 * BigRational::from_integer(BigInt::from(value));
        let floored = scaled.floor().to_integer();
        // |floor(r * v)| <= |v| for r in [0, 1], so this never saturates.
        floored.to_i128().unwrap_or(if floored.is_negative() {
            i128::MIN
        } else {
            i128::MAX
        })
    }
}

impl fmt::Display for RemainingLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

impl FromStr for RemainingLifetime {
    type Err = ParamError;

    /// Accepts `n/d` or a plain decimal such as `0.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParamError::InvalidLifetime(s.to_string());
        let value = if let Some((n, d)) = s.split_once('/') {
            let n: BigInt = n.trim().parse().map_err(|_| invalid())?;
            let d: BigInt = d.trim().parse().map_err(|_| invalid())?;
            if d.is_zero() {
                return Err(ParamError::ZeroDenominator);
            }
            BigRational::new(n, d)
        } else {
            parse_decimal(s).ok_or_else(invalid)?
        };
        if value.is_negative() || value > BigRational::one() {
            return Err(ParamError::LifetimeOutOfRange(s.to_string()));
        }
        Ok(Self(value))
    }
}

fn parse_decimal(s: &str) -> Option<BigRational> {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    let digits_ok = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    let unsigned = int_part.strip_prefix('-').unwrap_or(int_part);
    if (unsigned.is_empty() && frac_part.is_empty()) || !digits_ok(unsigned) || !digits_ok(frac_part)
    {
        return None;
    }
    let numer: BigInt = format!("{int_part}{frac_part}").parse().ok()?;
    let denom = num::pow(BigInt::from(10u32), frac_part.len());
    Some(BigRational::new(numer, denom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_denominator_and_values_above_one() {
        assert_eq!(RemainingLifetime::new(1, 0), Err(ParamError::ZeroDenominator));
        assert!(matches!(
            RemainingLifetime::new(3, 2),
            Err(ParamError::LifetimeOutOfRange(_))
        ));
        assert_eq!(RemainingLifetime::new(2, 4).unwrap().to_string(), "1/2");
    }

    #[test]
    fn from_f64_is_exact_and_bounded() {
        assert_eq!(
            RemainingLifetime::from_f64(0.5).unwrap(),
            RemainingLifetime::new(1, 2).unwrap()
        );
        assert!(RemainingLifetime::from_f64(-0.1).is_err());
        assert!(RemainingLifetime::from_f64(1.5).is_err());
        assert!(matches!(
            RemainingLifetime::from_f64(f64::NAN),
            Err(ParamError::InvalidLifetime(_))
        ));
    }

    #[test]
    fn parses_fractions_and_decimals() {
        assert_eq!(
            "3/4".parse::<RemainingLifetime>().unwrap(),
            RemainingLifetime::new(3, 4).unwrap()
        );
        assert_eq!(
            "0.25".parse::<RemainingLifetime>().unwrap(),
            RemainingLifetime::new(1, 4).unwrap()
        );
        assert_eq!("1".parse::<RemainingLifetime>().unwrap(), RemainingLifetime::one());
        assert_eq!(".5".parse::<RemainingLifetime>().unwrap(), RemainingLifetime::new(1, 2).unwrap());
        assert!("-0.5".parse::<RemainingLifetime>().is_err());
        assert!("5/4".parse::<RemainingLifetime>().is_err());
        assert!("abc".parse::<RemainingLifetime>().is_err());
        assert_eq!("1/0".parse::<RemainingLifetime>(), Err(ParamError::ZeroDenominator));
    }

    #[test]
    fn floor_scale_matches_floor_semantics() {
        let third = RemainingLifetime::new(1, 3).unwrap();
        assert_eq!(third.floor_scale(10), 3);
        assert_eq!(third.floor_scale(9), 3);
        assert_eq!(third.floor_scale(-10), -4);
        assert_eq!(RemainingLifetime::zero().floor_scale(-7), 0);
        assert_eq!(RemainingLifetime::one().floor_scale(i128::from(u64::MAX)), i128::from(u64::MAX));
    }

    #[test]
    fn serde_round_trips_through_text() {
        let lt = RemainingLifetime::new(2, 3).unwrap();
        let json = serde_json::to_string(&lt).unwrap();
        assert_eq!(json, "\"2/3\"");
        let from_number: RemainingLifetime = serde_json::from_str("0.75").unwrap();
        assert_eq!(from_number, RemainingLifetime::new(3, 4).unwrap());
        assert!(serde_json::from_str::<RemainingLifetime>("\"7/3\"").is_err());
    }
}

//! Payoff model of the one-shot CA accountability game.
//!
//! A play is an [`Outcome`]: whether the CA registered with the oversight
//! authority, whether it issued a compliant certificate, and whether the
//! detector reported it. Given [`RewardParams`] and the protocol scalars of a
//! [`Scenario`], the payout engine computes what the CA, the affected domain,
//! and the detector each gain or lose.

pub mod actions;
pub mod lifetime;
pub mod params;
pub mod payout;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;

pub use actions::{Detection, Issuance, Outcome, Registration};
pub use lifetime::RemainingLifetime;
pub use params::{ParamError, ProtocolScalars, RewardParams, Scenario};
pub use payout::{Payoff, Payoffs, Player};

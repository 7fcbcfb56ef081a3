//! Property verifier for the CA accountability game.
//!
//! Properties are data ([`property::Property`]). A run enumerates the
//! outcomes in each property's scope and either samples feasible parameter
//! points ([`sampling`]) or hands `domain ∧ preconditions ∧ ¬obligations` to
//! an SMT solver ([`symbolic`]). Solver witnesses are replayed against the
//! concrete payout engine before being reported.

pub mod counterexample;
pub mod property;
pub mod result;
pub mod sampling;
pub mod symbolic;
mod timeout;
pub mod verifier;

pub use counterexample::{Counterexample, WitnessSource};
pub use property::{standard_properties, standard_property, ParameterPoint, Property};
pub use result::{PropertyVerdict, VerificationReport, VerificationResult};
pub use verifier::{verify_all, verify_property, CheckerChoice, VerifyError, VerifyOptions};

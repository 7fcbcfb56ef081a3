pub(crate) mod helpers;
pub(crate) mod outcomes;
pub(crate) mod payoffs;
pub(crate) mod properties;
pub(crate) mod smt;
pub(crate) mod verify;

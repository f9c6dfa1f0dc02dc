//! CLI command implementations.

pub mod assess;
pub mod biometrics;
pub mod collect;
pub mod payload;

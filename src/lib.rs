//! Pmres: a fully-implicit black-oil reservoir model with a solvent extension
//!
//! The residual equations and their Jacobian are assembled with automatic differentiation
//! (see [ad::Adb]) and solved by Newton iterations (see [model::BlackoilModel]).

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod ad;
pub mod base;
pub mod model;
pub mod prelude;
pub mod props;

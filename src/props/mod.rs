//! Implements fluid and rock property evaluators

mod blackoil_fluid;
mod fluid_props;
mod polymer_props;
mod rock;
mod solvent_props;
mod table;
pub use crate::props::blackoil_fluid::*;
pub use crate::props::fluid_props::*;
pub use crate::props::polymer_props::*;
pub use crate::props::rock::*;
pub use crate::props::solvent_props::*;
pub use crate::props::table::*;

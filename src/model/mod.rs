//! Implements the fully-implicit black-oil model with an optional solvent or polymer component

mod blackoil_model;
mod context;
mod convergence;
mod extra_component;
mod linear_solver;
mod mass_balance;
mod newton_update;
mod polymer_component;
mod reservoir_quantities;
mod residual;
mod solution_state;
mod solvent_component;
mod state_builder;
mod todd_longstaff;
mod well_coupling;
mod well_density;
mod well_ops;
pub use crate::model::blackoil_model::*;
pub use crate::model::context::*;
pub use crate::model::convergence::*;
pub use crate::model::extra_component::*;
pub use crate::model::linear_solver::*;
pub use crate::model::mass_balance::*;
pub use crate::model::newton_update::*;
pub use crate::model::polymer_component::*;
pub use crate::model::reservoir_quantities::*;
pub use crate::model::residual::*;
pub use crate::model::solution_state::*;
pub use crate::model::solvent_component::*;
pub use crate::model::state_builder::*;
pub use crate::model::todd_longstaff::*;
pub use crate::model::well_coupling::*;
pub use crate::model::well_density::*;
pub use crate::model::well_ops::*;

//! Implements the base structures for a reservoir simulation

mod communicator;
mod config;
mod constants;
mod grid;
mod phases;
mod reservoir_state;
mod restart;
mod samples;
mod well_state;
mod wells;
pub use crate::base::communicator::*;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::grid::*;
pub use crate::base::phases::*;
pub use crate::base::reservoir_state::*;
pub use crate::base::restart::*;
pub use crate::base::samples::*;
pub use crate::base::well_state::*;
pub use crate::base::wells::*;

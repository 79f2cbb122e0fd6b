//! Makes available common structures needed to run a simulation
//!
//! You may write `use pmres::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::ad::{Adb, SparseBlock};
pub use crate::base::{Config, Grid, ReservoirState, RestartExtra, RestartValues, SampleProblem, Samples, SerialCommunicator};
pub use crate::base::{Phase, PhaseUsage, WellControl, WellSpec, WellState, WellType, Wells};
pub use crate::base::{DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::model::{BlackoilModel, ConvergenceReport, DirectSolver, ExtraProps, LinearSolver};
pub use crate::props::{BlackoilFluid, FluidProps, ParamBlackoil, PolymerProps, PolymerTables, RockCompressibility};
pub use crate::props::{SolventProps, SolventTables};

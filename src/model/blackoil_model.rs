use super::{ExtraComponent, LinearSolver, LinearSystem, LinearisedResidual, ModelContext, ReservoirQuantities};
use super::{PolymerComponent, SolventComponent};
use crate::ad::Adb;
use crate::base::{Communicator, Config, Grid, ReservoirState, WellState, Wells};
use crate::props::{FluidProps, PolymerProps, RockCompressibility, SolventProps};
use crate::StrError;
use russell_lab::Vector;

/// Defines the stages of one assembly pass
///
/// The constant state is captured only in the first Newton iteration of a time step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssemblyStage {
    Idle,
    ConstantStateCaptured,
    EffectivePropertiesComputed,
    AccumulationComputed,
    FluxAssembled,
    WellCoupled,
    ResidualComplete,
}

/// Holds the properties of the extra component
#[derive(Clone, Copy)]
pub enum ExtraProps<'a> {
    Solvent(&'a dyn SolventProps),
    Polymer(&'a dyn PolymerProps),
}

/// Implements the fully-implicit black-oil model
///
/// The model assembles the residual equations of all active phases (and of an optional extra
/// component) together with the well equations, and updates the reservoir and well states
/// with the Newton increments.
pub struct BlackoilModel<'a> {
    /// Holds the data shared by all assembly stages
    pub ctx: ModelContext<'a>,

    /// Holds the per-cell quantities of each phase (and of the extra component at `np`)
    pub rq: Vec<ReservoirQuantities>,

    /// Holds the residual equations of the last assembly
    pub residual: LinearisedResidual,

    /// Holds the mixture density at each perforation
    pub well_perforation_densities: Vector,

    /// Holds the pressure difference between each perforation and the bottom-hole reference depth
    pub well_perforation_pressure_diffs: Vector,

    /// Pore volume divided by the time step
    pub(crate) pvdt: Vector,

    /// Extra component (solvent or polymer)
    pub(crate) extra: Option<Box<dyn ExtraComponent + 'a>>,

    /// Current assembly stage
    stage: AssemblyStage,
}

impl<'a> BlackoilModel<'a> {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `config` -- the configuration (validated here)
    /// * `grid` -- the grid topology
    /// * `wells` -- the well topology
    /// * `fluid` -- black-oil fluid properties
    /// * `rock` -- rock compressibility
    /// * `comm` -- global reductions
    /// * `extra` -- solvent (polymer) properties; required if `config.solvent` (`config.polymer`) is true
    pub fn new(
        config: &Config,
        grid: &'a Grid,
        wells: &'a Wells,
        fluid: &'a dyn FluidProps,
        rock: &'a RockCompressibility,
        comm: &'a dyn Communicator,
        extra: Option<ExtraProps<'a>>,
    ) -> Result<Self, StrError> {
        if config.solvent && config.vapoil {
            return Err("solvent option only works with dead gas");
        }
        if let Some(msg) = config.validate() {
            log::error!("{}", msg);
            return Err("cannot allocate model because config.validate() failed");
        }
        let ctx = ModelContext::new(config, grid, wells, fluid, rock, comm)?;
        let np = ctx.np();
        let extra: Option<Box<dyn ExtraComponent + 'a>> = match (config.solvent, config.polymer, extra) {
            (true, _, Some(ExtraProps::Solvent(props))) => {
                Some(Box::new(SolventComponent::new(props, config.miscible)?))
            }
            (true, _, _) => return Err("solvent properties are required when solvent = true"),
            (_, true, Some(ExtraProps::Polymer(props))) => Some(Box::new(PolymerComponent::new(props))),
            (_, true, _) => return Err("polymer properties are required when polymer = true"),
            (false, false, Some(_)) => {
                return Err("extra properties are given but neither solvent nor polymer is active")
            }
            (false, false, None) => None,
        };
        let extra_scales: Vec<f64> = extra.iter().map(|e| e.default_equation_scale()).collect();
        let nquantities = np + extra_scales.len();
        let nperf = ctx.nperf();
        Ok(BlackoilModel {
            rq: vec![ReservoirQuantities::new(); nquantities],
            residual: LinearisedResidual::new(np, &extra_scales),
            well_perforation_densities: Vector::new(nperf),
            well_perforation_pressure_diffs: Vector::new(nperf),
            pvdt: Vector::new(ctx.ncell()),
            extra,
            stage: AssemblyStage::Idle,
            ctx,
        })
    }

    /// Returns the current assembly stage
    pub fn stage(&self) -> AssemblyStage {
        self.stage
    }

    /// Returns true if an extra (solvent or polymer) component is carried
    pub fn has_extra_component(&self) -> bool {
        self.extra.is_some()
    }

    /// Moves to the next assembly stage
    ///
    /// Idle may be entered at any time. The constant state is captured right after Idle and
    /// the effective properties follow Idle or the captured constant state. Every other stage
    /// must follow its predecessor.
    pub(crate) fn set_stage(&mut self, stage: AssemblyStage) -> Result<(), StrError> {
        use AssemblyStage::*;
        let allowed = match stage {
            Idle => true,
            ConstantStateCaptured => self.stage == Idle,
            EffectivePropertiesComputed => matches!(self.stage, Idle | ConstantStateCaptured),
            AccumulationComputed => self.stage == EffectivePropertiesComputed,
            FluxAssembled => self.stage == AccumulationComputed,
            WellCoupled => self.stage == FluxAssembled,
            ResidualComplete => self.stage == WellCoupled,
        };
        if !allowed {
            log::error!("cannot move from assembly stage {:?} to {:?}", self.stage, stage);
            return Err("assembly stages must follow in order");
        }
        log::trace!("assembly stage: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        Ok(())
    }

    /// Assembles the residual equations and their Jacobians
    ///
    /// # Input
    ///
    /// * `x` -- the reservoir state (at the old time level if `initial` is true)
    /// * `xw` -- the well state (controls may be switched here)
    /// * `dt` -- the time step
    /// * `initial` -- true for the first Newton iteration of a time step
    pub fn assemble(&mut self, x: &ReservoirState, xw: &mut WellState, dt: f64, initial: bool) -> Result<(), StrError> {
        let nc = self.ctx.ncell();
        let np = self.ctx.np();
        x.check(nc, np)?;
        xw.check(self.ctx.wells)?;
        if dt <= 0.0 {
            return Err("the time step must be > 0.0");
        }
        if !initial && self.rq[0].accum[0].size() != nc {
            return Err("the initial assembly must come first");
        }
        self.set_stage(AssemblyStage::Idle)?;

        // pore volume over time step
        self.pvdt = Vector::from(&self.ctx.pv.as_data().iter().map(|pv| pv / dt).collect::<Vec<_>>());

        // well controls may change between iterations
        self.update_well_controls(xw)?;

        // primary variables
        let indices = self.variable_state_indices();
        let initials = self.variable_state_initials(x, xw)?;
        let vars = Adb::variables(&initials);
        let state = self.variable_state_extract_vars(x, &indices, &vars)?;

        // old time level
        if initial {
            let state0 = state.to_constant();
            if let Some(extra) = self.extra.as_deref_mut() {
                if extra.is_miscible() {
                    extra.calculate_effective_properties(&self.ctx, &state0)?;
                }
            }
            self.compute_accum(&state0, 0)?;
            self.compute_well_connection_pressures(&state0, xw)?;
            self.set_stage(AssemblyStage::ConstantStateCaptured)?;
        }

        // effective properties at the new time level
        if let Some(extra) = self.extra.as_deref_mut() {
            if extra.is_miscible() {
                extra.calculate_effective_properties(&self.ctx, &state)?;
            }
        }
        self.set_stage(AssemblyStage::EffectivePropertiesComputed)?;

        // reservoir equations
        self.assemble_mass_balance_eq(&state)?;

        // well flux and well sources in the mass balance
        if self.ctx.nw() > 0 {
            let well_cells = &self.ctx.wops.well_cells;
            let mut mob_perf: Vec<Adb> = (0..np).map(|pos| self.rq[pos].mob.subset(well_cells)).collect();
            let mut b_perf: Vec<Adb> = (0..np).map(|pos| self.rq[pos].b.subset(well_cells)).collect();
            if let Some(extra) = self.extra.as_deref() {
                extra.well_mobility_and_b(&self.ctx, &state, &self.rq, &mut mob_perf, &mut b_perf)?;
            }
            let cq_s = self.compute_well_flux(&state, &mob_perf, &b_perf)?;
            self.update_perf_phase_rates_and_pressures(&cq_s, &state, xw);
            self.add_well_flux_eq(&cq_s, &state)?;
            self.add_well_contribution_to_mass_balance_eq(&cq_s, &state, xw)?;
        } else {
            self.residual.well_flux_eq = Adb::constant(Vector::new(0));
        }
        self.set_stage(AssemblyStage::WellCoupled)?;

        // well controls
        if self.ctx.nw() > 0 {
            self.add_well_control_eq(&state, xw)?;
        } else {
            self.residual.well_eq = Adb::constant(Vector::new(0));
        }
        self.set_stage(AssemblyStage::ResidualComplete)
    }

    /// Runs one Newton iteration (assemble, check convergence, solve, update)
    ///
    /// Returns true if the state had already converged (no update is applied in this case).
    pub fn nonlinear_iteration(
        &mut self,
        iteration: usize,
        dt: f64,
        x: &mut ReservoirState,
        xw: &mut WellState,
        solver: &mut dyn LinearSolver,
    ) -> Result<bool, StrError> {
        self.assemble(x, xw, dt, iteration == 0)?;
        let report = self.get_convergence(dt)?;
        log::debug!(
            "iteration {:>3}: cnv = {:?}, mb = {:?}, well flux = {:?}, well control = {:e}",
            iteration,
            report.cnv,
            report.mass_balance,
            report.well_flux,
            report.well_control
        );
        if report.converged() {
            return Ok(true);
        }
        let mut sys = LinearSystem::new(&self.residual)?;
        solver.solve(&mut sys.kk, &sys.rr, &mut sys.dx)?;
        self.update_state(&sys.dx, x, xw)?;
        Ok(false)
    }

    /// Advances the states by one time step
    ///
    /// Returns the number of Newton updates performed.
    pub fn step(
        &mut self,
        dt: f64,
        x: &mut ReservoirState,
        xw: &mut WellState,
        solver: &mut dyn LinearSolver,
    ) -> Result<usize, StrError> {
        let n_max = self.ctx.config.n_max_iterations;
        for iteration in 0..n_max {
            if self.nonlinear_iteration(iteration, dt, x, xw, solver)? {
                return Ok(iteration);
            }
        }
        self.assemble(x, xw, dt, false)?;
        if self.get_convergence(dt)?.converged() {
            return Ok(n_max);
        }
        log::warn!("Newton iterations did not converge after {} iterations", n_max);
        Err("Newton iterations did not converge")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{AssemblyStage, BlackoilModel, ExtraProps};
    use crate::base::{PhaseUsage, Samples, SerialCommunicator, WellState};
    use crate::ad::Adb;
    use crate::props::{BlackoilFluid, RockCompressibility};

    #[test]
    fn new_handles_errors() {
        let sample = Samples::column_water_oil_gas_solvent(3).unwrap();
        let pu = PhaseUsage::new(true, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let tables = Samples::solvent_tables(1.0, 1.0).unwrap();
        let solvent = Some(ExtraProps::Solvent(&tables));

        let mut config = sample.config.clone();
        config.vapoil = true;
        assert_eq!(
            BlackoilModel::new(&config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).err(),
            Some("solvent option only works with dead gas")
        );

        let mut config = sample.config.clone();
        config.ds_max = 0.0;
        assert_eq!(
            BlackoilModel::new(&config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).err(),
            Some("cannot allocate model because config.validate() failed")
        );

        assert_eq!(
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, None).err(),
            Some("solvent properties are required when solvent = true")
        );

        let sample = Samples::line_water_oil_polymer(2).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let polymer_tables = Samples::polymer_tables().unwrap();
        let polymer = Some(ExtraProps::Polymer(&polymer_tables));
        assert_eq!(
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).err(),
            Some("polymer properties are required when polymer = true")
        );
        let mut config = sample.config.clone();
        config.set_polymer(false).unwrap();
        assert_eq!(
            BlackoilModel::new(&config, &sample.grid, &sample.wells, &fluid, &rock, &comm, polymer).err(),
            Some("extra properties are given but neither solvent nor polymer is active")
        );
    }

    #[test]
    fn new_allocates_extra_quantities() {
        let sample = Samples::column_water_oil_gas_solvent(3).unwrap();
        let pu = PhaseUsage::new(true, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let tables = Samples::solvent_tables(1.0, 1.0).unwrap();
        let solvent = Some(ExtraProps::Solvent(&tables));
        let model =
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).unwrap();
        assert!(model.has_extra_component());
        assert_eq!(model.rq.len(), 4);
        assert_eq!(model.residual.material_balance_eq.len(), 4);
        assert_eq!(model.residual.matbalscale[3], 0.0031);
        assert_eq!(model.stage(), AssemblyStage::Idle);

        let sample = Samples::line_water_oil_polymer(2).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let polymer_tables = Samples::polymer_tables().unwrap();
        let polymer = Some(ExtraProps::Polymer(&polymer_tables));
        let model =
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, polymer).unwrap();
        assert!(model.has_extra_component());
        assert_eq!(model.rq.len(), 3);
        assert_eq!(model.residual.matbalscale[2], 1.0);
    }

    #[test]
    fn assembly_stages_must_follow_in_order() {
        let sample = Samples::column_water_oil_gas_solvent(3).unwrap();
        let pu = PhaseUsage::new(true, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let tables = Samples::solvent_tables(1.0, 1.0).unwrap();
        let solvent = Some(ExtraProps::Solvent(&tables));
        let mut model =
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).unwrap();
        let xw = WellState::new(&sample.wells, &sample.state).unwrap();
        let indices = model.variable_state_indices();
        let vars = Adb::variables(&model.variable_state_initials(&sample.state, &xw).unwrap());
        let state = model.variable_state_extract_vars(&sample.state, &indices, &vars).unwrap();

        // the mass balance needs the effective properties first
        assert_eq!(
            model.assemble_mass_balance_eq(&state).err(),
            Some("assembly stages must follow in order")
        );
        assert_eq!(model.stage(), AssemblyStage::Idle);
        assert_eq!(
            model.set_stage(AssemblyStage::WellCoupled).err(),
            Some("assembly stages must follow in order")
        );
        model.compute_accum(&state.to_constant(), 0).unwrap();
        model.set_stage(AssemblyStage::EffectivePropertiesComputed).unwrap();
        assert_eq!(
            model.set_stage(AssemblyStage::ConstantStateCaptured).err(),
            Some("assembly stages must follow in order")
        );
        model.assemble_mass_balance_eq(&state).unwrap();
        assert_eq!(model.stage(), AssemblyStage::FluxAssembled);
        assert_eq!(
            model.set_stage(AssemblyStage::ResidualComplete).err(),
            Some("assembly stages must follow in order")
        );
        model.set_stage(AssemblyStage::WellCoupled).unwrap();
        model.set_stage(AssemblyStage::ResidualComplete).unwrap();
        model.set_stage(AssemblyStage::Idle).unwrap();
    }

    #[test]
    fn assemble_handles_errors_and_reaches_last_stage() {
        let sample = Samples::column_water_oil_gas_solvent(3).unwrap();
        let pu = PhaseUsage::new(true, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let tables = Samples::solvent_tables(1.0, 1.0).unwrap();
        let solvent = Some(ExtraProps::Solvent(&tables));
        let mut model =
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).unwrap();
        let mut xw = WellState::new(&sample.wells, &sample.state).unwrap();
        assert_eq!(
            model.assemble(&sample.state, &mut xw, 1.0, false).err(),
            Some("the initial assembly must come first")
        );
        assert_eq!(
            model.assemble(&sample.state, &mut xw, 0.0, true).err(),
            Some("the time step must be > 0.0")
        );
        model.assemble(&sample.state, &mut xw, 1.0, true).unwrap();
        assert_eq!(model.stage(), AssemblyStage::ResidualComplete);
        // nc·(np + 1) + nw·np + nw
        assert_eq!(model.residual.size(), 3 * 4 + 2 * 3 + 2);
        assert!(!model.residual.contains_nan());
        model.assemble(&sample.state, &mut xw, 1.0, false).unwrap();
        assert_eq!(model.stage(), AssemblyStage::ResidualComplete);
    }
}

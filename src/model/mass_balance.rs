use super::{AssemblyStage, BlackoilModel, SolutionState};
use crate::ad::{Adb, UpwindSelector};
use crate::base::Phase;
use crate::StrError;

/// Fluid phases in canonical order
const FLUID_PHASES: [Phase; 3] = [Phase::Water, Phase::Oil, Phase::Gas];

impl<'a> BlackoilModel<'a> {
    /// Returns the active fluid phases in canonical order
    pub(crate) fn active_phases(&self) -> Vec<Phase> {
        FLUID_PHASES.iter().copied().filter(|ph| self.ctx.pu.active(*ph)).collect()
    }

    /// Returns the reciprocal formation volume factor of a fluid phase
    ///
    /// Miscible oil and gas use the effective values of the extra component.
    pub fn fluid_reciproc_fvf(&self, phase: Phase, pressure: &Adb, state: &SolutionState) -> Result<Adb, StrError> {
        let pos = self.ctx.pu.pos(phase)?;
        if phase != Phase::Water {
            if let Some(b) = self.extra.as_deref().and_then(|e| e.effective_reciproc_fvf(pos)) {
                return Ok(b.clone());
            }
        }
        let fluid = self.ctx.fluid;
        let t = &state.temperature;
        match phase {
            Phase::Water => Ok(fluid.b_wat(pressure, t)),
            Phase::Oil => Ok(fluid.b_oil(pressure, t, &state.rs)),
            Phase::Gas => Ok(fluid.b_gas(pressure, t, &state.rv)),
            Phase::Solvent => Err("unknown phase index"),
        }
    }

    /// Returns the viscosity of a fluid phase
    ///
    /// Miscible oil and gas use the effective values of the extra component.
    pub fn fluid_viscosity(&self, phase: Phase, pressure: &Adb, state: &SolutionState) -> Result<Adb, StrError> {
        let pos = self.ctx.pu.pos(phase)?;
        if phase != Phase::Water {
            if let Some(mu) = self.extra.as_deref().and_then(|e| e.effective_viscosity(pos)) {
                return Ok(mu.clone());
            }
        }
        let fluid = self.ctx.fluid;
        let t = &state.temperature;
        match phase {
            Phase::Water => Ok(fluid.mu_wat(pressure, t)),
            Phase::Oil => Ok(fluid.mu_oil(pressure, t, &state.rs)),
            Phase::Gas => Ok(fluid.mu_gas(pressure, t, &state.rv)),
            Phase::Solvent => Err("unknown phase index"),
        }
    }

    /// Returns the density of a fluid phase (including the dissolved components)
    pub fn fluid_density(&self, phase: Phase, b: &Adb, rs: &Adb, rv: &Adb) -> Result<Adb, StrError> {
        let fluid = self.ctx.fluid;
        let mut rho = b * fluid.surface_density(phase)?;
        if phase == Phase::Oil && self.ctx.config.disgas {
            rho = &rho + &(&(rs * b) * fluid.surface_density(Phase::Gas)?);
        }
        if phase == Phase::Gas && self.ctx.config.vapoil {
            rho = &rho + &(&(rv * b) * fluid.surface_density(Phase::Oil)?);
        }
        Ok(rho)
    }

    /// Computes the accumulation terms `pv_mult · b · s` at the old (0) or new (1) time level
    pub fn compute_accum(&mut self, state: &SolutionState, aix: usize) -> Result<(), StrError> {
        if aix > 1 {
            return Err("the accumulation index must be 0 or 1");
        }
        let pv_mult = self.ctx.rock.pore_volume_multiplier(&state.pressure);
        for phase in self.active_phases() {
            let pos = self.ctx.pu.pos(phase)?;
            let b = self.fluid_reciproc_fvf(phase, &state.canonical_phase_pressures[phase.index()], state)?;
            self.rq[pos].accum[aix] = &(&pv_mult * &b) * &state.saturation[pos];
            self.rq[pos].b = b;
        }
        if let (Ok(oilpos), Ok(gaspos)) = (self.ctx.pu.pos(Phase::Oil), self.ctx.pu.pos(Phase::Gas)) {
            let acc_oil = self.rq[oilpos].accum[aix].clone();
            let acc_gas = self.rq[gaspos].accum[aix].clone();
            if self.ctx.config.disgas {
                self.rq[gaspos].accum[aix] = &acc_gas + &(&state.rs * &acc_oil);
            }
            if self.ctx.config.vapoil {
                self.rq[oilpos].accum[aix] = &acc_oil + &(&state.rv * &acc_gas);
            }
        }
        if let Some(extra) = self.extra.as_deref() {
            extra.compute_accum(&self.ctx, state, &pv_mult, aix, &mut self.rq)?;
        }
        Ok(())
    }

    /// Computes the relative permeabilities [krw, kro, krg]
    pub fn compute_rel_perm(&self, state: &SolutionState) -> Result<Vec<Adb>, StrError> {
        if let Some(extra) = self.extra.as_deref() {
            return extra.compute_rel_perm(&self.ctx, state);
        }
        let sw = self.ctx.saturation_or_zero(&state.saturation, Phase::Water);
        let so = self.ctx.saturation_or_zero(&state.saturation, Phase::Oil);
        let sg = self.ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        Ok(self.ctx.fluid.relperm(&sw, &so, &sg))
    }

    /// Computes the mobility, head difference, and upwinded mass flux of a fluid phase
    ///
    /// For the carrier phase of an extra component, the extra component computes its own flux
    /// first and returns the modified relative permeability of the carrier.
    pub fn compute_mass_flux(&mut self, phase: Phase, kr: &Adb, state: &SolutionState) -> Result<(), StrError> {
        let pos = self.ctx.pu.pos(phase)?;
        let pressure = &state.canonical_phase_pressures[phase.index()];
        let mu = self.fluid_viscosity(phase, pressure, state)?;
        let kr = match (phase, self.extra.as_deref()) {
            (ph, Some(extra)) if ph == extra.carrier_phase() => {
                extra.compute_flux(&self.ctx, state, kr, pressure, &mut self.rq)?
            }
            _ => kr.clone(),
        };
        let b = &self.rq[pos].b;
        let rho = self.fluid_density(phase, b, &state.rs, &state.rv)?;
        let mob = &kr / &mu;
        let (dh, mflux) = self.ctx.upwind_mass_flux(b, &mob, &rho, pressure, &self.ctx.trans)?;
        let q = &mut self.rq[pos];
        q.mu = mu;
        q.rho = rho;
        q.kr = kr;
        q.mob = mob;
        q.dh = dh;
        q.mflux = mflux;
        Ok(())
    }

    /// Assembles the mass-balance equations of all phases (and of the extra component)
    ///
    /// ```text
    /// R = pv/dt · (accum[1] − accum[0]) + div(mflux)
    /// ```
    ///
    /// Dissolved gas adds `div(rs_face · mflux_oil)` to the gas equation and vaporized oil adds
    /// `div(rv_face · mflux_gas)` to the oil equation.
    pub fn assemble_mass_balance_eq(&mut self, state: &SolutionState) -> Result<(), StrError> {
        self.compute_accum(state, 1)?;
        self.set_stage(AssemblyStage::AccumulationComputed)?;

        let kr = self.compute_rel_perm(state)?;
        for phase in self.active_phases() {
            self.compute_mass_flux(phase, &kr[phase.index()], state)?;
        }

        let ops = &self.ctx.ops;
        for pos in 0..self.ctx.np() {
            let q = &self.rq[pos];
            self.residual.material_balance_eq[pos] =
                &(&self.pvdt * &(&q.accum[1] - &q.accum[0])) + &(&ops.div * &q.mflux);
        }

        if let (Ok(oilpos), Ok(gaspos)) = (self.ctx.pu.pos(Phase::Oil), self.ctx.pu.pos(Phase::Gas)) {
            let nc = self.ctx.ncell();
            if self.ctx.config.disgas {
                let upwind_oil = UpwindSelector::new(nc, &ops.face_cells, self.rq[oilpos].dh.value())?;
                let rs_face = upwind_oil.select(&state.rs);
                let div_rs = &ops.div * &(&rs_face * &self.rq[oilpos].mflux);
                self.residual.material_balance_eq[gaspos] = &self.residual.material_balance_eq[gaspos] + &div_rs;
            }
            if self.ctx.config.vapoil {
                let upwind_gas = UpwindSelector::new(nc, &ops.face_cells, self.rq[gaspos].dh.value())?;
                let rv_face = upwind_gas.select(&state.rv);
                let div_rv = &ops.div * &(&rv_face * &self.rq[gaspos].mflux);
                self.residual.material_balance_eq[oilpos] = &self.residual.material_balance_eq[oilpos] + &div_rv;
            }
        }

        if let Some(extra) = self.extra.as_deref() {
            extra.assemble_equations(&self.ctx, &self.pvdt, &self.rq, &mut self.residual)?;
        }
        self.update_equations_scaling()?;
        self.set_stage(AssemblyStage::FluxAssembled)
    }

    /// Updates the scaling factors of the material balance equations with the mean of 1/b
    pub fn update_equations_scaling(&mut self) -> Result<(), StrError> {
        let global_nc = self.ctx.comm.count(self.ctx.ncell());
        if global_nc == 0 {
            return Err("the global number of cells must be > 0");
        }
        for pos in 0..self.ctx.np() {
            let local: f64 = self.rq[pos].b.value().as_data().iter().map(|b| 1.0 / b).sum();
            self.residual.matbalscale[pos] = self.ctx.comm.sum(local) / (global_nc as f64);
        }
        if let Some(extra) = self.extra.as_deref() {
            extra.update_equations_scaling(&self.ctx, &self.rq, &mut self.residual)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use crate::ad::Adb;
    use crate::base::{Config, Grid, Phase, PhaseUsage, ReservoirState, SerialCommunicator, WellState, Wells};
    use crate::base::Samples;
    use crate::model::{BlackoilModel, ExtraProps};
    use crate::props::{BlackoilFluid, FluidProps, RockCompressibility};
    use russell_lab::{approx_eq, vec_approx_eq};

    #[test]
    fn property_lookups_handle_errors() {
        let sample = Samples::one_cell_solvent_injector(false).unwrap();
        let pu = PhaseUsage::new(false, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let tables = Samples::solvent_tables(1.0, 1.0).unwrap();
        let solvent = Some(ExtraProps::Solvent(&tables));
        let model =
            BlackoilModel::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm, solvent).unwrap();
        let xw = WellState::new(&sample.wells, &sample.state).unwrap();
        let indices = model.variable_state_indices();
        let vars = Adb::variables(&model.variable_state_initials(&sample.state, &xw).unwrap());
        let state = model.variable_state_extract_vars(&sample.state, &indices, &vars).unwrap();
        let p = &state.pressure;
        assert_eq!(model.fluid_reciproc_fvf(Phase::Water, p, &state).err(), Some("unknown phase index"));
        assert_eq!(model.fluid_reciproc_fvf(Phase::Solvent, p, &state).err(), Some("unknown phase index"));
        assert_eq!(model.fluid_viscosity(Phase::Solvent, p, &state).err(), Some("unknown phase index"));
        approx_eq(model.fluid_reciproc_fvf(Phase::Gas, p, &state).unwrap().at(0), 100.0, 1e-12);
        approx_eq(model.fluid_viscosity(Phase::Oil, p, &state).unwrap().at(0), 2.0, 1e-12);
    }

    #[test]
    fn closed_system_at_rest_has_zero_residual() {
        // two cells, oil and water, no gravity, no wells, equal pressures
        let mut config = Config::new();
        config.set_phases(true, true, false).unwrap();
        let grid = Grid::line(2, 10.0, 1.0, 0.5).unwrap();
        let wells = Wells::new(2, 2, &[]).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::new(100.0, 1e-4).unwrap();
        let comm = SerialCommunicator;
        let mut model = BlackoilModel::new(&config, &grid, &wells, &fluid, &rock, &comm, None).unwrap();
        let x = ReservoirState::new(2, 100.0, 300.0, &[0.3, 0.7]).unwrap();
        let mut xw = WellState::new(&wells, &x).unwrap();
        model.assemble(&x, &mut xw, 1.0, true).unwrap();
        for pos in 0..2 {
            vec_approx_eq(model.residual.material_balance_eq[pos].value(), &[0.0, 0.0], 1e-14);
        }
        // the flux derivatives cancel in the column sum; what remains is
        // ∂acc/∂p = pv/dt · (c_r · b · so + pv_mult · db/dp · so)
        let p = 100.0;
        let b_o = fluid.b_oil(&Adb::constant_filled(1, p), &Adb::constant_filled(1, 300.0), &Adb::constant_filled(1, 0.0));
        let db_dp = 0.8 * 1e-3;
        let correct = 10.0 * (1e-4 * b_o.at(0) * 0.7 + 1.0 * db_dp * 0.7);
        let jac = &model.residual.material_balance_eq[1].derivative()[0];
        approx_eq(jac.get(0, 0) + jac.get(1, 0), correct, 1e-12);
        // 1/b scaling
        approx_eq(model.residual.matbalscale[1], 1.0 / b_o.at(0), 1e-14);
        assert_eq!(model.residual.size(), 4);
    }

    #[test]
    fn pressure_difference_drives_upwind_flux() {
        let mut config = Config::new();
        config.set_phases(true, true, false).unwrap();
        let grid = Grid::line(2, 10.0, 1.0, 0.5).unwrap();
        let wells = Wells::new(2, 2, &[]).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let mut model = BlackoilModel::new(&config, &grid, &wells, &fluid, &rock, &comm, None).unwrap();
        let mut x = ReservoirState::new(2, 100.0, 300.0, &[0.0, 1.0]).unwrap();
        x.pressure[0] = 110.0;
        let mut xw = WellState::new(&wells, &x).unwrap();
        model.assemble(&x, &mut xw, 1.0, true).unwrap();
        // oil flows from cell 0 to cell 1 with the mobility and b of cell 0
        let b0 = 0.8 + 0.8 * 1e-3 * 10.0;
        let flux = b0 * (1.0 / 2.0) * 0.5 * 10.0;
        let r_oil = model.residual.material_balance_eq[1].value();
        approx_eq(r_oil[0], flux, 1e-12);
        approx_eq(r_oil[1], -flux, 1e-12);
        // no water is mobile
        vec_approx_eq(model.residual.material_balance_eq[0].value(), &[0.0, 0.0], 1e-15);
    }
}

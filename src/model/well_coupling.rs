use super::{BlackoilModel, SolutionState, WellDensitySegmented};
use crate::ad::{Adb, Criterion, Selector, SparseBlock};
use crate::base::{Phase, WellControl, WellState, WellType};
use crate::StrError;
use russell_lab::Vector;

/// Returns true if the well violates the given control
///
/// Injectors must stay below their targets; producers must stay above (rates of producers
/// are negative).
fn constraint_broken(kind: WellType, control: &WellControl, bhp: f64, rates: &[f64]) -> bool {
    let current = match control {
        WellControl::Bhp { .. } => bhp,
        WellControl::SurfaceRate { distr, .. } => distr.iter().zip(rates).map(|(d, q)| d * q).sum(),
    };
    match kind {
        WellType::Injector => current > control.target(),
        WellType::Producer => current < control.target(),
    }
}

impl<'a> BlackoilModel<'a> {
    /// Switches the well controls whose constraints are broken and applies the active targets
    ///
    /// The controls other than the current one are checked in order; the first broken
    /// constraint becomes the new control.
    pub fn update_well_controls(&self, xw: &mut WellState) -> Result<(), StrError> {
        let wells = self.ctx.wells;
        let np = self.ctx.np();
        for w in 0..self.ctx.nw() {
            let controls = &wells.controls[w];
            let current = xw.current_controls[w];
            if current >= controls.len() {
                return Err("the current control index is out of bounds");
            }
            let rates = &xw.well_rates.as_data()[w * np..(w + 1) * np];
            let broken = controls
                .iter()
                .enumerate()
                .find(|(i, ctrl)| *i != current && constraint_broken(wells.kind[w], ctrl, xw.bhp[w], rates))
                .map(|(i, _)| i);
            let active = match broken {
                Some(i) => {
                    log::warn!(
                        "switching control mode for well {} from {} to {}",
                        wells.name[w],
                        controls[current].mode(),
                        controls[i].mode()
                    );
                    xw.current_controls[w] = i;
                    i
                }
                None => current,
            };
            match &controls[active] {
                WellControl::Bhp { target } => xw.bhp[w] = *target,
                WellControl::SurfaceRate { target, distr } => {
                    for p in 0..np {
                        if distr[p] > 0.0 {
                            xw.well_rates[w * np + p] = target * distr[p];
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Computes the mixture densities and the pressure differences of the perforations
    ///
    /// Properties are evaluated at the average of the perforation pressure and the pressure
    /// above it (the bottom-hole pressure for the top perforation).
    pub fn compute_well_connection_pressures(&mut self, state: &SolutionState, xw: &WellState) -> Result<(), StrError> {
        let nw = self.ctx.nw();
        let nperf = self.ctx.nperf();
        let np = self.ctx.np();
        if nw == 0 {
            return Ok(());
        }
        let wells = self.ctx.wells;
        let pu = &self.ctx.pu;
        let fluid = self.ctx.fluid;
        let well_cells = &self.ctx.wops.well_cells;

        // average pressure of each perforation
        let mut avg_press = Vector::new(nperf);
        for w in 0..nw {
            let perfs = wells.perforations(w);
            let top = perfs.start;
            for perf in perfs {
                let above = if perf == top { state.bhp.at(w) } else { xw.perf_press[perf - 1] };
                avg_press[perf] = 0.5 * (xw.perf_press[perf] + above);
            }
        }
        let avg_press = Adb::constant(avg_press);

        // b factors, saturated ratios, and surface densities of each perforation
        let perf_temp = state.temperature.subset(well_cells);
        let perf_rs = state.rs.subset(well_cells);
        let perf_rv = state.rv.subset(well_cells);
        let perf_so = state.saturation[pu.pos(Phase::Oil)?].subset(well_cells);
        let mut b_perf = vec![0.0; nperf * np];
        let mut surf_dens_perf = vec![0.0; nperf * np];
        for phase in self.active_phases() {
            let pos = pu.pos(phase)?;
            let b = match phase {
                Phase::Water => fluid.b_wat(&avg_press, &perf_temp),
                Phase::Oil => fluid.b_oil(&avg_press, &perf_temp, &perf_rs),
                _ => fluid.b_gas(&avg_press, &perf_temp, &perf_rv),
            };
            let rho_s = fluid.surface_density(phase)?;
            for perf in 0..nperf {
                b_perf[perf * np + pos] = b.at(perf);
                surf_dens_perf[perf * np + pos] = rho_s;
            }
        }
        let rsmax_perf = if self.ctx.config.disgas {
            fluid.rs_sat(&avg_press, &perf_so).value().as_data().to_vec()
        } else {
            Vec::new()
        };
        let rvmax_perf = if self.ctx.config.vapoil {
            fluid.rv_sat(&avg_press, &perf_so).value().as_data().to_vec()
        } else {
            Vec::new()
        };
        if let Some(extra) = self.extra.as_deref() {
            extra.connection_gas_properties(&self.ctx, state, xw, &avg_press, &mut b_perf, &mut surf_dens_perf)?;
        }

        // densities and hydrostatic pressure differences
        let dens = WellDensitySegmented::compute_connection_densities(
            wells,
            pu,
            xw.perf_phase_rates.as_data(),
            &b_perf,
            &rsmax_perf,
            &rvmax_perf,
            &surf_dens_perf,
        )?;
        let z_perf: Vec<f64> = well_cells.iter().map(|c| self.ctx.grid.depth[*c]).collect();
        let cdp =
            WellDensitySegmented::compute_connection_pressure_delta(wells, &z_perf, &dens, self.ctx.config.gravity)?;
        self.well_perforation_densities = Vector::from(&dens);
        self.well_perforation_pressure_diffs = Vector::from(&cdp);
        Ok(())
    }

    /// Computes the surface rate of each phase at each perforation
    ///
    /// Producing perforations use the phase mobilities and b factors. Injecting perforations
    /// use the total mobility and the wellbore mixture, converted to surface conditions with
    /// the volume ratio. Crossflow is prevented: perforations flowing against the well type are
    /// shut if the well has at least one perforation flowing in the expected direction.
    pub fn compute_well_flux(
        &self,
        state: &SolutionState,
        mob_perf: &[Adb],
        b_perf: &[Adb],
    ) -> Result<Vec<Adb>, StrError> {
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        let nperf = self.ctx.nperf();
        if mob_perf.len() != np || b_perf.len() != np {
            return Err("perforation mobilities and b factors must have one entry per phase");
        }
        let wells = self.ctx.wells;
        let wops = &self.ctx.wops;
        let pu = &self.ctx.pu;
        let well_cells = &wops.well_cells;
        let tw = Vector::from(&wells.wi);

        // drawdown; positive means flow into the wellbore
        let p_perf = state.pressure.subset(well_cells);
        let rs_perf = state.rs.subset(well_cells);
        let rv_perf = state.rv.subset(well_cells);
        let perf_pressure = &(&wops.w2p * &state.bhp) + &self.well_perforation_pressure_diffs;
        let drawdown = &p_perf - &perf_pressure;

        // flow direction of each perforation
        let mut sel_inj = Vector::new(nperf);
        let mut sel_prod = Vector::new(nperf);
        for perf in 0..nperf {
            if drawdown.at(perf) < 0.0 {
                sel_inj[perf] = 1.0;
            } else {
                sel_prod[perf] = 1.0;
            }
        }
        let num_inj = wops.p2w.mul_vec(sel_inj.as_data());
        let num_prod = wops.p2w.mul_vec(sel_prod.as_data());
        for w in 0..nw {
            for perf in wells.perforations(w) {
                match wells.kind[w] {
                    WellType::Injector if num_inj[w] > 0.0 => sel_prod[perf] = 0.0,
                    WellType::Producer if num_prod[w] > 0.0 => sel_inj[perf] = 0.0,
                    _ => (),
                }
            }
        }

        // flow into the wellbore
        let prod_tw = Vector::from(&(0..nperf).map(|i| -sel_prod[i] * tw[i]).collect::<Vec<_>>());
        let mut cq_ps: Vec<Adb> = (0..np)
            .map(|pos| &b_perf[pos] * &(&prod_tw * &(&mob_perf[pos] * &drawdown)))
            .collect();
        if let (Ok(oilpos), Ok(gaspos)) = (pu.pos(Phase::Oil), pu.pos(Phase::Gas)) {
            let cq_oil = cq_ps[oilpos].clone();
            let cq_gas = cq_ps[gaspos].clone();
            cq_ps[gaspos] = &cq_gas + &(&rs_perf * &cq_oil);
            cq_ps[oilpos] = &cq_oil + &(&rv_perf * &cq_gas);
        }

        // flow out of the wellbore (total volume rate)
        let mut total_mob = mob_perf[0].clone();
        for mob in &mob_perf[1..] {
            total_mob = &total_mob + mob;
        }
        let inj_tw = Vector::from(&(0..nperf).map(|i| -sel_inj[i] * tw[i]).collect::<Vec<_>>());
        let cqt_i = &inj_tw * &(&total_mob * &drawdown);

        // wellbore mixture at surface conditions
        let zeros_nw = Adb::constant_filled(nw, 0.0);
        let mut wbq = Vec::with_capacity(np);
        let mut wbqt = zeros_nw.clone();
        for pos in 0..np {
            let compi = Vector::from(&(0..nw).map(|w| wells.comp_frac[w * np + pos]).collect::<Vec<_>>());
            let q_s = state.qs.subset(&(pos * nw..(pos + 1) * nw).collect::<Vec<_>>());
            let injecting = Selector::new(q_s.value(), Criterion::GreaterZero).select(&q_s, &zeros_nw);
            let q = &(&compi * &injecting) - &(&wops.p2w * &cq_ps[pos]);
            wbqt = &wbqt + &q;
            wbq.push(q);
        }
        let dead = Selector::new(wbqt.value(), Criterion::Zero);
        let mut cmix_s = Vec::with_capacity(np);
        for pos in 0..np {
            let compi = Adb::constant(Vector::from(&(0..nw).map(|w| wells.comp_frac[w * np + pos]).collect::<Vec<_>>()));
            cmix_s.push(&wops.w2p * &dead.select(&compi, &(&wbq[pos] / &wbqt)));
        }

        // volume ratio between reservoir and surface conditions
        let d = 1.0 - &(&rv_perf * &rs_perf);
        let mut volume_ratio = Adb::constant_filled(nperf, 0.0);
        for pos in 0..np {
            let mut tmp = cmix_s[pos].clone();
            let phase = pu.canonical(pos)?;
            if phase == Phase::Oil {
                if let Ok(gaspos) = pu.pos(Phase::Gas) {
                    tmp = &tmp - &(&(&rv_perf * &cmix_s[gaspos]) / &d);
                }
            }
            if phase == Phase::Gas {
                if let Ok(oilpos) = pu.pos(Phase::Oil) {
                    tmp = &tmp - &(&(&rs_perf * &cmix_s[oilpos]) / &d);
                }
            }
            volume_ratio = &volume_ratio + &(&tmp / &b_perf[pos]);
        }

        // surface rates
        let cqt_is = &cqt_i / &volume_ratio;
        Ok((0..np).map(|pos| &cq_ps[pos] + &(&cmix_s[pos] * &cqt_is)).collect())
    }

    /// Stores the perforation rates and pressures in the well state
    pub fn update_perf_phase_rates_and_pressures(&self, cq_s: &[Adb], state: &SolutionState, xw: &mut WellState) {
        let np = self.ctx.np();
        for perf in 0..self.ctx.nperf() {
            for pos in 0..np {
                xw.perf_phase_rates[perf * np + pos] = cq_s[pos].at(perf);
            }
        }
        let bhp_perf = self.ctx.wops.w2p.mul_vec(state.bhp.value().as_data());
        for perf in 0..self.ctx.nperf() {
            xw.perf_press[perf] = bhp_perf[perf] + self.well_perforation_pressure_diffs[perf];
        }
    }

    /// Assembles the well flux equations `qs − Σ_perf cq_s` (phase-major)
    pub fn add_well_flux_eq(&mut self, cq_s: &[Adb], state: &SolutionState) -> Result<(), StrError> {
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        let mut qs = state.qs.clone();
        for pos in 0..np {
            let indices: Vec<usize> = (pos * nw..(pos + 1) * nw).collect();
            let well_rate = (&self.ctx.wops.p2w * &cq_s[pos]).superset(&indices, nw * np)?;
            qs = &qs - &well_rate;
        }
        self.residual.well_flux_eq = qs;
        Ok(())
    }

    /// Subtracts the perforation rates from the material balance of the perforated cells
    pub fn add_well_contribution_to_mass_balance_eq(
        &mut self,
        cq_s: &[Adb],
        state: &SolutionState,
        xw: &WellState,
    ) -> Result<(), StrError> {
        let nc = self.ctx.ncell();
        for pos in 0..self.ctx.np() {
            let source = cq_s[pos].superset(&self.ctx.wops.well_cells, nc)?;
            self.residual.material_balance_eq[pos] = &self.residual.material_balance_eq[pos] - &source;
        }
        if let Some(extra) = self.extra.as_deref() {
            extra.add_well_contribution(&self.ctx, state, xw, cq_s, &mut self.residual)?;
        }
        Ok(())
    }

    /// Assembles the well control equations of the active controls
    ///
    /// ```text
    /// BHP:          bhp − target
    /// surface rate: Σ_phase distr · qs − target
    /// ```
    pub fn add_well_control_eq(&mut self, state: &SolutionState, xw: &WellState) -> Result<(), StrError> {
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        let wells = self.ctx.wells;
        let mut is_bhp = vec![false; nw];
        let mut bhp_targets = Vector::new(nw);
        let mut rate_targets = Vector::new(nw);
        let mut triplets = Vec::new();
        for w in 0..nw {
            match &wells.controls[w][xw.current_controls[w]] {
                WellControl::Bhp { target } => {
                    is_bhp[w] = true;
                    bhp_targets[w] = *target;
                }
                WellControl::SurfaceRate { target, distr } => {
                    rate_targets[w] = *target;
                    for p in 0..np {
                        triplets.push((w, p * nw + w, distr[p]));
                    }
                }
            }
        }
        let rate_distr = SparseBlock::from_triplets(nw, nw * np, &triplets)?;
        let bhp_residual = &state.bhp - &bhp_targets;
        let rate_residual = &(&rate_distr * &state.qs) - &rate_targets;
        self.residual.well_eq = Adb::select_rows(&is_bhp, &bhp_residual, &rate_residual);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

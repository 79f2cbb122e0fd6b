use super::{BlackoilModel, SolutionState, Var, NUM_BASE_VARS};
use crate::ad::Adb;
use crate::base::{HydroCarbonState, Phase, ReservoirState, WellState};
use crate::StrError;
use russell_lab::Vector;

/// Holds the meaning of the mixed variable in each cell (one-zero indicators)
pub(crate) struct PrimalIndicators {
    /// The mixed variable is the gas saturation
    pub is_sg: Vector,

    /// The mixed variable is the dissolved gas-oil ratio
    pub is_rs: Vector,

    /// The mixed variable is the vaporized oil-gas ratio
    pub is_rv: Vector,
}

impl<'a> BlackoilModel<'a> {
    /// Returns the one-zero indicators of the mixed variable given the hydrocarbon state
    ///
    /// Cells flagged OilOnly (GasOnly) fall back to the gas saturation if dissolved gas
    /// (vaporized oil) is disabled.
    pub(crate) fn primal_indicators(&self, x: &ReservoirState) -> PrimalIndicators {
        let nc = x.ncell();
        let mut ind = PrimalIndicators {
            is_sg: Vector::new(nc),
            is_rs: Vector::new(nc),
            is_rv: Vector::new(nc),
        };
        for c in 0..nc {
            match x.hydrocarbon_state[c] {
                HydroCarbonState::OilOnly if self.ctx.config.disgas => ind.is_rs[c] = 1.0,
                HydroCarbonState::GasOnly if self.ctx.config.vapoil => ind.is_rv[c] = 1.0,
                _ => ind.is_sg[c] = 1.0,
            }
        }
        ind
    }

    /// Returns the position of each group of primary variables in the list of variables
    ///
    /// The base order is {pressure, [sw], [xvar], qs, bhp}; an extra component inserts its
    /// block at position `np` and shifts the well blocks.
    pub fn variable_state_indices(&self) -> Vec<Option<usize>> {
        let mut indices = vec![None; NUM_BASE_VARS];
        let mut next = 0;
        let mut push = |var: Var, active: bool| {
            if active {
                indices[var.index()] = Some(next);
                next += 1;
            }
        };
        push(Var::Pressure, true);
        push(Var::Sw, self.ctx.pu.active(Phase::Water));
        push(Var::Xvar, self.ctx.pu.active(Phase::Gas));
        push(Var::Qs, true);
        push(Var::Bhp, true);
        if let Some(extra) = self.extra.as_deref() {
            extra.extend_indices(self.ctx.np(), &mut indices);
        }
        indices
    }

    /// Returns the initial values of the primary variables
    ///
    /// The well rates are phase-major: `qs[phase * nw + w]`.
    pub fn variable_state_initials(&self, x: &ReservoirState, xw: &WellState) -> Result<Vec<Vector>, StrError> {
        let nc = self.ctx.ncell();
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        x.check(nc, np)?;
        xw.check(self.ctx.wells)?;
        let mut initials = vec![x.pressure.clone()];
        if let Ok(pos) = self.ctx.pu.pos(Phase::Water) {
            initials.push(x.sat_column(pos));
        }
        if let Ok(gaspos) = self.ctx.pu.pos(Phase::Gas) {
            let ind = self.primal_indicators(x);
            let mut xvar = Vector::new(nc);
            for c in 0..nc {
                xvar[c] = if ind.is_rs[c] == 1.0 {
                    x.rs[c]
                } else if ind.is_rv[c] == 1.0 {
                    x.rv[c]
                } else {
                    x.sat(c, gaspos)
                };
            }
            initials.push(xvar);
        }
        let mut qs = Vector::new(nw * np);
        for w in 0..nw {
            for p in 0..np {
                qs[p * nw + w] = xw.well_rates[w * np + p];
            }
        }
        initials.push(qs);
        initials.push(xw.bhp.clone());
        if let Some(extra) = self.extra.as_deref() {
            extra.extend_initials(np, x, &mut initials);
        }
        Ok(initials)
    }

    /// Builds the solution state from the primary variables
    ///
    /// The oil saturation is `1 − sw − sg` (and `− ss` with solvent). The phase pressures
    /// follow from the capillary pressures, and rs (rv) is either the mixed variable or the
    /// saturated value.
    pub fn variable_state_extract_vars(
        &self,
        x: &ReservoirState,
        indices: &[Option<usize>],
        vars: &[Adb],
    ) -> Result<SolutionState, StrError> {
        if indices.len() != NUM_BASE_VARS + usize::from(self.extra.is_some()) {
            return Err("the number of variable indices must be 5 plus one per extra component");
        }
        let nc = self.ctx.ncell();
        let np = self.ctx.np();
        let pu = &self.ctx.pu;
        let fluid = self.ctx.fluid;
        let variable = |var: Var| -> Result<Option<&Adb>, StrError> {
            match indices[var.index()] {
                Some(i) => vars.get(i).map(Some).ok_or("variable index is out of bounds"),
                None => Ok(None),
            }
        };
        let mut state = SolutionState::new(np);

        // pressure and temperature
        let p = variable(Var::Pressure)?.ok_or("the pressure variable is missing")?;
        state.pressure = p.clone();
        state.temperature = Adb::constant(x.temperature.clone());

        // saturations
        let one = Adb::constant_filled(nc, 1.0);
        let sw = match variable(Var::Sw)? {
            Some(v) => v.clone(),
            None => Adb::constant_filled(nc, 0.0),
        };
        if let Ok(pos) = pu.pos(Phase::Water) {
            state.saturation[pos] = sw.clone();
        }
        let mut so = &one - &sw;
        let ind = self.primal_indicators(x);
        let xvar = variable(Var::Xvar)?;
        if let Ok(gaspos) = pu.pos(Phase::Gas) {
            let xvar = xvar.ok_or("the mixed variable is missing")?;
            let sg = &(&ind.is_sg * xvar) + &(&ind.is_rv * &so);
            so = &so - &sg;
            state.saturation[gaspos] = sg;
        }
        state.saturation[pu.pos(Phase::Oil)?] = so;
        if let Some(extra) = self.extra.as_deref() {
            extra.extract_variables(&self.ctx, indices, vars, &mut state)?;
        }

        // phase pressures
        let sw = self.ctx.saturation_or_zero(&state.saturation, Phase::Water);
        let so = self.ctx.saturation_or_zero(&state.saturation, Phase::Oil);
        let sg = self.ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let pc = fluid.cap_press(&sw, &so, &sg);
        let water = Phase::Water.index();
        let oil = Phase::Oil.index();
        let gas = Phase::Gas.index();
        state.canonical_phase_pressures[water] = if pu.active(Phase::Water) { p - &pc[water] } else { p.clone() };
        state.canonical_phase_pressures[oil] = p.clone();
        state.canonical_phase_pressures[gas] = if pu.active(Phase::Gas) { p + &pc[gas] } else { p.clone() };

        // dissolved gas and vaporized oil
        let zero = Adb::constant_filled(nc, 0.0);
        state.rs = match (self.ctx.config.disgas, xvar) {
            (true, Some(xvar)) => {
                let rs_sat = fluid.rs_sat(p, &so);
                let not_rs = Vector::from(&ind.is_rs.as_data().iter().map(|v| 1.0 - v).collect::<Vec<_>>());
                &(&not_rs * &rs_sat) + &(&ind.is_rs * xvar)
            }
            _ => zero.clone(),
        };
        state.rv = match (self.ctx.config.vapoil, xvar) {
            (true, Some(xvar)) => {
                let rv_sat = fluid.rv_sat(&state.canonical_phase_pressures[gas], &so);
                let not_rv = Vector::from(&ind.is_rv.as_data().iter().map(|v| 1.0 - v).collect::<Vec<_>>());
                &(&not_rv * &rv_sat) + &(&ind.is_rv * xvar)
            }
            _ => zero,
        };

        // wells
        state.qs = variable(Var::Qs)?.ok_or("the well rate variable is missing")?.clone();
        state.bhp = variable(Var::Bhp)?.ok_or("the bottom-hole pressure variable is missing")?.clone();
        Ok(state)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

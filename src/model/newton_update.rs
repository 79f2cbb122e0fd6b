use super::BlackoilModel;
use crate::ad::Adb;
use crate::base::{HydroCarbonState, Phase, ReservoirState, WellState, SQRT_EPSILON};
use crate::StrError;
use russell_lab::Vector;

/// Removes `len` entries starting at `start` and returns (remaining entries, removed entries)
///
/// The order of the remaining entries is preserved.
pub fn splice_out(dx: &Vector, start: usize, len: usize) -> Result<(Vector, Vector), StrError> {
    let data = dx.as_data();
    if start + len > data.len() {
        return Err("the slice to remove is out of bounds");
    }
    let removed = Vector::from(&&data[start..start + len]);
    let mut rest = Vec::with_capacity(data.len() - len);
    rest.extend_from_slice(&data[..start]);
    rest.extend_from_slice(&data[start + len..]);
    Ok((Vector::from(&rest), removed))
}

/// Returns `sign(d) · min(|d|, limit)`
fn limited(d: f64, limit: f64) -> f64 {
    f64::signum(d) * f64::min(f64::abs(d), limit)
}

impl<'a> BlackoilModel<'a> {
    /// Updates the reservoir and well states with the Newton increment (the states move by −dx)
    ///
    /// With an extra component, its block is removed from the increment, the rest updates the
    /// base variables, and then the extra component is updated.
    pub fn update_state(&self, dx: &Vector, x: &mut ReservoirState, xw: &mut WellState) -> Result<(), StrError> {
        match self.extra.as_deref() {
            Some(extra) => {
                let (dx_base, dextra) = extra.split_update(&self.ctx, dx)?;
                self.update_state_base(&dx_base, x, xw)?;
                extra.apply_update(&self.ctx, &dextra, x)
            }
            None => self.update_state_base(dx, x, xw),
        }
    }

    /// Updates the base (black-oil) variables
    ///
    /// The increment holds {dp, [dsw], [dxvar], dqs, dbhp}. Pressure, rs, rv, and bhp changes
    /// are limited relative to the old values; saturation changes are scaled to at most
    /// `ds_max` per cell and negative saturations are chopped. The hydrocarbon state of each
    /// cell is switched when gas appears or disappears.
    pub fn update_state_base(&self, dx: &Vector, x: &mut ReservoirState, xw: &mut WellState) -> Result<(), StrError> {
        let nc = self.ctx.ncell();
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        let config = &self.ctx.config;
        let pu = &self.ctx.pu;
        if dx.dim() != nc * np + nw * np + nw {
            return Err("update vector has an incorrect size");
        }
        x.check(nc, np)?;
        let data = dx.as_data();
        let zeros = vec![0.0; nc];

        // split the increment
        let mut offset = 0;
        let dp = &data[offset..offset + nc];
        offset += nc;
        let dsw = if pu.active(Phase::Water) {
            offset += nc;
            &data[offset - nc..offset]
        } else {
            &zeros[..]
        };
        let dxvar = if pu.active(Phase::Gas) {
            offset += nc;
            &data[offset - nc..offset]
        } else {
            &zeros[..]
        };
        let dqs = &data[offset..offset + nw * np];
        offset += nw * np;
        let dbhp = &data[offset..offset + nw];
        let ind = self.primal_indicators(x);

        // pressure
        let p_old = x.pressure.clone();
        for c in 0..nc {
            let dp_lim = limited(dp[c], config.dp_max_rel * f64::abs(p_old[c]));
            x.pressure[c] = f64::max(p_old[c] - dp_lim, 0.0);
        }

        // saturations with maximal change
        let wpos = pu.pos(Phase::Water).ok();
        let opos = pu.pos(Phase::Oil)?;
        let gpos = pu.pos(Phase::Gas).ok();
        let s_old = x.saturation.clone();
        let mut sw = vec![0.0; nc];
        let mut so = vec![0.0; nc];
        let mut sg = vec![0.0; nc];
        for c in 0..nc {
            let dsg = ind.is_sg[c] * dxvar[c] - ind.is_rv[c] * dsw[c];
            let dso = -dsw[c] - dsg;
            let max_val = f64::max(f64::max(f64::abs(dsw[c]), f64::abs(dsg)), f64::abs(dso));
            let step = if max_val > 0.0 { f64::min(config.ds_max / max_val, 1.0) } else { 1.0 };
            if let Some(pos) = wpos {
                sw[c] = s_old[c * np + pos] - step * dsw[c];
            }
            if let Some(pos) = gpos {
                sg[c] = s_old[c * np + pos] - step * dsg;
            }
            so[c] = s_old[c * np + opos] - step * dso;
        }

        // Appleyard chop of negative saturations
        for c in 0..nc {
            if sg[c] < 0.0 {
                sw[c] /= 1.0 - sg[c];
                so[c] /= 1.0 - sg[c];
                sg[c] = 0.0;
            }
            if so[c] < 0.0 {
                sw[c] /= 1.0 - so[c];
                sg[c] /= 1.0 - so[c];
                so[c] = 0.0;
            }
            if sw[c] < 0.0 {
                so[c] /= 1.0 - sw[c];
                sg[c] /= 1.0 - sw[c];
                sw[c] = 0.0;
            }
        }

        // dissolved gas and vaporized oil
        let mut rs = x.rs.clone();
        if config.disgas {
            for c in 0..nc {
                let drs = ind.is_rs[c] * dxvar[c];
                let limit = f64::max(f64::abs(x.rs[c]) * config.dr_max_rel, 1.0);
                rs[c] = f64::max(x.rs[c] - limited(drs, limit), 0.0);
            }
        }
        let mut rv = x.rv.clone();
        if config.vapoil {
            for c in 0..nc {
                let drv = ind.is_rv[c] * dxvar[c];
                let limit = f64::max(f64::abs(x.rv[c]) * config.dr_max_rel, 1.0);
                rv[c] = f64::max(x.rv[c] - limited(drv, limit), 0.0);
            }
        }

        // hydrocarbon state switching
        let mut hc_state = vec![HydroCarbonState::GasAndOil; nc];
        if gpos.is_some() && (config.disgas || config.vapoil) {
            let fluid = self.ctx.fluid;
            let constant = |v: &[f64]| Adb::constant(Vector::from(&v));
            let so_old: Vec<f64> = (0..nc).map(|c| s_old[c * np + opos]).collect();
            let wat_only: Vec<bool> = sw.iter().map(|s| *s > 1.0 - SQRT_EPSILON).collect();
            if config.disgas {
                let rs_sat0 = fluid.rs_sat(&constant(p_old.as_data()), &constant(&so_old));
                let rs_sat = fluid.rs_sat(&constant(x.pressure.as_data()), &constant(&so));
                for c in 0..nc {
                    let has_gas = sg[c] > 0.0 && ind.is_rs[c] == 0.0;
                    let gas_vaporized = rs[c] > rs_sat.at(c) * (1.0 + SQRT_EPSILON)
                        && ind.is_rs[c] == 1.0
                        && x.rs[c] > rs_sat0.at(c) * (1.0 - SQRT_EPSILON);
                    if wat_only[c] || has_gas || gas_vaporized {
                        rs[c] = rs_sat.at(c);
                    } else {
                        hc_state[c] = HydroCarbonState::OilOnly;
                    }
                }
            }
            if config.vapoil {
                let gas_pressure = |p: &[f64], sw: &[f64], so: &[f64], sg: &[f64]| {
                    let pc = fluid.cap_press(&constant(sw), &constant(so), &constant(sg));
                    &constant(p) + &pc[Phase::Gas.index()]
                };
                let sw_old: Vec<f64> = (0..nc).map(|c| wpos.map_or(0.0, |pos| s_old[c * np + pos])).collect();
                let sg_old: Vec<f64> = (0..nc).map(|c| gpos.map_or(0.0, |pos| s_old[c * np + pos])).collect();
                let pg_old = gas_pressure(p_old.as_data(), &sw_old, &so_old, &sg_old);
                let pg = gas_pressure(x.pressure.as_data(), &sw, &so, &sg);
                let rv_sat0 = fluid.rv_sat(&pg_old, &constant(&so_old));
                let rv_sat = fluid.rv_sat(&pg, &constant(&so));
                for c in 0..nc {
                    let has_oil = so[c] > 0.0 && ind.is_rv[c] == 0.0;
                    let oil_condensed = rv[c] > rv_sat.at(c) * (1.0 + SQRT_EPSILON)
                        && ind.is_rv[c] == 1.0
                        && x.rv[c] > rv_sat0.at(c) * (1.0 - SQRT_EPSILON);
                    if wat_only[c] || has_oil || oil_condensed {
                        rv[c] = rv_sat.at(c);
                    } else {
                        hc_state[c] = HydroCarbonState::GasOnly;
                    }
                }
            }
        }

        // reservoir state
        for c in 0..nc {
            if let Some(pos) = wpos {
                x.saturation[c * np + pos] = sw[c];
            }
            if let Some(pos) = gpos {
                x.saturation[c * np + pos] = sg[c];
            }
            x.saturation[c * np + opos] = so[c];
            x.hydrocarbon_state[c] = hc_state[c];
        }
        x.rs = rs;
        x.rv = rv;

        // well state (qs is phase-major; well rates are well-major)
        for w in 0..nw {
            for p in 0..np {
                xw.well_rates[w * np + p] -= dqs[p * nw + w];
            }
            let dbhp_lim = limited(dbhp[w], config.dbhp_max_rel * f64::abs(xw.bhp[w]));
            xw.bhp[w] -= dbhp_lim;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{limited, splice_out};
    use crate::base::{Config, Grid, HydroCarbonState, PhaseUsage, ReservoirState, Samples, SerialCommunicator};
    use crate::base::{WellState, Wells};
    use crate::model::BlackoilModel;
    use crate::props::{BlackoilFluid, RockCompressibility};
    use russell_lab::{approx_eq, vec_approx_eq, Vector};

    #[test]
    fn splice_out_works() {
        let dx = Vector::from(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let (rest, removed) = splice_out(&dx, 1, 2).unwrap();
        assert_eq!(rest.as_data(), &[0.0, 3.0, 4.0]);
        assert_eq!(removed.as_data(), &[1.0, 2.0]);
        let (rest, removed) = splice_out(&dx, 5, 0).unwrap();
        assert_eq!(rest.dim(), 5);
        assert_eq!(removed.dim(), 0);
        assert_eq!(splice_out(&dx, 4, 2).err(), Some("the slice to remove is out of bounds"));
    }

    #[test]
    fn limited_works() {
        assert_eq!(limited(5.0, 2.0), 2.0);
        assert_eq!(limited(-5.0, 2.0), -2.0);
        assert_eq!(limited(-1.0, 2.0), -1.0);
    }

    #[test]
    fn update_limits_pressure_and_saturation_changes() {
        let mut config = Config::new();
        config.set_phases(true, true, false).unwrap();
        config.set_update_limits(0.1, 0.2, 1.0).unwrap();
        let grid = Grid::line(2, 10.0, 1.0, 0.5).unwrap();
        let wells = Wells::new(2, 2, &[]).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let model = BlackoilModel::new(&config, &grid, &wells, &fluid, &rock, &comm, None).unwrap();
        let mut x = ReservoirState::new(2, 100.0, 300.0, &[0.3, 0.7]).unwrap();
        let mut xw = WellState::new(&wells, &x).unwrap();
        assert_eq!(
            model.update_state(&Vector::new(3), &mut x, &mut xw).err(),
            Some("update vector has an incorrect size")
        );

        // dp = [50, −5]; dsw = [−0.5, 0.1]
        let dx = Vector::from(&[50.0, -5.0, -0.5, 0.1]);
        model.update_state(&dx, &mut x, &mut xw).unwrap();
        vec_approx_eq(&x.pressure, &[90.0, 105.0], 1e-13);
        // cell 0: step = 0.2 / 0.5
        approx_eq(x.sat(0, 0), 0.3 + 0.2, 1e-15);
        approx_eq(x.sat(0, 1), 0.7 - 0.2, 1e-15);
        approx_eq(x.sat(1, 0), 0.2, 1e-15);
        approx_eq(x.sat(1, 1), 0.8, 1e-15);

        // Appleyard chop: water would become negative
        let mut config = config.clone();
        config.set_update_limits(0.1, 1.0, 1.0).unwrap();
        let model = BlackoilModel::new(&config, &grid, &wells, &fluid, &rock, &comm, None).unwrap();
        let dx = Vector::from(&[0.0, 0.0, 0.0, 0.3]);
        model.update_state(&dx, &mut x, &mut xw).unwrap();
        approx_eq(x.sat(0, 0), 0.5, 1e-15);
        approx_eq(x.sat(1, 0), 0.0, 1e-15);
        approx_eq(x.sat(1, 1), 1.0, 1e-15);
    }

    #[test]
    fn update_switches_to_undersaturated_oil() {
        let mut sample = Samples::column_water_oil_gas_solvent(1).unwrap();
        sample.config.set_solvent(false).unwrap();
        // single cell, no wells
        let grid = Grid::line(1, 10.0, 1.0, 0.5).unwrap();
        let wells = Wells::new(3, 1, &[]).unwrap();
        let pu = PhaseUsage::new(true, true, true).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let model = BlackoilModel::new(&sample.config, &grid, &wells, &fluid, &rock, &comm, None).unwrap();
        let mut x = ReservoirState::new(1, 100.0, 300.0, &[0.2, 0.7, 0.1]).unwrap();
        x.rs[0] = 50.0;
        let mut xw = WellState::new(&wells, &x).unwrap();

        // the gas saturation drops below zero: the cell becomes undersaturated
        let dx = Vector::from(&[0.0, 0.0, 0.15]);
        model.update_state(&dx, &mut x, &mut xw).unwrap();
        assert_eq!(x.hydrocarbon_state[0], HydroCarbonState::OilOnly);
        approx_eq(x.sat(0, 2), 0.0, 1e-15);
        let sum = x.sat(0, 0) + x.sat(0, 1) + x.sat(0, 2);
        approx_eq(sum, 1.0, 1e-15);
        approx_eq(x.rs[0], 50.0, 1e-15);

        // rs above saturation in an undersaturated cell brings gas back
        let dx = Vector::from(&[0.0, 0.0, -20.0]);
        model.update_state(&dx, &mut x, &mut xw).unwrap();
        assert_eq!(x.hydrocarbon_state[0], HydroCarbonState::GasAndOil);
        approx_eq(x.rs[0], 0.5 * 100.0, 1e-12);
    }
}

use super::{blend, ExtraComponent, LinearisedResidual, ModelContext, ReservoirQuantities, SolutionState, Var};
use crate::ad::Adb;
use crate::base::{Phase, ReservoirState, WellState};
use crate::props::PolymerProps;
use crate::StrError;
use russell_lab::Vector;

/// Default scaling factor of the polymer mass-balance equation
const POLYMER_EQUATION_SCALE: f64 = 1.0;

/// Implements the polymer component dissolved in water
///
/// The primary variable is the polymer concentration `c` in the water phase. The polymer
/// thickens the water according to the Todd-Longstaff rule with the fully mixed viscosity
/// `mu_m = mu_w · mult(c)`:
///
/// ```text
/// mu_p_eff = mu_p^(1−ω) · mu_m^ω        with mu_p = mu_w · mult(c_max)
/// mu_w_e   = mu_w^(1−ω) · mu_m^ω
/// 1/mu_w_eff = (1 − c/c_max) / mu_w_e + (c/c_max) / mu_p_eff
/// ```
///
/// The accumulation is `pv_mult · (b_w · sw · c · (1 − dps) + ads(c))` and the polymer is
/// transported with the water head difference and mobility `kr_w / mu_p_eff`.
pub struct PolymerComponent<'a> {
    props: &'a dyn PolymerProps,
}

impl<'a> PolymerComponent<'a> {
    /// Allocates a new instance
    pub fn new(props: &'a dyn PolymerProps) -> Self {
        PolymerComponent { props }
    }

    /// Returns (1/mu_w_eff, mu_p_eff) given the water viscosity and the concentration
    fn effective_viscosities(&self, mu_w: &Adb, c: &Adb) -> (Adb, Adb) {
        let omega = self.props.mixing_parameter();
        let c_max = self.props.max_concentration();
        let mu_m = mu_w * &self.props.viscosity_multiplier(c);
        let mult_max = self.props.viscosity_multiplier(&Adb::constant_filled(c.size(), c_max));
        let mu_p = mu_w * &mult_max;
        let mu_p_eff = blend(&mu_p, &mu_m, omega);
        let mu_w_e = blend(mu_w, &mu_m, omega);
        let c_bar = c / c_max;
        let inv_mu_w_eff = &(&(1.0 - &c_bar) / &mu_w_e) + &(&c_bar / &mu_p_eff);
        (inv_mu_w_eff, mu_p_eff)
    }
}

impl<'a> ExtraComponent for PolymerComponent<'a> {
    fn carrier_phase(&self) -> Phase {
        Phase::Water
    }

    fn default_equation_scale(&self) -> f64 {
        POLYMER_EQUATION_SCALE
    }

    fn extend_initials(&self, np: usize, x: &ReservoirState, initials: &mut Vec<Vector>) {
        initials.insert(np, x.polymer_concentration.clone());
    }

    fn extract_variables(
        &self,
        _ctx: &ModelContext,
        indices: &[Option<usize>],
        vars: &[Adb],
        state: &mut SolutionState,
    ) -> Result<(), StrError> {
        let i = indices
            .get(Var::Extra.index())
            .copied()
            .flatten()
            .ok_or("the polymer variable index is missing")?;
        let c = vars.get(i).ok_or("the polymer variable index is out of bounds")?;
        state.polymer_concentration = c.clone();
        Ok(())
    }

    fn compute_rel_perm(&self, ctx: &ModelContext, state: &SolutionState) -> Result<Vec<Adb>, StrError> {
        let sw = ctx.saturation_or_zero(&state.saturation, Phase::Water);
        let so = ctx.saturation_or_zero(&state.saturation, Phase::Oil);
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        Ok(ctx.fluid.relperm(&sw, &so, &sg))
    }

    fn compute_accum(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        pv_mult: &Adb,
        aix: usize,
        rq: &mut [ReservoirQuantities],
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let waterpos = ctx.pu.pos(Phase::Water)?;
        let c = state.polymer_concentration.max_scalar(0.0);
        let b_w = rq[waterpos].b.clone();
        let dissolved = &(&(&b_w * &state.saturation[waterpos]) * &c) * (1.0 - self.props.dead_pore_volume());
        let adsorbed = self.props.adsorption(&c);
        rq[np].accum[aix] = pv_mult * &(&dissolved + &adsorbed);
        rq[np].b = b_w;
        Ok(())
    }

    fn compute_flux(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        kr_carrier: &Adb,
        carrier_pressure: &Adb,
        rq: &mut [ReservoirQuantities],
    ) -> Result<Adb, StrError> {
        let np = ctx.np();
        let waterpos = ctx.pu.pos(Phase::Water)?;
        let c = state.polymer_concentration.max_scalar(0.0);
        let mu_w = ctx.fluid.mu_wat(carrier_pressure, &state.temperature);
        let (inv_mu_w_eff, mu_p_eff) = self.effective_viscosities(&mu_w, &c);

        // polymer flux with the water head difference
        let b_w = &rq[waterpos].b;
        let rho = b_w * ctx.fluid.surface_density(Phase::Water)?;
        let mob = kr_carrier / &mu_p_eff;
        let (dh, mflux) = ctx.upwind_mass_flux(&(&c * b_w), &mob, &rho, carrier_pressure, &ctx.trans)?;
        rq[np].mu = mu_p_eff;
        rq[np].rho = rho;
        rq[np].kr = kr_carrier.clone();
        rq[np].mob = mob;
        rq[np].dh = dh;
        rq[np].mflux = mflux;

        // the water mobility becomes kr_w / mu_w_eff
        Ok(&(kr_carrier * &mu_w) * &inv_mu_w_eff)
    }

    fn add_well_contribution(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        xw: &WellState,
        cq_s: &[Adb],
        residual: &mut LinearisedResidual,
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let waterpos = ctx.pu.pos(Phase::Water)?;
        let well_cells = &ctx.wops.well_cells;

        // producers take the concentration of the cell; injectors inject the given one
        let c_cell = state.polymer_concentration.subset(well_cells);
        let is_prod = ctx.producer_perforations();
        let injected: Vec<f64> = (0..ctx.nperf())
            .map(|perf| (1.0 - is_prod[perf]) * xw.polymer_concentration[perf])
            .collect();
        let c_perf = &(&c_cell * &is_prod) + &Vector::from(&injected);
        let cq_s_polymer = (&c_perf * &cq_s[waterpos]).superset(well_cells, ctx.ncell())?;
        residual.material_balance_eq[np] = &residual.material_balance_eq[np] - &cq_s_polymer;
        Ok(())
    }

    fn apply_update(&self, ctx: &ModelContext, dc: &Vector, x: &mut ReservoirState) -> Result<(), StrError> {
        let nc = ctx.ncell();
        if dc.dim() != nc {
            return Err("the polymer update must have one entry per cell");
        }
        for c in 0..nc {
            x.polymer_concentration[c] = f64::max(x.polymer_concentration[c] - dc[c], 0.0);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::PolymerComponent;
    use crate::ad::Adb;
    use crate::base::{Phase, PhaseUsage, Samples, SerialCommunicator};
    use crate::model::{ExtraComponent, ModelContext, ReservoirQuantities, SolutionState, Var};
    use crate::props::{BlackoilFluid, FluidProps, RockCompressibility};
    use russell_lab::{approx_eq, vec_approx_eq, Vector};

    #[test]
    fn indices_initials_and_extraction_work() {
        let mut sample = Samples::line_water_oil_polymer(2).unwrap();
        sample.state.polymer_concentration[1] = 0.5;
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let ctx = ModelContext::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm).unwrap();
        let tables = Samples::polymer_tables().unwrap();
        let polymer = PolymerComponent::new(&tables);
        assert_eq!(polymer.carrier_phase(), Phase::Water);
        assert!(!polymer.is_miscible());
        assert_eq!(polymer.effective_viscosity(0), None);

        // no gas: {pressure, sw, -, qs, bhp} followed by the polymer block at np = 2
        let mut indices = vec![Some(0), Some(1), None, Some(2), Some(3)];
        polymer.extend_indices(2, &mut indices);
        assert_eq!(indices, vec![Some(0), Some(1), None, Some(3), Some(4), Some(2)]);
        assert_eq!(indices[Var::Extra.index()], Some(2));

        let mut initials = vec![Vector::new(2), Vector::new(2), Vector::new(4), Vector::new(2)];
        polymer.extend_initials(2, &sample.state, &mut initials);
        assert_eq!(initials.len(), 5);
        assert_eq!(initials[2].as_data(), &[0.0, 0.5]);

        let vars = Adb::variables(&initials);
        let mut state = SolutionState::new(2);
        polymer.extract_variables(&ctx, &indices, &vars, &mut state).unwrap();
        vec_approx_eq(state.polymer_concentration.value(), &[0.0, 0.5], 1e-15);
        assert_eq!(state.polymer_concentration.derivative()[2].get(1, 1), 1.0);
        assert_eq!(
            polymer.extract_variables(&ctx, &indices[..5], &vars, &mut state).err(),
            Some("the polymer variable index is missing")
        );
    }

    #[test]
    fn accumulation_accounts_for_dead_pore_volume_and_adsorption() {
        let sample = Samples::line_water_oil_polymer(1).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let ctx = ModelContext::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm).unwrap();
        let mut tables = Samples::polymer_tables().unwrap();
        tables.set_dead_pore_volume(0.1).unwrap();
        let polymer = PolymerComponent::new(&tables);

        let vars = Adb::variables(&[Vector::from(&[1.0])]);
        let mut state = SolutionState::new(2);
        state.saturation = vec![Adb::constant_filled(1, 0.4), Adb::constant_filled(1, 0.6)];
        state.polymer_concentration = vars[0].clone();
        let mut rq = vec![ReservoirQuantities::new(); 3];
        rq[0].b = Adb::constant_filled(1, 1.25);
        let pv_mult = Adb::constant_filled(1, 2.0);
        polymer.compute_accum(&ctx, &state, &pv_mult, 1, &mut rq).unwrap();

        // 2 · (1.25 · 0.4 · 1 · 0.9 + 0.5e-4 · 2000 · 0.75 / 0.25)
        let ads = 0.5e-4 * 2000.0 * 0.75 / 0.25;
        approx_eq(rq[2].accum[1].at(0), 2.0 * (1.25 * 0.4 * 0.9 + ads), 1e-13);
        approx_eq(rq[2].b.at(0), 1.25, 1e-15);
        // d/dc = 2 · (1.25 · 0.4 · 0.9 + 0.5e-4 · 6000)
        approx_eq(rq[2].accum[1].derivative()[0].get(0, 0), 2.0 * (0.45 + 0.3), 1e-13);
    }

    #[test]
    fn full_mixing_moves_polymer_with_the_water() {
        let sample = Samples::line_water_oil_polymer(2).unwrap();
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let ctx = ModelContext::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm).unwrap();
        let tables = Samples::polymer_tables().unwrap();
        let polymer = PolymerComponent::new(&tables);

        let mut state = SolutionState::new(2);
        state.temperature = Adb::constant_filled(2, 300.0);
        state.polymer_concentration = Adb::constant(Vector::from(&[1.0, 0.0]));
        let pressure = Adb::constant(Vector::from(&[110.0, 100.0]));
        let kr = Adb::constant_filled(2, 0.5);
        let mut rq = vec![ReservoirQuantities::new(); 3];
        rq[0].b = fluid.b_wat(&pressure, &state.temperature);
        let kr_water = polymer.compute_flux(&ctx, &state, &kr, &pressure, &mut rq).unwrap();

        // ω = 1: the water viscosity is mu_w · mult(c) = 0.5 · 2 in cell 0
        let mu_w = fluid.mu_wat(&pressure, &state.temperature);
        approx_eq(kr_water.at(0) / mu_w.at(0), 0.5 / (0.5 * 2.0), 1e-14);
        approx_eq(kr_water.at(1), 0.5, 1e-14);

        // the polymer flux is c times the (thickened) water flux from the upwind cell 0
        let b0 = rq[0].b.at(0);
        let water_flux = b0 * (0.5 / 1.0) * 0.5 * 10.0;
        approx_eq(rq[2].mflux.at(0), 1.0 * water_flux, 1e-12);
        approx_eq(rq[2].mu.at(0), 1.0, 1e-14);
    }

    #[test]
    fn apply_update_clamps_negative_concentrations() {
        let mut sample = Samples::line_water_oil_polymer(2).unwrap();
        sample.state.polymer_concentration = Vector::from(&[0.5, 0.1]);
        let pu = PhaseUsage::new(true, true, false).unwrap();
        let fluid = BlackoilFluid::new(pu, Samples::param_blackoil()).unwrap();
        let rock = RockCompressibility::incompressible();
        let comm = SerialCommunicator;
        let ctx = ModelContext::new(&sample.config, &sample.grid, &sample.wells, &fluid, &rock, &comm).unwrap();
        let tables = Samples::polymer_tables().unwrap();
        let polymer = PolymerComponent::new(&tables);

        // nc·np reservoir entries, nc polymer entries, nw·np rates, nw bhp
        let dx = Vector::from(&(0..12).map(|i| i as f64).collect::<Vec<_>>());
        let (base, dc) = polymer.split_update(&ctx, &dx).unwrap();
        assert_eq!(dc.as_data(), &[4.0, 5.0]);
        assert_eq!(base.dim(), 10);

        let mut x = sample.state.clone();
        polymer.apply_update(&ctx, &Vector::from(&[0.2, 0.3]), &mut x).unwrap();
        vec_approx_eq(&x.polymer_concentration, &[0.3, 0.0], 1e-15);
        assert_eq!(x.saturation.as_data(), sample.state.saturation.as_data());
        assert_eq!(
            polymer.apply_update(&ctx, &Vector::new(3), &mut x).err(),
            Some("the polymer update must have one entry per cell")
        );
    }
}

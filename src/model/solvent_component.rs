use super::{ExtraComponent, LinearisedResidual, ModelContext, ReservoirQuantities, SolutionState};
use super::{ToddLongstaff, Var};
use crate::ad::{Adb, Criterion, Selector};
use crate::base::{Phase, ReservoirState, WellState};
use crate::props::SolventProps;
use crate::StrError;
use russell_lab::Vector;

/// Default scaling factor of the solvent mass-balance equation
const SOLVENT_EQUATION_SCALE: f64 = 0.0031;

/// Computes the solvent fraction of the gas-like saturation `F = ss / (ss + sg)`
///
/// Where `ss + sg` is exactly zero the fraction equals `ss` (i.e., zero), never NaN.
pub fn solvent_fraction(ss: &Adb, sg: &Adb) -> Adb {
    let ssg = ss + sg;
    Selector::new(ssg.value(), Criterion::Zero).select(ss, &(ss / &ssg))
}

/// Holds the effective properties of all phases (by position; the solvent at `np`)
struct EffectiveProperties {
    b: Vec<Adb>,
    mu: Vec<Adb>,
}

/// Implements the solvent pseudo-component
///
/// The solvent is transported with the gas phase: it shares the gas pressure, splits the gas
/// relative permeability, and takes its share of the gas injected or produced by the wells.
/// If miscible, the oil, gas, and solvent properties are replaced by Todd-Longstaff effective
/// values and the relative permeabilities blend towards miscible curves.
pub struct SolventComponent<'a> {
    props: &'a dyn SolventProps,
    miscible: bool,
    mixing: ToddLongstaff,
    effective: Option<EffectiveProperties>,
}

impl<'a> SolventComponent<'a> {
    /// Allocates a new instance
    pub fn new(props: &'a dyn SolventProps, miscible: bool) -> Result<Self, StrError> {
        let mixing = ToddLongstaff::new(props.mixing_parameter_viscosity(), props.mixing_parameter_density())?;
        Ok(SolventComponent {
            props,
            miscible,
            mixing,
            effective: None,
        })
    }

    /// Returns the solvent reciprocal formation volume factor
    fn reciproc_fvf(&self, ctx: &ModelContext, gas_pressure: &Adb) -> Adb {
        match self.effective_reciproc_fvf(ctx.np()) {
            Some(b) => b.clone(),
            None => self.props.b_solvent(gas_pressure),
        }
    }

    /// Returns the solvent viscosity
    fn viscosity(&self, ctx: &ModelContext, gas_pressure: &Adb) -> Adb {
        match self.effective_viscosity(ctx.np()) {
            Some(mu) => mu.clone(),
            None => self.props.mu_solvent(gas_pressure),
        }
    }

    /// Returns the solvent fraction at the perforations
    ///
    /// Producers use the fraction of the perforated cell; injectors use the injected fraction.
    fn perforation_fraction(&self, ctx: &ModelContext, state: &SolutionState, xw: &WellState) -> Adb {
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let f_cell = solvent_fraction(&state.solvent_saturation, &sg).subset(&ctx.wops.well_cells);
        let is_prod = ctx.producer_perforations();
        let injected: Vec<f64> = (0..ctx.nperf())
            .map(|perf| (1.0 - is_prod[perf]) * xw.solvent_fraction[perf])
            .collect();
        &(&f_cell * &is_prod) + &Vector::from(&injected)
    }
}

impl<'a> ExtraComponent for SolventComponent<'a> {
    fn carrier_phase(&self) -> Phase {
        Phase::Gas
    }

    fn is_miscible(&self) -> bool {
        self.miscible
    }

    fn default_equation_scale(&self) -> f64 {
        SOLVENT_EQUATION_SCALE
    }

    fn extend_initials(&self, np: usize, x: &ReservoirState, initials: &mut Vec<Vector>) {
        initials.insert(np, x.solvent_saturation.clone());
    }

    fn extract_variables(
        &self,
        ctx: &ModelContext,
        indices: &[Option<usize>],
        vars: &[Adb],
        state: &mut SolutionState,
    ) -> Result<(), StrError> {
        let i = indices
            .get(Var::Extra.index())
            .copied()
            .flatten()
            .ok_or("the solvent variable index is missing")?;
        let ss = vars.get(i).ok_or("the solvent variable index is out of bounds")?;
        let oilpos = ctx.pu.pos(Phase::Oil)?;
        state.saturation[oilpos] = &state.saturation[oilpos] - ss;
        state.solvent_saturation = ss.clone();
        Ok(())
    }

    fn calculate_effective_properties(&mut self, ctx: &ModelContext, state: &SolutionState) -> Result<(), StrError> {
        let np = ctx.np();
        let fluid = ctx.fluid;
        let pw = &state.canonical_phase_pressures[Phase::Water.index()];
        let po = &state.canonical_phase_pressures[Phase::Oil.index()];
        let pg = &state.canonical_phase_pressures[Phase::Gas.index()];
        let t = &state.temperature;
        let sw = ctx.saturation_or_zero(&state.saturation, Phase::Water);
        let so = ctx.saturation_or_zero(&state.saturation, Phase::Oil);
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let ss = &state.solvent_saturation;

        // intrinsic properties
        let mu_o = fluid.mu_oil(po, t, &state.rs);
        let mu_g = fluid.mu_gas(pg, t, &state.rv);
        let mu_s = self.props.mu_solvent(pg);
        let b_o = fluid.b_oil(po, t, &state.rs);
        let b_g = fluid.b_gas(pg, t, &state.rv);
        let b_s = self.props.b_solvent(pg);
        let rho_surf_o = fluid.surface_density(Phase::Oil)?;
        let rho_surf_g = fluid.surface_density(Phase::Gas)?;
        let rho_surf_s = self.props.solvent_surface_density();
        let rho_o = &b_o * rho_surf_o;
        let rho_g = &b_g * rho_surf_g;
        let rho_s = &b_s * rho_surf_s;

        // mobile saturations
        let sorwmis = self.props.miscible_residual_oil_saturation(&sw);
        let sgcwmis = self.props.miscible_critical_gas_saturation(&sw);
        let so_eff = &so - &sorwmis;
        let sg_eff = &sg - &sgcwmis;
        let ss_eff = ss - &sgcwmis;

        let mixed = self.mixing.mix(
            [&so_eff, &sg_eff, &ss_eff],
            [&mu_o, &mu_g, &mu_s],
            [&rho_o, &rho_g, &rho_s],
        );

        let null = Adb::constant_filled(0, 0.0);
        let mut b = vec![null.clone(); np + 1];
        let mut mu = vec![null; np + 1];
        if let Ok(pos) = ctx.pu.pos(Phase::Water) {
            b[pos] = fluid.b_wat(pw, t);
            mu[pos] = fluid.mu_wat(pw, t);
        }
        let oilpos = ctx.pu.pos(Phase::Oil)?;
        let gaspos = ctx.pu.pos(Phase::Gas)?;
        b[oilpos] = &mixed.rho_oil / rho_surf_o;
        b[gaspos] = &mixed.rho_gas / rho_surf_g;
        b[np] = &mixed.rho_solvent / rho_surf_s;
        mu[oilpos] = mixed.mu_oil;
        mu[gaspos] = mixed.mu_gas;
        mu[np] = mixed.mu_solvent;
        self.effective = Some(EffectiveProperties { b, mu });
        Ok(())
    }

    fn effective_viscosity(&self, pos: usize) -> Option<&Adb> {
        if !self.miscible {
            return None;
        }
        self.effective.as_ref().and_then(|e| e.mu.get(pos))
    }

    fn effective_reciproc_fvf(&self, pos: usize) -> Option<&Adb> {
        if !self.miscible {
            return None;
        }
        self.effective.as_ref().and_then(|e| e.b.get(pos))
    }

    fn compute_rel_perm(&self, ctx: &ModelContext, state: &SolutionState) -> Result<Vec<Adb>, StrError> {
        let sw = ctx.saturation_or_zero(&state.saturation, Phase::Water);
        let so = ctx.saturation_or_zero(&state.saturation, Phase::Oil);
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let ss = &state.solvent_saturation;

        // the solvent counts as gas in the immiscible curves
        let mut kr = ctx.fluid.relperm(&sw, &so, &(&sg + ss));
        if !self.miscible {
            return Ok(kr);
        }

        // miscible end points
        let f_solvent = solvent_fraction(ss, &sg);
        let misc = self.props.miscibility_function(&f_solvent);
        let immisc = 1.0 - &misc;
        let sorwmis = self.props.miscible_residual_oil_saturation(&sw);
        let sgcwmis = self.props.miscible_critical_gas_saturation(&sw);
        let sogcr = ctx.fluid.critical_oil_in_gas_saturation();
        let sgcr = ctx.fluid.critical_gas_saturation();
        let sor = &(&misc * &sorwmis) + &(&immisc * sogcr);
        let sgc = &(&misc * &sgcwmis) + &(&immisc * sgcr);

        // total gas fraction of the mobile hydrocarbon saturation
        let sn = &(ss + &so) + &sg;
        let ssg = &(ss + &sg) - &sgc;
        let sn_eff = &(&sn - &sor) - &sgc;
        let zero = Adb::constant_filled(ctx.ncell(), 0.0);
        let f_total_gas = Selector::new(sn_eff.value(), Criterion::Zero).select(&zero, &(&ssg / &sn_eff));

        // miscible curves
        let mkrn = self.props.miscible_hc_water_relperm(&sn);
        let mkrgt = &self.props.miscible_solvent_gas_relperm_multiplier(&f_total_gas) * &mkrn;
        let mkro = &self.props.miscible_oil_relperm_multiplier(&(1.0 - &f_total_gas)) * &mkrn;

        let gas = Phase::Gas.index();
        let oil = Phase::Oil.index();
        kr[gas] = &(&immisc * &kr[gas]) + &(&misc * &mkrgt);
        kr[oil] = &(&immisc * &kr[oil]) + &(&misc * &mkro);
        Ok(kr)
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
        let pg = &state.canonical_phase_pressures[Phase::Gas.index()];
        let b = self.reciproc_fvf(ctx, pg);
        rq[np].accum[aix] = &(pv_mult * &b) * &state.solvent_saturation;
        rq[np].b = b;
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
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let f_solvent = solvent_fraction(&state.solvent_saturation, &sg);

        // solvent share of the gas relative permeability
        let mu = self.viscosity(ctx, carrier_pressure);
        let rho = &rq[np].b * self.props.solvent_surface_density();
        let kr = &self.props.solvent_relperm_multiplier(&f_solvent) * kr_carrier;
        let mob = &kr / &mu;
        let (dh, mflux) = ctx.upwind_mass_flux(&rq[np].b, &mob, &rho, carrier_pressure, &ctx.trans)?;
        rq[np].mu = mu;
        rq[np].rho = rho;
        rq[np].kr = kr;
        rq[np].mob = mob;
        rq[np].dh = dh;
        rq[np].mflux = mflux;

        // gas share
        Ok(&self.props.gas_relperm_multiplier(&(1.0 - &f_solvent)) * kr_carrier)
    }

    fn connection_gas_properties(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        xw: &WellState,
        avg_press: &Adb,
        b_perf: &mut [f64],
        surf_dens_perf: &mut [f64],
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let gaspos = ctx.pu.pos(Phase::Gas)?;
        let bs = self.props.b_solvent(avg_press);
        let rho_s = self.props.solvent_surface_density();
        let f_solvent = self.perforation_fraction(ctx, state, xw);
        for perf in 0..ctx.nperf() {
            let f = f_solvent.at(perf);
            let k = perf * np + gaspos;
            b_perf[k] = (1.0 - f) * b_perf[k] + f * bs.at(perf);
            surf_dens_perf[k] = (1.0 - f) * surf_dens_perf[k] + f * rho_s;
        }
        Ok(())
    }

    fn well_mobility_and_b(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        rq: &[ReservoirQuantities],
        mob_perf: &mut [Adb],
        b_perf: &mut [Adb],
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let gaspos = ctx.pu.pos(Phase::Gas)?;
        let well_cells = &ctx.wops.well_cells;
        let sg = ctx.saturation_or_zero(&state.saturation, Phase::Gas);
        let f_solvent = solvent_fraction(&state.solvent_saturation, &sg).subset(well_cells);
        mob_perf[gaspos] = &mob_perf[gaspos] + &rq[np].mob.subset(well_cells);
        b_perf[gaspos] = &(&(1.0 - &f_solvent) * &b_perf[gaspos]) + &(&f_solvent * &rq[np].b.subset(well_cells));
        Ok(())
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
        let oilpos = ctx.pu.pos(Phase::Oil)?;
        let gaspos = ctx.pu.pos(Phase::Gas)?;
        let well_cells = &ctx.wops.well_cells;
        let rs_perf = state.rs.subset(well_cells);

        // solvent share of the free gas flowing through the perforations
        let f_solvent = self.perforation_fraction(ctx, state, xw);
        let free_gas = &cq_s[gaspos] - &(&rs_perf * &cq_s[oilpos]);
        let cq_s_solvent = (&f_solvent * &free_gas).superset(well_cells, ctx.ncell())?;
        residual.material_balance_eq[np] = &residual.material_balance_eq[np] - &cq_s_solvent;
        residual.material_balance_eq[gaspos] = &residual.material_balance_eq[gaspos] + &cq_s_solvent;
        Ok(())
    }

    fn apply_update(&self, ctx: &ModelContext, dss: &Vector, x: &mut ReservoirState) -> Result<(), StrError> {
        let nc = ctx.ncell();
        let np = ctx.np();
        if dss.dim() != nc {
            return Err("the solvent update must have one entry per cell");
        }
        let oilpos = ctx.pu.pos(Phase::Oil)?;
        for c in 0..nc {
            let ss = f64::max(x.solvent_saturation[c] - dss[c], 0.0);
            let others: f64 = (0..np).filter(|pos| *pos != oilpos).map(|pos| x.sat(c, pos)).sum();
            x.solvent_saturation[c] = ss;
            x.saturation[c * np + oilpos] = 1.0 - ss - others;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

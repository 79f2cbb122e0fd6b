use super::{splice_out, LinearisedResidual, ModelContext, ReservoirQuantities, SolutionState, Var};
use crate::ad::Adb;
use crate::base::{Phase, ReservoirState, WellState};
use crate::StrError;
use russell_lab::Vector;

/// Defines an extra component carried by the black-oil model (a solvent or a polymer)
///
/// The black-oil model calls these hooks at fixed points of the assembly and of the Newton
/// update. The extra component owns one equation, one primary variable block (inserted right
/// after the reservoir blocks), and one entry of the reservoir quantities (at position `np`).
/// It travels with its carrier phase: gas for the solvent, water for the polymer.
pub trait ExtraComponent {
    /// Returns the phase transporting the component
    fn carrier_phase(&self) -> Phase;

    /// Returns true if the component mixes with oil and gas (effective properties are used)
    fn is_miscible(&self) -> bool {
        false
    }

    /// Returns the default scaling factor of the extra equation
    fn default_equation_scale(&self) -> f64;

    /// Extends the list of variable indices (inserts the extra block at position `np`)
    fn extend_indices(&self, np: usize, indices: &mut Vec<Option<usize>>) {
        indices.resize(Var::Extra.index() + 1, None);
        indices[Var::Extra.index()] = Some(np);
        for var in [Var::Qs, Var::Bhp] {
            if let Some(i) = indices[var.index()] {
                indices[var.index()] = Some(i + 1);
            }
        }
    }

    /// Extends the list of initial values of the primary variables
    fn extend_initials(&self, np: usize, x: &ReservoirState, initials: &mut Vec<Vector>);

    /// Extracts the extra variable and adjusts the derived saturations
    fn extract_variables(
        &self,
        ctx: &ModelContext,
        indices: &[Option<usize>],
        vars: &[Adb],
        state: &mut SolutionState,
    ) -> Result<(), StrError>;

    /// Computes the effective (mixed) properties of the given state
    fn calculate_effective_properties(&mut self, _ctx: &ModelContext, _state: &SolutionState) -> Result<(), StrError> {
        Ok(())
    }

    /// Returns the effective viscosity of the phase at `pos` (if available)
    fn effective_viscosity(&self, _pos: usize) -> Option<&Adb> {
        None
    }

    /// Returns the effective reciprocal formation volume factor of the phase at `pos` (if available)
    fn effective_reciproc_fvf(&self, _pos: usize) -> Option<&Adb> {
        None
    }

    /// Computes the relative permeabilities [krw, kro, krg] accounting for the extra component
    fn compute_rel_perm(&self, ctx: &ModelContext, state: &SolutionState) -> Result<Vec<Adb>, StrError>;

    /// Computes the accumulation term of the extra component
    fn compute_accum(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        pv_mult: &Adb,
        aix: usize,
        rq: &mut [ReservoirQuantities],
    ) -> Result<(), StrError>;

    /// Computes the mass flux of the extra component and returns the modified relative
    /// permeability of the carrier phase
    fn compute_flux(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        kr_carrier: &Adb,
        carrier_pressure: &Adb,
        rq: &mut [ReservoirQuantities],
    ) -> Result<Adb, StrError>;

    /// Assembles the mass-balance equation of the extra component
    ///
    /// ```text
    /// R = pv/dt · (accum[1] − accum[0]) + div(mflux)
    /// ```
    fn assemble_equations(
        &self,
        ctx: &ModelContext,
        pvdt: &Vector,
        rq: &[ReservoirQuantities],
        residual: &mut LinearisedResidual,
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let q = &rq[np];
        residual.material_balance_eq[np] = &(pvdt * &(&q.accum[1] - &q.accum[0])) + &(&ctx.ops.div * &q.mflux);
        Ok(())
    }

    /// Updates the scaling factor of the extra equation with the global mean of 1/b
    fn update_equations_scaling(
        &self,
        ctx: &ModelContext,
        rq: &[ReservoirQuantities],
        residual: &mut LinearisedResidual,
    ) -> Result<(), StrError> {
        let np = ctx.np();
        let local: f64 = rq[np].b.value().as_data().iter().map(|b| 1.0 / b).sum();
        let global_nc = ctx.comm.count(ctx.ncell());
        if global_nc == 0 {
            return Err("the global number of cells must be > 0");
        }
        residual.matbalscale[np] = ctx.comm.sum(local) / (global_nc as f64);
        Ok(())
    }

    /// Modifies the gas b-factors and surface densities at the perforations (connection pressures)
    fn connection_gas_properties(
        &self,
        _ctx: &ModelContext,
        _state: &SolutionState,
        _xw: &WellState,
        _avg_press: &Adb,
        _b_perf: &mut [f64],
        _surf_dens_perf: &mut [f64],
    ) -> Result<(), StrError> {
        Ok(())
    }

    /// Modifies the mobilities and b-factors at the perforations (well flux)
    fn well_mobility_and_b(
        &self,
        _ctx: &ModelContext,
        _state: &SolutionState,
        _rq: &[ReservoirQuantities],
        _mob_perf: &mut [Adb],
        _b_perf: &mut [Adb],
    ) -> Result<(), StrError> {
        Ok(())
    }

    /// Adds the share of the well flux carried by the extra component
    fn add_well_contribution(
        &self,
        ctx: &ModelContext,
        state: &SolutionState,
        xw: &WellState,
        cq_s: &[Adb],
        residual: &mut LinearisedResidual,
    ) -> Result<(), StrError>;

    /// Splits the Newton update into (base update, extra block)
    fn split_update(&self, ctx: &ModelContext, dx: &Vector) -> Result<(Vector, Vector), StrError> {
        let nc = ctx.ncell();
        splice_out(dx, nc * ctx.np(), nc)
    }

    /// Applies the extra block of the Newton update (after the base update)
    fn apply_update(&self, ctx: &ModelContext, dextra: &Vector, x: &mut ReservoirState) -> Result<(), StrError>;
}

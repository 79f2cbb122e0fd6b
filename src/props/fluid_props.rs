use crate::ad::Adb;
use crate::base::{Phase, PhaseUsage};
use crate::StrError;

/// Defines the black-oil fluid property evaluator
///
/// All functions are evaluated cell-wise and return differentiable values. Relative
/// permeabilities and capillary pressures are returned in canonical order (water, oil, gas);
/// the entries of inactive phases are zero.
pub trait FluidProps {
    /// Returns the phase usage
    fn phase_usage(&self) -> &PhaseUsage;

    /// Returns the surface density of an active fluid phase
    fn surface_density(&self, phase: Phase) -> Result<f64, StrError>;

    /// Water viscosity
    fn mu_wat(&self, pw: &Adb, t: &Adb) -> Adb;

    /// Oil viscosity
    fn mu_oil(&self, po: &Adb, t: &Adb, rs: &Adb) -> Adb;

    /// Gas viscosity
    fn mu_gas(&self, pg: &Adb, t: &Adb, rv: &Adb) -> Adb;

    /// Water reciprocal formation volume factor
    fn b_wat(&self, pw: &Adb, t: &Adb) -> Adb;

    /// Oil reciprocal formation volume factor
    fn b_oil(&self, po: &Adb, t: &Adb, rs: &Adb) -> Adb;

    /// Gas reciprocal formation volume factor
    fn b_gas(&self, pg: &Adb, t: &Adb, rv: &Adb) -> Adb;

    /// Saturated dissolved gas-oil ratio
    fn rs_sat(&self, po: &Adb, so: &Adb) -> Adb;

    /// Saturated vaporized oil-gas ratio
    fn rv_sat(&self, pg: &Adb, so: &Adb) -> Adb;

    /// Relative permeabilities [krw, kro, krg]
    fn relperm(&self, sw: &Adb, so: &Adb, sg: &Adb) -> Vec<Adb>;

    /// Capillary pressures [pcow, 0, pcgo]
    ///
    /// The water pressure is `po − pcow` and the gas pressure is `po + pcgo`.
    fn cap_press(&self, sw: &Adb, so: &Adb, sg: &Adb) -> Vec<Adb>;

    /// Critical gas saturation (gas is immobile below it)
    fn critical_gas_saturation(&self) -> f64;

    /// Critical oil saturation in the oil-gas system
    fn critical_oil_in_gas_saturation(&self) -> f64;
}

use super::Table1d;
use crate::ad::Adb;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the solvent property evaluator
pub trait SolventProps {
    /// Solvent reciprocal formation volume factor as a function of the gas pressure
    fn b_solvent(&self, pg: &Adb) -> Adb;

    /// Solvent viscosity as a function of the gas pressure
    fn mu_solvent(&self, pg: &Adb) -> Adb;

    /// Solvent surface density
    fn solvent_surface_density(&self) -> f64;

    /// Multiplier of the gas relative permeability as a function of the gas fraction 1 − F
    fn gas_relperm_multiplier(&self, gas_fraction: &Adb) -> Adb;

    /// Multiplier of the gas relative permeability yielding the solvent relative permeability,
    /// as a function of the solvent fraction F
    fn solvent_relperm_multiplier(&self, solvent_fraction: &Adb) -> Adb;

    /// Miscibility as a function of the solvent fraction (0 = immiscible; 1 = fully miscible)
    fn miscibility_function(&self, solvent_fraction: &Adb) -> Adb;

    /// Miscible critical gas saturation as a function of the water saturation
    fn miscible_critical_gas_saturation(&self, sw: &Adb) -> Adb;

    /// Miscible residual oil saturation as a function of the water saturation
    fn miscible_residual_oil_saturation(&self, sw: &Adb) -> Adb;

    /// Miscible solvent+gas relative permeability multiplier (argument: total gas fraction)
    fn miscible_solvent_gas_relperm_multiplier(&self, total_gas_fraction: &Adb) -> Adb;

    /// Miscible oil relative permeability multiplier (argument: oil fraction of the hydrocarbon)
    fn miscible_oil_relperm_multiplier(&self, oil_fraction: &Adb) -> Adb;

    /// Miscible hydrocarbon-water relative permeability (argument: hydrocarbon saturation)
    fn miscible_hc_water_relperm(&self, sn: &Adb) -> Adb;

    /// Todd–Longstaff mixing parameter for viscosity
    fn mixing_parameter_viscosity(&self) -> f64;

    /// Todd–Longstaff mixing parameter for density
    fn mixing_parameter_density(&self) -> f64;
}

/// Implements the solvent properties using piecewise-linear tables
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SolventTables {
    /// b_s(pg)
    pub b_solvent: Table1d,

    /// mu_s(pg)
    pub mu_solvent: Table1d,

    /// Surface density of the solvent
    pub rho_surface: f64,

    /// Gas relperm multiplier (SSFN, gas column)
    pub krg_mult: Table1d,

    /// Solvent relperm multiplier (SSFN, solvent column)
    pub krs_mult: Table1d,

    /// Miscibility function (MISC)
    pub misc: Table1d,

    /// Miscible critical gas saturation (SGCWMIS)
    pub sgcwmis: Table1d,

    /// Miscible residual oil saturation (SORWMIS)
    pub sorwmis: Table1d,

    /// Miscible solvent+gas relperm multiplier (MSFN)
    pub mkrsg: Table1d,

    /// Miscible oil relperm multiplier (MSFN)
    pub mkro: Table1d,

    /// Miscible hydrocarbon-water relperm (SOF2)
    pub mkrn: Table1d,

    /// Viscosity mixing parameter
    pub omega_viscosity: f64,

    /// Density mixing parameter
    pub omega_density: f64,
}

impl SolventTables {
    /// Allocates a new instance
    ///
    /// The relative permeability multipliers are the identity, the miscibility is full, the
    /// miscible end-points are zero, and both mixing parameters are one.
    pub fn new(b_solvent: Table1d, mu_solvent: Table1d, rho_surface: f64) -> Result<Self, StrError> {
        if rho_surface <= 0.0 {
            return Err("solvent surface density must be > 0.0");
        }
        Ok(SolventTables {
            b_solvent,
            mu_solvent,
            rho_surface,
            krg_mult: Table1d::unit_ramp(),
            krs_mult: Table1d::unit_ramp(),
            misc: Table1d::constant(1.0),
            sgcwmis: Table1d::constant(0.0),
            sorwmis: Table1d::constant(0.0),
            mkrsg: Table1d::unit_ramp(),
            mkro: Table1d::unit_ramp(),
            mkrn: Table1d::unit_ramp(),
            omega_viscosity: 1.0,
            omega_density: 1.0,
        })
    }

    /// Sets the Todd–Longstaff mixing parameters
    pub fn set_mixing_parameters(&mut self, omega_viscosity: f64, omega_density: f64) -> Result<&mut Self, StrError> {
        if omega_viscosity < 0.0 || omega_viscosity > 1.0 || omega_density < 0.0 || omega_density > 1.0 {
            return Err("mixing parameters must be in [0, 1]");
        }
        self.omega_viscosity = omega_viscosity;
        self.omega_density = omega_density;
        Ok(self)
    }

    /// Sets the miscibility function
    pub fn set_miscibility(&mut self, misc: Table1d) -> &mut Self {
        self.misc = misc;
        self
    }
}

impl SolventProps for SolventTables {
    fn b_solvent(&self, pg: &Adb) -> Adb {
        self.b_solvent.eval_adb(pg)
    }

    fn mu_solvent(&self, pg: &Adb) -> Adb {
        self.mu_solvent.eval_adb(pg)
    }

    fn solvent_surface_density(&self) -> f64 {
        self.rho_surface
    }

    fn gas_relperm_multiplier(&self, gas_fraction: &Adb) -> Adb {
        self.krg_mult.eval_adb(gas_fraction)
    }

    fn solvent_relperm_multiplier(&self, solvent_fraction: &Adb) -> Adb {
        self.krs_mult.eval_adb(solvent_fraction)
    }

    fn miscibility_function(&self, solvent_fraction: &Adb) -> Adb {
        self.misc.eval_adb(solvent_fraction)
    }

    fn miscible_critical_gas_saturation(&self, sw: &Adb) -> Adb {
        self.sgcwmis.eval_adb(sw)
    }

    fn miscible_residual_oil_saturation(&self, sw: &Adb) -> Adb {
        self.sorwmis.eval_adb(sw)
    }

    fn miscible_solvent_gas_relperm_multiplier(&self, total_gas_fraction: &Adb) -> Adb {
        self.mkrsg.eval_adb(total_gas_fraction)
    }

    fn miscible_oil_relperm_multiplier(&self, oil_fraction: &Adb) -> Adb {
        self.mkro.eval_adb(oil_fraction)
    }

    fn miscible_hc_water_relperm(&self, sn: &Adb) -> Adb {
        self.mkrn.eval_adb(sn)
    }

    fn mixing_parameter_viscosity(&self) -> f64 {
        self.omega_viscosity
    }

    fn mixing_parameter_density(&self) -> f64 {
        self.omega_density
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{SolventProps, SolventTables};
    use crate::ad::Adb;
    use crate::props::Table1d;
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn new_handles_errors() {
        assert_eq!(
            SolventTables::new(Table1d::constant(1.0), Table1d::constant(1.0), 0.0).err(),
            Some("solvent surface density must be > 0.0")
        );
        let mut tables = SolventTables::new(Table1d::constant(1.0), Table1d::constant(1.0), 1.0).unwrap();
        assert_eq!(
            tables.set_mixing_parameters(1.5, 0.0).err(),
            Some("mixing parameters must be in [0, 1]")
        );
    }

    #[test]
    fn multipliers_reconstruct_gas_relperm_at_the_ends() {
        let tables = SolventTables::new(Table1d::constant(1.0), Table1d::constant(1.0), 1.0).unwrap();
        let krg = 0.35;
        for f in [0.0, 1.0] {
            let frac = Adb::constant(Vector::from(&[f]));
            let gas = tables.gas_relperm_multiplier(&(1.0 - &frac)).at(0) * krg;
            let solvent = tables.solvent_relperm_multiplier(&frac).at(0) * krg;
            approx_eq(gas + solvent, krg, 1e-15);
        }
    }

    #[test]
    fn tables_are_evaluated() {
        let b_s = Table1d::new(&[100.0, 200.0], &[1.0, 2.0]).unwrap();
        let mut tables = SolventTables::new(b_s, Table1d::constant(0.05), 0.9).unwrap();
        tables.set_mixing_parameters(0.5, 0.25).unwrap();
        let p = Adb::variables(&[Vector::from(&[150.0])]);
        let b = tables.b_solvent(&p[0]);
        approx_eq(b.at(0), 1.5, 1e-15);
        approx_eq(b.derivative()[0].get(0, 0), 0.01, 1e-15);
        assert_eq!(tables.mu_solvent(&p[0]).at(0), 0.05);
        assert_eq!(tables.solvent_surface_density(), 0.9);
        assert_eq!(tables.mixing_parameter_viscosity(), 0.5);
        assert_eq!(tables.mixing_parameter_density(), 0.25);
        assert_eq!(tables.miscibility_function(&p[0]).at(0), 1.0);
    }
}

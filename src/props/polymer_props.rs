use super::Table1d;
use crate::ad::Adb;
use crate::StrError;

/// Defines the properties of a polymer dissolved in the water phase
pub trait PolymerProps {
    /// Returns the viscosity multiplier of the fully mixed water-polymer solution
    fn viscosity_multiplier(&self, c: &Adb) -> Adb;

    /// Returns the maximum polymer concentration (injected concentration of pure polymer solution)
    fn max_concentration(&self) -> f64;

    /// Returns the Todd-Longstaff mixing parameter of the water-polymer mixture
    fn mixing_parameter(&self) -> f64;

    /// Returns the fraction of the pore volume that is not accessible to the polymer
    fn dead_pore_volume(&self) -> f64;

    /// Returns the adsorbed polymer mass per unit of pore volume
    fn adsorption(&self, c: &Adb) -> Adb;
}

/// Implements tabulated polymer properties
#[derive(Clone, Debug)]
pub struct PolymerTables {
    /// Viscosity multiplier as a function of the concentration
    pub visc_mult: Table1d,

    /// Adsorbed mass per unit of rock mass as a function of the concentration
    pub adsorption: Table1d,

    /// Maximum polymer concentration
    pub c_max: f64,

    /// Todd-Longstaff mixing parameter ω ∈ [0, 1]
    pub omega: f64,

    /// Inaccessible pore volume fraction
    pub dead_pore_volume: f64,

    /// Rock density
    pub rock_density: f64,

    /// Reference porosity
    pub porosity: f64,
}

impl PolymerTables {
    /// Allocates a new instance without adsorption and without inaccessible pore volume
    ///
    /// The mixing is complete (ω = 1).
    pub fn new(visc_mult: Table1d, c_max: f64) -> Result<Self, StrError> {
        if c_max <= 0.0 {
            return Err("the maximum polymer concentration must be > 0.0");
        }
        Ok(PolymerTables {
            visc_mult,
            adsorption: Table1d::constant(0.0),
            c_max,
            omega: 1.0,
            dead_pore_volume: 0.0,
            rock_density: 0.0,
            porosity: 1.0,
        })
    }

    /// Sets the Todd-Longstaff mixing parameter
    pub fn set_mixing_parameter(&mut self, omega: f64) -> Result<&mut Self, StrError> {
        if omega < 0.0 || omega > 1.0 {
            return Err("the mixing parameter must be in [0, 1]");
        }
        self.omega = omega;
        Ok(self)
    }

    /// Sets the inaccessible pore volume fraction
    pub fn set_dead_pore_volume(&mut self, fraction: f64) -> Result<&mut Self, StrError> {
        if fraction < 0.0 || fraction >= 1.0 {
            return Err("the dead pore volume fraction must be in [0, 1)");
        }
        self.dead_pore_volume = fraction;
        Ok(self)
    }

    /// Sets the adsorption isotherm and the rock data converting it to pore volume units
    pub fn set_adsorption(
        &mut self,
        adsorption: Table1d,
        rock_density: f64,
        porosity: f64,
    ) -> Result<&mut Self, StrError> {
        if rock_density < 0.0 {
            return Err("the rock density must be ≥ 0.0");
        }
        if porosity <= 0.0 || porosity > 1.0 {
            return Err("the porosity must be in (0, 1]");
        }
        self.adsorption = adsorption;
        self.rock_density = rock_density;
        self.porosity = porosity;
        Ok(self)
    }
}

impl PolymerProps for PolymerTables {
    fn viscosity_multiplier(&self, c: &Adb) -> Adb {
        self.visc_mult.eval_adb(c)
    }

    fn max_concentration(&self) -> f64 {
        self.c_max
    }

    fn mixing_parameter(&self) -> f64 {
        self.omega
    }

    fn dead_pore_volume(&self) -> f64 {
        self.dead_pore_volume
    }

    fn adsorption(&self, c: &Adb) -> Adb {
        let factor = self.rock_density * (1.0 - self.porosity) / self.porosity;
        &self.adsorption.eval_adb(c) * factor
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PolymerProps, PolymerTables};
    use crate::ad::Adb;
    use crate::props::Table1d;
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn new_and_setters_handle_errors() {
        let visc_mult = Table1d::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert_eq!(
            PolymerTables::new(visc_mult.clone(), 0.0).err(),
            Some("the maximum polymer concentration must be > 0.0")
        );
        let mut tables = PolymerTables::new(visc_mult, 2.0).unwrap();
        assert_eq!(
            tables.set_mixing_parameter(1.5).err(),
            Some("the mixing parameter must be in [0, 1]")
        );
        assert_eq!(
            tables.set_dead_pore_volume(1.0).err(),
            Some("the dead pore volume fraction must be in [0, 1)")
        );
        assert_eq!(
            tables.set_adsorption(Table1d::constant(0.0), -1.0, 0.2).err(),
            Some("the rock density must be ≥ 0.0")
        );
        assert_eq!(
            tables.set_adsorption(Table1d::constant(0.0), 2.0, 0.0).err(),
            Some("the porosity must be in (0, 1]")
        );
    }

    #[test]
    fn properties_are_correct() {
        let visc_mult = Table1d::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        let mut tables = PolymerTables::new(visc_mult, 2.0).unwrap();
        let adsorption = Table1d::new(&[0.0, 2.0], &[0.0, 1e-3]).unwrap();
        tables.set_adsorption(adsorption, 2000.0, 0.2).unwrap();
        let c = Adb::constant(Vector::from(&[0.0, 1.0, 2.0]));
        let mult = tables.viscosity_multiplier(&c);
        approx_eq(mult.at(0), 1.0, 1e-15);
        approx_eq(mult.at(1), 3.0, 1e-15);
        approx_eq(mult.at(2), 5.0, 1e-15);
        // 0.5e-3 · 2000 · 0.8 / 0.2
        let ads = tables.adsorption(&c);
        approx_eq(ads.at(1), 4.0, 1e-12);
        assert_eq!(tables.max_concentration(), 2.0);
        assert_eq!(tables.mixing_parameter(), 1.0);
        assert_eq!(tables.dead_pore_volume(), 0.0);
    }
}

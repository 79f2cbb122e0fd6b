use super::{ReservoirState, WellControl, WellType, Wells};
use crate::StrError;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};

/// Holds the state of all wells
///
/// Rates are stored well-major: `well_rates[w * np + phase]` and
/// `perf_phase_rates[perf * np + phase]`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WellState {
    /// Bottom-hole pressure of each well
    pub bhp: Vector,

    /// Surface rates of each well (nw × np)
    pub well_rates: Vector,

    /// Index of the active control of each well
    pub current_controls: Vec<usize>,

    /// Pressure at each perforation
    pub perf_press: Vector,

    /// Surface rates at each perforation (nperf × np)
    pub perf_phase_rates: Vector,

    /// Fraction of the injected gas stream that is solvent (per perforation)
    pub solvent_fraction: Vector,

    /// Polymer concentration of the injected water stream (per perforation)
    pub polymer_concentration: Vector,
}

impl WellState {
    /// Allocates a new instance consistent with the well controls and the reservoir state
    ///
    /// The bottom-hole pressure equals the target of BHP-controlled wells; otherwise it is
    /// slightly above (injectors) or below (producers) the pressure of the first perforated
    /// cell. Wells under rate control start at their target rates.
    pub fn new(wells: &Wells, x: &ReservoirState) -> Result<Self, StrError> {
        let np = wells.number_of_phases;
        let nw = wells.number_of_wells();
        let nperf = wells.number_of_perforations();
        if wells.well_cells.iter().any(|c| *c >= x.ncell()) {
            return Err("perforated cell index is out of bounds");
        }
        let mut bhp = Vector::new(nw);
        let mut well_rates = Vector::new(nw * np);
        for w in 0..nw {
            let first_cell = wells.well_cells[wells.well_connpos[w]];
            match &wells.controls[w][0] {
                WellControl::Bhp { target } => bhp[w] = *target,
                WellControl::SurfaceRate { target, distr } => {
                    let factor = match wells.kind[w] {
                        WellType::Injector => 1.01,
                        WellType::Producer => 0.99,
                    };
                    bhp[w] = factor * x.pressure[first_cell];
                    for p in 0..np {
                        if distr[p] > 0.0 {
                            well_rates[w * np + p] = target * distr[p];
                        }
                    }
                }
            }
        }
        let perf_press = Vector::from(&wells.well_cells.iter().map(|c| x.pressure[*c]).collect::<Vec<_>>());
        Ok(WellState {
            bhp,
            well_rates,
            current_controls: vec![0; nw],
            perf_press,
            perf_phase_rates: Vector::new(nperf * np),
            solvent_fraction: Vector::new(nperf),
            polymer_concentration: Vector::new(nperf),
        })
    }

    /// Sets the injected solvent fraction at all perforations of a well
    pub fn set_solvent_fraction(&mut self, wells: &Wells, w: usize, fraction: f64) -> Result<(), StrError> {
        if w >= wells.number_of_wells() {
            return Err("well index is out of bounds");
        }
        if !(0.0..=1.0).contains(&fraction) {
            return Err("solvent fraction must be in [0, 1]");
        }
        for perf in wells.perforations(w) {
            self.solvent_fraction[perf] = fraction;
        }
        Ok(())
    }

    /// Sets the injected polymer concentration at all perforations of a well
    pub fn set_polymer_concentration(&mut self, wells: &Wells, w: usize, c: f64) -> Result<(), StrError> {
        if w >= wells.number_of_wells() {
            return Err("well index is out of bounds");
        }
        if c < 0.0 {
            return Err("polymer concentration must be ≥ 0.0");
        }
        for perf in wells.perforations(w) {
            self.polymer_concentration[perf] = c;
        }
        Ok(())
    }

    /// Checks that the arrays match the well topology
    pub fn check(&self, wells: &Wells) -> Result<(), StrError> {
        let np = wells.number_of_phases;
        let nw = wells.number_of_wells();
        let nperf = wells.number_of_perforations();
        if self.bhp.dim() != nw || self.current_controls.len() != nw || self.well_rates.dim() != nw * np {
            return Err("well state does not match the number of wells");
        }
        if self.perf_press.dim() != nperf
            || self.perf_phase_rates.dim() != nperf * np
            || self.solvent_fraction.dim() != nperf
            || self.polymer_concentration.dim() != nperf
        {
            return Err("well state does not match the number of perforations");
        }
        for w in 0..nw {
            if self.current_controls[w] >= wells.controls[w].len() {
                return Err("current control index is out of bounds");
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

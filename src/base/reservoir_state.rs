use super::HydroCarbonState;
use crate::StrError;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the per-cell state of the reservoir
///
/// Saturations are stored cell-major: `saturation[c * np + pos]`. The solvent saturation is
/// stored separately; the saturations of the active phases plus the solvent sum up to one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReservoirState {
    /// Number of active phases
    pub num_phases: usize,

    /// Oil pressure
    pub pressure: Vector,

    /// Temperature
    pub temperature: Vector,

    /// Saturations (nc × np)
    pub saturation: Vector,

    /// Dissolved gas-oil ratio
    pub rs: Vector,

    /// Vaporized oil-gas ratio
    pub rv: Vector,

    /// Solvent saturation
    pub solvent_saturation: Vector,

    /// Polymer concentration in the water phase
    pub polymer_concentration: Vector,

    /// Hydrocarbon state of each cell (selects the meaning of the mixed variable)
    pub hydrocarbon_state: Vec<HydroCarbonState>,
}

impl ReservoirState {
    /// Allocates a new instance with uniform values
    ///
    /// # Input
    ///
    /// * `ncell` -- number of cells
    /// * `pressure` -- initial pressure
    /// * `temperature` -- initial temperature
    /// * `sat` -- saturation of each active phase (np entries)
    pub fn new(ncell: usize, pressure: f64, temperature: f64, sat: &[f64]) -> Result<Self, StrError> {
        let np = sat.len();
        if np < 1 {
            return Err("at least one phase saturation must be given");
        }
        if sat.iter().any(|s| *s < 0.0) {
            return Err("saturations must be ≥ 0.0");
        }
        let sum: f64 = sat.iter().sum();
        if f64::abs(sum - 1.0) > 1e-12 {
            return Err("saturations must sum up to one");
        }
        let mut saturation = Vector::new(ncell * np);
        for c in 0..ncell {
            for p in 0..np {
                saturation[c * np + p] = sat[p];
            }
        }
        Ok(ReservoirState {
            num_phases: np,
            pressure: Vector::filled(ncell, pressure),
            temperature: Vector::filled(ncell, temperature),
            saturation,
            rs: Vector::new(ncell),
            rv: Vector::new(ncell),
            solvent_saturation: Vector::new(ncell),
            polymer_concentration: Vector::new(ncell),
            hydrocarbon_state: vec![HydroCarbonState::GasAndOil; ncell],
        })
    }

    /// Returns the number of cells
    pub fn ncell(&self) -> usize {
        self.pressure.dim()
    }

    /// Returns the saturation of the phase at active position `pos` in cell `c`
    pub fn sat(&self, c: usize, pos: usize) -> f64 {
        self.saturation[c * self.num_phases + pos]
    }

    /// Returns the saturations of the phase at active position `pos` for all cells
    pub fn sat_column(&self, pos: usize) -> Vector {
        let nc = self.ncell();
        let data: Vec<f64> = (0..nc).map(|c| self.sat(c, pos)).collect();
        Vector::from(&data)
    }

    /// Sets the solvent saturation of a cell, taking the same amount from the phase at `from_pos`
    pub fn set_solvent_saturation(&mut self, c: usize, ss: f64, from_pos: usize) -> Result<(), StrError> {
        let old = self.solvent_saturation[c];
        let target = self.saturation[c * self.num_phases + from_pos] + old - ss;
        if ss < 0.0 || target < 0.0 {
            return Err("solvent saturation makes a saturation negative");
        }
        self.saturation[c * self.num_phases + from_pos] = target;
        self.solvent_saturation[c] = ss;
        Ok(())
    }

    /// Checks the dimensions of all arrays
    pub fn check(&self, ncell: usize, num_phases: usize) -> Result<(), StrError> {
        if self.num_phases != num_phases {
            return Err("reservoir state has an incorrect number of phases");
        }
        if self.pressure.dim() != ncell
            || self.temperature.dim() != ncell
            || self.rs.dim() != ncell
            || self.rv.dim() != ncell
            || self.solvent_saturation.dim() != ncell
            || self.polymer_concentration.dim() != ncell
            || self.hydrocarbon_state.len() != ncell
        {
            return Err("reservoir state arrays must have one entry per cell");
        }
        if self.saturation.dim() != ncell * num_phases {
            return Err("reservoir state saturation must have ncell × np entries");
        }
        Ok(())
    }

    /// Reads a JSON file with the state
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let state = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(state)
    }

    /// Writes a JSON file with the state
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

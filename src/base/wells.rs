use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the well type
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum WellType {
    Injector,
    Producer,
}

/// Defines a well control (constraint)
///
/// Rates are surface rates with the sign convention: injection > 0 and production < 0.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum WellControl {
    /// Bottom-hole pressure target
    Bhp { target: f64 },

    /// Surface rate target: Σ distr[phase] · q[phase] = target
    SurfaceRate { target: f64, distr: Vec<f64> },
}

impl WellControl {
    /// Returns the target value
    pub fn target(&self) -> f64 {
        match self {
            WellControl::Bhp { target } => *target,
            WellControl::SurfaceRate { target, .. } => *target,
        }
    }

    /// Returns a short description
    pub fn mode(&self) -> &'static str {
        match self {
            WellControl::Bhp { .. } => "BHP",
            WellControl::SurfaceRate { .. } => "SURFACE_RATE",
        }
    }
}

/// Holds the definition of one well (used to build `Wells`)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WellSpec {
    /// Name of the well
    pub name: String,

    /// Injector or producer
    pub kind: WellType,

    /// Reference depth of the bottom-hole pressure
    pub depth_ref: f64,

    /// Composition of the injected stream (one entry per active phase)
    pub comp_frac: Vec<f64>,

    /// Perforated cells, ordered from the top to the bottom
    pub cells: Vec<usize>,

    /// Well index (connection transmissibility) of each perforation
    pub wi: Vec<f64>,

    /// Controls; the first one is the initial control
    pub controls: Vec<WellControl>,
}

/// Holds the well topology in a flattened layout
///
/// The perforations of well `w` are `well_connpos[w]..well_connpos[w+1]`.
#[derive(Clone, Debug)]
pub struct Wells {
    /// Number of active phases
    pub number_of_phases: usize,

    /// Well names
    pub name: Vec<String>,

    /// Well types
    pub kind: Vec<WellType>,

    /// Reference depths
    pub depth_ref: Vec<f64>,

    /// Injection composition (nw × np, well-major)
    pub comp_frac: Vec<f64>,

    /// Perforation offsets (nw + 1)
    pub well_connpos: Vec<usize>,

    /// Perforated cells (nperf)
    pub well_cells: Vec<usize>,

    /// Well indices (nperf)
    pub wi: Vec<f64>,

    /// Controls of each well
    pub controls: Vec<Vec<WellControl>>,
}

impl Wells {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `np` -- number of active phases
    /// * `ncell` -- number of cells of the grid (to check perforated cells)
    /// * `specs` -- definition of each well
    pub fn new(np: usize, ncell: usize, specs: &[WellSpec]) -> Result<Self, StrError> {
        let mut wells = Wells {
            number_of_phases: np,
            name: Vec::new(),
            kind: Vec::new(),
            depth_ref: Vec::new(),
            comp_frac: Vec::new(),
            well_connpos: vec![0],
            well_cells: Vec::new(),
            wi: Vec::new(),
            controls: Vec::new(),
        };
        for spec in specs {
            if spec.comp_frac.len() != np {
                return Err("comp_frac must have one entry per active phase");
            }
            if spec.cells.is_empty() {
                return Err("a well must have at least one perforation");
            }
            if spec.wi.len() != spec.cells.len() {
                return Err("wi must have one entry per perforation");
            }
            if spec.cells.iter().any(|c| *c >= ncell) {
                return Err("perforated cell index is out of bounds");
            }
            if spec.controls.is_empty() {
                return Err("a well must have at least one control");
            }
            for control in &spec.controls {
                if let WellControl::SurfaceRate { distr, .. } = control {
                    if distr.len() != np {
                        return Err("control distr must have one entry per active phase");
                    }
                }
            }
            wells.name.push(spec.name.clone());
            wells.kind.push(spec.kind);
            wells.depth_ref.push(spec.depth_ref);
            wells.comp_frac.extend_from_slice(&spec.comp_frac);
            wells.well_cells.extend_from_slice(&spec.cells);
            wells.wi.extend_from_slice(&spec.wi);
            wells.well_connpos.push(wells.well_cells.len());
            wells.controls.push(spec.controls.clone());
        }
        Ok(wells)
    }

    /// Returns the number of wells
    pub fn number_of_wells(&self) -> usize {
        self.name.len()
    }

    /// Returns the total number of perforations
    pub fn number_of_perforations(&self) -> usize {
        self.well_cells.len()
    }

    /// Returns the range of perforations of a well
    pub fn perforations(&self, w: usize) -> std::ops::Range<usize> {
        self.well_connpos[w]..self.well_connpos[w + 1]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{WellControl, WellSpec, WellType, Wells};

    fn injector() -> WellSpec {
        WellSpec {
            name: "INJ".to_string(),
            kind: WellType::Injector,
            depth_ref: 0.0,
            comp_frac: vec![0.0, 1.0],
            cells: vec![0, 1],
            wi: vec![1.0, 2.0],
            controls: vec![WellControl::Bhp { target: 150.0 }],
        }
    }

    #[test]
    fn new_handles_errors() {
        let mut spec = injector();
        spec.comp_frac = vec![1.0];
        assert_eq!(
            Wells::new(2, 2, &[spec]).err(),
            Some("comp_frac must have one entry per active phase")
        );
        let mut spec = injector();
        spec.wi = vec![1.0];
        assert_eq!(Wells::new(2, 2, &[spec]).err(), Some("wi must have one entry per perforation"));
        assert_eq!(
            Wells::new(2, 1, &[injector()]).err(),
            Some("perforated cell index is out of bounds")
        );
        let mut spec = injector();
        spec.controls = vec![WellControl::SurfaceRate {
            target: 1.0,
            distr: vec![1.0],
        }];
        assert_eq!(
            Wells::new(2, 2, &[spec]).err(),
            Some("control distr must have one entry per active phase")
        );
    }

    #[test]
    fn new_works() {
        let mut producer = injector();
        producer.name = "PROD".to_string();
        producer.kind = WellType::Producer;
        producer.cells = vec![1];
        producer.wi = vec![3.0];
        let wells = Wells::new(2, 2, &[injector(), producer]).unwrap();
        assert_eq!(wells.number_of_wells(), 2);
        assert_eq!(wells.number_of_perforations(), 3);
        assert_eq!(wells.well_connpos, &[0, 2, 3]);
        assert_eq!(wells.perforations(1), 2..3);
        assert_eq!(wells.comp_frac, &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(wells.controls[0][0].mode(), "BHP");
        assert_eq!(wells.controls[0][0].target(), 150.0);
    }
}

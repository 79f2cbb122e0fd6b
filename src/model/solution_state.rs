use crate::ad::Adb;

/// Defines the groups of primary variables
///
/// The discriminant is the position of the group in the list of variable indices.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Var {
    Pressure = 0,
    Sw = 1,
    Xvar = 2,
    Qs = 3,
    Bhp = 4,
    /// Solvent saturation or polymer concentration
    Extra = 5,
}

impl Var {
    /// Returns the position in the list of variable indices
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Number of variable groups without extra components
pub const NUM_BASE_VARS: usize = 5;

/// Holds the differentiable view of the primary and derived variables of one assembly pass
///
/// `saturation` is indexed by the active phase position; `canonical_phase_pressures` is
/// indexed by the canonical phase (water, oil, gas).
#[derive(Clone, Debug)]
pub struct SolutionState {
    pub pressure: Adb,
    pub temperature: Adb,
    pub saturation: Vec<Adb>,
    pub rs: Adb,
    pub rv: Adb,
    pub qs: Adb,
    pub bhp: Adb,
    pub canonical_phase_pressures: Vec<Adb>,
    pub solvent_saturation: Adb,
    pub polymer_concentration: Adb,
}

impl SolutionState {
    /// Allocates an empty state for `np` active phases
    pub fn new(np: usize) -> Self {
        let null = Adb::constant_filled(0, 0.0);
        SolutionState {
            pressure: null.clone(),
            temperature: null.clone(),
            saturation: vec![null.clone(); np],
            rs: null.clone(),
            rv: null.clone(),
            qs: null.clone(),
            bhp: null.clone(),
            canonical_phase_pressures: vec![null.clone(); 3],
            solvent_saturation: null.clone(),
            polymer_concentration: null,
        }
    }

    /// Returns a copy without derivatives
    pub fn to_constant(&self) -> SolutionState {
        SolutionState {
            pressure: self.pressure.to_constant(),
            temperature: self.temperature.to_constant(),
            saturation: self.saturation.iter().map(|s| s.to_constant()).collect(),
            rs: self.rs.to_constant(),
            rv: self.rv.to_constant(),
            qs: self.qs.to_constant(),
            bhp: self.bhp.to_constant(),
            canonical_phase_pressures: self.canonical_phase_pressures.iter().map(|p| p.to_constant()).collect(),
            solvent_saturation: self.solvent_saturation.to_constant(),
            polymer_concentration: self.polymer_concentration.to_constant(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

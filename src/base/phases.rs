use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the canonical phases (and pseudo-phases)
///
/// The canonical index does not depend on which phases are active. The solvent pseudo-phase
/// has no canonical position in the saturation array; it occupies the active position
/// `num_phases` in the equation and quantity arrays.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Phase {
    Water,
    Oil,
    Gas,
    Solvent,
}

/// Number of canonical fluid phases (water, oil, gas)
pub const MAX_NUM_PHASES: usize = 3;

impl Phase {
    /// Returns the canonical index
    pub fn index(&self) -> usize {
        match self {
            Phase::Water => 0,
            Phase::Oil => 1,
            Phase::Gas => 2,
            Phase::Solvent => 3,
        }
    }

    /// Returns the phase corresponding to a canonical index
    pub fn from_index(index: usize) -> Result<Self, StrError> {
        match index {
            0 => Ok(Phase::Water),
            1 => Ok(Phase::Oil),
            2 => Ok(Phase::Gas),
            3 => Ok(Phase::Solvent),
            _ => Err("unknown phase index"),
        }
    }
}

/// Maps the canonical fluid phases to active positions
///
/// The mapping is fixed for a run and determines the layout of all per-phase arrays.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PhaseUsage {
    /// Number of active fluid phases
    pub num_phases: usize,

    /// Indicates whether each canonical phase is active
    pub phase_used: [bool; MAX_NUM_PHASES],

    /// Active position of each canonical phase (meaningless if inactive)
    pub phase_pos: [usize; MAX_NUM_PHASES],
}

impl PhaseUsage {
    /// Allocates a new instance
    ///
    /// The oil phase must be active.
    pub fn new(water: bool, oil: bool, gas: bool) -> Result<Self, StrError> {
        if !oil {
            return Err("the oil phase must be active");
        }
        let phase_used = [water, oil, gas];
        let mut phase_pos = [usize::MAX; MAX_NUM_PHASES];
        let mut num_phases = 0;
        for i in 0..MAX_NUM_PHASES {
            if phase_used[i] {
                phase_pos[i] = num_phases;
                num_phases += 1;
            }
        }
        Ok(PhaseUsage {
            num_phases,
            phase_used,
            phase_pos,
        })
    }

    /// Returns true if the canonical phase is active
    pub fn active(&self, phase: Phase) -> bool {
        match phase {
            Phase::Solvent => false,
            _ => self.phase_used[phase.index()],
        }
    }

    /// Returns the active position of a fluid phase
    pub fn pos(&self, phase: Phase) -> Result<usize, StrError> {
        if !self.active(phase) {
            return Err("unknown phase index");
        }
        Ok(self.phase_pos[phase.index()])
    }

    /// Returns the canonical phase at an active position
    pub fn canonical(&self, pos: usize) -> Result<Phase, StrError> {
        for i in 0..MAX_NUM_PHASES {
            if self.phase_used[i] && self.phase_pos[i] == pos {
                return Phase::from_index(i);
            }
        }
        Err("unknown phase index")
    }
}

/// Defines which hydrocarbon phases are present in a cell and thus what the mixed variable means
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum HydroCarbonState {
    /// Both gas and oil are present; the mixed variable is the gas saturation
    GasAndOil,

    /// Only oil is present; the mixed variable is the dissolved gas-oil ratio (rs)
    OilOnly,

    /// Only gas is present; the mixed variable is the vaporized oil-gas ratio (rv)
    GasOnly,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::ad::Adb;

/// Holds the per-cell quantities of one phase (or pseudo-phase) computed during assembly
#[derive(Clone, Debug)]
pub struct ReservoirQuantities {
    /// Accumulation at the old (0) and new (1) time levels
    pub accum: [Adb; 2],

    /// Mass flux on the internal faces
    pub mflux: Adb,

    /// Reciprocal formation volume factor
    pub b: Adb,

    /// Viscosity
    pub mu: Adb,

    /// Density
    pub rho: Adb,

    /// Relative permeability
    pub kr: Adb,

    /// Head difference on the internal faces
    pub dh: Adb,

    /// Mobility
    pub mob: Adb,
}

impl ReservoirQuantities {
    /// Allocates a new instance with empty values
    pub fn new() -> Self {
        let null = Adb::constant_filled(0, 0.0);
        ReservoirQuantities {
            accum: [null.clone(), null.clone()],
            mflux: null.clone(),
            b: null.clone(),
            mu: null.clone(),
            rho: null.clone(),
            kr: null.clone(),
            dh: null.clone(),
            mob: null,
        }
    }
}

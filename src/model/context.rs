use super::WellOps;
use crate::ad::{Adb, HelperOps, UpwindSelector};
use crate::base::{Communicator, Config, Grid, Phase, PhaseUsage, WellType, Wells};
use crate::props::{FluidProps, RockCompressibility};
use crate::StrError;
use russell_lab::Vector;

/// Holds the read-only data shared by all assembly stages
///
/// The context collects the configuration, the grid and well topology, the property
/// evaluators, and the discrete operators derived from them.
pub struct ModelContext<'a> {
    /// Configuration (fixed for a run)
    pub config: Config,

    /// Phase usage
    pub pu: PhaseUsage,

    /// Grid topology
    pub grid: &'a Grid,

    /// Well topology
    pub wells: &'a Wells,

    /// Black-oil fluid properties
    pub fluid: &'a dyn FluidProps,

    /// Rock compressibility
    pub rock: &'a RockCompressibility,

    /// Reduction over all processes
    pub comm: &'a dyn Communicator,

    /// Discrete gradient, divergence, and face average
    pub ops: HelperOps,

    /// Well/perforation operators
    pub wops: WellOps,

    /// Pore volumes
    pub pv: Vector,

    /// Transmissibilities of the internal faces
    pub trans: Vector,

    /// Gravity times the depth difference across each internal face
    pub gdz: Vector,
}

impl<'a> ModelContext<'a> {
    /// Allocates a new instance
    pub fn new(
        config: &Config,
        grid: &'a Grid,
        wells: &'a Wells,
        fluid: &'a dyn FluidProps,
        rock: &'a RockCompressibility,
        comm: &'a dyn Communicator,
    ) -> Result<Self, StrError> {
        let pu = PhaseUsage::new(config.water, config.oil, config.gas)?;
        if fluid.phase_usage() != &pu {
            return Err("the phase usage of the fluid does not match the configuration");
        }
        if wells.number_of_phases != pu.num_phases {
            return Err("the wells must have one composition entry per active phase");
        }
        if wells.well_cells.iter().any(|c| *c >= grid.ncell()) {
            return Err("perforated cell index is out of bounds");
        }
        let ops = HelperOps::new(grid.ncell(), &grid.face_cells)?;
        let wops = WellOps::new(wells)?;
        let dz = ops.ngrad.mul_vec(&grid.depth);
        let gdz = Vector::from(&dz.iter().map(|d| config.gravity * d).collect::<Vec<_>>());
        Ok(ModelContext {
            config: config.clone(),
            pu,
            grid,
            wells,
            fluid,
            rock,
            comm,
            ops,
            wops,
            pv: Vector::from(&grid.pore_volume),
            trans: Vector::from(&grid.transmissibility),
            gdz,
        })
    }

    /// Returns the number of cells
    pub fn ncell(&self) -> usize {
        self.grid.ncell()
    }

    /// Returns the number of active fluid phases
    pub fn np(&self) -> usize {
        self.pu.num_phases
    }

    /// Returns the number of wells
    pub fn nw(&self) -> usize {
        self.wells.number_of_wells()
    }

    /// Returns the number of perforations
    pub fn nperf(&self) -> usize {
        self.wells.number_of_perforations()
    }

    /// Returns the saturation of a fluid phase, or zeros if the phase is inactive
    pub fn saturation_or_zero(&self, saturation: &[Adb], phase: Phase) -> Adb {
        match self.pu.pos(phase) {
            Ok(pos) => saturation[pos].clone(),
            Err(_) => Adb::constant_filled(self.ncell(), 0.0),
        }
    }

    /// Returns one at the perforations of producers and zero at the perforations of injectors
    pub fn producer_perforations(&self) -> Vector {
        let mut is_prod = Vector::new(self.nperf());
        for w in 0..self.nw() {
            if self.wells.kind[w] == WellType::Producer {
                for perf in self.wells.perforations(w) {
                    is_prod[perf] = 1.0;
                }
            }
        }
        is_prod
    }

    /// Computes the head difference and the upwinded mass flux over the internal faces
    ///
    /// ```text
    /// dh    = ngrad·p − g · caver(rho) · ngrad·z
    /// mflux = upwind(b·mob) · trans · dh
    /// ```
    ///
    /// Returns `(dh, mflux)`.
    pub fn upwind_mass_flux(
        &self,
        b: &Adb,
        mob: &Adb,
        rho: &Adb,
        phase_pressure: &Adb,
        trans: &Vector,
    ) -> Result<(Adb, Adb), StrError> {
        let rho_avg = &self.ops.caver * rho;
        let dh = &(&self.ops.ngrad * phase_pressure) - &(&rho_avg * &self.gdz);
        let upwind = UpwindSelector::new(self.ncell(), &self.ops.face_cells, dh.value())?;
        let b_mob = upwind.select(&(b * mob));
        let mflux = &b_mob * &(trans * &dh);
        Ok((dh, mflux))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::ad::SparseBlock;
use crate::base::Wells;
use crate::StrError;

/// Holds the operators mapping between wells and perforations
#[derive(Clone, Debug)]
pub struct WellOps {
    /// Well to perforation (nperf × nw); copies the well value to each of its perforations
    pub w2p: SparseBlock,

    /// Perforation to well (nw × nperf); sums the perforation values of each well
    pub p2w: SparseBlock,

    /// Perforated cell of each perforation
    pub well_cells: Vec<usize>,
}

impl WellOps {
    /// Allocates a new instance
    pub fn new(wells: &Wells) -> Result<Self, StrError> {
        let nw = wells.number_of_wells();
        let nperf = wells.number_of_perforations();
        let mut triplets = Vec::with_capacity(nperf);
        for w in 0..nw {
            for perf in wells.perforations(w) {
                triplets.push((perf, w, 1.0));
            }
        }
        let w2p = SparseBlock::from_triplets(nperf, nw, &triplets)?;
        Ok(WellOps {
            p2w: w2p.transpose(),
            w2p,
            well_cells: wells.well_cells.clone(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

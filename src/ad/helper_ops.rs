use super::SparseBlock;
use crate::StrError;

/// Holds the discrete operators of a two-point flux approximation on the internal faces
///
/// With face f = (c0, c1):
///
/// ```text
/// ngrad[f, c0] = +1    ngrad[f, c1] = −1      (i.e., ngrad · x = x[c0] − x[c1])
/// grad = −ngrad
/// div  = ngradᵀ                               (the net outflow of each cell)
/// caver[f, c0] = caver[f, c1] = 1/2           (face average)
/// ```
#[derive(Clone, Debug)]
pub struct HelperOps {
    /// Number of cells
    pub ncell: usize,

    /// The (c0, c1) pairs of the internal faces
    pub face_cells: Vec<(usize, usize)>,

    /// Negative gradient (nface × ncell)
    pub ngrad: SparseBlock,

    /// Gradient (nface × ncell)
    pub grad: SparseBlock,

    /// Divergence (ncell × nface)
    pub div: SparseBlock,

    /// Face average (nface × ncell)
    pub caver: SparseBlock,
}

impl HelperOps {
    /// Allocates a new instance
    pub fn new(ncell: usize, face_cells: &[(usize, usize)]) -> Result<Self, StrError> {
        let mut t_ngrad = Vec::with_capacity(2 * face_cells.len());
        let mut t_caver = Vec::with_capacity(2 * face_cells.len());
        for (f, (c0, c1)) in face_cells.iter().enumerate() {
            if c0 == c1 {
                return Err("an internal face must connect two distinct cells");
            }
            t_ngrad.push((f, *c0, 1.0));
            t_ngrad.push((f, *c1, -1.0));
            t_caver.push((f, *c0, 0.5));
            t_caver.push((f, *c1, 0.5));
        }
        let nface = face_cells.len();
        let ngrad = SparseBlock::from_triplets(nface, ncell, &t_ngrad)?;
        let caver = SparseBlock::from_triplets(nface, ncell, &t_caver)?;
        Ok(HelperOps {
            ncell,
            face_cells: face_cells.to_vec(),
            grad: ngrad.scale(-1.0),
            div: ngrad.transpose(),
            ngrad,
            caver,
        })
    }

    /// Returns the number of internal faces
    pub fn nface(&self) -> usize {
        self.face_cells.len()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

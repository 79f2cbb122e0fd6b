use super::{Adb, SparseBlock};
use crate::StrError;
use russell_lab::Vector;

/// Defines the criterion applied to the selection basis
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Criterion {
    /// basis > 0
    GreaterZero,

    /// basis = 0 (exactly)
    Zero,

    /// basis < 0
    LessZero,
}

impl Criterion {
    /// Returns true if the basis value satisfies the criterion
    pub fn holds(&self, x: f64) -> bool {
        match self {
            Criterion::GreaterZero => x > 0.0,
            Criterion::Zero => x == 0.0,
            Criterion::LessZero => x < 0.0,
        }
    }
}

/// Selects entries (and Jacobian rows) from one of two values based on a criterion
///
/// For every entry i, `select(x1, x2)[i]` is `x1[i]` if `criterion(basis[i])` holds;
/// otherwise it is `x2[i]`. The entries of the non-selected operand are never touched;
/// thus, non-finite values (e.g., 0/0) in discarded rows do not propagate.
#[derive(Clone, Debug)]
pub struct Selector {
    left: Vec<bool>,
}

impl Selector {
    /// Allocates a new instance from a selection basis
    pub fn new(basis: &Vector, criterion: Criterion) -> Self {
        Selector {
            left: basis.as_data().iter().map(|x| criterion.holds(*x)).collect(),
        }
    }

    /// Selects between two values
    pub fn select(&self, x1: &Adb, x2: &Adb) -> Adb {
        Adb::select_rows(&self.left, x1, x2)
    }
}

/// Selects the upwind cell value on each face according to the sign of a face potential
///
/// The upwind cell of face f = (c0, c1) is c0 if the potential drop (from c0 to c1) is
/// non-negative; otherwise it is c1. The selection is a (nface × ncell) operator.
#[derive(Clone, Debug)]
pub struct UpwindSelector {
    op: SparseBlock,
}

impl UpwindSelector {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `ncell` -- number of cells
    /// * `face_cells` -- (c0, c1) pairs of the internal faces
    /// * `potential_drop` -- the potential drop across each face (from c0 to c1)
    pub fn new(ncell: usize, face_cells: &[(usize, usize)], potential_drop: &Vector) -> Result<Self, StrError> {
        if potential_drop.dim() != face_cells.len() {
            return Err("potential drop must have one entry per internal face");
        }
        let triplets: Vec<(usize, usize, f64)> = face_cells
            .iter()
            .enumerate()
            .map(|(f, (c0, c1))| {
                let upwind = if potential_drop[f] >= 0.0 { *c0 } else { *c1 };
                (f, upwind, 1.0)
            })
            .collect();
        Ok(UpwindSelector {
            op: SparseBlock::from_triplets(face_cells.len(), ncell, &triplets)?,
        })
    }

    /// Returns the upwind values on the faces
    pub fn select(&self, cell_values: &Adb) -> Adb {
        &self.op * cell_values
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

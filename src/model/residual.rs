use crate::ad::Adb;
use crate::StrError;
use russell_lab::Vector;
use russell_sparse::{SparseMatrix, Sym};

/// Default scaling factor of the fluid mass-balance equations
const DEFAULT_EQUATION_SCALE: f64 = 1.1169;

/// Holds the residual equations of one assembly pass
///
/// The material balance equations are indexed by the active phase position; an extra
/// component (solvent) occupies position `np`. The well flux equations are phase-major
/// (`phase * nw + w`).
#[derive(Clone, Debug)]
pub struct LinearisedResidual {
    /// Mass balance of each phase (and extra component) in each cell
    pub material_balance_eq: Vec<Adb>,

    /// Surface rate of each phase in each well minus the sum of the perforation rates
    pub well_flux_eq: Adb,

    /// Well control equations (BHP or surface rate)
    pub well_eq: Adb,

    /// Scaling factors of the material balance equations
    pub matbalscale: Vec<f64>,
}

impl LinearisedResidual {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `np` -- number of active fluid phases
    /// * `extra_scales` -- default scaling factors of the extra equations
    pub fn new(np: usize, extra_scales: &[f64]) -> Self {
        let null = Adb::constant_filled(0, 0.0);
        let mut matbalscale = vec![DEFAULT_EQUATION_SCALE; np];
        matbalscale.extend_from_slice(extra_scales);
        LinearisedResidual {
            material_balance_eq: vec![null.clone(); np + extra_scales.len()],
            well_flux_eq: null.clone(),
            well_eq: null,
            matbalscale,
        }
    }

    /// Returns all equations in the order of the rows of the linear system
    pub fn equations(&self) -> Vec<&Adb> {
        let mut eqs: Vec<&Adb> = self.material_balance_eq.iter().collect();
        eqs.push(&self.well_flux_eq);
        eqs.push(&self.well_eq);
        eqs
    }

    /// Returns the total number of equations
    pub fn size(&self) -> usize {
        self.equations().iter().map(|e| e.size()).sum()
    }

    /// Returns all residual values stacked in one vector
    pub fn values(&self) -> Vector {
        let mut data = Vec::with_capacity(self.size());
        for eq in self.equations() {
            data.extend_from_slice(eq.value().as_data());
        }
        Vector::from(&data)
    }

    /// Returns true if any residual value is NaN
    pub fn contains_nan(&self) -> bool {
        self.equations()
            .iter()
            .any(|eq| eq.value().as_data().iter().any(|v| v.is_nan()))
    }
}

/// Holds the global linear system J·dx = R
pub struct LinearSystem {
    /// Total number of equations
    pub neq: usize,

    /// Residual vector
    pub rr: Vector,

    /// Jacobian matrix
    pub kk: SparseMatrix,

    /// Newton update (the state is updated with −dx)
    pub dx: Vector,
}

impl LinearSystem {
    /// Allocates a new instance with the Jacobian blocks of all equations
    ///
    /// Rows follow [`LinearisedResidual::equations`]; columns follow the order of the primary
    /// variable blocks.
    pub fn new(residual: &LinearisedResidual) -> Result<Self, StrError> {
        let eqs = residual.equations();
        let pattern = match eqs.iter().find(|e| !e.is_constant()) {
            Some(e) => e.block_pattern(),
            None => return Err("the residual has no derivatives"),
        };
        let neq: usize = eqs.iter().map(|e| e.size()).sum();
        let ncol: usize = pattern.iter().sum();
        if ncol != neq {
            return Err("the linear system must be square");
        }
        let mut col_offsets = Vec::with_capacity(pattern.len());
        let mut offset = 0;
        for n in &pattern {
            col_offsets.push(offset);
            offset += n;
        }

        // allocate and fill the Jacobian
        let nnz: usize = eqs
            .iter()
            .map(|e| e.derivative().iter().map(|b| b.nnz()).sum::<usize>())
            .sum();
        let mut kk = SparseMatrix::new_coo(neq, neq, usize::max(nnz, 1), Sym::No)?;
        let mut row_offset = 0;
        for eq in &eqs {
            for (k, block) in eq.derivative().iter().enumerate() {
                if block.dims().1 != pattern[k] {
                    return Err("all equations must have the same block pattern");
                }
                let c0 = col_offsets[k];
                block.for_each_entry(|i, j, aij| kk.put(row_offset + i, c0 + j, aij))?;
            }
            row_offset += eq.size();
        }
        Ok(LinearSystem {
            neq,
            rr: residual.values(),
            kk,
            dx: Vector::new(neq),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::StrError;
use russell_lab::Vector;
use russell_sparse::{Genie, LinSolver, SparseMatrix};

/// Defines the solver of the Newton linear systems
pub trait LinearSolver {
    /// Solves kk · dx = rr
    fn solve(&mut self, kk: &mut SparseMatrix, rr: &Vector, dx: &mut Vector) -> Result<(), StrError>;
}

/// Implements a direct sparse solver
///
/// The sparsity pattern of the Jacobian may change from one Newton iteration to the next
/// (upwind directions, well controls); thus, a new factorization is computed for every system.
pub struct DirectSolver {
    /// Selects the sparse solver library
    pub genie: Genie,
}

impl DirectSolver {
    /// Allocates a new instance
    pub fn new(genie: Genie) -> Self {
        DirectSolver { genie }
    }
}

impl LinearSolver for DirectSolver {
    fn solve(&mut self, kk: &mut SparseMatrix, rr: &Vector, dx: &mut Vector) -> Result<(), StrError> {
        let mut solver = LinSolver::new(self.genie)?;
        solver.actual.factorize(kk, None)?;
        solver.actual.solve(dx, kk, rr, false)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{DirectSolver, LinearSolver};
    use russell_lab::{vec_approx_eq, Vector};
    use russell_sparse::{Genie, SparseMatrix, Sym};

    #[test]
    fn direct_solver_works() {
        let mut kk = SparseMatrix::new_coo(3, 3, 5, Sym::No).unwrap();
        kk.put(0, 0, 2.0).unwrap();
        kk.put(1, 1, 4.0).unwrap();
        kk.put(1, 2, -1.0).unwrap();
        kk.put(2, 0, -1.0).unwrap();
        kk.put(2, 2, 2.0).unwrap();
        let rr = Vector::from(&[2.0, 3.0, 1.0]);
        let mut dx = Vector::new(3);
        let mut solver = DirectSolver::new(Genie::Umfpack);
        solver.solve(&mut kk, &rr, &mut dx).unwrap();
        // x0 = 1, x2 = (1 + 1)/2 = 1, x1 = (3 + 1)/4 = 1
        vec_approx_eq(&dx, &[1.0, 1.0, 1.0], 1e-14);
    }
}

use super::{AssemblyStage, BlackoilModel};
use crate::StrError;

/// Holds the scaled residual norms of one assembly pass
#[derive(Clone, Debug)]
pub struct ConvergenceReport {
    /// Maximum scaled residual of each material balance equation (CNV)
    pub cnv: Vec<f64>,

    /// Scaled sum of the residuals of each material balance equation
    pub mass_balance: Vec<f64>,

    /// Scaled maximum well flux residual of each phase
    pub well_flux: Vec<f64>,

    /// Maximum absolute residual of the well control equations
    pub well_control: f64,

    /// Indicates that all mass balance norms are within tolerance
    pub converged_mb: bool,

    /// Indicates that all CNV norms are within tolerance
    pub converged_cnv: bool,

    /// Indicates that all well norms are within tolerance
    pub converged_well: bool,
}

impl ConvergenceReport {
    /// Returns true if all norms are within tolerance
    pub fn converged(&self) -> bool {
        self.converged_mb && self.converged_cnv && self.converged_well
    }
}

impl<'a> BlackoilModel<'a> {
    /// Computes the convergence norms of the last assembled residual
    ///
    /// For each material balance equation (including the extra component):
    ///
    /// ```text
    /// B_avg = mean(1/b)
    /// CNV   = B_avg · dt · max(|R| / pv)
    /// MB    = |B_avg · ΣR| · dt / Σpv
    /// ```
    ///
    /// All sums, maxima and counts go through the communicator.
    pub fn get_convergence(&self, dt: f64) -> Result<ConvergenceReport, StrError> {
        let config = &self.ctx.config;
        let comm = self.ctx.comm;
        let nc = self.ctx.ncell();
        let np = self.ctx.np();
        let nw = self.ctx.nw();
        let nm = self.rq.len();
        if self.stage() != AssemblyStage::ResidualComplete {
            return Err("the residual must be assembled first");
        }
        let global_nc = comm.count(nc);
        if global_nc == 0 {
            return Err("the global number of cells must be > 0");
        }
        if self.residual.contains_nan() {
            return Err("NaN residual found");
        }
        let pv = self.ctx.pv.as_data();
        let pv_sum = comm.sum(pv.iter().sum());

        let mut b_avg = vec![0.0; nm];
        let mut cnv = vec![0.0; nm];
        let mut mass_balance = vec![0.0; nm];
        for idx in 0..nm {
            let b = self.rq[idx].b.value();
            let eq = &self.residual.material_balance_eq[idx];
            let r = eq.value();
            let local_b: f64 = b.as_data().iter().map(|v| 1.0 / v).sum();
            b_avg[idx] = comm.sum(local_b) / (global_nc as f64);
            let local_max = r
                .as_data()
                .iter()
                .zip(pv)
                .fold(0.0, |acc, (rc, pvc)| f64::max(acc, f64::abs(*rc) / pvc));
            let r_sum = comm.sum(eq.sum()?.at(0));
            cnv[idx] = b_avg[idx] * dt * comm.max(local_max);
            mass_balance[idx] = f64::abs(b_avg[idx] * r_sum) * dt / pv_sum;
        }

        let wf = self.residual.well_flux_eq.value();
        let mut well_flux = vec![0.0; np];
        for idx in 0..np {
            let local_max = (0..nw).fold(0.0, |acc, w| f64::max(acc, f64::abs(wf[idx * nw + w])));
            well_flux[idx] = b_avg[idx] * local_max;
        }
        let well_control = self
            .residual
            .well_eq
            .value()
            .as_data()
            .iter()
            .fold(0.0, |acc, v| f64::max(acc, f64::abs(*v)));

        let converged_mb = mass_balance.iter().all(|v| *v < config.tol_mb);
        let converged_cnv = cnv.iter().all(|v| *v < config.tol_cnv);
        let converged_well = well_flux.iter().all(|v| *v < config.tol_wells) && well_control < config.tol_well_control;
        Ok(ConvergenceReport {
            cnv,
            mass_balance,
            well_flux,
            well_control,
            converged_mb,
            converged_cnv,
            converged_well,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::base::{Phase, PhaseUsage, Wells};
use crate::StrError;

/// Computes the densities of the wellbore segments and the resulting hydrostatic pressure column
///
/// Perforations of each well are ordered from the top (nearest to the surface) to the bottom.
/// All per-perforation-per-phase arrays are perforation-major: `a[perf * np + phase]`.
pub struct WellDensitySegmented;

impl WellDensitySegmented {
    /// Computes the density of the wellbore segment associated with each perforation
    ///
    /// The fluid flowing up through a segment is the sum of the inflows below it; its surface
    /// component mix gives the segment density. Segments without flow use the well composition.
    ///
    /// # Input
    ///
    /// * `wells` -- the well topology
    /// * `pu` -- phase usage
    /// * `perf_phase_rates` -- surface rates at the perforations (production < 0)
    /// * `b_perf` -- reciprocal formation volume factors
    /// * `rsmax_perf` -- saturated rs at each perforation (empty if not applicable)
    /// * `rvmax_perf` -- saturated rv at each perforation (empty if not applicable)
    /// * `surf_dens_perf` -- surface densities
    pub fn compute_connection_densities(
        wells: &Wells,
        pu: &PhaseUsage,
        perf_phase_rates: &[f64],
        b_perf: &[f64],
        rsmax_perf: &[f64],
        rvmax_perf: &[f64],
        surf_dens_perf: &[f64],
    ) -> Result<Vec<f64>, StrError> {
        let np = wells.number_of_phases;
        let nw = wells.number_of_wells();
        let nperf = wells.number_of_perforations();
        if perf_phase_rates.len() != nperf * np || b_perf.len() != nperf * np || surf_dens_perf.len() != nperf * np {
            return Err("perforation arrays must have nperf × np entries");
        }
        if (!rsmax_perf.is_empty() && rsmax_perf.len() != nperf) || (!rvmax_perf.is_empty() && rvmax_perf.len() != nperf) {
            return Err("saturated ratios must have one entry per perforation");
        }

        // surface flow going up the wellbore from each perforation
        let mut q_out_perf = vec![0.0; nperf * np];
        for w in 0..nw {
            let perfs = wells.perforations(w);
            let bottom = perfs.end - 1;
            for perf in perfs.rev() {
                for phase in 0..np {
                    let from_below = if perf == bottom { 0.0 } else { q_out_perf[(perf + 1) * np + phase] };
                    q_out_perf[perf * np + phase] = from_below - perf_phase_rates[perf * np + phase];
                }
            }
        }

        // component mix, volume ratio, and density of each segment
        let oil_gas = match (pu.pos(Phase::Oil), pu.pos(Phase::Gas)) {
            (Ok(o), Ok(g)) => Some((o, g)),
            _ => None,
        };
        let mut mix = vec![0.0; np];
        let mut dens = vec![0.0; nperf];
        for w in 0..nw {
            for perf in wells.perforations(w) {
                let q_out = &q_out_perf[perf * np..(perf + 1) * np];
                let total: f64 = q_out.iter().sum();
                if total != 0.0 {
                    for phase in 0..np {
                        mix[phase] = f64::abs(q_out[phase] / total);
                    }
                } else {
                    mix.copy_from_slice(&wells.comp_frac[w * np..(w + 1) * np]);
                }
                let mut x = mix.clone();
                if let Some((oilpos, gaspos)) = oil_gas {
                    let mut rs = 0.0;
                    let mut rv = 0.0;
                    if !rsmax_perf.is_empty() && mix[oilpos] > 0.0 {
                        rs = f64::min(mix[gaspos] / mix[oilpos], rsmax_perf[perf]);
                    }
                    if !rvmax_perf.is_empty() && mix[gaspos] > 0.0 {
                        rv = f64::min(mix[oilpos] / mix[gaspos], rvmax_perf[perf]);
                    }
                    if rs != 0.0 {
                        // gas dissolved in oil is not free gas
                        x[gaspos] = (mix[gaspos] - mix[oilpos] * rs) / (1.0 - rs * rv);
                    }
                    if rv != 0.0 {
                        // oil vaporized in gas is not free oil
                        x[oilpos] = (mix[oilpos] - mix[gaspos] * rv) / (1.0 - rs * rv);
                    }
                }
                let mut volrat = 0.0;
                let mut mass = 0.0;
                for phase in 0..np {
                    volrat += x[phase] / b_perf[perf * np + phase];
                    mass += surf_dens_perf[perf * np + phase] * mix[phase];
                }
                dens[perf] = mass / volrat;
            }
        }
        Ok(dens)
    }

    /// Computes the pressure difference between each perforation and the bottom-hole reference depth
    ///
    /// # Input
    ///
    /// * `wells` -- the well topology (with the reference depths)
    /// * `z_perf` -- depth of each perforation (z points downwards)
    /// * `dens_perf` -- segment densities
    /// * `gravity` -- gravity acceleration
    pub fn compute_connection_pressure_delta(
        wells: &Wells,
        z_perf: &[f64],
        dens_perf: &[f64],
        gravity: f64,
    ) -> Result<Vec<f64>, StrError> {
        let nperf = wells.number_of_perforations();
        if z_perf.len() != nperf || dens_perf.len() != nperf {
            return Err("perforation depths and densities must have one entry per perforation");
        }
        let mut dp_perf = vec![0.0; nperf];
        for w in 0..wells.number_of_wells() {
            let mut acc = 0.0;
            for perf in wells.perforations(w) {
                let z_above = if perf == wells.well_connpos[w] {
                    wells.depth_ref[w]
                } else {
                    z_perf[perf - 1]
                };
                acc += (z_perf[perf] - z_above) * dens_perf[perf] * gravity;
                dp_perf[perf] = acc;
            }
        }
        Ok(dp_perf)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::ad::{Adb, Criterion, Selector};
use crate::StrError;
use russell_lab::Vector;

/// Holds the effective viscosities and densities of the hydrocarbon components after mixing
#[derive(Clone, Debug)]
pub struct MixedProperties {
    pub mu_oil: Adb,
    pub mu_gas: Adb,
    pub mu_solvent: Adb,
    pub rho_oil: Adb,
    pub rho_gas: Adb,
    pub rho_solvent: Adb,
}

/// Implements the Todd-Longstaff mixing model for oil, gas, and a miscible solvent
///
/// The fully mixed viscosities follow the quarter-power rule. For the pair `a`, `b`:
///
/// ```text
///              mu_a · mu_b
/// mu_ab = ───────────────────────────────────────────
///         ((s_a/s_ab) · mu_b^¼ + (s_b/s_ab) · mu_a^¼)⁴
/// ```
///
/// and analogously for the three components. The effective viscosity of each component is
/// `mu^(1−ω) · mu_mix^ω`. The effective densities are obtained from the effective "density
/// viscosities" (computed with the density mixing parameter) by inverting the quarter-power rule
/// for the fraction of the pure component.
#[derive(Clone, Copy, Debug)]
pub struct ToddLongstaff {
    /// Viscosity mixing parameter ω ∈ [0, 1]
    pub omega_viscosity: f64,

    /// Density mixing parameter ω ∈ [0, 1]
    pub omega_density: f64,
}

/// Quarter-power viscosities closer than this are treated as equal (unit mobility ratio)
const EQUAL_MOBILITY_TOL: f64 = 1e-10;

/// Returns num/den or the fallback where den is exactly zero
fn ratio_or(num: &Adb, den: &Adb, fallback: &Adb) -> Adb {
    Selector::new(den.value(), Criterion::Zero).select(fallback, &(num / den))
}

/// Selects the first operand where |a − b| < EQUAL_MOBILITY_TOL
fn nearly_equal(a: &Adb, b: &Adb) -> Selector {
    let gap: Vec<f64> = a
        .value()
        .as_data()
        .iter()
        .zip(b.value().as_data())
        .map(|(x, y)| f64::abs(x - y) - EQUAL_MOBILITY_TOL)
        .collect();
    Selector::new(&Vector::from(&gap), Criterion::LessZero)
}

/// Computes mu^(1−ω) · mix^ω
pub(crate) fn blend(mu: &Adb, mix: &Adb, omega: f64) -> Adb {
    if omega == 0.0 {
        mu.clone()
    } else if omega == 1.0 {
        mix.clone()
    } else {
        &mu.powf(1.0 - omega) * &mix.powf(omega)
    }
}

/// Logs the range of a mixed property
fn trace_range(name: &str, x: &Adb) {
    if log::log_enabled!(log::Level::Trace) {
        let data = x.value().as_data();
        let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        log::trace!("Todd-Longstaff: {} in [{:e}, {:e}]", name, min, max);
    }
}

impl ToddLongstaff {
    /// Allocates a new instance
    pub fn new(omega_viscosity: f64, omega_density: f64) -> Result<Self, StrError> {
        if !(0.0..=1.0).contains(&omega_viscosity) || !(0.0..=1.0).contains(&omega_density) {
            return Err("mixing parameters must be in [0, 1]");
        }
        Ok(ToddLongstaff {
            omega_viscosity,
            omega_density,
        })
    }

    /// Computes the effective viscosities and densities
    ///
    /// # Input
    ///
    /// * `sat` -- (effective) saturations `[oil, gas, solvent]`
    /// * `mu` -- intrinsic viscosities `[oil, gas, solvent]`
    /// * `rho` -- intrinsic densities `[oil, gas, solvent]`
    pub fn mix(&self, sat: [&Adb; 3], mu: [&Adb; 3], rho: [&Adb; 3]) -> MixedProperties {
        let [so, sg, ss] = sat;
        let [mu_o, mu_g, mu_s] = mu;
        let [rho_o, rho_g, rho_s] = rho;

        let sn = &(so + sg) + ss;
        let sos = so + ss;
        let ssg = ss + sg;
        let sog = so + sg;
        let m_o = mu_o.powf(0.25);
        let m_g = mu_g.powf(0.25);
        let m_s = mu_s.powf(0.25);

        // fully mixed viscosities
        let den_os = &(&(so * &m_s) + &(ss * &m_o)) / &sos;
        let mu_mos = &(mu_o * mu_s) / &den_os.powf(4.0);
        let mu_mos = Selector::new(sos.value(), Criterion::Zero).select(mu_o, &mu_mos);
        let den_sg = &(&(sg * &m_s) + &(ss * &m_g)) / &ssg;
        let mu_msg = &(mu_g * mu_s) / &den_sg.powf(4.0);
        let mu_msg = Selector::new(ssg.value(), Criterion::Zero).select(mu_g, &mu_msg);
        let den_n = &(&(&(so * &(&m_s * &m_g)) + &(ss * &(&m_o * &m_g))) + &(sg * &(&m_s * &m_o))) / &sn;
        let mu_m = &(&(mu_o * mu_s) * mu_g) / &den_n.powf(4.0);
        let mu_m = Selector::new(sn.value(), Criterion::Zero).select(mu_s, &mu_m);

        // effective viscosities
        let omega = self.omega_viscosity;
        let mu_oil = blend(mu_o, &mu_mos, omega);
        let mu_gas = blend(mu_g, &mu_msg, omega);
        let mu_solvent = blend(mu_s, &mu_m, omega);

        // fully mixed density
        let mass = &(&(rho_o * so) + &(rho_g * sg)) + &(rho_s * ss);
        let rho_m = ratio_or(&mass, &sn, rho_s);

        // unit mobility ratio: linear blend with the fully mixed density
        let omega = self.omega_density;
        let unit = |rho: &Adb| &(rho * (1.0 - omega)) + &(&rho_m * omega);
        let equal_oil = Selector::new((mu_s - mu_o).value(), Criterion::Zero);
        let equal_gas = Selector::new((mu_s - mu_g).value(), Criterion::Zero);

        // oil: fraction of pure oil in the effective oil
        let m_od = blend(mu_o, &mu_mos, omega).powf(0.25);
        let f_oe = &(&m_o / &m_od) * &(&(&m_od - &m_s) / &(&m_o - &m_s));
        let frac_o = &(&f_oe * rho_o) + &(&(1.0 - &f_oe) * rho_s);
        let rho_oil = equal_oil.select(&unit(rho_o), &frac_o);

        // gas: fraction of pure gas in the effective gas
        let m_gd = blend(mu_g, &mu_msg, omega).powf(0.25);
        let f_ge = &(&m_g / &m_gd) * &(&(&m_gd - &m_s) / &(&m_g - &m_s));
        let frac_g = &(&f_ge * rho_g) + &(&(1.0 - &f_ge) * rho_s);
        let rho_gas = equal_gas.select(&unit(rho_g), &frac_g);

        // solvent: fraction of pure solvent mixed with the oil-gas combination
        let m_n = ratio_or(&(&(&m_o * &m_g) * &sog), &(&(so * &m_g) + &(sg * &m_o)), &m_s);
        let rho_og = ratio_or(&(&(rho_o * so) + &(rho_g * sg)), &sog, rho_s);
        let m_sd = blend(mu_s, &mu_m, omega).powf(0.25);
        let f_se = &(&m_s / &m_sd) * &(&(&m_n - &m_sd) / &(&m_n - &m_s));
        let frac_s = &(&f_se * rho_s) + &(&(1.0 - &f_se) * &rho_og);
        let frac_s = Selector::new(sog.value(), Criterion::Zero).select(rho_s, &frac_s);
        let unit_s = unit(rho_s);
        let frac_s = nearly_equal(&m_n, &m_s).select(&unit_s, &frac_s);
        let rho_solvent = equal_gas.select(&unit_s, &equal_oil.select(&unit_s, &frac_s));

        trace_range("mu_oil", &mu_oil);
        trace_range("mu_gas", &mu_gas);
        trace_range("mu_solvent", &mu_solvent);
        trace_range("rho_oil", &rho_oil);
        trace_range("rho_gas", &rho_gas);
        trace_range("rho_solvent", &rho_solvent);

        MixedProperties {
            mu_oil,
            mu_gas,
            mu_solvent,
            rho_oil,
            rho_gas,
            rho_solvent,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ToddLongstaff;
    use crate::ad::Adb;
    use russell_lab::{approx_eq, deriv1_central5, vec_approx_eq, Vector};

    fn c(values: &[f64]) -> Adb {
        Adb::constant(Vector::from(&values))
    }

    #[test]
    fn new_handles_errors() {
        assert_eq!(ToddLongstaff::new(1.1, 0.0).err(), Some("mixing parameters must be in [0, 1]"));
        assert_eq!(ToddLongstaff::new(0.0, -0.1).err(), Some("mixing parameters must be in [0, 1]"));
    }

    #[test]
    fn zero_mixing_gives_intrinsic_properties() {
        let tl = ToddLongstaff::new(0.0, 0.0).unwrap();
        let (so, sg, ss) = (c(&[0.5, 0.0]), c(&[0.2, 0.0]), c(&[0.3, 0.0]));
        let (mu_o, mu_g, mu_s) = (c(&[2.0, 2.0]), c(&[0.02, 0.02]), c(&[0.05, 0.05]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0, 800.0]), c(&[100.0, 100.0]), c(&[120.0, 120.0]));
        let res = tl.mix([&so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        vec_approx_eq(res.mu_oil.value(), mu_o.value().as_data(), 1e-14);
        vec_approx_eq(res.mu_gas.value(), mu_g.value().as_data(), 1e-14);
        vec_approx_eq(res.mu_solvent.value(), mu_s.value().as_data(), 1e-14);
        vec_approx_eq(res.rho_oil.value(), rho_o.value().as_data(), 1e-10);
        vec_approx_eq(res.rho_gas.value(), rho_g.value().as_data(), 1e-10);
        vec_approx_eq(res.rho_solvent.value(), rho_s.value().as_data(), 1e-10);
    }

    #[test]
    fn full_mixing_of_oil_and_solvent_works() {
        let tl = ToddLongstaff::new(1.0, 1.0).unwrap();
        let (so, sg, ss) = (c(&[0.5]), c(&[0.0]), c(&[0.5]));
        let (mu_o, mu_g, mu_s) = (c(&[1.0]), c(&[0.5]), c(&[16.0]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0]), c(&[100.0]), c(&[400.0]));
        let res = tl.mix([&so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        // m_o = 1, m_s = 2, denominator = 0.5·2 + 0.5·1 = 1.5
        let mu_mix = 16.0 / f64::powf(1.5, 4.0);
        approx_eq(res.mu_oil.at(0), mu_mix, 1e-13);
        approx_eq(res.mu_solvent.at(0), mu_mix, 1e-13);
        // no gas: the gas-solvent mixture is pure solvent
        approx_eq(res.mu_gas.at(0), 16.0, 1e-12);
        // fully mixed density
        approx_eq(res.rho_oil.at(0), 600.0, 1e-10);
        approx_eq(res.rho_solvent.at(0), 600.0, 1e-10);
    }

    #[test]
    fn unit_mobility_ratio_uses_linear_blend() {
        let tl = ToddLongstaff::new(0.5, 0.5).unwrap();
        let (so, sg, ss) = (c(&[0.6]), c(&[0.0]), c(&[0.4]));
        let (mu_o, mu_g, mu_s) = (c(&[1.0]), c(&[0.5]), c(&[1.0]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0]), c(&[100.0]), c(&[400.0]));
        let res = tl.mix([&so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        let rho_m = 0.6 * 800.0 + 0.4 * 400.0;
        approx_eq(res.rho_oil.at(0), 0.5 * 800.0 + 0.5 * rho_m, 1e-12);
        approx_eq(res.rho_solvent.at(0), 0.5 * 400.0 + 0.5 * rho_m, 1e-12);
        approx_eq(res.mu_oil.at(0), 1.0, 1e-14);
    }

    #[test]
    fn equal_solvent_and_oil_gas_mobilities_use_linear_blend() {
        let tl = ToddLongstaff::new(0.5, 0.5).unwrap();
        let (so, sg, ss) = (c(&[0.3]), c(&[0.3]), c(&[0.4]));
        // m_o = 2, m_g = 1, thus the oil-gas mixture has m_n = 2·0.6/(0.3 + 0.6) = 4/3
        let mu_s = f64::powf(4.0 / 3.0, 4.0);
        let (mu_o, mu_g, mu_s) = (c(&[16.0]), c(&[1.0]), c(&[mu_s]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0]), c(&[100.0]), c(&[400.0]));
        let res = tl.mix([&so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        let rho_m = 0.3 * 800.0 + 0.3 * 100.0 + 0.4 * 400.0;
        assert!(res.rho_solvent.at(0).is_finite());
        approx_eq(res.rho_solvent.at(0), 0.5 * 400.0 + 0.5 * rho_m, 1e-10);
        assert!(res.rho_oil.at(0).is_finite());
        assert!(res.rho_gas.at(0).is_finite());
    }

    #[test]
    fn zero_saturations_give_finite_values() {
        let tl = ToddLongstaff::new(0.7, 0.3).unwrap();
        let zero = c(&[0.0]);
        let (mu_o, mu_g, mu_s) = (c(&[2.0]), c(&[0.02]), c(&[0.05]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0]), c(&[100.0]), c(&[120.0]));
        let res = tl.mix([&zero, &zero, &zero], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        for x in [&res.mu_oil, &res.mu_gas, &res.mu_solvent, &res.rho_oil, &res.rho_gas, &res.rho_solvent] {
            assert!(x.at(0).is_finite());
        }
        approx_eq(res.mu_oil.at(0), 2.0, 1e-14);
        approx_eq(res.rho_solvent.at(0), 120.0, 1e-12);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        struct Args {
            sg: f64,
        }
        let tl = ToddLongstaff::new(0.7, 0.4).unwrap();
        let (mu_o, mu_g, mu_s) = (c(&[2.0]), c(&[0.02]), c(&[0.05]));
        let (rho_o, rho_g, rho_s) = (c(&[800.0]), c(&[100.0]), c(&[120.0]));
        let calc = |so: f64, sg: f64| {
            let (so, sg, ss) = (c(&[so]), c(&[sg]), c(&[1.0 - so - sg]));
            let res = tl.mix([&so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
            (res.mu_oil.at(0), res.rho_solvent.at(0))
        };
        let vars = Adb::variables(&[Vector::from(&[0.5])]);
        let so = &vars[0];
        let sg = c(&[0.2]);
        let ss = 0.8 - so;
        let res = tl.mix([so, &sg, &ss], [&mu_o, &mu_g, &mu_s], [&rho_o, &rho_g, &rho_s]);
        let mut args = Args { sg: 0.2 };
        let num = deriv1_central5(0.5, &mut args, |x, a| Ok(calc(x, a.sg).0)).unwrap();
        approx_eq(res.mu_oil.derivative()[0].get(0, 0), num, 1e-8);
        let num = deriv1_central5(0.5, &mut args, |x, a| Ok(calc(x, a.sg).1)).unwrap();
        approx_eq(res.rho_solvent.derivative()[0].get(0, 0), num, 1e-6);
    }
}

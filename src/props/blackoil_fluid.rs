use super::FluidProps;
use crate::ad::Adb;
use crate::base::{Phase, PhaseUsage};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds parameters of the simple black-oil fluid
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ParamBlackoil {
    /// Reference pressure
    pub p_ref: f64,

    /// Water b at the reference pressure
    pub b_w_ref: f64,

    /// Water compressibility
    pub c_w: f64,

    /// Water viscosity
    pub mu_w: f64,

    /// Oil b at the reference pressure (dead oil)
    pub b_o_ref: f64,

    /// Oil compressibility
    pub c_o: f64,

    /// Oil viscosity (dead oil)
    pub mu_o: f64,

    /// Oil swelling per unit of dissolved gas: b_o = b_dead / (1 + swell · rs)
    pub swell: f64,

    /// Oil viscosity reduction per unit of dissolved gas: mu_o = mu_dead / (1 + visc_rs · rs)
    pub visc_rs: f64,

    /// Gas b at the reference pressure (b_g is proportional to the pressure)
    pub b_g_ref: f64,

    /// Gas viscosity
    pub mu_g: f64,

    /// Surface densities [water, oil, gas]
    pub rho_surface: [f64; 3],

    /// Saturated rs per unit of pressure
    pub rs_per_pressure: f64,

    /// Saturated rv per unit of pressure
    pub rv_per_pressure: f64,

    /// Connate water saturation
    pub swc: f64,

    /// Residual oil saturation
    pub sorw: f64,

    /// Critical gas saturation
    pub sgc: f64,

    /// Corey exponents [water, oil, gas]
    pub corey_n: [f64; 3],

    /// End-point relative permeabilities [water, oil, gas]
    pub kr_max: [f64; 3],

    /// Maximum oil-water capillary pressure (at connate water)
    pub pcow_max: f64,

    /// Maximum gas-oil capillary pressure (at maximum gas saturation)
    pub pcgo_max: f64,
}

/// Implements a black-oil fluid with linear compressibility and Corey relative permeabilities
pub struct BlackoilFluid {
    pu: PhaseUsage,
    param: ParamBlackoil,
}

impl BlackoilFluid {
    /// Allocates a new instance
    pub fn new(pu: PhaseUsage, param: ParamBlackoil) -> Result<Self, StrError> {
        if param.p_ref <= 0.0 {
            return Err("p_ref must be > 0.0");
        }
        if param.b_w_ref <= 0.0 || param.b_o_ref <= 0.0 || param.b_g_ref <= 0.0 {
            return Err("reference b values must be > 0.0");
        }
        if param.mu_w <= 0.0 || param.mu_o <= 0.0 || param.mu_g <= 0.0 {
            return Err("viscosities must be > 0.0");
        }
        if param.swc + param.sorw >= 1.0 || param.swc + param.sgc >= 1.0 {
            return Err("end-point saturations are inconsistent");
        }
        Ok(BlackoilFluid { pu, param })
    }

    /// Returns the parameters
    pub fn param(&self) -> &ParamBlackoil {
        &self.param
    }
}

/// Computes kr_max · se^n with se = clamp((s − s_min) / span, 0, 1)
fn corey(s: &Adb, s_min: f64, span: f64, kr_max: f64, n: f64) -> Adb {
    s.apply(|si| {
        let se = (si - s_min) / span;
        if se <= 0.0 {
            (0.0, 0.0)
        } else if se >= 1.0 {
            (kr_max, 0.0)
        } else {
            (kr_max * f64::powf(se, n), kr_max * n * f64::powf(se, n - 1.0) / span)
        }
    })
}

/// Computes c · clamp((s − s_min) / span, 0, 1)
fn clamped_linear(s: &Adb, s_min: f64, span: f64, c: f64) -> Adb {
    s.apply(|si| {
        let se = (si - s_min) / span;
        if se <= 0.0 {
            (0.0, 0.0)
        } else if se >= 1.0 {
            (c, 0.0)
        } else {
            (c * se, c / span)
        }
    })
}

impl FluidProps for BlackoilFluid {
    fn phase_usage(&self) -> &PhaseUsage {
        &self.pu
    }

    fn surface_density(&self, phase: Phase) -> Result<f64, StrError> {
        if !self.pu.active(phase) {
            return Err("unknown phase index");
        }
        Ok(self.param.rho_surface[phase.index()])
    }

    fn mu_wat(&self, pw: &Adb, _t: &Adb) -> Adb {
        Adb::constant_filled(pw.size(), self.param.mu_w)
    }

    fn mu_oil(&self, _po: &Adb, _t: &Adb, rs: &Adb) -> Adb {
        self.param.mu_o / &(&(rs * self.param.visc_rs) + 1.0)
    }

    fn mu_gas(&self, pg: &Adb, _t: &Adb, _rv: &Adb) -> Adb {
        Adb::constant_filled(pg.size(), self.param.mu_g)
    }

    fn b_wat(&self, pw: &Adb, _t: &Adb) -> Adb {
        let p = &self.param;
        &(&(pw - p.p_ref) * (p.b_w_ref * p.c_w)) + p.b_w_ref
    }

    fn b_oil(&self, po: &Adb, _t: &Adb, rs: &Adb) -> Adb {
        let p = &self.param;
        let b_dead = &(&(po - p.p_ref) * (p.b_o_ref * p.c_o)) + p.b_o_ref;
        &b_dead / &(&(rs * p.swell) + 1.0)
    }

    fn b_gas(&self, pg: &Adb, _t: &Adb, _rv: &Adb) -> Adb {
        pg * (self.param.b_g_ref / self.param.p_ref)
    }

    fn rs_sat(&self, po: &Adb, _so: &Adb) -> Adb {
        po * self.param.rs_per_pressure
    }

    fn rv_sat(&self, pg: &Adb, _so: &Adb) -> Adb {
        pg * self.param.rv_per_pressure
    }

    fn relperm(&self, sw: &Adb, so: &Adb, sg: &Adb) -> Vec<Adb> {
        let p = &self.param;
        let span_wo = 1.0 - p.swc - p.sorw;
        let span_g = 1.0 - p.swc - p.sgc;
        let zero = Adb::constant_filled(so.size(), 0.0);
        let krw = if self.pu.phase_used[0] {
            corey(sw, p.swc, span_wo, p.kr_max[0], p.corey_n[0])
        } else {
            zero.clone()
        };
        let kro = corey(so, p.sorw, span_wo, p.kr_max[1], p.corey_n[1]);
        let krg = if self.pu.phase_used[2] {
            corey(sg, p.sgc, span_g, p.kr_max[2], p.corey_n[2])
        } else {
            zero
        };
        vec![krw, kro, krg]
    }

    fn cap_press(&self, sw: &Adb, so: &Adb, sg: &Adb) -> Vec<Adb> {
        let p = &self.param;
        let zero = Adb::constant_filled(so.size(), 0.0);
        let pcow = if self.pu.phase_used[0] && p.pcow_max != 0.0 {
            // pcow = pcow_max · (1 − se_w)
            let se_w = clamped_linear(sw, p.swc, 1.0 - p.swc - p.sorw, 1.0);
            (1.0 - &se_w) * p.pcow_max
        } else {
            zero.clone()
        };
        let pcgo = if self.pu.phase_used[2] && p.pcgo_max != 0.0 {
            clamped_linear(sg, 0.0, 1.0 - p.swc, p.pcgo_max)
        } else {
            zero.clone()
        };
        vec![pcow, zero, pcgo]
    }

    fn critical_gas_saturation(&self) -> f64 {
        self.param.sgc
    }

    fn critical_oil_in_gas_saturation(&self) -> f64 {
        self.param.sorw
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

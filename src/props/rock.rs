use crate::ad::Adb;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Implements a linear rock compressibility model
///
/// The pore volume multiplier is `1 + c · (p − p_ref)`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct RockCompressibility {
    /// Reference pressure
    pub p_ref: f64,

    /// Rock compressibility
    pub c: f64,
}

impl RockCompressibility {
    /// Allocates a new instance
    pub fn new(p_ref: f64, c: f64) -> Result<Self, StrError> {
        if c < 0.0 {
            return Err("rock compressibility must be ≥ 0.0");
        }
        Ok(RockCompressibility { p_ref, c })
    }

    /// Allocates an incompressible rock
    pub fn incompressible() -> Self {
        RockCompressibility { p_ref: 0.0, c: 0.0 }
    }

    /// Returns the pore volume multiplier
    pub fn pore_volume_multiplier(&self, p: &Adb) -> Adb {
        if self.c == 0.0 {
            return Adb::constant_filled(p.size(), 1.0);
        }
        &(&(p - self.p_ref) * self.c) + 1.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

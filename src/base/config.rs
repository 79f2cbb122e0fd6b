use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Holds configuration parameters of the reservoir model
///
/// The model flags (active phases, dissolved gas, vaporized oil, solvent or polymer, miscibility) are
/// fixed at model construction. The remaining values control the Newton update and the
/// convergence checks.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Water phase is active
    pub water: bool,

    /// Oil phase is active (must be true)
    pub oil: bool,

    /// Gas phase is active
    pub gas: bool,

    /// Gas may dissolve in oil (live oil)
    pub disgas: bool,

    /// Oil may vaporize in gas (wet gas)
    pub vapoil: bool,

    /// Solvent pseudo-phase is active
    pub solvent: bool,

    /// Solvent is miscible (Todd-Longstaff mixing); requires `solvent`
    pub miscible: bool,

    /// Polymer is dissolved in the water phase; excludes `solvent`
    pub polymer: bool,

    /// Gravity acceleration (z points downwards)
    pub gravity: f64,

    /// Maximum relative pressure change per Newton update
    pub dp_max_rel: f64,

    /// Maximum saturation change per Newton update
    pub ds_max: f64,

    /// Maximum relative change of rs and rv per Newton update
    pub dr_max_rel: f64,

    /// Maximum relative bottom-hole pressure change per Newton update
    pub dbhp_max_rel: f64,

    /// Tolerance on the mass-balance error (total, scaled)
    pub tol_mb: f64,

    /// Tolerance on the cell-wise maximum scaled residual (CNV)
    pub tol_cnv: f64,

    /// Tolerance on the well flux equations (scaled)
    pub tol_wells: f64,

    /// Tolerance on the well control equations (pressure units)
    pub tol_well_control: f64,

    /// Maximum number of Newton iterations per time step
    pub n_max_iterations: usize,
}

impl Config {
    /// Allocates a new instance with default values (oil and gas; no solvent)
    pub fn new() -> Self {
        Config {
            water: false,
            oil: true,
            gas: true,
            disgas: false,
            vapoil: false,
            solvent: false,
            miscible: false,
            polymer: false,
            gravity: 0.0,
            dp_max_rel: 1.0,
            ds_max: 0.2,
            dr_max_rel: 1.0e9,
            dbhp_max_rel: 1.0,
            tol_mb: 1.0e-7,
            tol_cnv: 1.0e-2,
            tol_wells: 5.0e-4,
            tol_well_control: 1.0e-3,
            n_max_iterations: 15,
        }
    }

    /// Sets the active phases
    pub fn set_phases(&mut self, water: bool, oil: bool, gas: bool) -> Result<&mut Self, StrError> {
        if !oil {
            return Err("the oil phase must be active");
        }
        self.water = water;
        self.oil = oil;
        self.gas = gas;
        Ok(self)
    }

    /// Enables or disables dissolved gas in oil
    pub fn set_disgas(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        if flag && !self.gas {
            return Err("dissolved gas requires the gas phase");
        }
        self.disgas = flag;
        Ok(self)
    }

    /// Enables or disables vaporized oil in gas
    pub fn set_vapoil(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        if flag && !self.gas {
            return Err("vaporized oil requires the gas phase");
        }
        if flag && self.solvent {
            return Err("solvent option only works with dead gas");
        }
        self.vapoil = flag;
        Ok(self)
    }

    /// Enables or disables the solvent pseudo-phase
    ///
    /// Disabling the solvent also disables miscibility.
    pub fn set_solvent(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        if flag && !self.gas {
            return Err("solvent requires the gas phase");
        }
        if flag && self.vapoil {
            return Err("solvent option only works with dead gas");
        }
        if flag && self.polymer {
            return Err("solvent and polymer cannot be active together");
        }
        self.solvent = flag;
        if !flag {
            self.miscible = false;
        }
        Ok(self)
    }

    /// Enables or disables Todd-Longstaff miscibility (requires solvent)
    pub fn set_miscible(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        if flag && !self.solvent {
            return Err("miscibility requires the solvent option");
        }
        self.miscible = flag;
        Ok(self)
    }

    /// Enables or disables the polymer component (carried by water)
    pub fn set_polymer(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        if flag && !self.water {
            return Err("polymer requires the water phase");
        }
        if flag && self.solvent {
            return Err("solvent and polymer cannot be active together");
        }
        self.polymer = flag;
        Ok(self)
    }

    /// Sets the gravity acceleration
    pub fn set_gravity(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("gravity must be ≥ 0.0");
        }
        self.gravity = value;
        Ok(self)
    }

    /// Sets the Newton update limits
    pub fn set_update_limits(&mut self, dp_max_rel: f64, ds_max: f64, dbhp_max_rel: f64) -> Result<&mut Self, StrError> {
        if dp_max_rel <= 0.0 || ds_max <= 0.0 || dbhp_max_rel <= 0.0 {
            return Err("update limits must be > 0.0");
        }
        self.dp_max_rel = dp_max_rel;
        self.ds_max = ds_max;
        self.dbhp_max_rel = dbhp_max_rel;
        Ok(self)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if !self.oil {
            return Some("oil = false is incorrect; the oil phase must be active".to_string());
        }
        if (self.disgas || self.vapoil || self.solvent) && !self.gas {
            return Some("gas = false is incorrect; disgas, vapoil, and solvent require the gas phase".to_string());
        }
        if self.solvent && self.vapoil {
            return Some("solvent = true is incorrect with vapoil = true; solvent only works with dead gas".to_string());
        }
        if self.miscible && !self.solvent {
            return Some("miscible = true is incorrect; it requires solvent = true".to_string());
        }
        if self.polymer && !self.water {
            return Some("water = false is incorrect; polymer requires the water phase".to_string());
        }
        if self.polymer && self.solvent {
            return Some(
                "polymer = true is incorrect with solvent = true; only one extra component is allowed".to_string(),
            );
        }
        if self.gravity < 0.0 {
            return Some(format!("gravity = {:?} is incorrect; it must be ≥ 0.0", self.gravity));
        }
        if self.dp_max_rel <= 0.0 {
            return Some(format!("dp_max_rel = {:?} is incorrect; it must be > 0.0", self.dp_max_rel));
        }
        if self.ds_max <= 0.0 {
            return Some(format!("ds_max = {:?} is incorrect; it must be > 0.0", self.ds_max));
        }
        if self.dr_max_rel <= 0.0 {
            return Some(format!("dr_max_rel = {:?} is incorrect; it must be > 0.0", self.dr_max_rel));
        }
        if self.dbhp_max_rel <= 0.0 {
            return Some(format!("dbhp_max_rel = {:?} is incorrect; it must be > 0.0", self.dbhp_max_rel));
        }
        if self.tol_mb <= 0.0 || self.tol_cnv <= 0.0 || self.tol_wells <= 0.0 || self.tol_well_control <= 0.0 {
            return Some("tolerances must be > 0.0".to_string());
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {:?} is incorrect; it must be ≥ 1",
                self.n_max_iterations
            ));
        }
        None // all good
    }

    /// Reads a JSON file with the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let config = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(config)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn setters_handle_errors() {
        let mut config = Config::new();
        assert_eq!(config.set_phases(true, false, true).err(), Some("the oil phase must be active"));
        assert_eq!(config.set_miscible(true).err(), Some("miscibility requires the solvent option"));
        config.set_solvent(true).unwrap();
        assert_eq!(config.set_vapoil(true).err(), Some("solvent option only works with dead gas"));
        config.set_solvent(false).unwrap();
        config.set_vapoil(true).unwrap();
        assert_eq!(config.set_solvent(true).err(), Some("solvent option only works with dead gas"));
        assert_eq!(config.set_gravity(-1.0).err(), Some("gravity must be ≥ 0.0"));
        assert_eq!(config.set_update_limits(0.0, 0.2, 1.0).err(), Some("update limits must be > 0.0"));
        config.set_phases(true, true, false).unwrap();
        assert_eq!(config.set_disgas(true).err(), Some("dissolved gas requires the gas phase"));
        config.set_phases(false, true, true).unwrap();
        assert_eq!(config.set_polymer(true).err(), Some("polymer requires the water phase"));
        config.set_phases(true, true, true).unwrap();
        config.set_vapoil(false).unwrap();
        config.set_solvent(true).unwrap();
        assert_eq!(config.set_polymer(true).err(), Some("solvent and polymer cannot be active together"));
        config.set_solvent(false).unwrap();
        config.set_polymer(true).unwrap();
        assert_eq!(config.set_solvent(true).err(), Some("solvent and polymer cannot be active together"));
    }

    #[test]
    fn setters_work() {
        let mut config = Config::new();
        config
            .set_phases(true, true, true)
            .unwrap()
            .set_disgas(true)
            .unwrap()
            .set_solvent(true)
            .unwrap()
            .set_miscible(true)
            .unwrap()
            .set_gravity(9.81)
            .unwrap();
        assert!(config.water && config.disgas && config.solvent && config.miscible);
        assert_eq!(config.gravity, 9.81);
        config.set_solvent(false).unwrap();
        assert!(!config.miscible);
        assert_eq!(config.validate(), None);
    }

    #[test]
    fn validate_works() {
        let mut config = Config::new();
        config.solvent = true;
        config.vapoil = true;
        assert_eq!(
            config.validate(),
            Some("solvent = true is incorrect with vapoil = true; solvent only works with dead gas".to_string())
        );
        config.vapoil = false;
        config.ds_max = 0.0;
        assert_eq!(
            config.validate(),
            Some("ds_max = 0.0 is incorrect; it must be > 0.0".to_string())
        );
        config.ds_max = 0.2;
        config.n_max_iterations = 0;
        assert_eq!(
            config.validate(),
            Some("n_max_iterations = 0 is incorrect; it must be ≥ 1".to_string())
        );
        config.n_max_iterations = 1;
        assert_eq!(config.validate(), None);
        config.polymer = true;
        assert_eq!(
            config.validate(),
            Some("water = false is incorrect; polymer requires the water phase".to_string())
        );
        config.water = true;
        assert_eq!(
            config.validate(),
            Some("polymer = true is incorrect with solvent = true; only one extra component is allowed".to_string())
        );
        config.solvent = false;
        assert_eq!(config.validate(), None);
    }

    #[test]
    fn serialize_works() {
        let mut config = Config::new();
        config.set_solvent(true).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let read: Config = serde_json::from_str(&json).unwrap();
        assert!(read.solvent);
        assert_eq!(read.ds_max, 0.2);
    }
}

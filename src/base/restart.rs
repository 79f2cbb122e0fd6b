use crate::StrError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Name of the extra restart field holding the suggested time step
pub const RESTART_EXTRA_KEY: &str = "OPMEXTRA";

/// Holds named arrays stored in a restart file
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RestartValues {
    /// Named arrays
    pub fields: HashMap<String, Vec<f64>>,
}

impl RestartValues {
    /// Allocates an empty instance
    pub fn new() -> Self {
        RestartValues { fields: HashMap::new() }
    }

    /// Reads a JSON file
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let values = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(values)
    }

    /// Writes a JSON file
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

/// Holds the extra (non-standard) restart data
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestartExtra {
    /// Suggested size of the next time step (−1.0 if unknown)
    pub suggested_step: f64,
}

impl RestartExtra {
    /// Reads the extra data
    ///
    /// A missing field is not an error: a warning is logged and the suggested step is −1.0.
    pub fn read(values: &RestartValues) -> Result<Self, StrError> {
        match values.fields.get(RESTART_EXTRA_KEY) {
            Some(data) => {
                if data.len() != 1 {
                    return Err("OPMEXTRA must hold exactly one value");
                }
                Ok(RestartExtra {
                    suggested_step: data[0],
                })
            }
            None => {
                log::warn!("restart data does not contain {}; the suggested time step is unknown", RESTART_EXTRA_KEY);
                Ok(RestartExtra { suggested_step: -1.0 })
            }
        }
    }

    /// Writes the extra data
    pub fn write(&self, values: &mut RestartValues) {
        values
            .fields
            .insert(RESTART_EXTRA_KEY.to_string(), vec![self.suggested_step]);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

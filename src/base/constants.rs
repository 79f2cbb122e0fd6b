/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/pmres/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/pmres/test";

/// Defines the square root of the machine epsilon (used by the hydrocarbon state switching)
pub const SQRT_EPSILON: f64 = 1.4901161193847656e-8;

/// Defines the global reductions needed by the model
///
/// Implementations must provide a deterministic sum so that results do not depend on the
/// number of processes.
pub trait Communicator {
    /// Returns the global sum of a local value
    fn sum(&self, local: f64) -> f64;

    /// Returns the global maximum of a local value
    fn max(&self, local: f64) -> f64;

    /// Returns the global number of items given the local number
    fn count(&self, local: usize) -> usize;
}

/// Implements a single-process communicator
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn sum(&self, local: f64) -> f64 {
        local
    }

    fn max(&self, local: f64) -> f64 {
        local
    }

    fn count(&self, local: usize) -> usize {
        local
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

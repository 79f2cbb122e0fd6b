use crate::ad::Adb;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Implements a piecewise-linear table y(x)
///
/// Values outside the range are extrapolated as constants (the derivative is zero there).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Table1d {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Table1d {
    /// Allocates a new instance
    ///
    /// The x values must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, StrError> {
        if x.is_empty() {
            return Err("table must have at least one point");
        }
        if x.len() != y.len() {
            return Err("table x and y must have the same length");
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err("table x values must be strictly increasing");
        }
        Ok(Table1d {
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    /// Allocates a table with a constant value
    pub fn constant(value: f64) -> Self {
        Table1d {
            x: vec![0.0],
            y: vec![value],
        }
    }

    /// Allocates the identity table y = x on [0, 1]
    pub fn unit_ramp() -> Self {
        Table1d {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
        }
    }

    /// Returns the value and the derivative at x
    pub fn eval(&self, x: f64) -> (f64, f64) {
        let n = self.x.len();
        if n == 1 || x <= self.x[0] {
            return (self.y[0], 0.0);
        }
        if x >= self.x[n - 1] {
            return (self.y[n - 1], 0.0);
        }
        // first index with x[i] > x
        let i = self.x.partition_point(|xi| *xi <= x);
        let (x0, x1) = (self.x[i - 1], self.x[i]);
        let (y0, y1) = (self.y[i - 1], self.y[i]);
        let slope = (y1 - y0) / (x1 - x0);
        (y0 + slope * (x - x0), slope)
    }

    /// Evaluates the table for a differentiable argument
    pub fn eval_adb(&self, x: &Adb) -> Adb {
        x.apply(|xi| self.eval(xi))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

//! Implements automatic differentiation with explicit sparse Jacobian blocks

mod adb;
mod helper_ops;
mod selector;
mod sparse_block;
pub use crate::ad::adb::*;
pub use crate::ad::helper_ops::*;
pub use crate::ad::selector::*;
pub use crate::ad::sparse_block::*;

//! Indexed containers backing a [`crate::ModelStore`].
//!
//! # Module Organization
//!
//! - [`table`]: id-allocating entity table shared by every kind
//! - [`matrix`]: sparse matrices with row and column indices kept in sync
//! - [`variables`]: variable records
//! - [`linear`]: linear constraints and the constraint matrix
//! - [`objectives`]: the primary and auxiliary objectives
//! - [`atomic`]: generic storage for atomic constraint families
//!
//! Each store pairs with a `*Diff` accumulator. Mutators take an iterator of
//! accumulators (one per live tracker) and record only what the consumer
//! behind that tracker could already have seen.

pub mod atomic;
pub mod linear;
pub mod matrix;
pub mod objectives;
pub mod table;
pub mod variables;

pub use atomic::{AtomicConstraintDiff, AtomicConstraintStore, ConstraintFamily};
pub use linear::{LinearConstraintDiff, LinearConstraintStore};
pub use matrix::{PairIndex, SparseMatrix, SymmetricMatrix, symmetric_key};
pub use objectives::{ObjectiveData, ObjectiveDiff, ObjectiveStore};
pub use table::EntityTable;
pub use variables::{VariableDiff, VariableStore};

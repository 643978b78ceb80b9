//! Snapshot and update wire records.
//!
//! A [`ModelSnapshot`] is a complete, self-contained copy of a model; a
//! [`ModelUpdate`] is a sparse delta relative to some tracker checkpoint.
//! Both use parallel arrays keyed by raw `u64` ids so they serialize to
//! compact JSON and carry no references into a live store.

pub(crate) mod float;

use serde::{Deserialize, Serialize};

use crate::constraints::{
    IndicatorConstraint, QuadraticConstraint, SecondOrderConeConstraint, Sos1Constraint,
    Sos2Constraint,
};
use crate::model::ModelError;

/// Version written into every snapshot; import rejects anything else.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Sparse `id -> double` vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseDoubleVector {
    pub ids: Vec<u64>,
    #[serde(with = "float::vec")]
    pub values: Vec<f64>,
}

impl SparseDoubleVector {
    pub fn push(&mut self, id: u64, value: f64) {
        self.ids.push(id);
        self.values.push(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.ids.iter().copied().zip(self.values.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sparse `id -> bool` vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseBoolVector {
    pub ids: Vec<u64>,
    pub values: Vec<bool>,
}

impl SparseBoolVector {
    pub fn push(&mut self, id: u64, value: bool) {
        self.ids.push(id);
        self.values.push(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, bool)> + '_ {
        self.ids.iter().copied().zip(self.values.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sparse matrix as parallel row/column/coefficient arrays.
///
/// In updates a coefficient of exactly zero means "erase this entry".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseDoubleMatrix {
    pub row_ids: Vec<u64>,
    pub column_ids: Vec<u64>,
    pub coefficients: Vec<f64>,
}

impl SparseDoubleMatrix {
    pub fn push(&mut self, row: u64, column: u64, coefficient: f64) {
        self.row_ids.push(row);
        self.column_ids.push(column);
        self.coefficients.push(coefficient);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64, f64)> + '_ {
        self.row_ids
            .iter()
            .zip(&self.column_ids)
            .zip(&self.coefficients)
            .map(|((row, column), coefficient)| (*row, *column, *coefficient))
    }

    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariablesSection {
    pub ids: Vec<u64>,
    #[serde(with = "float::vec")]
    pub lower_bounds: Vec<f64>,
    #[serde(with = "float::vec")]
    pub upper_bounds: Vec<f64>,
    pub integers: Vec<bool>,
    pub names: Vec<String>,
}

impl VariablesSection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearConstraintsSection {
    pub ids: Vec<u64>,
    #[serde(with = "float::vec")]
    pub lower_bounds: Vec<f64>,
    #[serde(with = "float::vec")]
    pub upper_bounds: Vec<f64>,
    pub names: Vec<String>,
}

impl LinearConstraintsSection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One objective in full. Quadratic entries are upper triangular (row <= column).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectiveSection {
    pub maximize: bool,
    pub priority: i64,
    pub offset: f64,
    pub linear_coefficients: SparseDoubleVector,
    pub quadratic_coefficients: SparseDoubleMatrix,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliaryObjectivesSection {
    pub ids: Vec<u64>,
    pub objectives: Vec<ObjectiveSection>,
}

impl AuxiliaryObjectivesSection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Constraints of one atomic family, in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSection<F> {
    pub ids: Vec<u64>,
    pub constraints: Vec<F>,
}

impl<F> ConstraintSection<F> {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<F> Default for ConstraintSection<F> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

/// A complete, self-contained copy of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    pub name: String,
    pub variables: VariablesSection,
    pub objective: ObjectiveSection,
    pub auxiliary_objectives: AuxiliaryObjectivesSection,
    pub linear_constraints: LinearConstraintsSection,
    pub linear_constraint_matrix: SparseDoubleMatrix,
    pub quadratic_constraints: ConstraintSection<QuadraticConstraint>,
    pub second_order_cone_constraints: ConstraintSection<SecondOrderConeConstraint>,
    pub sos1_constraints: ConstraintSection<Sos1Constraint>,
    pub sos2_constraints: ConstraintSection<Sos2Constraint>,
    pub indicator_constraints: ConstraintSection<IndicatorConstraint>,
}

impl Default for ModelSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            name: String::new(),
            variables: VariablesSection::default(),
            objective: ObjectiveSection::default(),
            auxiliary_objectives: AuxiliaryObjectivesSection::default(),
            linear_constraints: LinearConstraintsSection::default(),
            linear_constraint_matrix: SparseDoubleMatrix::default(),
            quadratic_constraints: ConstraintSection::default(),
            second_order_cone_constraints: ConstraintSection::default(),
            sos1_constraints: ConstraintSection::default(),
            sos2_constraints: ConstraintSection::default(),
            indicator_constraints: ConstraintSection::default(),
        }
    }
}

impl ModelSnapshot {
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|err| ModelError::invalid_snapshot(err.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|err| ModelError::invalid_snapshot(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableUpdates {
    pub deleted_ids: Vec<u64>,
    pub lower_bounds: SparseDoubleVector,
    pub upper_bounds: SparseDoubleVector,
    pub integers: SparseBoolVector,
    pub new_variables: VariablesSection,
}

impl VariableUpdates {
    pub fn is_empty(&self) -> bool {
        self.deleted_ids.is_empty()
            && self.lower_bounds.is_empty()
            && self.upper_bounds.is_empty()
            && self.integers.is_empty()
            && self.new_variables.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearConstraintUpdates {
    pub deleted_ids: Vec<u64>,
    pub lower_bounds: SparseDoubleVector,
    pub upper_bounds: SparseDoubleVector,
    pub new_constraints: LinearConstraintsSection,
    pub matrix: SparseDoubleMatrix,
}

impl LinearConstraintUpdates {
    pub fn is_empty(&self) -> bool {
        self.deleted_ids.is_empty()
            && self.lower_bounds.is_empty()
            && self.upper_bounds.is_empty()
            && self.new_constraints.is_empty()
            && self.matrix.is_empty()
    }
}

/// Changed fields of one objective that existed at the checkpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectiveUpdates {
    pub maximize: Option<bool>,
    pub priority: Option<i64>,
    pub offset: Option<f64>,
    pub linear_coefficients: SparseDoubleVector,
    pub quadratic_coefficients: SparseDoubleMatrix,
}

impl ObjectiveUpdates {
    pub fn is_empty(&self) -> bool {
        self.maximize.is_none()
            && self.priority.is_none()
            && self.offset.is_none()
            && self.linear_coefficients.is_empty()
            && self.quadratic_coefficients.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliaryObjectiveUpdates {
    pub deleted_ids: Vec<u64>,
    pub ids: Vec<u64>,
    pub updates: Vec<ObjectiveUpdates>,
    pub new_objectives: AuxiliaryObjectivesSection,
}

impl AuxiliaryObjectiveUpdates {
    pub fn is_empty(&self) -> bool {
        self.deleted_ids.is_empty() && self.ids.is_empty() && self.new_objectives.is_empty()
    }
}

/// Atomic constraints are immutable, so a family only ever reports deletions
/// and new constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicConstraintUpdates<F> {
    pub deleted_ids: Vec<u64>,
    pub new_constraints: ConstraintSection<F>,
}

impl<F> AtomicConstraintUpdates<F> {
    pub fn is_empty(&self) -> bool {
        self.deleted_ids.is_empty() && self.new_constraints.is_empty()
    }
}

impl<F> Default for AtomicConstraintUpdates<F> {
    fn default() -> Self {
        Self {
            deleted_ids: Vec::new(),
            new_constraints: ConstraintSection::default(),
        }
    }
}

/// Sparse delta between a tracker checkpoint and the current model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub variables: VariableUpdates,
    pub linear_constraints: LinearConstraintUpdates,
    pub objective: ObjectiveUpdates,
    pub auxiliary_objectives: AuxiliaryObjectiveUpdates,
    pub quadratic_constraints: AtomicConstraintUpdates<QuadraticConstraint>,
    pub second_order_cone_constraints: AtomicConstraintUpdates<SecondOrderConeConstraint>,
    pub sos1_constraints: AtomicConstraintUpdates<Sos1Constraint>,
    pub sos2_constraints: AtomicConstraintUpdates<Sos2Constraint>,
    pub indicator_constraints: AtomicConstraintUpdates<IndicatorConstraint>,
}

impl ModelUpdate {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.linear_constraints.is_empty()
            && self.objective.is_empty()
            && self.auxiliary_objectives.is_empty()
            && self.quadratic_constraints.is_empty()
            && self.second_order_cone_constraints.is_empty()
            && self.sos1_constraints.is_empty()
            && self.sos2_constraints.is_empty()
            && self.indicator_constraints.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|err| {
            ModelError::invalid_update("update", None, format!("encode failed: {err}"))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|err| {
            ModelError::invalid_update("update", None, format!("decode failed: {err}"))
        })
    }
}

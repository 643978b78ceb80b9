//! In-memory optimization model storage with checkpoint/diff tracking.
//!
//! [`ModelStore`] holds variables, objectives, linear constraints and atomic
//! constraint families. Trackers created with [`ModelStore::new_tracker`]
//! accumulate changes so consumers can pull a [`ModelUpdate`] containing only
//! what changed since their last checkpoint.

pub mod constraints;
pub mod handle;
pub mod logging;
pub mod model;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod wire;

pub use constraints::{
    AtomicFamily, IndicatorConstraint, QuadraticConstraint, SecondOrderConeConstraint,
    Sos1Constraint, Sos2Constraint,
};
pub use handle::{Handle, StoreId};
pub use logging::{LogFormat, LoggingError, enable_logging};
pub use model::{
    DELETED_CONSTRAINT_NAME, DELETED_LINEAR_CONSTRAINT_NAME, DELETED_OBJECTIVE_NAME,
    DELETED_VARIABLE_NAME, ModelError, ModelStore, StoredEntity,
};
pub use optstore_ids::{
    AuxiliaryObjectiveId, EntityId, IndicatorConstraintId, LinearConstraintId, ObjectiveId,
    QuadraticConstraintId, SecondOrderConeConstraintId, Sos1ConstraintId, Sos2ConstraintId,
    VariableId,
};
pub use storage::{ConstraintFamily, ObjectiveData};
pub use tracker::TrackerId;
pub use types::{Bounds, LinearConstraintData, LinearExpression, Sense, VariableData};
pub use wire::{ModelSnapshot, ModelUpdate, SNAPSHOT_FORMAT_VERSION};

//! Model error types.

use optstore_ids::EntityId;

use crate::handle::StoreId;

/// Errors that can occur during model operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Id never existed or was deleted
    NotFound { kind: &'static str, id: u64 },
    /// Handle or tracker belongs to another store
    ForeignStorage { expected: StoreId, actual: StoreId },
    /// Update references an id that is neither live nor a valid new id
    InvalidUpdate {
        section: String,
        id: Option<u64>,
        reason: String,
    },
    /// Snapshot is malformed or has an unsupported version
    InvalidSnapshot { reason: String },
    /// Tracker was deleted
    TrackerDestroyed(u64),
    /// Coefficient is NaN or infinite
    InvalidCoefficient { value: f64 },
    /// Constraint record is internally inconsistent
    InvalidConstraint { reason: String },
}

impl ModelError {
    pub(crate) fn not_found<I: EntityId>(id: I) -> Self {
        ModelError::NotFound {
            kind: I::KIND,
            id: id.inner(),
        }
    }

    pub(crate) fn invalid_update(
        section: impl Into<String>,
        id: Option<u64>,
        reason: impl Into<String>,
    ) -> Self {
        ModelError::InvalidUpdate {
            section: section.into(),
            id,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_snapshot(reason: impl Into<String>) -> Self {
        ModelError::InvalidSnapshot {
            reason: reason.into(),
        }
    }

    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::NotFound { .. } => "ENTITY_NOT_FOUND",
            ModelError::ForeignStorage { .. } => "STORAGE_FOREIGN",
            ModelError::InvalidUpdate { .. } => "UPDATE_INVALID",
            ModelError::InvalidSnapshot { .. } => "SNAPSHOT_INVALID",
            ModelError::TrackerDestroyed(_) => "TRACKER_DESTROYED",
            ModelError::InvalidCoefficient { .. } => "COEFFICIENT_INVALID",
            ModelError::InvalidConstraint { .. } => "CONSTRAINT_INVALID",
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NotFound { kind, id } => write!(
                f,
                "[{}] {} with id {} does not exist",
                self.code(),
                kind,
                id
            ),
            ModelError::ForeignStorage { expected, actual } => write!(
                f,
                "[{}] handle belongs to store {} but was used with store {}",
                self.code(),
                actual.inner(),
                expected.inner()
            ),
            ModelError::InvalidUpdate {
                section,
                id: Some(id),
                reason,
            } => write!(
                f,
                "[{}] update section '{}' id {}: {}",
                self.code(),
                section,
                id,
                reason
            ),
            ModelError::InvalidUpdate {
                section,
                id: None,
                reason,
            } => write!(
                f,
                "[{}] update section '{}': {}",
                self.code(),
                section,
                reason
            ),
            ModelError::InvalidSnapshot { reason } => {
                write!(f, "[{}] snapshot invalid: {}", self.code(), reason)
            }
            ModelError::TrackerDestroyed(id) => write!(
                f,
                "[{}] tracker {} was deleted and can no longer be used",
                self.code(),
                id
            ),
            ModelError::InvalidCoefficient { value } => write!(
                f,
                "[{}] coefficient must be finite (got {})",
                self.code(),
                value
            ),
            ModelError::InvalidConstraint { reason } => {
                write!(f, "[{}] constraint invalid: {}", self.code(), reason)
            }
        }
    }
}

impl std::error::Error for ModelError {}

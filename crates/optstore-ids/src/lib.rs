//! Strongly-typed indices for every entity kind held by an optstore model.
//!
//! Each kind gets its own newtype over `u64` so a variable index can never be
//! passed where a constraint index is expected. Generic containers use the
//! [`EntityId`] trait to allocate and report indices without knowing the kind.

use std::fmt::Debug;
use std::hash::Hash;

/// Behaviour shared by all typed indices.
pub trait EntityId: Copy + Debug + Eq + Ord + Hash + Send + Sync + 'static {
    /// Human readable entity kind, used in error messages and logs.
    const KIND: &'static str;

    /// Create an index from its raw value.
    fn new(value: u64) -> Self;

    /// Get the raw value.
    fn inner(self) -> u64;

    /// The index immediately after this one, or `None` at `u64::MAX`.
    fn next(self) -> Option<Self> {
        self.inner().checked_add(1).map(Self::new)
    }
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Get the inner u64 value.
            pub fn inner(self) -> u64 {
                self.0
            }

            /// Create an ID from a u64 value.
            pub fn new(value: u64) -> Self {
                Self(value)
            }
        }

        impl EntityId for $name {
            const KIND: &'static str = $kind;

            fn new(value: u64) -> Self {
                Self(value)
            }

            fn inner(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

define_id_type!(VariableId, "variable");
define_id_type!(LinearConstraintId, "linear_constraint");
define_id_type!(AuxiliaryObjectiveId, "auxiliary_objective");
define_id_type!(QuadraticConstraintId, "quadratic_constraint");
define_id_type!(SecondOrderConeConstraintId, "second_order_cone_constraint");
define_id_type!(Sos1ConstraintId, "sos1_constraint");
define_id_type!(Sos2ConstraintId, "sos2_constraint");
define_id_type!(IndicatorConstraintId, "indicator_constraint");

/// Identifies either the primary objective or one auxiliary objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectiveId {
    Primary,
    Auxiliary(AuxiliaryObjectiveId),
}

impl ObjectiveId {
    pub fn is_primary(self) -> bool {
        matches!(self, ObjectiveId::Primary)
    }

    /// The auxiliary index, or `None` for the primary objective.
    pub fn auxiliary(self) -> Option<AuxiliaryObjectiveId> {
        match self {
            ObjectiveId::Primary => None,
            ObjectiveId::Auxiliary(id) => Some(id),
        }
    }
}

impl From<AuxiliaryObjectiveId> for ObjectiveId {
    fn from(id: AuxiliaryObjectiveId) -> Self {
        ObjectiveId::Auxiliary(id)
    }
}

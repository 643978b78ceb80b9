//! Atomic constraint families.
//!
//! Every family is a plain data record implementing
//! [`ConstraintFamily`](crate::storage::ConstraintFamily). The
//! `atomic_families!` invocation at the bottom of this file is the only place
//! that lists them; it generates the per-family store/diff containers and the
//! [`AtomicFamily`] accessors the root store uses to reach a family's storage,
//! accumulator and wire sections generically.

mod indicator;
mod quadratic;
mod second_order_cone;
mod sos;

use std::collections::BTreeSet;

use optstore_ids::{EntityId, VariableId};

use crate::model::ModelError;
use crate::model::update::check_new_ids;
use crate::storage::{AtomicConstraintDiff, AtomicConstraintStore, ConstraintFamily};
use crate::wire::{AtomicConstraintUpdates, ConstraintSection, ModelSnapshot, ModelUpdate};

pub use indicator::IndicatorConstraint;
pub use quadratic::QuadraticConstraint;
pub use second_order_cone::SecondOrderConeConstraint;
pub use sos::{Sos1Constraint, Sos2Constraint};

/// Routes generic code to one family's storage and wire sections.
pub trait AtomicFamily: ConstraintFamily {
    /// Section label used in update validation errors.
    const SECTION: &'static str;

    fn store(atomic: &AtomicConstraints) -> &AtomicConstraintStore<Self>;
    fn store_mut(atomic: &mut AtomicConstraints) -> &mut AtomicConstraintStore<Self>;
    fn diff_mut(diffs: &mut AtomicDiffs) -> &mut AtomicConstraintDiff<Self::Id>;
    fn snapshot_section(snapshot: &ModelSnapshot) -> &ConstraintSection<Self>;
    fn update_section(update: &ModelUpdate) -> &AtomicConstraintUpdates<Self>;
}

/// Check a record's coefficients and variable references before it is stored.
pub(crate) fn validate_record<F: ConstraintFamily>(
    data: &F,
    variable_exists: impl Fn(VariableId) -> bool,
) -> Result<(), ModelError> {
    if let Some(value) = data.invalid_coefficient() {
        return Err(ModelError::InvalidCoefficient { value });
    }
    if let Some(reason) = data.shape_error() {
        return Err(ModelError::InvalidConstraint { reason });
    }
    match data
        .related_variables()
        .into_iter()
        .find(|variable| !variable_exists(*variable))
    {
        Some(variable) => Err(ModelError::not_found(variable)),
        None => Ok(()),
    }
}

fn validate_family_update<F: AtomicFamily>(
    store: &AtomicConstraintStore<F>,
    updates: &AtomicConstraintUpdates<F>,
    variable_exists: &dyn Fn(VariableId) -> bool,
) -> Result<(), ModelError> {
    let mut deleted = BTreeSet::new();
    for raw in &updates.deleted_ids {
        if !store.contains(F::Id::new(*raw)) {
            return Err(ModelError::invalid_update(
                F::SECTION,
                Some(*raw),
                "deleted id is not a live constraint",
            ));
        }
        if !deleted.insert(*raw) {
            return Err(ModelError::invalid_update(
                F::SECTION,
                Some(*raw),
                "id deleted twice",
            ));
        }
    }

    let section = &updates.new_constraints;
    if section.ids.len() != section.constraints.len() {
        return Err(ModelError::invalid_update(
            F::SECTION,
            None,
            "ids and constraints have different lengths",
        ));
    }
    check_new_ids(F::SECTION, &section.ids, store.next_id().inner())?;
    for (raw, data) in section.ids.iter().zip(&section.constraints) {
        validate_record(data, variable_exists).map_err(|err| {
            ModelError::invalid_update(F::SECTION, Some(*raw), err.to_string())
        })?;
    }
    Ok(())
}

fn apply_family_deletions<'a, F: AtomicFamily>(
    store: &mut AtomicConstraintStore<F>,
    updates: &AtomicConstraintUpdates<F>,
    diffs: impl Iterator<Item = &'a mut AtomicDiffs>,
) -> Result<(), ModelError> {
    let mut diffs: Vec<&'a mut AtomicDiffs> = diffs.collect();
    for raw in &updates.deleted_ids {
        store.delete(
            F::Id::new(*raw),
            diffs.iter_mut().map(|diffs| F::diff_mut(diffs)),
        )?;
    }
    Ok(())
}

fn apply_family_additions<F: AtomicFamily>(
    store: &mut AtomicConstraintStore<F>,
    updates: &AtomicConstraintUpdates<F>,
) {
    let section = &updates.new_constraints;
    for (raw, data) in section.ids.iter().zip(&section.constraints) {
        store.ensure_next_id_at_least(F::Id::new(*raw));
        store.add(data.clone());
    }
}

macro_rules! atomic_families {
    ($($field:ident: $family:ty => $section:literal),+ $(,)?) => {
        /// One generic store per atomic constraint family.
        #[derive(Debug, Clone, Default)]
        pub struct AtomicConstraints {
            $(pub(crate) $field: AtomicConstraintStore<$family>,)+
        }

        /// One deletion accumulator per atomic constraint family.
        #[derive(Debug, Clone)]
        pub struct AtomicDiffs {
            $(pub(crate) $field: AtomicConstraintDiff<<$family as ConstraintFamily>::Id>,)+
        }

        impl AtomicDiffs {
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_empty())+
            }
        }

        impl AtomicConstraints {
            /// Fresh accumulators whose boundaries are the current next ids.
            pub(crate) fn checkpoint(&self) -> AtomicDiffs {
                AtomicDiffs {
                    $($field: AtomicConstraintDiff::new(self.$field.next_id()),)+
                }
            }

            /// Strip `variable` from every family. Returns how many
            /// constraints were touched.
            pub(crate) fn delete_variable(&mut self, variable: VariableId) -> usize {
                0 $(+ self.$field.delete_variable(variable).len())+
            }

            /// Total number of atomic constraints across families.
            pub(crate) fn len(&self) -> usize {
                0 $(+ self.$field.size())+
            }

            pub(crate) fn export(&self, snapshot: &mut ModelSnapshot, remove_names: bool) {
                $(snapshot.$field = self.$field.export(remove_names);)+
            }

            pub(crate) fn export_update(
                &self,
                diffs: &AtomicDiffs,
                update: &mut ModelUpdate,
                remove_names: bool,
            ) {
                $(update.$field = self.$field.export_update(&diffs.$field, remove_names);)+
            }

            pub(crate) fn validate_update(
                &self,
                update: &ModelUpdate,
                variable_exists: &dyn Fn(VariableId) -> bool,
            ) -> Result<(), ModelError> {
                $(validate_family_update(&self.$field, &update.$field, variable_exists)?;)+
                Ok(())
            }

            pub(crate) fn apply_deletions<'a>(
                &mut self,
                update: &ModelUpdate,
                diffs: impl Iterator<Item = &'a mut AtomicDiffs>,
            ) -> Result<(), ModelError> {
                let mut diffs: Vec<&'a mut AtomicDiffs> = diffs.collect();
                $(apply_family_deletions(
                    &mut self.$field,
                    &update.$field,
                    diffs.iter_mut().map(|diffs| &mut **diffs),
                )?;)+
                Ok(())
            }

            pub(crate) fn apply_additions(&mut self, update: &ModelUpdate) {
                $(apply_family_additions(&mut self.$field, &update.$field);)+
            }

            /// Family names with a live constraint referencing `variable`.
            pub(crate) fn families_with_variable(&self, variable: VariableId) -> Vec<&'static str> {
                let mut families = Vec::new();
                $(if !self.$field.related_constraints(variable).is_empty() {
                    families.push($section);
                })+
                families
            }

            #[cfg(test)]
            pub(crate) fn assert_consistent(&self) {
                $(self.$field.assert_consistent();)+
            }
        }

        $(
            impl AtomicFamily for $family {
                const SECTION: &'static str = $section;

                fn store(atomic: &AtomicConstraints) -> &AtomicConstraintStore<Self> {
                    &atomic.$field
                }

                fn store_mut(atomic: &mut AtomicConstraints) -> &mut AtomicConstraintStore<Self> {
                    &mut atomic.$field
                }

                fn diff_mut(diffs: &mut AtomicDiffs) -> &mut AtomicConstraintDiff<Self::Id> {
                    &mut diffs.$field
                }

                fn snapshot_section(snapshot: &ModelSnapshot) -> &ConstraintSection<Self> {
                    &snapshot.$field
                }

                fn update_section(update: &ModelUpdate) -> &AtomicConstraintUpdates<Self> {
                    &update.$field
                }
            }
        )+
    };
}

atomic_families! {
    quadratic_constraints: QuadraticConstraint => "quadratic_constraints",
    second_order_cone_constraints: SecondOrderConeConstraint => "second_order_cone_constraints",
    sos1_constraints: Sos1Constraint => "sos1_constraints",
    sos2_constraints: Sos2Constraint => "sos2_constraints",
    indicator_constraints: IndicatorConstraint => "indicator_constraints",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bounds, LinearExpression};

    fn v(id: u64) -> VariableId {
        VariableId::new(id)
    }

    fn populated() -> AtomicConstraints {
        let mut atomic = AtomicConstraints::default();
        atomic.quadratic_constraints.add(QuadraticConstraint::new(
            vec![(v(0), 1.0)],
            vec![(v(1), v(1), 2.0)],
            Bounds::new(f64::NEG_INFINITY, 4.0),
        ));
        atomic.sos1_constraints.add(Sos1Constraint::new(
            vec![LinearExpression::new(vec![(v(0), 1.0)], 0.0)],
            Vec::new(),
        ));
        atomic.indicator_constraints.add(IndicatorConstraint::new(
            v(2),
            vec![(v(0), 1.0)],
            Bounds::new(0.0, 1.0),
        ));
        atomic
    }

    #[test]
    fn delete_variable_visits_every_family() {
        let mut atomic = populated();
        assert_eq!(
            atomic.families_with_variable(v(0)),
            vec!["quadratic_constraints", "sos1_constraints", "indicator_constraints"]
        );
        assert_eq!(atomic.delete_variable(v(0)), 3);
        assert!(atomic.families_with_variable(v(0)).is_empty());
        assert_eq!(atomic.len(), 3);
        atomic.assert_consistent();
    }

    #[test]
    fn checkpoint_starts_empty_and_records_old_deletions() {
        let mut atomic = populated();
        let mut diffs = atomic.checkpoint();
        assert!(diffs.is_empty());

        let id = atomic.quadratic_constraints.sorted_ids()[0];
        QuadraticConstraint::store_mut(&mut atomic)
            .delete(id, [QuadraticConstraint::diff_mut(&mut diffs)])
            .unwrap();
        assert!(!diffs.is_empty());

        let mut update = ModelUpdate::default();
        atomic.export_update(&diffs, &mut update, false);
        assert_eq!(update.quadratic_constraints.deleted_ids, vec![id.inner()]);
        assert!(update.sos1_constraints.is_empty());
    }

    #[test]
    fn validate_update_rejects_unknown_variables_and_stale_ids() {
        let atomic = populated();
        let exists = |variable: VariableId| variable.inner() < 3;

        let mut update = ModelUpdate::default();
        update.sos2_constraints.new_constraints.ids.push(0);
        update
            .sos2_constraints
            .new_constraints
            .constraints
            .push(Sos2Constraint::new(
                vec![LinearExpression::new(vec![(v(7), 1.0)], 0.0)],
                Vec::new(),
            ));
        let err = atomic.validate_update(&update, &exists).unwrap_err();
        assert_eq!(err.code(), "UPDATE_INVALID");

        let mut update = ModelUpdate::default();
        update.quadratic_constraints.new_constraints.ids.push(0);
        update
            .quadratic_constraints
            .new_constraints
            .constraints
            .push(QuadraticConstraint::new(Vec::new(), Vec::new(), Bounds::free()));
        assert!(atomic.validate_update(&update, &exists).is_err());

        let mut update = ModelUpdate::default();
        update.indicator_constraints.deleted_ids = vec![0, 0];
        assert!(atomic.validate_update(&update, &exists).is_err());
    }

    #[test]
    fn validate_record_reports_non_finite_coefficients() {
        let record = QuadraticConstraint::new(vec![(v(0), f64::NAN)], Vec::new(), Bounds::free());
        let err = validate_record(&record, |_| true).unwrap_err();
        assert_eq!(err.code(), "COEFFICIENT_INVALID");
    }
}

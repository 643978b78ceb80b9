//! Full snapshot export and import.

use std::time::Instant;

use crate::model::ModelStore;
use crate::model::error::ModelError;
use crate::wire::{
    AtomicConstraintUpdates, AuxiliaryObjectiveUpdates, ConstraintSection, LinearConstraintUpdates,
    ModelSnapshot, ModelUpdate, ObjectiveSection, ObjectiveUpdates, SNAPSHOT_FORMAT_VERSION,
    VariableUpdates,
};

impl ModelStore {
    /// Serialize every live entity, independent of any tracker.
    pub fn export_snapshot(&self, remove_names: bool) -> ModelSnapshot {
        let started = Instant::now();
        let (linear_constraints, linear_constraint_matrix) =
            self.linear_constraints.export(remove_names);
        let (objective, auxiliary_objectives) = self.objectives.export(remove_names);
        let mut snapshot = ModelSnapshot {
            version: SNAPSHOT_FORMAT_VERSION,
            name: if remove_names {
                String::new()
            } else {
                self.name().to_string()
            },
            variables: self.variables.export(remove_names),
            objective,
            auxiliary_objectives,
            linear_constraints,
            linear_constraint_matrix,
            ..ModelSnapshot::default()
        };
        self.atomic.export(&mut snapshot, remove_names);

        tracing::debug!(
            component = "snapshot",
            operation = "export_snapshot",
            status = "success",
            variables = snapshot.variables.ids.len(),
            linear_constraints = snapshot.linear_constraints.ids.len(),
            matrix_entries = snapshot.linear_constraint_matrix.len(),
            atomic_constraints = self.atomic.len(),
            remove_names,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Exported snapshot"
        );
        snapshot
    }

    /// Build a model from a snapshot, preserving every id.
    ///
    /// The snapshot is validated in full first; on any inconsistency no store
    /// is returned.
    pub fn from_snapshot(snapshot: &ModelSnapshot) -> Result<ModelStore, ModelError> {
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(ModelError::invalid_snapshot(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        let mut store = ModelStore::new(snapshot.name.clone());
        let update = snapshot_as_update(snapshot);
        if let Err(err) = store.apply_update(&update) {
            tracing::warn!(
                component = "snapshot",
                operation = "from_snapshot",
                status = "error",
                error_code = err.code(),
                error = %err,
                "Rejected snapshot"
            );
            return Err(ModelError::invalid_snapshot(err.to_string()));
        }
        store
            .objectives
            .set_primary_name(snapshot.objective.name.clone());

        tracing::debug!(
            component = "snapshot",
            operation = "from_snapshot",
            status = "success",
            store = store.store_id().inner(),
            variables = store.num_variables(),
            linear_constraints = store.num_linear_constraints(),
            "Imported snapshot"
        );
        Ok(store)
    }
}

/// Express a snapshot as an update against an empty model.
fn snapshot_as_update(snapshot: &ModelSnapshot) -> ModelUpdate {
    ModelUpdate {
        variables: VariableUpdates {
            new_variables: snapshot.variables.clone(),
            ..VariableUpdates::default()
        },
        linear_constraints: LinearConstraintUpdates {
            new_constraints: snapshot.linear_constraints.clone(),
            matrix: snapshot.linear_constraint_matrix.clone(),
            ..LinearConstraintUpdates::default()
        },
        objective: objective_as_update(&snapshot.objective),
        auxiliary_objectives: AuxiliaryObjectiveUpdates {
            new_objectives: snapshot.auxiliary_objectives.clone(),
            ..AuxiliaryObjectiveUpdates::default()
        },
        quadratic_constraints: as_new(&snapshot.quadratic_constraints),
        second_order_cone_constraints: as_new(&snapshot.second_order_cone_constraints),
        sos1_constraints: as_new(&snapshot.sos1_constraints),
        sos2_constraints: as_new(&snapshot.sos2_constraints),
        indicator_constraints: as_new(&snapshot.indicator_constraints),
    }
}

fn objective_as_update(section: &ObjectiveSection) -> ObjectiveUpdates {
    ObjectiveUpdates {
        maximize: Some(section.maximize),
        priority: Some(section.priority),
        offset: Some(section.offset),
        linear_coefficients: section.linear_coefficients.clone(),
        quadratic_coefficients: section.quadratic_coefficients.clone(),
    }
}

fn as_new<F: Clone>(section: &ConstraintSection<F>) -> AtomicConstraintUpdates<F> {
    AtomicConstraintUpdates {
        deleted_ids: Vec::new(),
        new_constraints: section.clone(),
    }
}

//! Checkpoint trackers and incremental update export.

use std::time::Instant;

use crate::model::ModelStore;
use crate::model::error::ModelError;
use crate::storage::{LinearConstraintDiff, ObjectiveDiff, VariableDiff};
use crate::tracker::{ModelDiff, TrackerId};
use crate::wire::ModelUpdate;

impl ModelStore {
    /// Empty accumulators whose boundaries are the current next ids.
    fn checkpoint(&self) -> ModelDiff {
        let variable_checkpoint = self.variables.next_id();
        ModelDiff::new(
            VariableDiff::new(variable_checkpoint),
            ObjectiveDiff::new(self.objectives.next_auxiliary_id(), variable_checkpoint),
            LinearConstraintDiff::new(self.linear_constraints.next_id(), variable_checkpoint),
            self.atomic.checkpoint(),
        )
    }

    /// Register a tracker whose checkpoint is the model as it is now.
    pub fn new_tracker(&mut self) -> TrackerId {
        let checkpoint = self.checkpoint();
        let id = self.trackers.insert(checkpoint);
        tracing::debug!(
            component = "tracker",
            operation = "new_tracker",
            status = "success",
            tracker_id = id.index(),
            trackers = self.trackers.len(),
            "Created tracker"
        );
        id
    }

    /// Delete a tracker. Any later use of `id` fails with `TrackerDestroyed`.
    pub fn delete_tracker(&mut self, id: TrackerId) -> Result<(), ModelError> {
        self.trackers.remove(id)?;
        tracing::debug!(
            component = "tracker",
            operation = "delete_tracker",
            status = "success",
            tracker_id = id.index(),
            trackers = self.trackers.len(),
            "Deleted tracker"
        );
        Ok(())
    }

    /// Discard everything `id` has accumulated and move its checkpoint to now.
    pub fn advance_checkpoint(&mut self, id: TrackerId) -> Result<(), ModelError> {
        let checkpoint = self.checkpoint();
        *self.trackers.get_mut(id)? = checkpoint;
        tracing::debug!(
            component = "tracker",
            operation = "advance_checkpoint",
            status = "success",
            tracker_id = id.index(),
            "Advanced checkpoint"
        );
        Ok(())
    }

    /// Number of live trackers.
    pub fn num_trackers(&self) -> usize {
        self.trackers.len()
    }

    /// Changes since `id`'s checkpoint, or `None` when there are none.
    ///
    /// Applying the result to a model equal to this one at the checkpoint
    /// reproduces this model. Export does not touch the tracker, so calls for
    /// different trackers may run concurrently.
    pub fn export_update(
        &self,
        id: TrackerId,
        remove_names: bool,
    ) -> Result<Option<ModelUpdate>, ModelError> {
        let started = Instant::now();
        let diff = self.trackers.get(id)?;
        let new_variables = self
            .variables
            .sorted_ids_from(diff.variables.checkpoint());

        let mut update = ModelUpdate {
            variables: self.variables.export_update(&diff.variables, remove_names),
            linear_constraints: self.linear_constraints.export_update(
                &diff.linear_constraints,
                &new_variables,
                remove_names,
            ),
            ..ModelUpdate::default()
        };
        let (objective, auxiliary_objectives) =
            self.objectives
                .export_update(&diff.objectives, &new_variables, remove_names);
        update.objective = objective;
        update.auxiliary_objectives = auxiliary_objectives;
        self.atomic
            .export_update(&diff.atomic, &mut update, remove_names);

        let empty = update.is_empty();
        tracing::debug!(
            component = "tracker",
            operation = "export_update",
            status = "success",
            tracker_id = id.index(),
            empty,
            new_variables = update.variables.new_variables.ids.len(),
            deleted_variables = update.variables.deleted_ids.len(),
            matrix_entries = update.linear_constraints.matrix.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Exported update"
        );
        Ok((!empty).then_some(update))
    }
}

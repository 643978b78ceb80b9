use super::support::{bounded_constraint, continuous, two_variable_model};
use super::*;
use crate::constraints::{IndicatorConstraint, QuadraticConstraint, Sos1Constraint};

#[test]
#[allow(clippy::float_cmp)]
fn test_deleted_variable_and_bound_change_scenario() {
    let (mut model, x, y, _c0) = two_variable_model();
    assert_eq!((x.inner(), y.inner()), (0, 1));
    let tracker = model.new_tracker();

    model.delete_variable(x).unwrap();
    model.set_variable_upper_bound(y, 3.0).unwrap();

    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.variables.deleted_ids, vec![0]);
    assert!(!update.linear_constraints.matrix.column_ids.contains(&0));
    assert_eq!(update.variables.upper_bounds.ids, vec![1]);
    assert_eq!(update.variables.upper_bounds.values, vec![3.0]);
    assert!(update.variables.new_variables.is_empty());
}

#[test]
fn test_untouched_model_exports_nothing() {
    let (mut model, x, _y, _c0) = two_variable_model();
    let tracker = model.new_tracker();
    assert_eq!(model.export_update(tracker, false).unwrap(), None);

    // Writing the current value is not a change.
    model.set_variable_lower_bound(x, 0.0).unwrap();
    assert_eq!(model.export_update(tracker, false).unwrap(), None);
}

#[test]
fn test_created_then_deleted_entities_are_invisible() {
    let (mut model, x, _y, c0) = two_variable_model();
    let tracker = model.new_tracker();

    let z = model.add_variable(continuous(0.0, 1.0, "z"));
    model.set_linear_constraint_coefficient(c0, z, 4.0).unwrap();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, z, 2.0)
        .unwrap();
    let c1 = model
        .add_linear_constraint_with_terms(bounded_constraint(0.0, 1.0, "c1"), vec![(x, 1.0)])
        .unwrap();
    let aux = model.add_auxiliary_objective(1, "aux");
    model
        .set_objective_linear_coefficient(aux.into(), x, 1.0)
        .unwrap();
    let quad = model
        .add_constraint(QuadraticConstraint::new(
            vec![(x, 1.0)],
            vec![(x, x, 1.0)],
            Bounds::free(),
        ))
        .unwrap();

    model.delete_constraint::<QuadraticConstraint>(quad).unwrap();
    model.delete_auxiliary_objective(aux).unwrap();
    model.delete_linear_constraint(c1).unwrap();
    model.delete_variable(z).unwrap();

    assert_eq!(model.export_update(tracker, false).unwrap(), None);
}

#[test]
fn test_modified_then_deleted_reports_single_deletion() {
    let (mut model, x, _y, c0) = two_variable_model();
    let tracker = model.new_tracker();

    model.set_variable_lower_bound(x, 1.0).unwrap();
    model.set_variable_integer(x, true).unwrap();
    model.set_linear_constraint_coefficient(c0, x, 7.0).unwrap();
    model.set_linear_constraint_upper_bound(c0, 9.0).unwrap();
    model.delete_linear_constraint(c0).unwrap();
    model.delete_variable(x).unwrap();

    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.variables.deleted_ids, vec![x.inner()]);
    assert!(update.variables.lower_bounds.is_empty());
    assert!(update.variables.integers.is_empty());
    assert_eq!(update.linear_constraints.deleted_ids, vec![c0.inner()]);
    assert!(update.linear_constraints.upper_bounds.is_empty());
    assert!(update.linear_constraints.matrix.is_empty());
}

#[test]
#[allow(clippy::float_cmp)]
fn test_new_entities_are_exported_in_full() {
    let (mut model, x, _y, c0) = two_variable_model();
    let tracker = model.new_tracker();

    let z = model.add_variable(continuous(-1.0, 1.0, "z"));
    model.set_variable_integer(z, true).unwrap();
    model.set_linear_constraint_coefficient(c0, z, 2.5).unwrap();
    let c1 = model
        .add_linear_constraint_with_terms(bounded_constraint(1.0, 2.0, "c1"), vec![(x, 3.0)])
        .unwrap();

    let update = model.export_update(tracker, false).unwrap().unwrap();
    let new_variables = &update.variables.new_variables;
    assert_eq!(new_variables.ids, vec![z.inner()]);
    assert_eq!(new_variables.integers, vec![true]);
    assert_eq!(new_variables.names, vec!["z"]);
    assert!(update.variables.integers.is_empty());

    assert_eq!(update.linear_constraints.new_constraints.ids, vec![c1.inner()]);
    let entries: Vec<(u64, u64, f64)> = update.linear_constraints.matrix.iter().collect();
    assert_eq!(
        entries,
        vec![
            (c0.inner(), z.inner(), 2.5),
            (c1.inner(), x.inner(), 3.0)
        ]
    );
}

#[test]
#[allow(clippy::float_cmp)]
fn test_objective_changes_are_reported_per_field() {
    let (mut model, x, y, _c0) = two_variable_model();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, x, 1.0)
        .unwrap();
    let aux = model.add_auxiliary_objective(3, "secondary");
    let tracker = model.new_tracker();

    model
        .set_objective_sense(ObjectiveId::Primary, Sense::Maximize)
        .unwrap();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, x, 0.0)
        .unwrap();
    model
        .set_objective_quadratic_coefficient(ObjectiveId::Primary, y, x, 0.5)
        .unwrap();
    model.set_objective_priority(aux.into(), 1).unwrap();
    let fresh = model.add_auxiliary_objective(7, "fresh");

    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.objective.maximize, Some(true));
    assert_eq!(update.objective.offset, None);
    assert_eq!(update.objective.linear_coefficients.ids, vec![x.inner()]);
    assert_eq!(update.objective.linear_coefficients.values, vec![0.0]);
    assert_eq!(
        update.objective.quadratic_coefficients.iter().collect::<Vec<_>>(),
        vec![(x.inner(), y.inner(), 0.5)]
    );

    let auxiliary = &update.auxiliary_objectives;
    assert_eq!(auxiliary.ids, vec![aux.inner()]);
    assert_eq!(auxiliary.updates[0].priority, Some(1));
    assert_eq!(auxiliary.new_objectives.ids, vec![fresh.inner()]);
    assert_eq!(auxiliary.new_objectives.objectives[0].priority, 7);
}

#[test]
fn test_advance_checkpoint_clears_and_moves_boundary() {
    let (mut model, x, _y, _c0) = two_variable_model();
    let tracker = model.new_tracker();
    model.set_variable_upper_bound(x, 2.0).unwrap();
    let z = model.add_variable(continuous(0.0, 1.0, "z"));

    model.advance_checkpoint(tracker).unwrap();
    assert_eq!(model.export_update(tracker, false).unwrap(), None);

    // `z` is now known to the consumer, so edits show up as attribute changes.
    model.set_variable_lower_bound(z, 0.5).unwrap();
    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.variables.lower_bounds.ids, vec![z.inner()]);
    assert!(update.variables.new_variables.is_empty());
}

#[test]
fn test_trackers_are_independent() {
    let (mut model, x, y, _c0) = two_variable_model();
    let first = model.new_tracker();
    model.set_variable_upper_bound(x, 4.0).unwrap();
    let second = model.new_tracker();
    model.set_variable_upper_bound(y, 6.0).unwrap();
    assert_eq!(model.num_trackers(), 2);

    let first_update = model.export_update(first, false).unwrap().unwrap();
    let second_update = model.export_update(second, false).unwrap().unwrap();
    assert_eq!(
        first_update.variables.upper_bounds.ids,
        vec![x.inner(), y.inner()]
    );
    assert_eq!(second_update.variables.upper_bounds.ids, vec![y.inner()]);

    model.advance_checkpoint(first).unwrap();
    assert!(model.export_update(second, false).unwrap().is_some());
}

#[test]
fn test_deleted_tracker_fails_deterministically() {
    let (mut model, _x, _y, _c0) = two_variable_model();
    let tracker = model.new_tracker();
    model.delete_tracker(tracker).unwrap();
    assert_eq!(model.num_trackers(), 0);

    for err in [
        model.export_update(tracker, false).unwrap_err(),
        model.advance_checkpoint(tracker).unwrap_err(),
        model.delete_tracker(tracker).unwrap_err(),
    ] {
        assert_eq!(err.code(), "TRACKER_DESTROYED");
    }
}

#[test]
fn test_tracker_from_another_store_is_rejected() {
    let (mut model, _x, _y, _c0) = two_variable_model();
    let tracker = model.new_tracker();
    let mut clone = model.clone_model(Some("copy"));
    assert_eq!(clone.num_trackers(), 0);
    assert_eq!(clone.name(), "copy");

    let err = clone.export_update(tracker, false).unwrap_err();
    assert_eq!(err.code(), "STORAGE_FOREIGN");
    assert!(clone.advance_checkpoint(tracker).is_err());
}

#[test]
fn test_remove_names_blanks_new_entity_names() {
    let (mut model, _x, _y, _c0) = two_variable_model();
    let tracker = model.new_tracker();
    model.add_variable(continuous(0.0, 1.0, "secret"));
    model
        .add_constraint(
            Sos1Constraint::new(Vec::new(), Vec::new()).with_name("hidden"),
        )
        .unwrap();

    let update = model.export_update(tracker, true).unwrap().unwrap();
    assert_eq!(update.variables.new_variables.names, vec![""]);
    assert_eq!(update.sos1_constraints.new_constraints.constraints[0].name, "");
}

#[test]
fn test_atomic_deletions_are_tracked_per_family() {
    let (mut model, x, y, _c0) = two_variable_model();
    let indicator = model
        .add_constraint(IndicatorConstraint::new(
            y,
            vec![(x, 1.0)],
            Bounds::new(0.0, 1.0),
        ))
        .unwrap();
    let sos = model
        .add_constraint(Sos1Constraint::new(
            vec![LinearExpression::new(vec![(x, 1.0)], 0.0)],
            Vec::new(),
        ))
        .unwrap();
    let tracker = model.new_tracker();

    model
        .delete_constraint::<IndicatorConstraint>(indicator)
        .unwrap();
    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(
        IndicatorConstraint::update_section(&update).deleted_ids,
        vec![indicator.inner()]
    );
    assert!(Sos1Constraint::update_section(&update).is_empty());
    assert!(model.has_constraint::<Sos1Constraint>(sos));
}

#![allow(clippy::float_cmp)]

use optstore_core::{
    Bounds, IndicatorConstraint, LinearConstraintData, LinearExpression, ModelSnapshot,
    ModelStore, ModelUpdate, ObjectiveId, QuadraticConstraint, Sense, Sos1Constraint,
    TrackerId, VariableData,
};

/// Ship an update through JSON the way a remote consumer would see it.
fn push_update(model: &mut ModelStore, tracker: TrackerId, mirror: &mut ModelStore) -> bool {
    let Some(update) = model.export_update(tracker, false).unwrap() else {
        return false;
    };
    let json = update.to_json().unwrap();
    mirror
        .apply_update(&ModelUpdate::from_json(&json).unwrap())
        .unwrap();
    model.advance_checkpoint(tracker).unwrap();
    true
}

fn assert_in_sync(model: &ModelStore, mirror: &ModelStore) {
    assert_eq!(model.export_snapshot(false), mirror.export_snapshot(false));
}

/// Test: a knapsack model edited over several rounds stays identical to a
/// mirror that only ever sees JSON snapshots and updates.
#[test]
fn test_mirror_follows_edits_through_json() {
    let mut model = ModelStore::new("knapsack");
    let items: Vec<_> = (0..4)
        .map(|i| model.add_variable(VariableData::binary().with_name(format!("item_{i}"))))
        .collect();
    let weights = [3.0, 4.0, 2.0, 5.0];
    let capacity = model
        .add_linear_constraint_with_terms(
            LinearConstraintData::new(Bounds::new(f64::NEG_INFINITY, 8.0)).with_name("capacity"),
            items.iter().copied().zip(weights),
        )
        .unwrap();
    model
        .set_objective_sense(ObjectiveId::Primary, Sense::Maximize)
        .unwrap();
    for (item, value) in items.iter().zip([5.0, 6.0, 3.0, 7.0]) {
        model
            .set_objective_linear_coefficient(ObjectiveId::Primary, *item, value)
            .unwrap();
    }

    let snapshot_json = model.export_snapshot(false).to_json().unwrap();
    let mut mirror = ModelStore::from_snapshot(&ModelSnapshot::from_json(&snapshot_json).unwrap())
        .unwrap();
    let tracker = model.new_tracker();
    assert_in_sync(&model, &mirror);
    assert!(!push_update(&mut model, tracker, &mut mirror));

    // Round 1: tighten capacity, add an item and a conflict between two items.
    model
        .set_linear_constraint_upper_bound(capacity, 7.0)
        .unwrap();
    let extra = model.add_variable(VariableData::binary().with_name("item_4"));
    model
        .set_linear_constraint_coefficient(capacity, extra, 1.0)
        .unwrap();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, extra, 2.0)
        .unwrap();
    model
        .add_constraint(
            Sos1Constraint::new(
                vec![
                    LinearExpression::new(vec![(items[0], 1.0)], 0.0),
                    LinearExpression::new(vec![(items[1], 1.0)], 0.0),
                ],
                Vec::new(),
            )
            .with_name("conflict"),
        )
        .unwrap();
    assert!(push_update(&mut model, tracker, &mut mirror));
    assert_in_sync(&model, &mirror);

    // Round 2: drop an item, which strips it from the capacity row and the
    // conflict, and add a risk budget on the rest.
    model.delete_variable(items[0]).unwrap();
    let risk = model
        .add_constraint(QuadraticConstraint::new(
            Vec::new(),
            vec![(items[1], items[2], 1.0), (items[3], items[3], 2.0)],
            Bounds::new(f64::NEG_INFINITY, 1.0),
        ))
        .unwrap();
    assert!(push_update(&mut model, tracker, &mut mirror));
    assert_in_sync(&model, &mirror);
    assert_eq!(mirror.get_linear_constraint_terms(capacity).unwrap().len(), 4);

    // Round 3: remove what round 2 added and re-weight an item.
    model
        .delete_constraint::<QuadraticConstraint>(risk)
        .unwrap();
    model
        .set_linear_constraint_coefficient(capacity, items[3], 0.0)
        .unwrap();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, items[2], 4.5)
        .unwrap();
    assert!(push_update(&mut model, tracker, &mut mirror));
    assert_in_sync(&model, &mirror);
    assert_eq!(
        mirror
            .get_objective(ObjectiveId::Primary)
            .unwrap()
            .linear_coefficient(items[2]),
        4.5
    );
}

/// Test: the update after deleting `x` and changing `y`'s upper bound.
#[test]
fn test_update_contents_after_delete_and_bound_change() {
    let mut model = ModelStore::new("small");
    let x = model.add_variable(VariableData::continuous(Bounds::new(0.0, 10.0)).with_name("x"));
    let y = model.add_variable(VariableData::continuous(Bounds::new(0.0, 10.0)).with_name("y"));
    model
        .add_linear_constraint_with_terms(
            LinearConstraintData::new(Bounds::new(f64::NEG_INFINITY, 5.0)),
            vec![(x, 1.0), (y, 1.0)],
        )
        .unwrap();
    let tracker = model.new_tracker();

    model.delete_variable(x).unwrap();
    model.set_variable_upper_bound(y, 3.0).unwrap();

    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.variables.deleted_ids, vec![0]);
    assert_eq!(update.variables.upper_bounds.ids, vec![1]);
    assert_eq!(update.variables.upper_bounds.values, vec![3.0]);
    assert!(update.linear_constraints.is_empty());

    // Exporting does not consume the diff.
    assert_eq!(model.export_update(tracker, false).unwrap(), Some(update));
}

/// Test: a mirror with its own tracker forwards what it receives.
#[test]
fn test_updates_chain_through_intermediate_stores() {
    let mut source = ModelStore::new("source");
    let x = source.add_variable(VariableData::continuous(Bounds::new(0.0, 1.0)));
    let z = source.add_variable(VariableData::binary());

    let mut relay = source.clone_model(Some("relay"));
    let mut sink = relay.clone_model(Some("sink"));
    let upstream = source.new_tracker();
    let downstream = relay.new_tracker();

    source
        .add_constraint(
            IndicatorConstraint::new(z, vec![(x, 1.0)], Bounds::new(f64::NEG_INFINITY, 0.0))
                .activate_on_zero(true),
        )
        .unwrap();
    source.set_variable_lower_bound(x, -1.0).unwrap();

    assert!(push_update(&mut source, upstream, &mut relay));
    assert!(push_update(&mut relay, downstream, &mut sink));
    assert_eq!(
        source.export_snapshot(true).indicator_constraints,
        sink.export_snapshot(true).indicator_constraints
    );
    assert_eq!(sink.get_variable(x).unwrap().bounds.lower, -1.0);
    assert_eq!(sink.name(), "sink");
}

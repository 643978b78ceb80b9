use super::*;

pub(super) fn continuous(lower: f64, upper: f64, name: &str) -> VariableData {
    VariableData::continuous(Bounds::new(lower, upper)).with_name(name)
}

pub(super) fn bounded_constraint(lower: f64, upper: f64, name: &str) -> LinearConstraintData {
    LinearConstraintData::new(Bounds::new(lower, upper)).with_name(name)
}

/// `x` (id 0) and `y` (id 1) in `[0, 10]`, and `c0: x + y <= 5` (id 0).
pub(super) fn two_variable_model() -> (ModelStore, VariableId, VariableId, LinearConstraintId) {
    let mut model = ModelStore::new("two");
    let x = model.add_variable(continuous(0.0, 10.0, "x"));
    let y = model.add_variable(continuous(0.0, 10.0, "y"));
    let c0 = model
        .add_linear_constraint_with_terms(
            bounded_constraint(f64::NEG_INFINITY, 5.0, "c0"),
            vec![(x, 1.0), (y, 1.0)],
        )
        .unwrap();
    (model, x, y, c0)
}

/// Live ids plus every attribute, for comparing two stores.
pub(super) fn assert_same_model(left: &ModelStore, right: &ModelStore) {
    assert_eq!(left.export_snapshot(false), right.export_snapshot(false));
}

/// Simulates a consumer: apply `model`'s update for `tracker` onto `mirror`
/// and move the checkpoint on.
pub(super) fn sync(model: &mut ModelStore, tracker: TrackerId, mirror: &mut ModelStore) {
    if let Some(update) = model.export_update(tracker, false).unwrap() {
        mirror.apply_update(&update).unwrap();
    }
    model.advance_checkpoint(tracker).unwrap();
}

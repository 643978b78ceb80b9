use super::support::{continuous, two_variable_model};
use super::*;
use crate::constraints::{
    IndicatorConstraint, QuadraticConstraint, SecondOrderConeConstraint, Sos1Constraint,
    Sos2Constraint,
};
use crate::storage::ConstraintFamily;

#[test]
#[allow(clippy::float_cmp)]
fn test_delete_variable_cascades_everywhere() {
    let (mut model, x, y, c0) = two_variable_model();
    model
        .set_objective_linear_coefficient(ObjectiveId::Primary, x, 2.0)
        .unwrap();
    model
        .set_objective_quadratic_coefficient(ObjectiveId::Primary, x, y, 1.0)
        .unwrap();
    let aux = model.add_auxiliary_objective(0, "aux");
    model
        .set_objective_quadratic_coefficient(aux.into(), x, x, 3.0)
        .unwrap();

    let quad = model
        .add_constraint(QuadraticConstraint::new(
            vec![(x, 1.0), (y, 1.0)],
            vec![(x, y, 1.0)],
            Bounds::new(f64::NEG_INFINITY, 1.0),
        ))
        .unwrap();
    let cone = model
        .add_constraint(SecondOrderConeConstraint::new(
            LinearExpression::new(vec![(y, 1.0)], 0.0),
            vec![LinearExpression::new(vec![(x, 2.0)], 1.0)],
        ))
        .unwrap();
    let sos1 = model
        .add_constraint(Sos1Constraint::new(
            vec![
                LinearExpression::new(vec![(x, 1.0)], 0.0),
                LinearExpression::new(vec![(y, 1.0)], 0.0),
            ],
            Vec::new(),
        ))
        .unwrap();
    let sos2 = model
        .add_constraint(Sos2Constraint::new(
            vec![LinearExpression::new(vec![(x, 1.0), (y, 1.0)], 0.0)],
            Vec::new(),
        ))
        .unwrap();
    let indicator = model
        .add_constraint(IndicatorConstraint::new(
            x,
            vec![(y, 1.0)],
            Bounds::new(0.0, 1.0),
        ))
        .unwrap();
    let tracker = model.new_tracker();

    model.delete_variable(x).unwrap();

    assert!(!model.has_variable(x));
    assert_eq!(model.variables_in_linear_constraint(c0).unwrap(), vec![y]);
    assert_eq!(model.num_matrix_entries(), 1);

    let primary = model.get_objective(ObjectiveId::Primary).unwrap();
    assert!(!primary.references(x));
    assert_eq!(primary.linear_coefficient(x), 0.0);
    assert_eq!(primary.quadratic_coefficient(x, y), 0.0);
    assert!(!model.get_objective(aux.into()).unwrap().references(x));

    let quadratic = model.get_constraint::<QuadraticConstraint>(quad).unwrap();
    assert_eq!(quadratic.related_variables(), vec![y]);
    assert!(quadratic.quadratic_terms.is_empty());
    assert_eq!(
        model
            .get_constraint::<SecondOrderConeConstraint>(cone)
            .unwrap()
            .related_variables(),
        vec![y]
    );
    assert_eq!(
        model
            .get_constraint::<Sos1Constraint>(sos1)
            .unwrap()
            .related_variables(),
        vec![y]
    );
    assert_eq!(
        model
            .get_constraint::<Sos2Constraint>(sos2)
            .unwrap()
            .related_variables(),
        vec![y]
    );
    let implied = model
        .get_constraint::<IndicatorConstraint>(indicator)
        .unwrap();
    assert_eq!(implied.indicator, None);
    assert_eq!(implied.terms, vec![(y, 1.0)]);
    assert_eq!(model.num_atomic_constraints(), 5);
    model.atomic.assert_consistent();

    // Consumers cascade on their own; the update only names the variable.
    let update = model.export_update(tracker, false).unwrap().unwrap();
    assert_eq!(update.variables.deleted_ids, vec![x.inner()]);
    assert!(update.linear_constraints.matrix.is_empty());
    assert!(update.objective.linear_coefficients.is_empty());
    assert!(update.indicator_constraints.is_empty());
}

#[test]
fn test_search_by_variable() {
    let (mut model, x, y, c0) = two_variable_model();
    let c1 = model
        .add_linear_constraint_with_terms(
            LinearConstraintData::new(Bounds::new(0.0, 1.0)),
            vec![(y, 4.0)],
        )
        .unwrap();
    let aux = model.add_auxiliary_objective(1, "aux");
    model
        .set_objective_linear_coefficient(aux.into(), y, 1.0)
        .unwrap();
    model
        .set_objective_quadratic_coefficient(ObjectiveId::Primary, y, y, 1.0)
        .unwrap();
    let first = model
        .add_constraint(Sos1Constraint::new(
            vec![LinearExpression::new(vec![(y, 1.0)], 0.0)],
            Vec::new(),
        ))
        .unwrap();
    model
        .add_constraint(Sos1Constraint::new(
            vec![LinearExpression::new(vec![(x, 1.0)], 0.0)],
            Vec::new(),
        ))
        .unwrap();

    assert_eq!(model.linear_constraints_with_variable(x).unwrap(), vec![c0]);
    assert_eq!(
        model.linear_constraints_with_variable(y).unwrap(),
        vec![c0, c1]
    );
    assert_eq!(
        model.objectives_with_variable(y).unwrap(),
        vec![ObjectiveId::Primary, aux.into()]
    );
    assert!(model.objectives_with_variable(x).unwrap().is_empty());
    assert_eq!(
        model.constraints_with_variable::<Sos1Constraint>(y).unwrap(),
        vec![first]
    );
    assert!(
        model
            .constraints_with_variable::<IndicatorConstraint>(y)
            .unwrap()
            .is_empty()
    );

    model.delete_variable(y).unwrap();
    assert_eq!(
        model.linear_constraints_with_variable(y).unwrap_err().code(),
        "ENTITY_NOT_FOUND"
    );
    assert!(model.variables_in_linear_constraint(c1).unwrap().is_empty());
}

#[test]
fn test_names_and_placeholders() {
    let (mut model, x, _y, c0) = two_variable_model();
    let aux = model.add_auxiliary_objective(0, "aux");
    let sos = model
        .add_constraint(Sos2Constraint::new(Vec::new(), Vec::new()).with_name("chain"))
        .unwrap();

    assert_eq!(model.get_variable_name(x).unwrap(), "x");
    assert_eq!(model.get_linear_constraint_name(c0).unwrap(), "c0");
    assert_eq!(model.get_objective_name(aux.into()).unwrap(), "aux");
    assert_eq!(model.get_constraint_name::<Sos2Constraint>(sos).unwrap(), "chain");

    model.delete_variable(x).unwrap();
    model.delete_linear_constraint(c0).unwrap();
    model.delete_auxiliary_objective(aux).unwrap();
    model.delete_constraint::<Sos2Constraint>(sos).unwrap();

    assert!(model.get_variable_name(x).is_err());
    assert_eq!(model.variable_name_or_placeholder(x), DELETED_VARIABLE_NAME);
    assert_eq!(
        model.linear_constraint_name_or_placeholder(c0),
        DELETED_LINEAR_CONSTRAINT_NAME
    );
    assert_eq!(
        model.objective_name_or_placeholder(aux.into()),
        DELETED_OBJECTIVE_NAME
    );
    assert_eq!(
        model.constraint_name_or_placeholder::<Sos2Constraint>(sos),
        DELETED_CONSTRAINT_NAME
    );
}

#[test]
fn test_lookup_by_name_prefers_lowest_id() {
    let (mut model, _x, y, c0) = two_variable_model();
    model.add_variable(continuous(0.0, 1.0, "y"));

    assert_eq!(model.get_variable_by_name("y"), Some(y));
    assert_eq!(model.get_linear_constraint_by_name("c0"), Some(c0));
    assert_eq!(model.get_variable_by_name("missing"), None);

    model.delete_variable(y).unwrap();
    assert_eq!(model.get_variable_by_name("y"), Some(VariableId::new(2)));
}

#[test]
fn test_ids_are_never_reused() {
    let (mut model, x, _y, c0) = two_variable_model();
    model.delete_variable(x).unwrap();
    model.delete_linear_constraint(c0).unwrap();

    let z = model.add_variable(continuous(0.0, 1.0, "z"));
    let c1 = model.add_linear_constraint(LinearConstraintData::new(Bounds::free()));
    assert_eq!(z, VariableId::new(2));
    assert_eq!(c1, LinearConstraintId::new(1));
    assert_eq!(model.variable_ids(), vec![VariableId::new(1), z]);
    assert_eq!(model.linear_constraint_ids(), vec![c1]);
    assert!(!model.has_linear_constraint(c0));
    assert_eq!(model.next_linear_constraint_id(), LinearConstraintId::new(2));

    let aux = model.add_auxiliary_objective(0, "aux");
    model.delete_auxiliary_objective(aux).unwrap();
    assert!(!model.has_auxiliary_objective(aux));
    assert_eq!(model.next_auxiliary_objective_id(), AuxiliaryObjectiveId::new(1));
}

#[test]
fn test_handles_are_bound_to_their_store() {
    let (model, x, _y, c0) = two_variable_model();
    let (mut other, _, _, _) = two_variable_model();

    let handle = model.handle(x).unwrap();
    assert_eq!(handle.store(), model.store_id());
    assert_eq!(model.resolve(handle).unwrap(), x);

    let before = other.export_snapshot(false);
    let err = other.resolve(handle).unwrap_err();
    assert_eq!(
        err,
        ModelError::ForeignStorage {
            expected: other.store_id(),
            actual: model.store_id(),
        }
    );
    assert_eq!(other.export_snapshot(false), before);

    let row = other.handle(c0).unwrap();
    other.delete_linear_constraint(c0).unwrap();
    assert_eq!(other.resolve(row).unwrap_err().code(), "ENTITY_NOT_FOUND");
    assert!(model.resolve(row).is_err());
    assert!(other.handle(c0).is_err());
}

#[test]
fn test_delete_through_handle_checks_the_owner() {
    let (mut model, x, y, c0) = two_variable_model();
    let (mut other, _, _, _) = two_variable_model();
    let sos = model
        .add_constraint(Sos1Constraint::new(
            vec![LinearExpression::new(vec![(y, 1.0)], 0.0)],
            Vec::new(),
        ))
        .unwrap();

    let foreign = other.handle(x).unwrap();
    let before = model.export_snapshot(false);
    assert_eq!(model.delete(foreign).unwrap_err().code(), "STORAGE_FOREIGN");
    assert_eq!(model.export_snapshot(false), before);
    assert!(other.has_variable(x));

    let own = model.handle(x).unwrap();
    model.delete(own).unwrap();
    assert!(!model.has_variable(x));
    assert_eq!(model.variables_in_linear_constraint(c0).unwrap(), vec![y]);
    assert_eq!(model.delete(own).unwrap_err().code(), "ENTITY_NOT_FOUND");

    let sos = model.handle(sos).unwrap();
    assert!(other.delete(sos).is_err());
    model.delete(sos).unwrap();
    assert_eq!(model.num_constraints::<Sos1Constraint>(), 0);
    assert_eq!(other.num_variables(), 2);
}

#[test]
fn test_invalid_input_changes_nothing() {
    let (mut model, x, _y, c0) = two_variable_model();
    let missing = VariableId::new(42);
    let before = model.export_snapshot(false);

    assert_eq!(
        model
            .set_linear_constraint_coefficient(c0, x, f64::NAN)
            .unwrap_err()
            .code(),
        "COEFFICIENT_INVALID"
    );
    assert_eq!(
        model
            .set_objective_offset(ObjectiveId::Primary, f64::INFINITY)
            .unwrap_err()
            .code(),
        "COEFFICIENT_INVALID"
    );
    assert_eq!(
        model
            .set_linear_constraint_coefficient(c0, missing, 1.0)
            .unwrap_err(),
        ModelError::NotFound {
            kind: "variable",
            id: 42
        }
    );
    assert!(
        model
            .add_constraint(IndicatorConstraint::new(
                missing,
                vec![(x, 1.0)],
                Bounds::new(0.0, 1.0),
            ))
            .is_err()
    );
    assert!(
        model
            .add_constraint(QuadraticConstraint::new(
                vec![(x, f64::NAN)],
                Vec::new(),
                Bounds::free(),
            ))
            .is_err()
    );
    assert_eq!(
        model
            .add_constraint(Sos1Constraint::new(
                vec![
                    LinearExpression::new(vec![(x, 1.0)], 0.0),
                    LinearExpression::new(vec![(x, 2.0)], 0.0),
                ],
                vec![1.0, 2.0, 3.0],
            ))
            .unwrap_err()
            .code(),
        "CONSTRAINT_INVALID"
    );
    assert!(model.delete_variable(missing).is_err());
    assert!(
        model
            .set_objective_sense(AuxiliaryObjectiveId::new(3).into(), Sense::Maximize)
            .is_err()
    );

    assert_eq!(model.export_snapshot(false), before);
    assert_eq!(model.next_constraint_id::<IndicatorConstraint>().inner(), 0);
}

#[test]
#[allow(clippy::float_cmp)]
fn test_counts_and_getters() {
    let (mut model, x, y, c0) = two_variable_model();
    model.add_auxiliary_objective(5, "aux");
    model
        .add_constraint(SecondOrderConeConstraint::new(
            LinearExpression::constant(1.0),
            vec![LinearExpression::new(vec![(x, 1.0)], 0.0)],
        ))
        .unwrap();

    assert_eq!(model.num_variables(), 2);
    assert_eq!(model.num_linear_constraints(), 1);
    assert_eq!(model.num_matrix_entries(), 2);
    assert_eq!(model.num_auxiliary_objectives(), 1);
    assert_eq!(model.num_constraints::<SecondOrderConeConstraint>(), 1);
    assert_eq!(model.num_constraints::<Sos1Constraint>(), 0);
    assert_eq!(model.objective_ids().len(), 2);

    assert_eq!(model.get_variable(y).unwrap().bounds.upper, 10.0);
    assert_eq!(model.get_linear_constraint(c0).unwrap().bounds.upper, 5.0);
    assert_eq!(model.get_linear_constraint_coefficient(c0, x).unwrap(), 1.0);
    assert_eq!(
        model.get_linear_constraint_terms(c0).unwrap(),
        vec![(x, 1.0), (y, 1.0)]
    );
    assert_eq!(
        model.constraint_ids::<SecondOrderConeConstraint>(),
        vec![SecondOrderConeConstraintId::new(0)]
    );
}

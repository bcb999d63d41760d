use pretty_assertions::assert_eq;
use rstest::rstest;

use symcalc::expression::build::*;
use symcalc::{
    Environment, EvaluationError, Expression, OperationExpression, PlotRangeError,
    RecordingRenderer, VariableStore,
};

fn environment() -> Environment<RecordingRenderer> {
    Environment::new(RecordingRenderer::new())
}

fn x() -> Expression {
    variable("x")
}

#[rstest]
#[case::addition(add(number(3.0), number(4.0)), 7.0)]
#[case::power(pow(number(2.0), number(3.0)), 8.0)]
#[case::negation(negate(number(5.0)), -5.0)]
fn to_double_evaluates(#[case] expression: Expression, #[case] expected: f64) {
    assert_eq!(
        environment().execute(&to_double(expression)),
        Ok(number(expected))
    );
}

#[test]
fn undefined_variable() {
    assert_eq!(
        environment().execute(&to_double(x())),
        Err(EvaluationError::UndefinedVariable("x".to_string()))
    );
}

#[rstest]
#[case::folds_addition(add(number(3.0), number(4.0)), number(7.0))]
#[case::folds_around_a_free_variable(
    mul(add(number(1.0), number(2.0)), variable("y")),
    mul(number(3.0), variable("y"))
)]
#[case::leaves_leaf_division(div(number(6.0), number(2.0)), div(number(6.0), number(2.0)))]
#[case::leaves_unary(sin(number(0.0)), sin(number(0.0)))]
fn simplify_folds(#[case] expression: Expression, #[case] expected: Expression) {
    assert_eq!(environment().execute(&simplify(expression)), Ok(expected));
}

#[test]
fn simplify_inlines_variables() {
    let mut environment = environment();
    environment.bind("c", number(4.0));
    assert_eq!(
        environment.execute(&simplify(add(variable("c"), number(1.0)))),
        Ok(number(5.0))
    );
}

#[rstest]
#[case::min_exceeds_max(
    plot(x(), x(), number(5.0), number(2.0), number(1.0)),
    PlotRangeError::MinExceedsMax { min: 5.0, max: 2.0 }.into()
)]
#[case::zero_step(
    plot(x(), x(), number(0.0), number(5.0), number(0.0)),
    PlotRangeError::NonPositiveStep(0.0).into()
)]
fn plot_rejects_bad_ranges(#[case] node: Expression, #[case] expected: EvaluationError) {
    let mut environment = environment();
    assert_eq!(environment.execute(&node), Err(expected));
    assert!(environment.renderer().plots().is_empty());
}

#[test]
fn plot_refuses_to_shadow() {
    let mut environment = environment();
    environment.bind("x", number(0.5));
    assert_eq!(
        environment.execute(&plot(x(), x(), number(0.0), number(1.0), number(1.0))),
        Err(EvaluationError::VariableAlreadyBound("x".to_string()))
    );
    assert_eq!(environment.lookup("x"), Some(&number(0.5)));
}

#[test]
fn plot_samples_and_restores() {
    let mut environment = environment();
    let result = environment.execute(&plot(
        mul(number(3.0), x()),
        x(),
        number(2.0),
        number(5.0),
        number(0.5),
    ));
    assert_eq!(result, Ok(number(1.0)));
    assert!(!environment.contains("x"));

    let plots = environment.renderer().plots();
    assert_eq!(plots.len(), 1);
    assert_eq!(plots[0].title, "Scatter Plot");
    assert_eq!(plots[0].x_axis_label, "X AXIS");
    assert_eq!(plots[0].y_axis_label, "Y AXIS");
    assert_eq!(
        plots[0].points().collect::<Vec<_>>(),
        [
            (2.0, 6.0),
            (2.5, 7.5),
            (3.0, 9.0),
            (3.5, 10.5),
            (4.0, 12.0),
            (4.5, 13.5),
            (5.0, 15.0)
        ]
    );
}

#[test]
fn plot_restores_after_a_failed_sample() {
    let mut environment = environment();
    let node = plot(
        mul(x(), variable("scale")),
        x(),
        number(0.0),
        number(1.0),
        number(0.5),
    );
    assert_eq!(
        environment.execute(&node),
        Err(EvaluationError::UndefinedVariable("scale".to_string()))
    );
    assert!(!environment.contains("x"));

    environment.bind("scale", number(2.0));
    assert_eq!(environment.execute(&node), Ok(number(1.0)));
    assert_eq!(environment.renderer().plots()[0].ys, [0.0, 1.0, 2.0]);
}

#[test]
fn simplify_is_idempotent_on_folded_trees() {
    let mut environment = environment();
    environment.bind("c", number(4.0));
    let expression = mul(add(variable("c"), number(1.0)), sub(number(2.0), variable("c")));

    let once = environment.execute(&simplify(expression)).unwrap();
    let twice = environment.execute(&simplify(once.clone())).unwrap();
    assert_eq!(once, number(-10.0));
    assert_eq!(twice, once);
}

#[test]
fn aliased_children_are_independent() {
    let shared = add(number(1.0), variable("y"));
    let left = mul(shared.clone(), number(2.0));
    let right = sub(shared.clone(), number(2.0));

    let mut environment = environment();
    environment.bind("y", number(1.0));
    assert_eq!(environment.execute(&simplify(left.clone())), Ok(number(4.0)));

    assert_eq!(left, mul(add(number(1.0), variable("y")), number(2.0)));
    assert_eq!(right, sub(add(number(1.0), variable("y")), number(2.0)));
}

#[test]
fn commands_read_from_json() {
    let json = r#"{"Operation": {"name": "toDouble", "children": [
        {"Operation": {"name": "-", "children": [{"Number": 10.0}, {"Variable": "k"}]}}
    ]}}"#;
    let node: Expression = serde_json::from_str(json).unwrap();

    let mut environment = environment();
    environment.bind("k", number(2.5));
    assert_eq!(environment.execute(&node), Ok(number(7.5)));
}

#[test]
fn malformed_commands_are_rejected_before_evaluation() {
    let node = Expression::Operation(OperationExpression::new(
        "plot",
        vec![x(), x(), number(0.0)],
    ));
    assert!(matches!(
        environment().execute(&node),
        Err(EvaluationError::MalformedCommand { .. })
    ));
}

#[test]
fn plot_rejects_an_empty_loop_variable_from_json() {
    let json = r#"{"Operation": {"name": "plot", "children": [
        {"Variable": ""}, {"Variable": ""}, {"Number": 0.0}, {"Number": 1.0}, {"Number": 1.0}
    ]}}"#;
    let node: Expression = serde_json::from_str(json).unwrap();

    let mut environment = environment();
    assert!(matches!(
        environment.execute(&node),
        Err(EvaluationError::MalformedCommand { .. })
    ));
    assert!(environment.variables().is_empty());
    assert!(environment.renderer().plots().is_empty());
}

// Copyright 2021 Rigetti Computing
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    environment::{ScopedBinding, VariableStoreMut},
    error::{EvaluationError, EvaluationResult, PlotRangeError},
    expression::{is_identifier, Expression, Operator},
    render::{Renderer, ScatterPlot},
};

use super::assert_node_matches;

/// Slack allowed when deciding whether `max` is a whole number of steps past `min`.
const STEP_TOLERANCE: f64 = 1e-9;

/// PlotSettings contains the labels a plot is drawn with and the limits placed on sampling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlotSettings {
    /// Title handed to the renderer.
    pub title: String,
    /// Label of the axis the loop variable is plotted along.
    pub x_axis_label: String,
    /// Label of the axis the sampled values are plotted along.
    pub y_axis_label: String,
    /// The largest number of samples a single plot may take.
    pub max_samples: usize,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            title: "Scatter Plot".to_string(),
            x_axis_label: "X AXIS".to_string(),
            y_axis_label: "Y AXIS".to_string(),
            max_samples: 1_000_000,
        }
    }
}

/// A parsed `plot(expression, variable, min, max, step)` command.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlotCommand {
    pub expression: Expression,
    pub variable: String,
    pub min: Expression,
    pub max: Expression,
    pub step: Expression,
}

impl PlotCommand {
    pub fn new(
        expression: Expression,
        variable: impl Into<String>,
        min: Expression,
        max: Expression,
        step: Expression,
    ) -> Self {
        Self {
            expression,
            variable: variable.into(),
            min,
            max,
            step,
        }
    }

    /// Check every operand tree against the arity table.
    pub fn check_arity(&self) -> EvaluationResult<()> {
        [&self.expression, &self.min, &self.max, &self.step]
            .into_iter()
            .try_for_each(Expression::check_arity)
    }

    /// Sample `expression` over `min..=max` in increments of `step`, binding `variable` to
    /// each sample point in turn, and hand the samples to `renderer`.
    ///
    /// The bounds must reduce to numbers (or negated numbers) without the loop variable,
    /// `min` may not exceed `max`, `step` must be positive, and `variable` may not already be
    /// bound. On return `variables` holds exactly the bindings it held before the call,
    /// whether or not sampling succeeded.
    ///
    /// Sample points are computed as `min + k * step` rather than accumulated, and never
    /// exceed `max`.
    #[tracing::instrument(skip_all, fields(variable = %self.variable))]
    pub fn run<V, R>(
        &self,
        variables: &mut V,
        renderer: &mut R,
        settings: &PlotSettings,
    ) -> EvaluationResult<ScatterPlot>
    where
        V: VariableStoreMut + ?Sized,
        R: Renderer + ?Sized,
    {
        let expression = self.expression.simplify(&*variables)?;
        let min = self.min.simplify(&*variables)?;
        let max = self.max.simplify(&*variables)?;
        let step = self.step.simplify(&*variables)?;

        let num_min = min.evaluate(&*variables)?;
        let num_max = max.evaluate(&*variables)?;
        let num_step = step.evaluate(&*variables)?;

        for bound in [&min, &max, &step] {
            if !is_resolved_bound(bound) {
                return Err(PlotRangeError::UnresolvedBound {
                    bound: bound.to_string(),
                }
                .into());
            }
        }
        if num_min > num_max {
            return Err(PlotRangeError::MinExceedsMax {
                min: num_min,
                max: num_max,
            }
            .into());
        }
        if !(num_step > 0.0) {
            return Err(PlotRangeError::NonPositiveStep(num_step).into());
        }
        let steps = sample_steps(num_min, num_max, num_step, settings.max_samples)?;
        if variables.contains(&self.variable) {
            return Err(EvaluationError::VariableAlreadyBound(self.variable.clone()));
        }

        let mut xs = Vec::with_capacity(steps + 1);
        let mut ys = Vec::with_capacity(steps + 1);
        {
            let mut binding = ScopedBinding::new(variables, &self.variable);
            for k in 0..=steps {
                let x = (num_min + k as f64 * num_step).min(num_max);
                binding.set(Expression::Number(x));
                let y = expression.evaluate(binding.variables())?;
                tracing::trace!(x, y, "sampled");
                xs.push(x);
                ys.push(y);
            }
        }

        let plot = ScatterPlot {
            title: settings.title.clone(),
            x_axis_label: settings.x_axis_label.clone(),
            y_axis_label: settings.y_axis_label.clone(),
            xs,
            ys,
        };
        renderer.draw_scatter_plot(&plot)?;
        tracing::debug!(samples = plot.len(), "plotted");

        Ok(plot)
    }
}

impl TryFrom<&Expression> for PlotCommand {
    type Error = EvaluationError;

    fn try_from(node: &Expression) -> Result<Self, Self::Error> {
        let [expression, variable, min, max, step] =
            assert_node_matches::<5>(node, Operator::Plot)?;
        let Expression::Variable(name) = variable else {
            return Err(EvaluationError::malformed(
                Operator::Plot.to_string(),
                format!("expected a variable as the second operand, found `{variable}`"),
            ));
        };
        if !is_identifier(name) {
            return Err(EvaluationError::malformed(
                Operator::Plot.to_string(),
                format!("`{name}` is not a valid variable name"),
            ));
        }

        Ok(Self::new(
            expression.clone(),
            name.clone(),
            min.clone(),
            max.clone(),
            step.clone(),
        ))
    }
}

impl From<PlotCommand> for Expression {
    fn from(command: PlotCommand) -> Self {
        crate::expression::build::plot(
            command.expression,
            Expression::Variable(command.variable),
            command.min,
            command.max,
            command.step,
        )
    }
}

/// A plot bound is usable if it simplified all the way down to a number, possibly negated.
fn is_resolved_bound(bound: &Expression) -> bool {
    bound.is_number() || bound.operator() == Some(Operator::Negate)
}

/// The index of the last sample of `min..=max` in increments of `step`.
fn sample_steps(min: f64, max: f64, step: f64, limit: usize) -> EvaluationResult<usize> {
    let steps = ((max - min) / step + STEP_TOLERANCE).floor();
    let samples = steps + 1.0;
    if samples.is_finite() && samples <= limit as f64 {
        Ok(steps as usize)
    } else {
        Err(PlotRangeError::TooManySamples { samples, limit }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::VariableStore,
        expression::build::*,
        render::{NullRenderer, RecordingRenderer},
        Variables,
    };

    use proptest::prelude::*;
    use rstest::rstest;

    fn run(
        command: &PlotCommand,
        variables: &mut Variables,
    ) -> EvaluationResult<ScatterPlot> {
        command.run(variables, &mut NullRenderer, &PlotSettings::default())
    }

    fn x() -> Expression {
        variable("x")
    }

    #[test]
    fn samples_the_whole_range() {
        let command = PlotCommand::new(
            mul(number(3.0), x()),
            "x",
            number(2.0),
            number(5.0),
            number(0.5),
        );
        let mut variables = Variables::new();
        let mut renderer = RecordingRenderer::new();

        let plot = command
            .run(&mut variables, &mut renderer, &PlotSettings::default())
            .unwrap();

        let points: Vec<_> = plot.points().collect();
        assert_eq!(
            points,
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
        assert_eq!(renderer.plots(), [plot]);
        assert!(!variables.contains("x"));
    }

    #[test]
    fn uses_the_configured_labels() {
        let settings = PlotSettings {
            title: "Parabola".to_string(),
            x_axis_label: "t".to_string(),
            ..Default::default()
        };
        let command = PlotCommand::new(mul(x(), x()), "x", number(0.0), number(1.0), number(1.0));
        let plot = command
            .run(&mut Variables::new(), &mut NullRenderer, &settings)
            .unwrap();

        assert_eq!(plot.title, "Parabola");
        assert_eq!(plot.x_axis_label, "t");
        assert_eq!(plot.y_axis_label, "Y AXIS");
        assert_eq!(plot.ys, [0.0, 1.0]);
    }

    #[test]
    fn last_sample_never_passes_max() {
        let command = PlotCommand::new(x(), "x", number(0.0), number(1.0), number(0.1));
        let plot = run(&command, &mut Variables::new()).unwrap();

        assert_eq!(plot.len(), 11);
        assert_eq!(plot.xs.last(), Some(&1.0));
        assert!(plot.xs.iter().all(|sample| *sample <= 1.0));
    }

    #[test]
    fn stops_short_of_an_uneven_max() {
        let command = PlotCommand::new(x(), "x", number(0.0), number(1.0), number(0.3));
        let plot = run(&command, &mut Variables::new()).unwrap();
        assert_eq!(plot.len(), 4);
    }

    #[test]
    fn single_sample_when_min_equals_max() {
        let command = PlotCommand::new(x(), "x", number(2.0), number(2.0), number(1.0));
        let plot = run(&command, &mut Variables::new()).unwrap();
        assert_eq!(plot.xs, [2.0]);
    }

    #[test]
    fn bounds_may_use_bound_variables_and_negation() {
        let mut variables = Variables::new();
        variables.insert("lo".to_string(), number(1.0));
        variables.insert("width".to_string(), number(2.0));

        let command = PlotCommand::new(
            x(),
            "x",
            negate(variable("lo")),
            add(variable("lo"), variable("width")),
            number(2.0),
        );
        let plot = run(&command, &mut variables).unwrap();

        assert_eq!(plot.xs, [-1.0, 1.0, 3.0]);
        assert_eq!(variables.len(), 2);
    }

    #[rstest]
    #[case::min_exceeds_max(
        number(5.0),
        number(2.0),
        number(1.0),
        PlotRangeError::MinExceedsMax { min: 5.0, max: 2.0 }.into()
    )]
    #[case::zero_step(
        number(0.0),
        number(5.0),
        number(0.0),
        PlotRangeError::NonPositiveStep(0.0).into()
    )]
    #[case::negative_step(
        number(0.0),
        number(5.0),
        negate(number(1.0)),
        PlotRangeError::NonPositiveStep(-1.0).into()
    )]
    #[case::unfolded_division(
        number(0.0),
        div(number(6.0), number(2.0)),
        number(1.0),
        PlotRangeError::UnresolvedBound { bound: "6 / 2".to_string() }.into()
    )]
    #[case::unbound_variable(
        number(0.0),
        variable("top"),
        number(1.0),
        EvaluationError::UndefinedVariable("top".to_string())
    )]
    #[case::too_many_samples(
        number(0.0),
        number(1e12),
        number(1.0),
        PlotRangeError::TooManySamples { samples: 1e12 + 1.0, limit: 1_000_000 }.into()
    )]
    fn rejects_bad_ranges(
        #[case] min: Expression,
        #[case] max: Expression,
        #[case] step: Expression,
        #[case] expected: EvaluationError,
    ) {
        let command = PlotCommand::new(x(), "x", min, max, step);
        let mut variables = Variables::new();
        assert_eq!(run(&command, &mut variables), Err(expected));
        assert!(variables.is_empty());
    }

    #[test]
    fn nan_step_is_rejected() {
        let command = PlotCommand::new(
            x(),
            "x",
            number(0.0),
            number(1.0),
            number(f64::NAN),
        );
        assert!(matches!(
            run(&command, &mut Variables::new()),
            Err(EvaluationError::InvalidPlotRange(PlotRangeError::NonPositiveStep(step))) if step.is_nan()
        ));
    }

    #[test]
    fn refuses_to_shadow_a_binding() {
        let mut variables = Variables::new();
        variables.insert("x".to_string(), number(7.0));
        let command = PlotCommand::new(x(), "x", number(0.0), number(1.0), number(1.0));

        assert_eq!(
            run(&command, &mut variables),
            Err(EvaluationError::VariableAlreadyBound("x".to_string()))
        );
        assert_eq!(variables.lookup("x"), Some(&number(7.0)));
    }

    #[test]
    fn restores_the_environment_when_sampling_fails() {
        let command = PlotCommand::new(
            add(x(), variable("missing")),
            "x",
            number(0.0),
            number(1.0),
            number(1.0),
        );
        let mut variables = Variables::new();
        let mut renderer = RecordingRenderer::new();

        assert_eq!(
            command.run(&mut variables, &mut renderer, &PlotSettings::default()),
            Err(EvaluationError::UndefinedVariable("missing".to_string()))
        );
        assert!(variables.is_empty());
        assert!(renderer.plots().is_empty());
    }

    #[test]
    fn renderer_failures_surface() {
        struct Broken;

        impl Renderer for Broken {
            fn draw_scatter_plot(&mut self, _plot: &ScatterPlot) -> Result<(), crate::RenderError> {
                Err(crate::RenderError::new("no display"))
            }
        }

        let command = PlotCommand::new(x(), "x", number(0.0), number(1.0), number(1.0));
        let mut variables = Variables::new();
        assert_eq!(
            command.run(&mut variables, &mut Broken, &PlotSettings::default()),
            Err(EvaluationError::Render(crate::RenderError::new("no display")))
        );
        assert!(variables.is_empty());
    }

    #[rstest]
    #[case::not_an_operation(x())]
    #[case::wrong_name(to_double(x()))]
    #[case::variable_is_a_number(plot(x(), number(1.0), number(0.0), number(1.0), number(1.0)))]
    #[case::empty_variable_name(plot(x(), variable(""), number(0.0), number(1.0), number(1.0)))]
    #[case::variable_name_is_not_an_identifier(
        plot(x(), variable("1x"), number(0.0), number(1.0), number(1.0))
    )]
    fn parsing_rejects_malformed_nodes(#[case] node: Expression) {
        assert!(matches!(
            PlotCommand::try_from(&node),
            Err(EvaluationError::MalformedCommand { .. })
        ));
    }

    #[test]
    fn parses_back_into_the_same_node() {
        let node = plot(sin(x()), x(), number(0.0), number(3.0), number(0.5));
        let command = PlotCommand::try_from(&node).unwrap();
        assert_eq!(command.variable, "x");
        assert_eq!(Expression::from(command), node);
    }

    proptest! {
        #[test]
        fn always_restores_the_environment(
            min in -10.0..10.0f64,
            width in -1.0..10.0f64,
            step in -1.0..2.0f64,
            divisor in -2.0..2.0f64,
        ) {
            let command = PlotCommand::new(
                div(x(), number(divisor)),
                "x",
                number(min),
                number(min + width),
                number(step),
            );
            let mut variables = Variables::new();
            variables.insert("y".to_string(), number(1.0));
            let before = variables.clone();

            let _ = run(&command, &mut variables);
            prop_assert_eq!(variables, before);
        }
    }
}

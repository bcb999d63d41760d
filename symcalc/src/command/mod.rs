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

//! The three top-level commands: `toDouble`, `simplify`, and `plot`.
//!
//! A command is an [`Expression::Operation`] node like any other; this module checks that a
//! node really is the command it claims to be and runs it against an [`Environment`].

use std::fmt;

use crate::{
    environment::{Environment, VariableStore},
    error::{EvaluationError, EvaluationResult},
    expression::{Expression, Operator},
    render::Renderer,
};

mod plot;

pub use plot::{PlotCommand, PlotSettings};

/// A top-level command, parsed from its [`Expression`] node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    ToDouble(Expression),
    Simplify(Expression),
    Plot(PlotCommand),
}

impl Command {
    pub fn operator(&self) -> Operator {
        match self {
            Self::ToDouble(_) => Operator::ToDouble,
            Self::Simplify(_) => Operator::Simplify,
            Self::Plot(_) => Operator::Plot,
        }
    }

    /// Check every operand tree against the arity table without running anything.
    pub fn check_arity(&self) -> EvaluationResult<()> {
        match self {
            Self::ToDouble(expression) | Self::Simplify(expression) => expression.check_arity(),
            Self::Plot(plot) => plot.check_arity(),
        }
    }

    /// Run the command.
    ///
    /// `toDouble` returns the value as a [`Expression::Number`], `simplify` returns the
    /// simplified tree, and `plot` draws on the environment's renderer and returns `1`.
    #[tracing::instrument(skip_all, fields(command = %self.operator()))]
    pub fn execute<R: Renderer>(
        &self,
        environment: &mut Environment<R>,
    ) -> EvaluationResult<Expression> {
        self.check_arity()?;
        match self {
            Self::ToDouble(expression) => run_to_double(&*environment, expression),
            Self::Simplify(expression) => run_simplify(&*environment, expression),
            Self::Plot(plot) => {
                let (variables, renderer, settings) = environment.split_mut();
                plot.run(variables, renderer, settings)?;
                Ok(Expression::Number(1.0))
            }
        }
    }
}

impl TryFrom<&Expression> for Command {
    type Error = EvaluationError;

    fn try_from(node: &Expression) -> Result<Self, Self::Error> {
        match node.operator() {
            Some(Operator::ToDouble) => {
                let [expression] = assert_node_matches::<1>(node, Operator::ToDouble)?;
                Ok(Self::ToDouble(expression.clone()))
            }
            Some(Operator::Simplify) => {
                let [expression] = assert_node_matches::<1>(node, Operator::Simplify)?;
                Ok(Self::Simplify(expression.clone()))
            }
            Some(Operator::Plot) => PlotCommand::try_from(node).map(Self::Plot),
            _ => {
                let reason = match node {
                    Expression::Operation(operation) => {
                        format!("`{}` is not a command", operation.name)
                    }
                    other => format!("expected an operation, found `{other}`"),
                };
                Err(EvaluationError::malformed("command", reason))
            }
        }
    }
}

impl From<Command> for Expression {
    fn from(command: Command) -> Self {
        use crate::expression::build;
        match command {
            Command::ToDouble(expression) => build::to_double(expression),
            Command::Simplify(expression) => build::simplify(expression),
            Command::Plot(plot) => plot.into(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Expression::from(self.clone()))
    }
}

impl<R: Renderer> Environment<R> {
    /// Parse `node` as a [`Command`] and run it in this environment.
    ///
    /// # Example
    ///
    /// ```rust
    /// use symcalc::expression::build::{add, number, to_double, variable};
    /// use symcalc::{Environment, NullRenderer};
    ///
    /// let mut environment = Environment::new(NullRenderer);
    /// environment.bind("c", number(4.0));
    ///
    /// let result = environment.execute(&to_double(add(variable("c"), number(3.0)))).unwrap();
    /// assert_eq!(result, number(7.0));
    /// ```
    #[tracing::instrument(skip_all, fields(node = %node))]
    pub fn execute(&mut self, node: &Expression) -> EvaluationResult<Expression> {
        Command::try_from(node)?.execute(self)
    }
}

/// Handle a `toDouble(expression)` node: evaluate `expression` to a number.
#[tracing::instrument(skip_all)]
pub fn handle_to_double<V>(variables: &V, node: &Expression) -> EvaluationResult<Expression>
where
    V: VariableStore + ?Sized,
{
    let [expression] = assert_node_matches::<1>(node, Operator::ToDouble)?;
    expression.check_arity()?;
    run_to_double(variables, expression)
}

/// Handle a `simplify(expression)` node: constant-fold `expression`.
#[tracing::instrument(skip_all)]
pub fn handle_simplify<V>(variables: &V, node: &Expression) -> EvaluationResult<Expression>
where
    V: VariableStore + ?Sized,
{
    let [expression] = assert_node_matches::<1>(node, Operator::Simplify)?;
    expression.check_arity()?;
    run_simplify(variables, expression)
}

/// Handle a `plot(expression, variable, min, max, step)` node. See [`PlotCommand::run`].
#[tracing::instrument(skip_all)]
pub fn handle_plot<R: Renderer>(
    environment: &mut Environment<R>,
    node: &Expression,
) -> EvaluationResult<Expression> {
    Command::Plot(PlotCommand::try_from(node)?).execute(environment)
}

fn run_to_double<V>(variables: &V, expression: &Expression) -> EvaluationResult<Expression>
where
    V: VariableStore + ?Sized,
{
    let value = expression.evaluate(variables)?;
    tracing::debug!(value, "evaluated");
    Ok(Expression::Number(value))
}

fn run_simplify<V>(variables: &V, expression: &Expression) -> EvaluationResult<Expression>
where
    V: VariableStore + ?Sized,
{
    let simplified = expression.simplify(variables)?;
    tracing::debug!(%simplified, "simplified");
    Ok(simplified)
}

/// Check that `node` is an `operator` node with exactly `N` operands, and return them.
fn assert_node_matches<const N: usize>(
    node: &Expression,
    operator: Operator,
) -> EvaluationResult<&[Expression; N]> {
    debug_assert_eq!(operator.arity(), N);
    let name: &'static str = operator.into();

    let Expression::Operation(operation) = node else {
        return Err(EvaluationError::malformed(
            name,
            format!("expected an operation, found `{node}`"),
        ));
    };
    if operation.name != name {
        return Err(EvaluationError::malformed(
            name,
            format!("expected operation `{name}`, found `{}`", operation.name),
        ));
    }

    operation.children().try_into().map_err(|_| {
        EvaluationError::malformed(
            name,
            format!(
                "expected {N} children, found {}",
                operation.children().len()
            ),
        )
    })
}

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

//! Reduction of [`Expression`]s to numbers.

use crate::{
    environment::VariableStore,
    error::{EvaluationError, EvaluationResult},
    expression::{Expression, Operator},
};

/// Compute the result of applying a known arithmetic operator to evaluated operands.
///
/// This is the only place arithmetic happens: the simplifier folds through it too, so that
/// evaluating a tree and evaluating its simplified form always agree.
#[inline]
pub(crate) fn calculate(operator: Operator, operands: &[f64]) -> EvaluationResult<f64> {
    use Operator::*;
    match (operator, operands) {
        (Plus, &[left, right]) => Ok(left + right),
        (Minus, &[left, right]) => Ok(left - right),
        (Star, &[left, right]) => Ok(left * right),
        (Slash, &[left, right]) => Ok(left / right),
        (Caret, &[left, right]) => Ok(left.powf(right)),
        (Negate, &[value]) => Ok(-value),
        (Sine, &[value]) => Ok(value.sin()),
        (Cosine, &[value]) => Ok(value.cos()),
        (ToDouble | Simplify | Plot, _) => {
            Err(EvaluationError::UnknownOperation(operator.to_string()))
        }
        (Plus | Minus | Star | Slash | Caret | Negate | Sine | Cosine, _) => {
            Err(EvaluationError::ArityMismatch {
                operation: operator.to_string(),
                expected: operator.arity(),
                found: operands.len(),
            })
        }
    }
}

/// Walks expression trees against a variable store, tracking which bindings are currently
/// being expanded so that a binding which refers back to itself is reported instead of
/// recursing forever.
pub(crate) struct Resolver<'v, V: ?Sized> {
    variables: &'v V,
    resolving: Vec<String>,
}

impl<'v, V> Resolver<'v, V>
where
    V: VariableStore + ?Sized,
{
    pub(crate) fn new(variables: &'v V) -> Self {
        Self {
            variables,
            resolving: Vec::new(),
        }
    }

    /// Run `expand` on the expression bound to `name`, or return `None` if `name` is unbound.
    pub(super) fn resolve<T>(
        &mut self,
        name: &str,
        expand: impl FnOnce(&mut Self, &'v Expression) -> EvaluationResult<T>,
    ) -> EvaluationResult<Option<T>> {
        let variables = self.variables;
        let Some(bound) = variables.lookup(name) else {
            return Ok(None);
        };

        if self.resolving.iter().any(|pending| pending == name) {
            tracing::warn!(variable = name, chain = ?self.resolving, "cyclic variable binding");
            return Err(EvaluationError::CyclicBinding(name.to_string()));
        }

        self.resolving.push(name.to_string());
        let expanded = expand(self, bound);
        self.resolving.pop();

        expanded.map(Some)
    }

    pub(crate) fn evaluate(&mut self, expression: &Expression) -> EvaluationResult<f64> {
        match expression {
            Expression::Number(value) => Ok(*value),
            Expression::Variable(name) => self
                .resolve(name, |resolver, bound| match bound {
                    Expression::Number(value) => Ok(*value),
                    Expression::Variable(_) | Expression::Operation(_) => {
                        let simplified = resolver.simplify(bound)?;
                        resolver.evaluate(&simplified)
                    }
                })?
                .ok_or_else(|| EvaluationError::UndefinedVariable(name.clone())),
            Expression::Operation(operation) => {
                let operator = operation
                    .operator()
                    .filter(|operator| !operator.is_command())
                    .ok_or_else(|| EvaluationError::UnknownOperation(operation.name.clone()))?;
                operation.check_own_arity()?;

                let operands = operation
                    .children()
                    .iter()
                    .map(|child| self.evaluate(child))
                    .collect::<EvaluationResult<Vec<_>>>()?;

                calculate(operator, &operands)
            }
        }
    }
}

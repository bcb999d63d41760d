//! Constant folding for [`Expression`]s.
//!
//! The fold policy depends on the operator:
//! - `+`, `-`, `*` fold whenever both simplified operands are numbers;
//! - `/`, `^` only recurse when one of the unsimplified operands is an operation, and never fold,
//!   so `6 / 2` stays `6 / 2` and `(1 + 2) / 4` becomes `3 / 4`;
//! - `negate`, `sin`, `cos` recurse into their operand and never fold.
//!
//! Operations outside the arithmetic set have their operands simplified and are otherwise left
//! alone.
use crate::{
    environment::VariableStore,
    error::{EvaluationError, EvaluationResult},
    expression::{calculate, Expression, FoldClass, OperationExpression, Operator, Resolver},
};

impl<'v, V> Resolver<'v, V>
where
    V: VariableStore + ?Sized,
{
    pub(crate) fn simplify(&mut self, expression: &Expression) -> EvaluationResult<Expression> {
        match expression {
            Expression::Number(_) => Ok(expression.clone()),
            Expression::Variable(name) => Ok(self
                .resolve(name, |resolver, bound| resolver.simplify(bound))?
                .unwrap_or_else(|| expression.clone())),
            Expression::Operation(operation) => {
                operation.check_own_arity()?;
                match operation.operator() {
                    Some(operator) => match operator.class() {
                        FoldClass::Additive => self.fold(operator, operation),
                        FoldClass::Conservative => self.recurse_through(expression, operation),
                        FoldClass::Unary | FoldClass::Command => self.rebuild(operation),
                    },
                    None => self.rebuild(operation),
                }
            }
        }
    }

    /// Simplify both operands and fold them if they both became numbers.
    fn fold(
        &mut self,
        operator: Operator,
        operation: &OperationExpression,
    ) -> EvaluationResult<Expression> {
        let (left, right) = binary_operands(operation)?;
        let left = self.simplify(left)?;
        let right = self.simplify(right)?;

        match (&left, &right) {
            (Expression::Number(l), Expression::Number(r)) => {
                let folded = calculate(operator, &[*l, *r])?;
                tracing::debug!(%operator, left = l, right = r, folded, "folded constant");
                Ok(Expression::Number(folded))
            }
            _ => Ok(operation.with_children([left, right])),
        }
    }

    /// Simplify the operands of `expression` only if one of them is itself an operation; leave
    /// leaf-only nodes exactly as they are, without inlining bound variables.
    fn recurse_through(
        &mut self,
        expression: &Expression,
        operation: &OperationExpression,
    ) -> EvaluationResult<Expression> {
        let (left, right) = binary_operands(operation)?;
        if left.is_operation() || right.is_operation() {
            let left = self.simplify(left)?;
            let right = self.simplify(right)?;
            Ok(operation.with_children([left, right]))
        } else {
            Ok(expression.clone())
        }
    }

    fn rebuild(&mut self, operation: &OperationExpression) -> EvaluationResult<Expression> {
        let children = operation
            .children()
            .iter()
            .map(|child| self.simplify(child))
            .collect::<EvaluationResult<Vec<_>>>()?;
        Ok(operation.with_children(children))
    }
}

fn binary_operands(
    operation: &OperationExpression,
) -> EvaluationResult<(&Expression, &Expression)> {
    match operation.children() {
        [left, right] => Ok((left, right)),
        children => Err(EvaluationError::ArityMismatch {
            operation: operation.name.clone(),
            expected: 2,
            found: children.len(),
        }),
    }
}

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

use crate::render::RenderError;

/// The different possible types of errors that could occur while evaluating, simplifying, or
/// plotting an [`Expression`](crate::expression::Expression).
///
/// Every variant aborts the command that produced it; none of them are transient.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Node is not a valid {command} node: {reason}.")]
    MalformedCommand {
        command: String,
        reason: String,
    },
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Operation {operation} expects {expected} operand(s) but was given {found}.")]
    ArityMismatch {
        operation: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    InvalidPlotRange(#[from] PlotRangeError),
    #[error("Variable {0} is already defined in the environment.")]
    VariableAlreadyBound(String),
    #[error("Variable {0} is bound to an expression that refers back to itself.")]
    CyclicBinding(String),
    #[error("Failed to render the plot: {0}")]
    Render(#[from] RenderError),
}

/// The ways the bounds of a `plot` command may be unusable.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlotRangeError {
    #[error("Undefined variables within expressions: {bound} is not a number.")]
    UnresolvedBound { bound: String },
    #[error("Minimum value of variable ({min}) is larger than maximum ({max}).")]
    MinExceedsMax { min: f64, max: f64 },
    #[error("Increment of variable ({0}) is either zero or negative.")]
    NonPositiveStep(f64),
    #[error("Plotting {samples} samples exceeds the limit of {limit}.")]
    TooManySamples { samples: f64, limit: usize },
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;

impl EvaluationError {
    pub(crate) fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

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

//! A small symbolic calculator over arithmetic expression trees.
//!
//! Within this crate you'll find:
//!
//! * An immutable [expression] tree with builder utilities and operator overloads
//! * An [evaluator] that reduces trees to numbers under a set of variable bindings
//! * A constant-folding [simplifier]
//! * The [`plot`](command::PlotCommand) command, which samples an expression over a range and
//!   hands the result to a [renderer]
//!
//! Top-level commands (`toDouble`, `simplify`, and `plot`) are ordinary operation nodes, run
//! against an [`Environment`] with [`Environment::execute`].
//!
//! [evaluator]: crate::expression::Expression::evaluate
//! [expression]: crate::expression::Expression
//! [renderer]: crate::render::Renderer
//! [simplifier]: crate::expression::Expression::simplify

pub mod command;
pub mod environment;
pub mod error;
pub mod expression;
mod floating_point_eq;
pub mod render;

pub use command::{Command, PlotCommand, PlotSettings};
pub use environment::{Environment, VariableStore, VariableStoreMut, Variables};
pub use error::{EvaluationError, EvaluationResult, PlotRangeError};
pub use expression::{Expression, FoldClass, OperationExpression, Operator};
pub use render::{NullRenderer, RecordingRenderer, RenderError, Renderer, ScatterPlot};

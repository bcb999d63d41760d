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

//! Sinks for the samples produced by a `plot` command.

use std::fmt;

use crate::floating_point_eq;

/// A failure reported by a [`Renderer`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for RenderError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// A complete set of `(x, y)` samples, along with the labels to draw them with.
///
/// `xs` and `ys` always have the same length, and `ys[i]` is the value sampled at `xs[i]`.
#[derive(Clone, Debug)]
pub struct ScatterPlot {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl ScatterPlot {
    /// The samples as `(x, y)` pairs, in order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl PartialEq for ScatterPlot {
    // Implemented by hand so that NaN samples compare equal to each other.
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.x_axis_label == other.x_axis_label
            && self.y_axis_label == other.y_axis_label
            && floating_point_eq::slice_eq(&self.xs, &other.xs)
            && floating_point_eq::slice_eq(&self.ys, &other.ys)
    }
}

impl fmt::Display for ScatterPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} points, {} against {})",
            self.title,
            self.len(),
            self.y_axis_label,
            self.x_axis_label
        )
    }
}

/// Something that can draw a [`ScatterPlot`].
///
/// A successful `plot` command calls [`Renderer::draw_scatter_plot`] exactly once, with the
/// complete sample set.
pub trait Renderer {
    fn draw_scatter_plot(&mut self, plot: &ScatterPlot) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn draw_scatter_plot(&mut self, plot: &ScatterPlot) -> Result<(), RenderError> {
        (**self).draw_scatter_plot(plot)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn draw_scatter_plot(&mut self, plot: &ScatterPlot) -> Result<(), RenderError> {
        (**self).draw_scatter_plot(plot)
    }
}

/// Keeps every plot it is asked to draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingRenderer {
    plots: Vec<ScatterPlot>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plots(&self) -> &[ScatterPlot] {
        &self.plots
    }

    /// The most recently drawn plot.
    pub fn last(&self) -> Option<&ScatterPlot> {
        self.plots.last()
    }
}

impl Renderer for RecordingRenderer {
    fn draw_scatter_plot(&mut self, plot: &ScatterPlot) -> Result<(), RenderError> {
        self.plots.push(plot.clone());
        Ok(())
    }
}

/// Discards every plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_scatter_plot(&mut self, _plot: &ScatterPlot) -> Result<(), RenderError> {
        Ok(())
    }
}

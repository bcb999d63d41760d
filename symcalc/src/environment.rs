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

use std::{collections::HashMap, hash::BuildHasher};

use indexmap::IndexMap;

use crate::{command::PlotSettings, expression::Expression, render::Renderer};

/// The default variable store: bindings kept in the order they were made.
pub type Variables = IndexMap<String, Expression>;

/// Read access to variable bindings, by exact name.
pub trait VariableStore {
    fn lookup(&self, name: &str) -> Option<&Expression>;

    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// A [`VariableStore`] that can be changed.
pub trait VariableStoreMut: VariableStore {
    /// Bind `name`, returning the expression it was previously bound to.
    fn bind(&mut self, name: String, value: Expression) -> Option<Expression>;

    /// Remove the binding for `name`, returning the expression it was bound to.
    fn unbind(&mut self, name: &str) -> Option<Expression>;
}

impl<S: BuildHasher> VariableStore for IndexMap<String, Expression, S> {
    fn lookup(&self, name: &str) -> Option<&Expression> {
        self.get(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<S: BuildHasher> VariableStoreMut for IndexMap<String, Expression, S> {
    fn bind(&mut self, name: String, value: Expression) -> Option<Expression> {
        self.insert(name, value)
    }

    fn unbind(&mut self, name: &str) -> Option<Expression> {
        self.shift_remove(name)
    }
}

impl<S: BuildHasher> VariableStore for HashMap<String, Expression, S> {
    fn lookup(&self, name: &str) -> Option<&Expression> {
        self.get(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<S: BuildHasher> VariableStoreMut for HashMap<String, Expression, S> {
    fn bind(&mut self, name: String, value: Expression) -> Option<Expression> {
        self.insert(name, value)
    }

    fn unbind(&mut self, name: &str) -> Option<Expression> {
        self.remove(name)
    }
}

/// A binding that lasts exactly as long as this guard: `name` is unbound when the guard is
/// dropped, whether the scope it guards finished, returned early with an error, or unwound.
///
/// The name must not be bound when the guard is created.
pub(crate) struct ScopedBinding<'a, V: VariableStoreMut + ?Sized> {
    variables: &'a mut V,
    name: &'a str,
}

impl<'a, V: VariableStoreMut + ?Sized> ScopedBinding<'a, V> {
    pub(crate) fn new(variables: &'a mut V, name: &'a str) -> Self {
        debug_assert!(!variables.contains(name));
        Self { variables, name }
    }

    /// Rebind the guarded name.
    pub(crate) fn set(&mut self, value: Expression) {
        self.variables.bind(self.name.to_owned(), value);
    }

    pub(crate) fn variables(&self) -> &V {
        &*self.variables
    }
}

impl<V: VariableStoreMut + ?Sized> Drop for ScopedBinding<'_, V> {
    fn drop(&mut self) {
        self.variables.unbind(self.name);
    }
}

/// The state of one calculator session: variable bindings, the renderer that plots are drawn
/// on, and plot settings.
///
/// An environment has a single owner; commands that need to change it take it by `&mut`.
#[derive(Debug, Default)]
pub struct Environment<R> {
    variables: Variables,
    renderer: R,
    settings: PlotSettings,
}

impl<R: Renderer> Environment<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            variables: Variables::new(),
            renderer,
            settings: PlotSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PlotSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Bind `name` to `value`, returning the previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Expression) -> Option<Expression> {
        self.variables.bind(name.into(), value)
    }

    /// Remove the binding for `name`.
    pub fn unbind(&mut self, name: &str) -> Option<Expression> {
        self.variables.unbind(name)
    }

    /// Borrow the variables, renderer, and settings at the same time.
    pub(crate) fn split_mut(&mut self) -> (&mut Variables, &mut R, &PlotSettings) {
        (&mut self.variables, &mut self.renderer, &self.settings)
    }
}

impl<R> VariableStore for Environment<R> {
    fn lookup(&self, name: &str) -> Option<&Expression> {
        self.variables.lookup(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.variables.contains(name)
    }
}

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
    environment::VariableStore,
    error::{EvaluationError, EvaluationResult},
    floating_point_eq,
};
use itertools::Itertools;
use lexical::{format, to_string_with_options, WriteFloatOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
    num::NonZeroI32,
    ops::{Add, BitXor, Div, Mul, Neg, Sub},
    sync::Arc,
};

#[cfg(test)]
use proptest_derive::Arbitrary;

mod evaluation;
mod simplification;

pub(crate) use evaluation::{calculate, Resolver};

/// The type of arithmetic expression trees.
///
/// Expressions are *immutable values*.  The children of an [`Expression::Operation`] live in a
/// shared [`Arc<[Expression]>`](Arc) slice, so cloning a node is a pointer copy and an atomic
/// increment, and two parent nodes may freely alias the same children.  No API hands out an
/// owned or `&mut` reference to a child sequence; every transformation (simplification,
/// substitution) builds new nodes instead.
///
/// Note that when comparing expressions, any embedded NaNs are treated as *equal* to other
/// NaNs, not unequal, in contravention of IEEE 754.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Operation(OperationExpression),
}

/// A named operation applied to an ordered sequence of operands, e.g. `a - b` or `sin(x)`.
///
/// The name is kept as text so that trees may mention operations this crate does not know;
/// those are reported as [`EvaluationError::UnknownOperation`] only when evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationExpression {
    pub name: String,
    pub children: Arc<[Expression]>,
}

impl OperationExpression {
    pub fn new(name: impl Into<String>, children: impl Into<Arc<[Expression]>>) -> Self {
        Self {
            name: name.into(),
            children: children.into(),
        }
    }

    /// The operands, in order.
    #[inline]
    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    /// The [`Operator`] named by this node, if it is one this crate knows.
    #[inline]
    pub fn operator(&self) -> Option<Operator> {
        self.name.parse().ok()
    }

    /// Check this node's own child count against the arity table.  Operations this crate
    /// does not know have no fixed arity and always pass.
    pub fn check_own_arity(&self) -> EvaluationResult<()> {
        match self.operator() {
            Some(operator) if operator.arity() != self.children.len() => {
                Err(EvaluationError::ArityMismatch {
                    operation: self.name.clone(),
                    expected: operator.arity(),
                    found: self.children.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Build a node with the same name over a new sequence of children.
    pub(crate) fn with_children(&self, children: impl Into<Arc<[Expression]>>) -> Expression {
        Expression::Operation(Self::new(self.name.clone(), children))
    }
}

impl PartialEq for Expression {
    // Implemented by hand since we can't derive with f64s hidden inside.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => floating_point_eq::eq(*left, *right),
            (Self::Variable(left), Self::Variable(right)) => left == right,
            (Self::Operation(left), Self::Operation(right)) => left == right,

            // This explicit or-pattern ensures that we'll get a compilation error if
            // `Expression` grows another constructor.
            (Self::Number(_) | Self::Variable(_) | Self::Operation(_), _) => false,
        }
    }
}

// Implemented by hand since we can't derive with f64s hidden inside.
impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(value) => {
                "Number".hash(state);
                floating_point_eq::hash(*value, state);
            }
            Self::Variable(name) => {
                "Variable".hash(state);
                name.hash(state);
            }
            Self::Operation(operation) => {
                "Operation".hash(state);
                operation.hash(state);
            }
        }
    }
}

macro_rules! variant_accessors {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        paste::paste! { $(
            #[doc = concat!("Is this an [`Expression::", stringify!($variant), "`] node?")]
            #[inline]
            pub fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant(_))
            }

            #[doc = concat!(
                "The contents of this node, if it is an [`Expression::",
                stringify!($variant),
                "`]."
            )]
            #[inline]
            pub fn [<as_ $variant:snake>](&self) -> Option<&$ty> {
                match self {
                    Self::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        )+ }
    };
}

impl Expression {
    variant_accessors! {
        Number(f64),
        Variable(String),
        Operation(OperationExpression),
    }

    /// The [`Operator`] at the root of this tree, if it is an operation this crate knows.
    #[inline]
    pub fn operator(&self) -> Option<Operator> {
        self.as_operation().and_then(OperationExpression::operator)
    }

    /// Evaluate the expression to a single number.
    ///
    /// Variables are looked up in `variables`. A variable bound to another variable or to a
    /// still-symbolic expression is first simplified and then evaluated, so chains of bindings
    /// resolve transitively.
    ///
    /// # Example
    ///
    /// ```rust
    /// use symcalc::expression::build::{add, number, variable};
    /// use symcalc::Variables;
    ///
    /// let mut variables = Variables::new();
    /// variables.insert("c".to_string(), number(4.0));
    ///
    /// let value = add(variable("c"), number(3.0)).evaluate(&variables).unwrap();
    /// assert_eq!(value, 7.0);
    /// ```
    pub fn evaluate<V>(&self, variables: &V) -> EvaluationResult<f64>
    where
        V: VariableStore + ?Sized,
    {
        Resolver::new(variables).evaluate(self)
    }

    /// Constant-fold the expression, returning a new tree.
    ///
    /// Bound variables are inlined.  `+`, `-` and `*` fold whenever both simplified operands are
    /// numbers.  `/` and `^` only recurse when an operand is itself an operation, and never fold.
    /// Unary operations recurse into their operand but never fold.
    ///
    /// # Example
    ///
    /// ```rust
    /// use symcalc::expression::build::{add, div, mul, number, variable};
    /// use symcalc::Variables;
    ///
    /// let variables = Variables::new();
    ///
    /// let folded = mul(add(number(1.0), number(2.0)), variable("y"))
    ///     .simplify(&variables)
    ///     .unwrap();
    /// assert_eq!(folded, mul(number(3.0), variable("y")));
    ///
    /// let untouched = div(number(6.0), number(2.0));
    /// assert_eq!(untouched.simplify(&variables).unwrap(), untouched);
    /// ```
    pub fn simplify<V>(&self, variables: &V) -> EvaluationResult<Expression>
    where
        V: VariableStore + ?Sized,
    {
        Resolver::new(variables).simplify(self)
    }

    /// Check every operation node in the tree against the arity table, failing on the first
    /// mismatch.
    pub fn check_arity(&self) -> EvaluationResult<()> {
        match self {
            Self::Number(_) | Self::Variable(_) => Ok(()),
            Self::Operation(operation) => {
                operation.check_own_arity()?;
                operation
                    .children
                    .iter()
                    .try_for_each(Expression::check_arity)
            }
        }
    }
}

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("pattern is valid"));

/// Whether `name` may be used as a variable name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// How the simplifier treats an operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FoldClass {
    /// `+`, `-`, `*`: fold whenever both simplified operands are numbers.
    Additive,
    /// `/`, `^`: recurse only when an operand is an operation, and never fold.
    Conservative,
    /// `negate`, `sin`, `cos`: recurse into the operand, never fold.
    Unary,
    /// `toDouble`, `simplify`, `plot`: interpreted by [`Command`](crate::command::Command).
    Command,
}

/// Every operation name this crate knows, with its fixed arity.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Operator {
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "^")]
    Caret,
    #[strum(serialize = "negate")]
    Negate,
    #[strum(serialize = "sin")]
    Sine,
    #[strum(serialize = "cos")]
    Cosine,
    #[strum(serialize = "toDouble")]
    ToDouble,
    #[strum(serialize = "simplify")]
    Simplify,
    #[strum(serialize = "plot")]
    Plot,
}

impl Operator {
    /// The number of children a node with this operator must have.
    pub const fn arity(self) -> usize {
        use Operator::*;
        match self {
            Negate | Sine | Cosine | ToDouble | Simplify => 1,
            Plus | Minus | Star | Slash | Caret => 2,
            Plot => 5,
        }
    }

    pub const fn class(self) -> FoldClass {
        use Operator::*;
        match self {
            Plus | Minus | Star => FoldClass::Additive,
            Slash | Caret => FoldClass::Conservative,
            Negate | Sine | Cosine => FoldClass::Unary,
            ToDouble | Simplify | Plot => FoldClass::Command,
        }
    }

    #[inline]
    pub const fn is_command(self) -> bool {
        matches!(self.class(), FoldClass::Command)
    }

    /// Whether this operator is written between its operands.
    #[inline]
    const fn is_infix(self) -> bool {
        matches!(self.class(), FoldClass::Additive | FoldClass::Conservative)
    }
}

macro_rules! impl_expr_op {
    ($name:ident, $function:ident, $operator:ident) => {
        impl $name for Expression {
            type Output = Self;
            fn $function(self, other: Self) -> Self {
                build::operation(Operator::$operator, [self, other])
            }
        }
    };
}

impl_expr_op!(BitXor, bitxor, Caret);
impl_expr_op!(Add, add, Plus);
impl_expr_op!(Sub, sub, Minus);
impl_expr_op!(Mul, mul, Star);
impl_expr_op!(Div, div, Slash);

impl Neg for Expression {
    type Output = Self;

    fn neg(self) -> Self {
        build::negate(self)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

static FORMAT_NUMBER_OPTIONS: Lazy<WriteFloatOptions> = Lazy::new(|| {
    WriteFloatOptions::builder()
        .negative_exponent_break(NonZeroI32::new(-5))
        .positive_exponent_break(NonZeroI32::new(15))
        .trim_floats(true)
        .build()
        .expect("options are valid")
});

/// Format a number without a trailing `.0` for integral values, switching to exponent
/// notation for very large and very small magnitudes.
#[inline]
pub(crate) fn format_number(value: f64) -> String {
    const FORMAT: u128 = format::STANDARD;
    if value == 0f64 {
        "0".to_owned()
    } else {
        to_string_with_options::<_, FORMAT>(value, &FORMAT_NUMBER_OPTIONS)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Variable(name) => f.write_str(name),
            Self::Operation(operation) => write!(f, "{operation}"),
        }
    }
}

impl fmt::Display for OperationExpression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.operator(), self.children()) {
            (Some(operator), [left, right]) if operator.is_infix() => {
                format_inner_expression(f, left)?;
                write!(f, " {operator} ")?;
                format_inner_expression(f, right)
            }
            (_, children) => write!(f, "{}({})", self.name, children.iter().join(", ")),
        }
    }
}

/// Wrap infix operands in parentheses so that the printed form keeps the tree's grouping.
fn format_inner_expression(f: &mut fmt::Formatter, expression: &Expression) -> fmt::Result {
    match expression.operator() {
        Some(operator) if operator.is_infix() => write!(f, "({expression})"),
        _ => write!(f, "{expression}"),
    }
}

/// Convenience constructors for building [`Expression`] trees.
pub mod build {
    use super::*;

    /// A [`Number`](Expression::Number) leaf.
    #[inline(always)]
    pub fn number(value: f64) -> Expression {
        Expression::Number(value)
    }

    /// A [`Variable`](Expression::Variable) leaf.
    #[inline(always)]
    pub fn variable(name: impl Into<String>) -> Expression {
        Expression::Variable(name.into())
    }

    /// An [`Operation`](Expression::Operation) node for a known operator.
    #[inline(always)]
    pub fn operation(
        operator: Operator,
        children: impl Into<Arc<[Expression]>>,
    ) -> Expression {
        let name: &'static str = operator.into();
        Expression::Operation(OperationExpression::new(name, children))
    }

    macro_rules! binary_wrappers {
        ($($func:ident: $ctor:ident ($op:tt)),+ $(,)?) => {
            $(
                #[doc = concat!(
                    "Create an [`Expression`] representing `left ", stringify!($op), " right`."
                )]
                #[inline(always)]
                pub fn $func(left: Expression, right: Expression) -> Expression {
                    operation(Operator::$ctor, [left, right])
                }
            )+
        };
    }

    macro_rules! unary_wrappers {
        ($($func:ident: $ctor:ident),+ $(,)?) => {
            $(
                #[doc = concat!(
                    "Create an [`Expression`] representing `", stringify!($func), "(operand)`."
                )]
                #[inline(always)]
                pub fn $func(operand: Expression) -> Expression {
                    operation(Operator::$ctor, [operand])
                }
            )+
        };
    }

    binary_wrappers! {
        add: Plus (+),
        sub: Minus (-),
        mul: Star (*),
        div: Slash (/),
        pow: Caret (^),
    }

    unary_wrappers! {
        negate: Negate,
        sin: Sine,
        cos: Cosine,
        to_double: ToDouble,
        simplify: Simplify,
    }

    /// Create a `plot(expression, variable, min, max, step)` command node.
    #[inline(always)]
    pub fn plot(
        expression: Expression,
        variable: Expression,
        min: Expression,
        max: Expression,
        step: Expression,
    ) -> Expression {
        operation(Operator::Plot, [expression, variable, min, max, step])
    }
}


#[cfg(test)]
impl proptest::prelude::Arbitrary for Expression {
    type Parameters = ();
    type Strategy = proptest::prelude::BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        let () = args;

        self::proptest_helpers::arb_expr().boxed()
    }
}

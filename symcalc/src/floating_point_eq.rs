//! Equality and hashing for the [`f64`] payloads of [`Number`](crate::expression::Expression::Number)
//! nodes, so that expression trees can implement [`Eq`] and [`Hash`].
//!
//! The functions in this module treat `±0.0` as indistinguishable, all NaNs as indistinguishable,
//! and all NaNs as equal only to each other.

use std::hash::{Hash as _, Hasher};

/// Reflexive [`f64`] equality: `NaN` equals `NaN`, and `+0.0` equals `-0.0`. Agrees with [`hash`].
#[inline]
pub(crate) fn eq(left: f64, right: f64) -> bool {
    left == right || left.is_nan() && right.is_nan()
}

/// Compares two sample sequences element-wise with [`eq`].
#[inline]
pub(crate) fn slice_eq(left: &[f64], right: &[f64]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(&l, &r)| eq(l, r))
}

/// Hashes an [`f64`] such that all `NaN`s are considered equal.
///
/// This hash function is compatible with using [`eq`] as an equality function.
#[inline]
pub(crate) fn hash<H: Hasher>(value: f64, state: &mut H) {
    let value = if value == 0.0f64 {
        // `+0.0` and `-0.0` have different bits but compare equal, so both hash as `+0.0`.
        0.0f64
    } else if value.is_nan() {
        f64::NAN
    } else {
        value
    };

    value.to_bits().hash(state)
}

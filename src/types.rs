//! Newtype wrappers for discrete state keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of fractional digits kept when a real-valued feature is bucketed.
pub const REAL_FEATURE_DIGITS: u32 = 3;

const REAL_FEATURE_SCALE: f64 = 1000.0;

/// A single component of a [`StateKey`].
///
/// Real values are rounded to [`REAL_FEATURE_DIGITS`] decimal places and
/// stored as fixed-point integers so keys stay hashable and totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// A small integer bucket (hp band, flag, counter, ...)
    Int(i64),
    /// A real value in thousandths
    Milli(i64),
}

impl Feature {
    /// Bucket a real value. Non-finite inputs collapse to zero.
    pub fn real(value: f64) -> Self {
        if !value.is_finite() {
            return Feature::Milli(0);
        }
        Feature::Milli((value * REAL_FEATURE_SCALE).round() as i64)
    }

    /// Numeric view of the feature.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Feature::Int(v) => v as f64,
            Feature::Milli(v) => v as f64 / REAL_FEATURE_SCALE,
        }
    }
}

impl From<i64> for Feature {
    fn from(value: i64) -> Self {
        Feature::Int(value)
    }
}

impl From<i32> for Feature {
    fn from(value: i32) -> Self {
        Feature::Int(i64::from(value))
    }
}

impl From<usize> for Feature {
    fn from(value: usize) -> Self {
        Feature::Int(value as i64)
    }
}

impl From<bool> for Feature {
    fn from(value: bool) -> Self {
        Feature::Int(i64::from(value))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Int(v) => write!(f, "{v}"),
            Feature::Milli(_) => write!(f, "{:.3}", self.as_f64()),
        }
    }
}

/// Immutable, bucketed encoding of a battle snapshot.
///
/// Two snapshots encoding to the same key are indistinguishable for
/// learning purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(Vec<Feature>);

impl StateKey {
    pub fn new(features: Vec<Feature>) -> Self {
        StateKey(features)
    }

    /// Build a key made only of integer buckets.
    pub fn from_ints(values: &[i64]) -> Self {
        StateKey(values.iter().copied().map(Feature::Int).collect())
    }

    pub fn features(&self) -> &[Feature] {
        &self.0
    }

    /// Number of features in the key.
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Feature> for StateKey {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        StateKey(iter.into_iter().collect())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, feature) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{feature}")?;
        }
        write!(f, ")")
    }
}

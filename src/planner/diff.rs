//! Structural JSON diff.
//!
//! Objects compare by key regardless of order, arrays compare by position
//! and numbers compare by numeric value, so `1` and `1.0` are equal. Every
//! difference is reported at the deepest path where the two sides diverge.

use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeSet;
use std::fmt;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array position.
    Index(usize),
}

/// Location of a value inside a JSON document. Empty for the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

/// How a field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Present only in the desired document.
    Added,
    /// Present only in the current document.
    Removed,
    /// Present in both with different values.
    Modified,
}

/// A single leaf-level difference.
///
/// `before` is `None` when the field is absent from the current document and
/// `after` is `None` when it is absent from the desired one. A field that is
/// present with a JSON `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    /// Where the documents diverge.
    pub path: FieldPath,
    /// Current value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    /// Desired value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl FieldPath {
    /// The root path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns this path extended by an object key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Returns this path extended by an array position.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FieldChange {
    /// Classifies the change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match (&self.before, &self.after) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Removed,
            _ => ChangeKind::Modified,
        }
    }
}

/// Computes the differences that turn `before` into `after`.
///
/// The result is ordered by path: object keys in lexicographic order, array
/// positions ascending. An empty result means the documents are equal.
#[must_use]
pub fn diff(before: &Value, after: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut path = Vec::new();
    diff_into(before, after, &mut path, &mut changes);
    changes
}

/// Returns true if the documents are structurally equal.
#[must_use]
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| structurally_equal(value, other)))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| structurally_equal(l, r))
        }
        _ => scalars_equal(a, b),
    }
}

fn diff_into(
    before: &Value,
    after: &Value,
    path: &mut Vec<PathSegment>,
    changes: &mut Vec<FieldChange>,
) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let keys: BTreeSet<&String> = b.keys().chain(a.keys()).collect();
            for key in keys {
                path.push(PathSegment::Key(key.clone()));
                match (b.get(key), a.get(key)) {
                    (Some(bv), Some(av)) => diff_into(bv, av, path, changes),
                    (bv, av) => changes.push(change_at(path, bv, av)),
                }
                path.pop();
            }
        }
        (Value::Array(b), Value::Array(a)) => {
            for index in 0..b.len().max(a.len()) {
                path.push(PathSegment::Index(index));
                match (b.get(index), a.get(index)) {
                    (Some(bv), Some(av)) => diff_into(bv, av, path, changes),
                    (bv, av) => changes.push(change_at(path, bv, av)),
                }
                path.pop();
            }
        }
        _ if scalars_equal(before, after) => {}
        _ => changes.push(change_at(path, Some(before), Some(after))),
    }
}

fn change_at(path: &[PathSegment], before: Option<&Value>, after: Option<&Value>) -> FieldChange {
    FieldChange {
        path: FieldPath(path.to_vec()),
        before: before.cloned(),
        after: after.cloned(),
    }
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        _ => false,
    }
}

/// Smallest float that no longer fits `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Smallest float `i64` can hold.
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;

#[allow(clippy::float_cmp)]
fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (integer_of(x), integer_of(y)) {
        (Some(a), Some(b)) => a == b,
        (Some(a), None) => y.as_f64().is_some_and(|f| float_equals_integer(f, a)),
        (None, Some(b)) => x.as_f64().is_some_and(|f| float_equals_integer(f, b)),
        (None, None) => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn integer_of(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Exact comparison: the float must be integral and inside the integer range.
#[allow(clippy::cast_possible_truncation)]
fn float_equals_integer(f: f64, i: i128) -> bool {
    if !f.is_finite() || f.fract() != 0.0 || f < I64_MIN || f >= U64_LIMIT {
        return false;
    }
    f as i128 == i
}

//! Comparison policy: per-field equality rules.
//!
//! Scalars compare by identity. Sets compare by membership, ignoring order
//! and duplicates. Comparison never rewrites what is stored; only Read
//! normalizes observed sets.

use crate::policy::ResourcePolicy;
use crate::record::{AttributeRecord, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a field's values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    Set,
}

/// Compare two values under the rule for `kind`.
///
/// A set-kind field holding a scalar on one side falls back to identity.
pub fn values_equal(kind: FieldKind, a: &Value, b: &Value) -> bool {
    match (kind, a, b) {
        (FieldKind::Set, Value::Set(left), Value::Set(right)) => sets_equal(left, right),
        _ => a == b,
    }
}

/// Order- and duplicate-insensitive set equality
pub fn sets_equal(a: &[String], b: &[String]) -> bool {
    let left: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let right: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    left == right
}

/// Sort and deduplicate a set in place
pub fn normalize_set(items: &mut Vec<String>) {
    items.sort();
    items.dedup();
}

/// Normalize every set-typed field of an observed record.
pub fn normalize_record(policy: &ResourcePolicy, record: &mut AttributeRecord) {
    for (field, value) in record.iter_mut() {
        if policy.field_kind(field) == FieldKind::Set
            && let Value::Set(items) = value
        {
            normalize_set(items);
        }
    }
}

/// Compare an optional pair of field values.
///
/// Absent and empty are treated alike so that a server omitting an empty
/// set does not read as drift.
pub fn field_equal(kind: FieldKind, a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => values_equal(kind, a, b),
        (Some(v), None) | (None, Some(v)) => v.is_empty(),
        (None, None) => true,
    }
}

/// Whether every user-declarable field of `desired` matches `observed`.
///
/// Computed fields and the identifier are skipped: they are owned by the
/// remote service, not the author of the desired record.
pub fn matches_desired(
    policy: &ResourcePolicy,
    observed: &AttributeRecord,
    desired: &AttributeRecord,
) -> bool {
    desired
        .iter()
        .filter(|(field, _)| !policy.is_computed(field))
        .all(|(field, value)| {
            field_equal(policy.field_kind(field), observed.get(field), Some(value))
        })
}

//! Diff computation between persisted and desired records

use crate::compare::field_equal;
use crate::policy::{ResourcePolicy, UpdateSemantics};
use crate::record::{AttributeRecord, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Placeholder shown instead of sensitive values
pub const REDACTED: &str = "(sensitive value)";

/// What a plan will do to one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    NoChange,
    Create,
    Update,
    /// Delete then create; an immutable field changed
    Replace,
    Delete,
}

impl PlannedAction {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::Delete => "-",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoChange => "no change",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
        })
    }
}

/// One changed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: Option<Value>,
    pub to: Option<Value>,
    /// The field is immutable, so the change needs a replacement
    pub forces_replacement: bool,
    pub sensitive: bool,
}

impl FieldChange {
    fn render(&self, value: Option<&Value>) -> String {
        match value {
            None => "(none)".to_string(),
            Some(_) if self.sensitive => REDACTED.to_string(),
            Some(value) => value.to_string(),
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} => {}",
            self.field,
            self.render(self.from.as_ref()),
            self.render(self.to.as_ref())
        )?;
        if self.forces_replacement {
            f.write_str(" (forces replacement)")?;
        }
        Ok(())
    }
}

/// A diff between the persisted and desired state of one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// State address, e.g. `dns_record.www`
    pub address: String,
    pub action: PlannedAction,
    pub changes: Vec<FieldChange>,
}

impl ResourceDiff {
    /// Compare `prior` (persisted, already refreshed) with `desired`.
    ///
    /// Computed fields are never part of a diff: they belong to the remote
    /// service.
    pub fn compute(
        address: impl Into<String>,
        policy: &ResourcePolicy,
        prior: Option<&AttributeRecord>,
        desired: Option<&AttributeRecord>,
    ) -> Self {
        let address = address.into();
        let (action, changes) = match (prior, desired) {
            (None, None) => (PlannedAction::NoChange, Vec::new()),
            (None, Some(desired)) => (
                PlannedAction::Create,
                authored_changes(policy, &AttributeRecord::new(), desired),
            ),
            (Some(prior), None) => (
                PlannedAction::Delete,
                authored_changes(policy, prior, &AttributeRecord::new()),
            ),
            (Some(prior), Some(desired)) => {
                let changes = authored_changes(policy, prior, desired);
                let action = if changes.is_empty() {
                    PlannedAction::NoChange
                } else if changes.iter().any(|c| c.forces_replacement)
                    || policy.update == UpdateSemantics::Unsupported
                {
                    PlannedAction::Replace
                } else {
                    PlannedAction::Update
                };
                (action, changes)
            }
        };

        Self {
            address,
            action,
            changes,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.action.is_change()
    }
}

fn authored_changes(
    policy: &ResourcePolicy,
    prior: &AttributeRecord,
    desired: &AttributeRecord,
) -> Vec<FieldChange> {
    let fields: BTreeSet<&str> = prior
        .iter()
        .chain(desired.iter())
        .map(|(field, _)| field)
        .collect();

    fields
        .into_iter()
        .filter(|field| !policy.is_computed(field) && Some(*field) != policy.identifier_field)
        .filter_map(|field| {
            let from = prior.get(field);
            let to = desired.get(field);
            if field_equal(policy.field_kind(field), from, to) {
                return None;
            }
            Some(FieldChange {
                field: field.to_string(),
                from: from.cloned(),
                to: to.cloned(),
                forces_replacement: prior.has(field)
                    && !desired.is_empty()
                    && policy.is_immutable(field),
                sensitive: policy.is_sensitive(field),
            })
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub creates: usize,
    pub updates: usize,
    pub replaces: usize,
    pub deletes: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.action {
                PlannedAction::NoChange => summary.unchanged += 1,
                PlannedAction::Create => summary.creates += 1,
                PlannedAction::Update => summary.updates += 1,
                PlannedAction::Replace => summary.replaces += 1,
                PlannedAction::Delete => summary.deletes += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.replaces + self.deletes
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete",
            self.creates, self.updates, self.replaces, self.deletes
        )
    }
}

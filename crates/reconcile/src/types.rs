//! Core types for reconciliation outcomes

use crate::record::AttributeRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five lifecycle operations every kind is driven through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the front-end must do with its persisted record after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewState {
    /// Persist this record as the instance's state
    Persist(AttributeRecord),
    /// Drop persisted state: the instance was deleted or has drifted away
    Clear,
}

impl NewState {
    pub fn record(&self) -> Option<&AttributeRecord> {
        match self {
            Self::Persist(record) => Some(record),
            Self::Clear => None,
        }
    }

    pub fn into_record(self) -> Option<AttributeRecord> {
        match self {
            Self::Persist(record) => Some(record),
            Self::Clear => None,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }
}

/// Result of applying one planned change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Instance was created
    Created,
    /// Instance was updated in place (or re-applied)
    Updated,
    /// Instance was deleted then created
    Replaced,
    /// Instance was deleted, or local state dropped
    Deleted,
    /// Existing instance adopted into state
    Imported,
    /// Instance no longer exists remotely; state cleared
    Drifted,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Replaced | Self::Deleted | Self::Imported
        )
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub imported: usize,
    pub drifted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted + self.imported
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of instances processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.drifted + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Updated => self.updated += 1,
            ApplyResult::Replaced => self.replaced += 1,
            ApplyResult::Deleted => self.deleted += 1,
            ApplyResult::Imported => self.imported += 1,
            ApplyResult::Drifted => self.drifted += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        for result in [
            ApplyResult::Created,
            ApplyResult::Replaced,
            ApplyResult::NoChange,
            ApplyResult::Drifted,
            ApplyResult::Failed {
                error: "boom".into(),
            },
        ] {
            summary.add_result(&result);
        }

        assert_eq!(summary.total_changes(), 2);
        assert_eq!(summary.total(), 5);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_new_state_accessors() {
        let state = NewState::Persist(AttributeRecord::new().with("id", "x"));
        assert_eq!(state.record().and_then(|r| r.get_str("id")), Some("x"));
        assert!(NewState::Clear.is_clear());
        assert!(NewState::Clear.into_record().is_none());
    }
}

//! Execution engine for deploymeta
//!
//! The engine orchestrates:
//! 1. Refreshing - Read tracked instances and detect drift
//! 2. Planning - Diff the manifest against refreshed state
//! 3. Executing - Reconcile planned changes in parallel and record the outcome

pub mod differ;
pub mod executor;
pub mod planner;

use reconcile::{RemoteAdapter, ResourceKind};

pub use executor::{ExecuteOptions, execute, refresh};
pub use planner::{Target, build_plan, destroy_plan, parse_target};

/// One remote adapter per kind, shared across worker threads
pub trait AdapterSet: Sync {
    fn adapter(&self, kind: ResourceKind) -> &dyn RemoteAdapter;
}

impl AdapterSet for factory::Adapters {
    fn adapter(&self, kind: ResourceKind) -> &dyn RemoteAdapter {
        Self::adapter(self, kind)
    }
}

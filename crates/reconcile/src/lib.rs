//! # Reconcile
//!
//! Declarative reconciliation of remote deployment metadata.
//!
//! A front-end holds the persisted state of each resource instance and asks
//! this crate to move it toward a desired state. Every resource kind is
//! driven by the same [`Reconciler`], customized by a static
//! [`ResourcePolicy`] and served by one [`RemoteAdapter`].
//!
//! ## Core Concepts
//!
//! - **AttributeRecord**: the field values of one instance
//! - **ResourcePolicy**: per-kind identifier, immutable fields and lifecycle semantics
//! - **RemoteAdapter**: the per-kind RPCs against the configuration service
//! - **Reconciler**: Create, Read, Update, Delete and Import for one kind
//! - **NewState**: what the front-end must persist after an operation
//!
//! ## Failure model
//!
//! Remote failures are classified by their structured [`ErrorCode`] into
//! not found, transient and fatal. A Read that finds nothing returns
//! [`NewState::Clear`] so the front-end forgets the instance; the other
//! categories surface as an [`Error`]. Caller contract violations are
//! reported as [`Error::PreconditionFailed`] before any remote call.
//!
//! No operation retries internally. See [`retry_safe`] for which
//! operations a caller may repeat after a transient failure.

pub mod adapter;
pub mod apply;
pub mod compare;
pub mod diff;
pub mod error;
pub mod policy;
pub mod reconciler;
pub mod record;
pub mod types;

// Re-export main types at crate root
pub use adapter::{CallCounts, MockAdapter, RemoteAdapter, RemoteResult};
pub use apply::{Request, apply, retry_safe};
pub use compare::{FieldKind, matches_desired, sets_equal, values_equal};
pub use diff::{DiffSummary, FieldChange, PlannedAction, REDACTED, ResourceDiff};
pub use error::{
    Error, ErrorCategory, ErrorCode, ErrorContext, RemoteError, Result, Violation, classify,
};
pub use policy::{
    DeleteSemantics, FieldSpec, Presence, ReadSemantics, ResourceKind, ResourcePolicy,
    UpdateSemantics,
};
pub use reconciler::{ReadOutcome, Reconciler};
pub use record::{AttributeRecord, Value};
pub use types::{ApplyResult, ExecuteSummary, NewState, Operation};

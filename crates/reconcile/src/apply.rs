//! Single entry point for front-ends.
//!
//! A front-end holds persisted state per instance and calls [`apply`] with
//! one [`Request`]. The returned [`NewState`] tells it what to persist.

use crate::adapter::RemoteAdapter;
use crate::error::{Error, ErrorContext, Result, Violation};
use crate::policy::{ResourceKind, ResourcePolicy, UpdateSemantics};
use crate::reconciler::{ReadOutcome, Reconciler};
use crate::record::AttributeRecord;
use crate::types::{NewState, Operation};

/// One lifecycle request for one instance
#[derive(Debug, Clone)]
pub enum Request {
    Create { desired: AttributeRecord },
    Read { prior: AttributeRecord },
    Update {
        prior: AttributeRecord,
        desired: AttributeRecord,
    },
    Delete { prior: AttributeRecord },
    Import { id: String },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Read { .. } => Operation::Read,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
            Self::Import { .. } => Operation::Import,
        }
    }
}

/// Dispatch `request` for `kind` through `adapter`.
///
/// The adapter must serve `kind`; a mismatch is rejected without any remote
/// call.
pub fn apply(
    kind: ResourceKind,
    adapter: &dyn RemoteAdapter,
    request: Request,
) -> Result<NewState> {
    let operation = request.operation();
    if adapter.kind() != kind {
        return Err(Error::precondition(
            ErrorContext::new(kind, operation, None),
            Violation::AdapterMismatch {
                kind,
                adapter: adapter.kind(),
            },
        ));
    }

    let reconciler = Reconciler::new(kind.policy(), adapter);
    log::trace!("apply {operation} {kind}");

    match request {
        Request::Create { desired } => reconciler.create(&desired).map(NewState::Persist),
        Request::Read { prior } => match reconciler.read(&prior)? {
            ReadOutcome::Present(record) => Ok(NewState::Persist(record)),
            ReadOutcome::Absent => Ok(NewState::Clear),
        },
        Request::Update { prior, desired } => {
            reconciler.update(&prior, &desired).map(NewState::Persist)
        }
        Request::Delete { prior } => reconciler.delete(&prior).map(|()| NewState::Clear),
        Request::Import { id } => reconciler.import(&id).map(NewState::Persist),
    }
}

/// Whether a caller may safely repeat `operation` after a transient failure.
///
/// Reads and deletes are naturally idempotent. Create and Update are only
/// safe for kinds whose service call replaces the instance wholesale; for
/// the others a lost response may have created a duplicate.
pub fn retry_safe(policy: &ResourcePolicy, operation: Operation) -> bool {
    match operation {
        Operation::Read | Operation::Import | Operation::Delete => true,
        Operation::Create | Operation::Update => policy.update == UpdateSemantics::Reapply,
    }
}

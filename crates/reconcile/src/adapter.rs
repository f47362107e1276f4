//! Remote adapter trait and an in-memory implementation.
//!
//! One adapter is bound to one resource kind and performs that kind's RPCs
//! against the configuration service. Adapters are constructed by the
//! caller with whatever client context they need; the reconciler only sees
//! this trait.
//!
//! # Testing
//!
//! Use [`MockAdapter`] to reconcile without a remote service:
//!
//! ```
//! use reconcile::{AttributeRecord, MockAdapter, Reconciler, ResourceKind, Value};
//!
//! let adapter = MockAdapter::new(ResourceKind::DnsRecord);
//! let reconciler = Reconciler::new(ResourceKind::DnsRecord.policy(), &adapter);
//!
//! let desired = AttributeRecord::new()
//!     .with("name", "www")
//!     .with("zone_name", "example.com")
//!     .with("type", "CNAME")
//!     .with("values", Value::set(["target.example.com"]));
//!
//! let observed = reconciler.create(&desired).unwrap();
//! assert_eq!(observed.get_str("id"), Some("dns-1"));
//! assert_eq!(adapter.calls().create, 1);
//! ```

use crate::error::{ErrorCode, RemoteError};
use crate::policy::ResourceKind;
use crate::record::AttributeRecord;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Result type for adapter calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Per-kind interface to the configuration service.
///
/// `id` is `None` for kinds without an identifier field (singletons keyed
/// implicitly by the deployment).
pub trait RemoteAdapter: Send + Sync {
    /// The kind this adapter serves
    fn kind(&self) -> ResourceKind;

    /// Create the instance, returning at least the assigned identifier and
    /// any server-computed fields.
    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord>;

    /// Fetch the instance. Absence must be reported as
    /// [`ErrorCode::NotFound`].
    fn get(&self, id: Option<&str>) -> RemoteResult<AttributeRecord>;

    /// Update the instance in place.
    fn update(&self, id: &str, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let _ = (id, record);
        Err(RemoteError::unimplemented("update"))
    }

    /// Delete the instance.
    fn delete(&self, id: &str) -> RemoteResult<()> {
        let _ = id;
        Err(RemoteError::unimplemented("delete"))
    }
}

/// Number of calls a [`MockAdapter`] has served, per RPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub get: usize,
    pub update: usize,
    pub delete: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.create + self.get + self.update + self.delete
    }
}

#[derive(Debug, Default)]
struct MockInner {
    records: BTreeMap<String, AttributeRecord>,
    next_id: usize,
    calls: CallCounts,
    failures: VecDeque<RemoteError>,
    omit_identifier: bool,
    computed: AttributeRecord,
}

/// In-memory adapter that behaves like a well-formed remote service.
///
/// Instances are keyed by an assigned identifier (`<prefix>-<n>`), or by an
/// empty key for singleton kinds. Failures can be queued to be returned by
/// the next calls, in order.
#[derive(Debug)]
pub struct MockAdapter {
    kind: ResourceKind,
    inner: Mutex<MockInner>,
}

impl MockAdapter {
    /// Create a new empty mock adapter for `kind`.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(MockInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self.kind {
            ResourceKind::DnsRecord => "dns",
            ResourceKind::AwsAcmCertificate => "cert",
            ResourceKind::MonitoringWriteToken => "tok",
            _ => "res",
        }
    }

    fn key(&self, id: Option<&str>) -> String {
        id.unwrap_or_default().to_string()
    }

    /// Queue a failure for the next call.
    pub fn fail_next(&self, err: RemoteError) {
        self.lock().failures.push_back(err);
    }

    /// Queue a failure with the given code for the next call.
    pub fn fail_next_with(&self, code: ErrorCode) {
        self.fail_next(RemoteError::new(code, format!("mock {code}")));
    }

    /// Make create succeed without reporting an identifier.
    pub fn omit_identifier_on_create(&self) {
        self.lock().omit_identifier = true;
    }

    /// Fields the mock "computes" and returns on every create.
    pub fn set_computed(&self, computed: AttributeRecord) {
        self.lock().computed = computed;
    }

    /// Seed an existing remote instance (as if created out-of-band).
    pub fn insert(&self, id: Option<&str>, record: AttributeRecord) {
        let key = self.key(id);
        self.lock().records.insert(key, record);
    }

    /// Remove an instance behind the reconciler's back (simulates drift).
    pub fn forget(&self, id: Option<&str>) {
        let key = self.key(id);
        self.lock().records.remove(&key);
    }

    /// The stored instance, if any.
    pub fn stored(&self, id: Option<&str>) -> Option<AttributeRecord> {
        self.lock().records.get(&self.key(id)).cloned()
    }

    /// Calls served so far.
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    fn take_failure(inner: &mut MockInner) -> RemoteResult<()> {
        match inner.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RemoteAdapter for MockAdapter {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let identifier_field = self.kind.policy().identifier_field;
        let prefix = self.id_prefix();
        let mut inner = self.lock();
        inner.calls.create += 1;
        Self::take_failure(&mut inner)?;

        let mut stored = record.clone();
        stored.merge(inner.computed.clone());

        let key = match identifier_field {
            Some(field) => {
                inner.next_id += 1;
                let id = format!("{prefix}-{}", inner.next_id);
                stored.insert(field, id.clone());
                id
            }
            None => String::new(),
        };
        inner.records.insert(key, stored.clone());

        if inner.omit_identifier
            && let Some(field) = identifier_field
        {
            stored.remove(field);
        }
        Ok(stored)
    }

    fn get(&self, id: Option<&str>) -> RemoteResult<AttributeRecord> {
        let key = self.key(id);
        let mut inner = self.lock();
        inner.calls.get += 1;
        Self::take_failure(&mut inner)?;

        inner
            .records
            .get(&key)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("{} '{key}' not found", self.kind)))
    }

    fn update(&self, id: &str, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let mut inner = self.lock();
        inner.calls.update += 1;
        Self::take_failure(&mut inner)?;

        let stored = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RemoteError::not_found(format!("{} '{id}' not found", self.kind)))?;
        stored.merge(record.clone());
        Ok(stored.clone())
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        let mut inner = self.lock();
        inner.calls.delete += 1;
        Self::take_failure(&mut inner)?;

        inner
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::not_found(format!("{} '{id}' not found", self.kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_mock_assigns_sequential_ids() {
        let mock = MockAdapter::new(ResourceKind::DnsRecord);
        let first = mock.create(&AttributeRecord::new()).unwrap();
        let second = mock.create(&AttributeRecord::new()).unwrap();
        assert_eq!(first.get_str("id"), Some("dns-1"));
        assert_eq!(second.get_str("id"), Some("dns-2"));
    }

    #[test]
    fn test_mock_singleton_has_no_id() {
        let mock = MockAdapter::new(ResourceKind::Nameservers);
        let created = mock.create(&AttributeRecord::new().with("ns_records", "x")).unwrap();
        assert!(created.get("id").is_none());
        assert!(mock.get(None).is_ok());
    }

    #[test]
    fn test_mock_queued_failures_are_consumed_in_order() {
        let mock = MockAdapter::new(ResourceKind::DnsRecord);
        mock.fail_next_with(ErrorCode::Unavailable);

        let err = mock.get(Some("dns-1")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transient);

        let err = mock.get(Some("dns-1")).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(mock.calls().get, 2);
    }

    #[test]
    fn test_default_update_and_delete_are_unimplemented() {
        struct ReadOnly;
        impl RemoteAdapter for ReadOnly {
            fn kind(&self) -> ResourceKind {
                ResourceKind::Deployment
            }
            fn create(&self, _: &AttributeRecord) -> RemoteResult<AttributeRecord> {
                Err(RemoteError::unimplemented("create"))
            }
            fn get(&self, _: Option<&str>) -> RemoteResult<AttributeRecord> {
                Ok(AttributeRecord::new())
            }
        }

        let adapter = ReadOnly;
        assert_eq!(
            adapter.delete("x").unwrap_err().code,
            ErrorCode::Unimplemented
        );
        assert_eq!(
            adapter.update("x", &AttributeRecord::new()).unwrap_err().code,
            ErrorCode::Unimplemented
        );
    }
}

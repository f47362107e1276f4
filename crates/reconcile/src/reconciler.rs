//! The reconciler: one generic state machine for every resource kind.
//!
//! A [`Reconciler`] pairs a static [`ResourcePolicy`] with a
//! [`RemoteAdapter`] bound to the same kind, and drives the adapter through
//! Create, Read, Update, Delete and Import. Each call is synchronous and
//! self-contained: nothing is cached between calls and no retries happen
//! here. Contract violations are rejected before the adapter is touched.

use crate::adapter::RemoteAdapter;
use crate::compare::{field_equal, matches_desired, normalize_record};
use crate::error::{Error, ErrorCategory, ErrorContext, Result, Violation};
use crate::policy::{DeleteSemantics, ReadSemantics, ResourcePolicy, UpdateSemantics};
use crate::record::AttributeRecord;
use crate::types::Operation;

/// Result of a Read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The freshly observed record
    Present(AttributeRecord),
    /// The instance no longer exists remotely
    Absent,
}

impl ReadOutcome {
    pub fn into_record(self) -> Option<AttributeRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Generic reconciler for one resource kind
pub struct Reconciler<'a> {
    policy: &'static ResourcePolicy,
    adapter: &'a dyn RemoteAdapter,
}

impl<'a> Reconciler<'a> {
    pub fn new(policy: &'static ResourcePolicy, adapter: &'a dyn RemoteAdapter) -> Self {
        Self { policy, adapter }
    }

    pub fn policy(&self) -> &'static ResourcePolicy {
        self.policy
    }

    fn context(&self, operation: Operation, id: Option<&str>) -> ErrorContext {
        ErrorContext::new(self.policy.kind, operation, id)
    }

    fn reject(&self, operation: Operation, id: Option<&str>, violation: Violation) -> Error {
        log::debug!(
            "rejecting {operation} {} before any remote call: {violation}",
            self.policy.kind
        );
        Error::precondition(self.context(operation, id), violation)
    }

    fn check_adapter(&self, operation: Operation) -> Result<()> {
        let adapter = self.adapter.kind();
        if adapter != self.policy.kind {
            return Err(self.reject(
                operation,
                None,
                Violation::AdapterMismatch {
                    kind: self.policy.kind,
                    adapter,
                },
            ));
        }
        Ok(())
    }

    fn check_writable(&self, operation: Operation) -> Result<()> {
        self.check_adapter(operation)?;
        if self.policy.read_only {
            return Err(self.reject(operation, None, Violation::Unsupported(operation)));
        }
        Ok(())
    }

    /// Require the identifier in `prior` for kinds that have one.
    ///
    /// Returns `Ok(None)` for singleton kinds.
    fn require_identifier<'r>(
        &self,
        operation: Operation,
        prior: &'r AttributeRecord,
    ) -> Result<Option<&'r str>> {
        match self.policy.identifier_field {
            None => Ok(None),
            Some(field) => match prior.identifier(field) {
                Some(id) => Ok(Some(id)),
                None => Err(self.reject(operation, None, Violation::MissingIdentifier)),
            },
        }
    }

    /// Merge an adapter response into the payload it answered.
    ///
    /// For kinds with an identifier the merged record must carry one: a
    /// success the service cannot tie to an identifier leaves an unknown
    /// remote instance behind, which is never swallowed.
    fn merge_response(
        &self,
        operation: Operation,
        mut payload: AttributeRecord,
        response: AttributeRecord,
        known_id: Option<&str>,
    ) -> Result<AttributeRecord> {
        payload.merge(response);

        if let Some(field) = self.policy.identifier_field {
            match (payload.identifier(field).map(str::to_string), known_id) {
                (Some(reported), Some(known)) if reported != known => {
                    log::warn!(
                        "{} {known}: service reported identifier '{reported}', keeping '{known}'",
                        self.policy.kind
                    );
                    payload.insert(field, known);
                }
                (Some(_), _) => {}
                (None, Some(known)) => {
                    payload.insert(field, known);
                }
                (None, None) => {
                    return Err(Error::Fatal {
                        context: self.context(operation, None),
                        message: "the service accepted the request but did not report an \
                                  identifier; the remote instance may be orphaned and needs \
                                  manual cleanup"
                            .to_string(),
                        code: None,
                    });
                }
            }
        }

        Ok(payload)
    }

    /// Create a new instance from `desired`.
    pub fn create(&self, desired: &AttributeRecord) -> Result<AttributeRecord> {
        let op = Operation::Create;
        self.check_writable(op)?;

        if let Some(id) = self.policy.identifier_of(desired) {
            return Err(self.reject(op, Some(id), Violation::IdentifierAlreadySet(id.into())));
        }
        self.policy
            .validate_desired(desired)
            .map_err(|reason| self.reject(op, None, Violation::Invalid(reason)))?;

        log::debug!("creating {}", self.policy.kind);
        let response = self
            .adapter
            .create(desired)
            .map_err(|err| Error::from_remote(self.context(op, None), err))?;
        log::trace!("created {}", self.policy.kind);

        self.merge_response(op, desired.clone(), response, None)
    }

    /// Refresh `prior` from the remote service.
    ///
    /// [`ReadOutcome::Absent`] is the drift signal: the caller must treat the
    /// instance as destroyed and clear its persisted state.
    pub fn read(&self, prior: &AttributeRecord) -> Result<ReadOutcome> {
        let op = Operation::Read;
        self.check_adapter(op)?;
        let id = self.require_identifier(op, prior)?;

        if self.policy.read == ReadSemantics::Local {
            return Ok(ReadOutcome::Present(prior.clone()));
        }

        log::debug!("reading {}{}", self.policy.kind, fmt_id(id));
        let fresh = match self.adapter.get(id) {
            Ok(fresh) => fresh,
            Err(err) if err.category() == ErrorCategory::NotFound => {
                log::info!(
                    "{}{} no longer exists remotely",
                    self.policy.kind,
                    fmt_id(id)
                );
                return Ok(ReadOutcome::Absent);
            }
            Err(err) => return Err(Error::from_remote(self.context(op, id), err)),
        };
        log::trace!("read {}{}", self.policy.kind, fmt_id(id));

        // Fields the service does not echo back are kept from prior state
        let mut observed = prior.clone();
        observed.merge(fresh);
        if let (Some(field), Some(id)) = (self.policy.identifier_field, id) {
            observed.insert(field, id);
        }
        normalize_record(self.policy, &mut observed);

        Ok(ReadOutcome::Present(observed))
    }

    /// Move an existing instance from `prior` to `desired`.
    pub fn update(
        &self,
        prior: &AttributeRecord,
        desired: &AttributeRecord,
    ) -> Result<AttributeRecord> {
        let op = Operation::Update;
        self.check_writable(op)?;
        let id = self.require_identifier(op, prior)?;

        if let (Some(from), Some(to)) = (id, self.policy.identifier_of(desired))
            && from != to
        {
            return Err(self.reject(
                op,
                id,
                Violation::IdentifierChanged {
                    from: from.into(),
                    to: to.into(),
                },
            ));
        }

        for field in self.policy.immutable_fields {
            // A value the service never reported is adopted, not changed
            let Some(wanted) = desired.get(field).filter(|_| prior.has(field)) else {
                continue;
            };
            if !field_equal(self.policy.field_kind(field), prior.get(field), Some(wanted)) {
                return Err(self.reject(
                    op,
                    id,
                    Violation::ImmutableFieldChanged {
                        field: (*field).to_string(),
                    },
                ));
            }
        }

        let mut payload = desired.clone();
        if let Some(field) = self.policy.identifier_field {
            payload.remove(field);
        }
        self.policy
            .validate_desired(&payload)
            .map_err(|reason| self.reject(op, id, Violation::Invalid(reason)))?;

        match self.policy.update {
            UpdateSemantics::Remote => {
                let Some(id) = id else {
                    return Err(self.reject(op, None, Violation::Unsupported(op)));
                };
                log::debug!("updating {} '{id}'", self.policy.kind);
                let response = self
                    .adapter
                    .update(id, &payload)
                    .map_err(|err| Error::from_remote(self.context(op, Some(id)), err))?;
                log::trace!("updated {} '{id}'", self.policy.kind);
                self.merge_response(op, payload, response, Some(id))
            }
            UpdateSemantics::Reapply => {
                log::debug!("re-applying {}{}", self.policy.kind, fmt_id(id));
                let response = self
                    .adapter
                    .create(&payload)
                    .map_err(|err| Error::from_remote(self.context(op, id), err))?;
                log::trace!("re-applied {}{}", self.policy.kind, fmt_id(id));
                self.merge_response(op, payload, response, id)
            }
            UpdateSemantics::Unsupported => {
                if matches_desired(self.policy, prior, desired) {
                    Ok(prior.clone())
                } else {
                    Err(self.reject(op, id, Violation::Unsupported(op)))
                }
            }
        }
    }

    /// Destroy the instance described by `prior`.
    pub fn delete(&self, prior: &AttributeRecord) -> Result<()> {
        let op = Operation::Delete;
        self.check_writable(op)?;

        if self.policy.delete == DeleteSemantics::LocalNoop {
            log::debug!(
                "{} has no remote delete, dropping local state only",
                self.policy.kind
            );
            return Ok(());
        }

        let Some(id) = self.require_identifier(op, prior)? else {
            return Err(self.reject(op, None, Violation::Unsupported(op)));
        };

        log::debug!("deleting {} '{id}'", self.policy.kind);
        match self.adapter.delete(id) {
            Ok(()) => {
                log::trace!("deleted {} '{id}'", self.policy.kind);
                Ok(())
            }
            Err(err) if err.category() == ErrorCategory::NotFound => {
                log::debug!("{} '{id}' was already gone", self.policy.kind);
                Ok(())
            }
            Err(err) => Err(Error::from_remote(self.context(op, Some(id)), err)),
        }
    }

    /// Adopt an existing remote instance by its identifier.
    pub fn import(&self, external_id: &str) -> Result<AttributeRecord> {
        let op = Operation::Import;
        self.check_adapter(op)?;

        let field = match self.policy.identifier_field {
            Some(field) if self.policy.import_supported => field,
            _ => return Err(self.reject(op, Some(external_id), Violation::Unsupported(op))),
        };
        if external_id.is_empty() {
            return Err(self.reject(op, None, Violation::MissingIdentifier));
        }

        let stub = AttributeRecord::new().with(field, external_id);
        match self.read(&stub) {
            Ok(ReadOutcome::Present(record)) => Ok(record),
            Ok(ReadOutcome::Absent) => Err(Error::NotFound {
                context: self.context(op, Some(external_id)),
            }),
            Err(err) => Err(retag(err, op)),
        }
    }
}

fn fmt_id(id: Option<&str>) -> String {
    id.map(|id| format!(" '{id}'")).unwrap_or_default()
}

/// Report a failure of a delegated operation under the outer operation
fn retag(mut err: Error, op: Operation) -> Error {
    match &mut err {
        Error::PreconditionFailed { context, .. }
        | Error::NotFound { context }
        | Error::Transient { context, .. }
        | Error::Fatal { context, .. } => context.operation = op,
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::error::ErrorCode;
    use crate::policy::ResourceKind;
    use crate::record::Value;

    fn dns_desired() -> AttributeRecord {
        AttributeRecord::new()
            .with("name", "www")
            .with("zone_name", "example.com")
            .with("type", "CNAME")
            .with("values", Value::set(["target.example.com"]))
    }

    fn outputs_desired(vpc: &str) -> AttributeRecord {
        let mut record = AttributeRecord::new();
        for field in crate::policy::TERRAFORM_OUTPUT.fields {
            record.insert(field.name, format!("{}-value", field.name));
        }
        record.with("vpc_id", vpc)
    }

    fn reconciler(adapter: &MockAdapter) -> Reconciler<'_> {
        Reconciler::new(adapter.kind().policy(), adapter)
    }

    #[test]
    fn test_create_merges_identifier() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let observed = reconciler(&adapter).create(&dns_desired()).unwrap();

        assert_eq!(observed.get_str("id"), Some("dns-1"));
        assert_eq!(observed.get_str("name"), Some("www"));
        assert_eq!(adapter.calls().create, 1);
    }

    #[test]
    fn test_create_merges_server_computed_fields() {
        let adapter = MockAdapter::new(ResourceKind::MonitoringWriteToken);
        adapter.set_computed(AttributeRecord::new().with("token", "secret"));

        let observed = reconciler(&adapter).create(&AttributeRecord::new()).unwrap();
        assert_eq!(observed.get_str("token"), Some("secret"));
        assert_eq!(observed.get_str("id"), Some("tok-1"));
    }

    #[test]
    fn test_create_rejects_existing_identifier() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let err = reconciler(&adapter)
            .create(&dns_desired().with("id", "dns-9"))
            .unwrap_err();

        assert!(err.is_precondition());
        assert_eq!(
            err.violation(),
            Some(&Violation::IdentifierAlreadySet("dns-9".into()))
        );
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_create_rejects_invalid_record_locally() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let err = reconciler(&adapter)
            .create(&dns_desired().with("type", "MX"))
            .unwrap_err();

        assert!(matches!(err.violation(), Some(Violation::Invalid(_))));
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_create_without_reported_identifier_is_fatal() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        adapter.omit_identifier_on_create();

        let err = reconciler(&adapter).create(&dns_desired()).unwrap_err();
        assert!(matches!(err, Error::Fatal { .. }));
        assert!(err.to_string().contains("orphaned"));
    }

    #[test]
    fn test_create_not_found_is_fatal_and_transient_is_surfaced() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        adapter.fail_next_with(ErrorCode::NotFound);
        let err = reconciler(&adapter).create(&dns_desired()).unwrap_err();
        assert!(matches!(
            err,
            Error::Fatal {
                code: Some(ErrorCode::NotFound),
                ..
            }
        ));

        adapter.fail_next_with(ErrorCode::DeadlineExceeded);
        let err = reconciler(&adapter).create(&dns_desired()).unwrap_err();
        assert!(err.is_retryable());
        // One attempt per call: no internal retries
        assert_eq!(adapter.calls().create, 2);
    }

    #[test]
    fn test_read_normalizes_sets_and_keeps_unechoed_fields() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        adapter.insert(
            Some("dns-1"),
            AttributeRecord::new()
                .with("id", "dns-1")
                .with("values", Value::set(["c", "a", "b", "a"])),
        );
        let prior = dns_desired().with("id", "dns-1");

        let observed = reconciler(&adapter).read(&prior).unwrap().into_record().unwrap();
        assert_eq!(
            observed.get("values"),
            Some(&Value::set(["a", "b", "c"]))
        );
        assert_eq!(observed.get_str("zone_name"), Some("example.com"));
    }

    #[test]
    fn test_read_not_found_is_absent() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let outcome = reconciler(&adapter)
            .read(&dns_desired().with("id", "dns-1"))
            .unwrap();
        assert!(outcome.is_absent());
    }

    #[test]
    fn test_read_other_failures_are_classified() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let prior = dns_desired().with("id", "dns-1");

        adapter.fail_next_with(ErrorCode::Unavailable);
        assert!(reconciler(&adapter).read(&prior).unwrap_err().is_retryable());

        adapter.fail_next_with(ErrorCode::PermissionDenied);
        let err = reconciler(&adapter).read(&prior).unwrap_err();
        assert!(matches!(err, Error::Fatal { .. }));
        assert_eq!(err.context().id.as_deref(), Some("dns-1"));
    }

    #[test]
    fn test_read_requires_identifier() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let err = reconciler(&adapter).read(&dns_desired()).unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::MissingIdentifier));
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_read_singleton_needs_no_identifier() {
        let adapter = MockAdapter::new(ResourceKind::Deployment);
        adapter.insert(
            None,
            AttributeRecord::new()
                .with("id", "dep-1")
                .with("dns_zone_name", "example.com"),
        );

        let observed = reconciler(&adapter)
            .read(&AttributeRecord::new())
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(observed.get_str("dns_zone_name"), Some("example.com"));
    }

    #[test]
    fn test_read_local_kind_echoes_prior() {
        let adapter = MockAdapter::new(ResourceKind::MonitoringWriteToken);
        let prior = AttributeRecord::new()
            .with("id", "tok-1")
            .with("token", "secret");

        let outcome = reconciler(&adapter).read(&prior).unwrap();
        assert_eq!(outcome, ReadOutcome::Present(prior));
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_update_immutable_field_rejected_before_remote_call() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let prior = dns_desired().with("id", "dns-1");
        let desired = dns_desired().with("name", "api");

        let err = reconciler(&adapter).update(&prior, &desired).unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&Violation::ImmutableFieldChanged {
                field: "name".into()
            })
        );
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_update_adopts_unreported_immutable_field() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        adapter.insert(
            Some("dns-5"),
            AttributeRecord::new()
                .with("id", "dns-5")
                .with("values", Value::set(["target.example.com"])),
        );
        let r = reconciler(&adapter);
        let imported = r.import("dns-5").unwrap();
        assert!(imported.get("type").is_none());

        let observed = r.update(&imported, &dns_desired()).unwrap();
        assert_eq!(observed.get_str("type"), Some("CNAME"));
        assert_eq!(observed.get_str("id"), Some("dns-5"));
        assert_eq!(adapter.calls().update, 1);
    }

    #[test]
    fn test_update_immutable_token_rejected_before_remote_call() {
        let adapter = MockAdapter::new(ResourceKind::MonitoringWriteToken);
        let prior = AttributeRecord::new()
            .with("id", "tok-1")
            .with("token", "secret");
        let desired = AttributeRecord::new().with("token", "other");

        let err = reconciler(&adapter).update(&prior, &desired).unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(Violation::ImmutableFieldChanged { field }) if field == "token"
        ));
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_update_unsupported_noop_succeeds_without_call() {
        let adapter = MockAdapter::new(ResourceKind::MonitoringWriteToken);
        let prior = AttributeRecord::new()
            .with("id", "tok-1")
            .with("token", "secret");

        let observed = reconciler(&adapter)
            .update(&prior, &AttributeRecord::new())
            .unwrap();
        assert_eq!(observed, prior);
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_update_remote_sends_identifier_and_values() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let r = reconciler(&adapter);
        let prior = r.create(&dns_desired()).unwrap();

        let desired = dns_desired().with("values", Value::set(["other.example.com"]));
        let observed = r.update(&prior, &desired).unwrap();

        assert_eq!(observed.get_str("id"), Some("dns-1"));
        assert_eq!(
            observed.get("values"),
            Some(&Value::set(["other.example.com"]))
        );
        assert_eq!(adapter.calls().update, 1);
    }

    #[test]
    fn test_update_set_order_is_not_an_immutable_change() {
        let adapter = MockAdapter::new(ResourceKind::Nameservers);
        let r = reconciler(&adapter);
        let prior = AttributeRecord::new().with("ns_records", Value::set(["a", "b"]));
        let desired = AttributeRecord::new().with("ns_records", Value::set(["b", "a"]));

        assert!(r.update(&prior, &desired).is_ok());
    }

    #[test]
    fn test_update_reapply_is_idempotent() {
        let adapter = MockAdapter::new(ResourceKind::TerraformOutput);
        let r = reconciler(&adapter);
        let prior = r.create(&outputs_desired("vpc-1")).unwrap();
        let desired = outputs_desired("vpc-2");

        let first = r.update(&prior, &desired).unwrap();
        let second = r.update(&first, &desired).unwrap();

        assert_eq!(first, second);
        let calls = adapter.calls();
        assert_eq!(calls.create, 3);
        assert_eq!(calls.update, 0);
    }

    #[test]
    fn test_update_requires_identifier() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let err = reconciler(&adapter)
            .update(&dns_desired(), &dns_desired())
            .unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::MissingIdentifier));
    }

    #[test]
    fn test_update_rejects_identifier_change() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let prior = dns_desired().with("id", "dns-1");
        let err = reconciler(&adapter)
            .update(&prior, &dns_desired().with("id", "dns-2"))
            .unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(Violation::IdentifierChanged { .. })
        ));
    }

    #[test]
    fn test_delete_local_noop_makes_no_calls() {
        let adapter = MockAdapter::new(ResourceKind::TerraformOutput);
        reconciler(&adapter)
            .delete(&outputs_desired("vpc-1"))
            .unwrap();
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_delete_not_found_is_success() {
        let adapter = MockAdapter::new(ResourceKind::AwsAcmCertificate);
        let prior = AttributeRecord::new().with("id", "cert-7");
        reconciler(&adapter).delete(&prior).unwrap();
        assert_eq!(adapter.calls().delete, 1);
    }

    #[test]
    fn test_delete_failure_is_surfaced() {
        let adapter = MockAdapter::new(ResourceKind::AwsAcmCertificate);
        adapter.fail_next_with(ErrorCode::PermissionDenied);
        let err = reconciler(&adapter)
            .delete(&AttributeRecord::new().with("id", "cert-7"))
            .unwrap_err();
        assert!(matches!(err, Error::Fatal { .. }));
    }

    #[test]
    fn test_read_only_kind_rejects_writes() {
        let adapter = MockAdapter::new(ResourceKind::Deployment);
        let r = reconciler(&adapter);

        for err in [
            r.create(&AttributeRecord::new()).unwrap_err(),
            r.update(&AttributeRecord::new(), &AttributeRecord::new())
                .unwrap_err(),
            r.delete(&AttributeRecord::new()).unwrap_err(),
        ] {
            assert!(matches!(err.violation(), Some(Violation::Unsupported(_))));
        }
        assert_eq!(adapter.calls().total(), 0);
    }

    #[test]
    fn test_import_existing_instance() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        adapter.insert(Some("dns-5"), dns_desired().with("id", "dns-5"));

        let record = reconciler(&adapter).import("dns-5").unwrap();
        assert_eq!(record.get_str("name"), Some("www"));
        assert_eq!(record.get_str("id"), Some("dns-5"));
    }

    #[test]
    fn test_import_missing_instance_is_not_found() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let err = reconciler(&adapter).import("dns-5").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.context().operation, Operation::Import);
    }

    #[test]
    fn test_import_unsupported_kind() {
        let adapter = MockAdapter::new(ResourceKind::Nameservers);
        let err = reconciler(&adapter).import("x").unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&Violation::Unsupported(Operation::Import))
        );
    }

    #[test]
    fn test_adapter_kind_mismatch_rejected() {
        let adapter = MockAdapter::new(ResourceKind::Nameservers);
        let r = Reconciler::new(ResourceKind::DnsRecord.policy(), &adapter);
        let err = r.create(&dns_desired()).unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(Violation::AdapterMismatch { .. })
        ));
    }

    #[test]
    fn test_drift_then_recreate_gets_new_identifier() {
        let adapter = MockAdapter::new(ResourceKind::DnsRecord);
        let r = reconciler(&adapter);

        let observed = r.create(&dns_desired()).unwrap();
        assert_eq!(observed.get_str("id"), Some("dns-1"));

        let refreshed = r.read(&observed).unwrap().into_record().unwrap();
        assert_eq!(refreshed.get("values"), dns_desired().get("values"));

        adapter.forget(Some("dns-1"));
        assert!(r.read(&observed).unwrap().is_absent());

        // State cleared: a Read with no identifier is a contract violation
        let err = r.read(&dns_desired()).unwrap_err();
        assert!(err.is_precondition());

        let recreated = r.create(&dns_desired()).unwrap();
        assert_eq!(recreated.get_str("id"), Some("dns-2"));
    }
}

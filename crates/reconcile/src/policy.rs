//! Resource policies: the static, per-kind descriptors that customize the
//! reconciler.
//!
//! The table is fixed at compile time. Adding a kind means adding a
//! [`ResourceKind`] variant, a policy entry here and a remote adapter.

use crate::compare::FieldKind;
use crate::record::{AttributeRecord, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The resource kinds known to the configuration service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    DnsRecord,
    Nameservers,
    AwsAcmCertificate,
    MonitoringWriteToken,
    TerraformOutput,
    Deployment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::DnsRecord,
        ResourceKind::Nameservers,
        ResourceKind::AwsAcmCertificate,
        ResourceKind::MonitoringWriteToken,
        ResourceKind::TerraformOutput,
        ResourceKind::Deployment,
    ];

    /// Name used in manifests, state addresses and diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DnsRecord => "dns_record",
            Self::Nameservers => "nameservers",
            Self::AwsAcmCertificate => "aws_acm_certificate",
            Self::MonitoringWriteToken => "monitoring_write_token",
            Self::TerraformOutput => "terraform_output",
            Self::Deployment => "deployment",
        }
    }

    /// The policy entry for this kind
    pub fn policy(&self) -> &'static ResourcePolicy {
        match self {
            Self::DnsRecord => &DNS_RECORD,
            Self::Nameservers => &NAMESERVERS,
            Self::AwsAcmCertificate => &AWS_ACM_CERTIFICATE,
            Self::MonitoringWriteToken => &MONITORING_WRITE_TOKEN,
            Self::TerraformOutput => &TERRAFORM_OUTPUT,
            Self::Deployment => &DEPLOYMENT,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| format!("unknown resource kind '{s}'"))
    }
}

/// Who supplies a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present and non-empty in desired state
    Required,
    /// May be supplied by the author
    Optional,
    /// Assigned by the remote service; never authored
    Computed,
}

/// One field of a kind's attribute schema
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    /// Redacted in any user-facing output
    pub sensitive: bool,
}

impl FieldSpec {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
            presence: Presence::Required,
            sensitive: false,
        }
    }

    const fn required_set(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Set,
            presence: Presence::Required,
            sensitive: false,
        }
    }

    const fn computed(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
            presence: Presence::Computed,
            sensitive: false,
        }
    }

    const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// How Delete behaves for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSemantics {
    /// Call the adapter's delete; an already-absent instance counts as deleted
    RemoteCall,
    /// No remote deprovisioning exists; only local state is dropped
    LocalNoop,
}

/// How Update behaves for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSemantics {
    /// Call the adapter's update with the full desired record
    Remote,
    /// Re-send the create-equivalent payload; the service replaces the
    /// instance wholesale and the call is idempotent
    Reapply,
    /// No update path; only a no-op Update (desired equals prior) succeeds
    Unsupported,
}

/// How Read behaves for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSemantics {
    /// Call the adapter's get
    Remote,
    /// The service exposes no read; prior state is returned unchanged
    Local,
}

/// Per-kind descriptor consulted by the reconciler
#[derive(Debug)]
pub struct ResourcePolicy {
    pub kind: ResourceKind,
    /// Field holding the remote-assigned ID; `None` for singleton kinds
    pub identifier_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    /// Fields that Update may never change once the instance exists
    pub immutable_fields: &'static [&'static str],
    pub update: UpdateSemantics,
    pub delete: DeleteSemantics,
    pub read: ReadSemantics,
    pub import_supported: bool,
    /// Read-only kinds reject Create, Update and Delete
    pub read_only: bool,
    /// Kind-specific checks run after the generic schema checks
    pub validate: fn(&AttributeRecord) -> Result<(), String>,
}

impl ResourcePolicy {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Comparison kind for a field; unknown fields compare as scalars
    pub fn field_kind(&self, name: &str) -> FieldKind {
        self.field(name).map_or(FieldKind::Scalar, |f| f.kind)
    }

    pub fn is_computed(&self, name: &str) -> bool {
        self.field(name)
            .is_some_and(|f| f.presence == Presence::Computed)
    }

    pub fn is_immutable(&self, name: &str) -> bool {
        self.immutable_fields.contains(&name)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.sensitive)
    }

    /// Whether Update maps onto a real update call
    pub fn update_supported(&self) -> bool {
        self.update == UpdateSemantics::Remote
    }

    /// Kinds without an identifier exist at most once per deployment
    pub fn is_singleton(&self) -> bool {
        self.identifier_field.is_none()
    }

    /// The identifier carried by `record`, if the kind has one and it is set
    pub fn identifier_of<'r>(&self, record: &'r AttributeRecord) -> Option<&'r str> {
        self.identifier_field
            .and_then(|field| record.identifier(field))
    }

    /// Check an authored record against the field table and the kind's
    /// validator.
    ///
    /// The identifier is not checked here; callers decide what an identifier
    /// in desired state means for their operation.
    pub fn validate_desired(&self, desired: &AttributeRecord) -> Result<(), String> {
        for (name, value) in desired.iter() {
            if Some(name) == self.identifier_field {
                continue;
            }
            let spec = self
                .field(name)
                .ok_or_else(|| format!("unknown field '{name}' for {}", self.kind))?;
            if spec.presence == Presence::Computed {
                return Err(format!(
                    "field '{name}' is computed by the remote service and cannot be set"
                ));
            }
            let shape_ok = match spec.kind {
                FieldKind::Set => matches!(value, Value::Set(_)),
                FieldKind::Scalar => matches!(value, Value::String(_)),
            };
            if !shape_ok {
                return Err(format!(
                    "field '{name}' expects a {}",
                    match spec.kind {
                        FieldKind::Set => "set of strings",
                        FieldKind::Scalar => "string",
                    }
                ));
            }
        }

        for spec in self.fields {
            if spec.presence == Presence::Required && !desired.has(spec.name) {
                return Err(format!("required field '{}' is missing or empty", spec.name));
            }
        }

        (self.validate)(desired)
    }
}

// ============================================================================
// Validators
// ============================================================================

/// DNS record types accepted by the service
pub const DNS_RECORD_TYPES: [&str; 2] = ["TXT", "CNAME"];

fn no_extra_checks(_: &AttributeRecord) -> Result<(), String> {
    Ok(())
}

fn validate_dns_record(record: &AttributeRecord) -> Result<(), String> {
    if let Some(rr_type) = record.get_str("type")
        && !DNS_RECORD_TYPES.contains(&rr_type)
    {
        return Err(format!(
            "the DNS record type '{rr_type}' is invalid. Valid values are ['TXT', 'CNAME']"
        ));
    }
    Ok(())
}

// ============================================================================
// Policy table
// ============================================================================

pub static DNS_RECORD: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::DnsRecord,
    identifier_field: Some("id"),
    fields: &[
        FieldSpec::computed("id"),
        FieldSpec::required("name"),
        FieldSpec::required("zone_name"),
        FieldSpec::required("type"),
        FieldSpec::required_set("values"),
    ],
    // The update call only carries values
    immutable_fields: &["name", "zone_name", "type"],
    update: UpdateSemantics::Remote,
    delete: DeleteSemantics::RemoteCall,
    read: ReadSemantics::Remote,
    import_supported: true,
    read_only: false,
    validate: validate_dns_record,
};

pub static NAMESERVERS: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::Nameservers,
    identifier_field: None,
    fields: &[FieldSpec::required_set("ns_records")],
    immutable_fields: &[],
    update: UpdateSemantics::Reapply,
    // Deregistration is handled by an operator
    delete: DeleteSemantics::LocalNoop,
    read: ReadSemantics::Remote,
    import_supported: false,
    read_only: false,
    validate: no_extra_checks,
};

pub static AWS_ACM_CERTIFICATE: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::AwsAcmCertificate,
    identifier_field: Some("id"),
    fields: &[
        FieldSpec::computed("id"),
        FieldSpec::required("arn"),
        FieldSpec::required("domain_name"),
        FieldSpec::required("validation_cname_name"),
        FieldSpec::required("validation_cname_value"),
        FieldSpec::required("status"),
    ],
    immutable_fields: &[],
    update: UpdateSemantics::Remote,
    delete: DeleteSemantics::RemoteCall,
    read: ReadSemantics::Remote,
    import_supported: true,
    read_only: false,
    validate: no_extra_checks,
};

pub static MONITORING_WRITE_TOKEN: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::MonitoringWriteToken,
    identifier_field: Some("id"),
    fields: &[
        FieldSpec::computed("id"),
        FieldSpec::computed("token").sensitive(),
    ],
    immutable_fields: &["token"],
    update: UpdateSemantics::Unsupported,
    delete: DeleteSemantics::LocalNoop,
    read: ReadSemantics::Local,
    import_supported: false,
    read_only: false,
    validate: no_extra_checks,
};

pub static TERRAFORM_OUTPUT: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::TerraformOutput,
    identifier_field: None,
    fields: &[
        FieldSpec::required("saml_sso_acs_url"),
        FieldSpec::required("saml_sso_entity_id"),
        FieldSpec::required("cognito_user_pool_id"),
        FieldSpec::required("dns_cname_record_for_app_domain"),
        FieldSpec::required("dns_cname_record_for_auth_domain"),
        FieldSpec::required("web_client_id"),
        FieldSpec::required("cli_client_id"),
        FieldSpec::required("terraform_client_id"),
        FieldSpec::required("read_only_client_id"),
        FieldSpec::required("provisioner_client_id"),
        FieldSpec::required("vpc_id"),
    ],
    immutable_fields: &[],
    update: UpdateSemantics::Reapply,
    delete: DeleteSemantics::LocalNoop,
    read: ReadSemantics::Remote,
    import_supported: false,
    read_only: false,
    validate: no_extra_checks,
};

pub static DEPLOYMENT: ResourcePolicy = ResourcePolicy {
    kind: ResourceKind::Deployment,
    identifier_field: None,
    fields: &[
        FieldSpec::computed("id"),
        FieldSpec::computed("dns_zone_name"),
        FieldSpec::computed("default_subdomain"),
    ],
    immutable_fields: &[],
    update: UpdateSemantics::Unsupported,
    delete: DeleteSemantics::LocalNoop,
    read: ReadSemantics::Remote,
    import_supported: false,
    read_only: true,
    validate: no_extra_checks,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn dns(rr_type: &str) -> AttributeRecord {
        AttributeRecord::new()
            .with("name", "www")
            .with("zone_name", "example.com")
            .with("type", rr_type)
            .with("values", Value::set(["target.example.com"]))
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.type_name().parse::<ResourceKind>().unwrap(), kind);
            assert_eq!(kind.policy().kind, kind);
        }
        assert!("bogus".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_immutable_fields_are_declared_fields() {
        for kind in ResourceKind::ALL {
            let policy = kind.policy();
            for field in policy.immutable_fields {
                assert!(policy.field(field).is_some(), "{kind}.{field}");
            }
            if let Some(id) = policy.identifier_field {
                assert!(policy.is_computed(id), "{kind} identifier must be computed");
            }
        }
    }

    #[test]
    fn test_validate_dns_record() {
        assert!(DNS_RECORD.validate_desired(&dns("CNAME")).is_ok());
        assert!(DNS_RECORD.validate_desired(&dns("TXT")).is_ok());

        let err = DNS_RECORD.validate_desired(&dns("MX")).unwrap_err();
        assert!(err.contains("'MX' is invalid"));
    }

    #[test]
    fn test_validate_rejects_missing_required() {
        let record = dns("TXT").with("values", Value::set(Vec::<String>::new()));
        let err = DNS_RECORD.validate_desired(&record).unwrap_err();
        assert!(err.contains("values"));
    }

    #[test]
    fn test_validate_rejects_computed_and_unknown() {
        let err = MONITORING_WRITE_TOKEN
            .validate_desired(&AttributeRecord::new().with("token", "abc"))
            .unwrap_err();
        assert!(err.contains("computed"));

        let err = DNS_RECORD
            .validate_desired(&dns("TXT").with("ttl", "300"))
            .unwrap_err();
        assert!(err.contains("unknown field 'ttl'"));
    }

    #[test]
    fn test_validate_rejects_wrong_shape() {
        let record = dns("TXT").with("values", "target.example.com");
        let err = DNS_RECORD.validate_desired(&record).unwrap_err();
        assert!(err.contains("set of strings"));
    }

    #[test]
    fn test_singletons() {
        assert!(NAMESERVERS.is_singleton());
        assert!(TERRAFORM_OUTPUT.is_singleton());
        assert!(DEPLOYMENT.is_singleton());
        assert!(!DNS_RECORD.is_singleton());
    }
}

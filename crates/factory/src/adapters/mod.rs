//! One remote adapter per resource kind.
//!
//! Adapters translate between attribute records and the service's wire
//! messages. They do no validation of their own; the reconciler has already
//! checked the record against the kind's policy.

mod certificate;
mod deployment;
mod dns_record;
mod nameservers;
mod outputs;
mod write_token;

pub use certificate::AwsAcmCertificateAdapter;
pub use deployment::DeploymentAdapter;
pub use dns_record::DnsRecordAdapter;
pub use nameservers::NameserversAdapter;
pub use outputs::TerraformOutputAdapter;
pub use write_token::WriteTokenAdapter;

use crate::client::FactoryClient;
use reconcile::{AttributeRecord, RemoteAdapter, ResourceKind, Value};
use std::sync::Arc;

/// The full adapter set, sharing one client
pub struct Adapters {
    dns_record: DnsRecordAdapter,
    nameservers: NameserversAdapter,
    certificate: AwsAcmCertificateAdapter,
    write_token: WriteTokenAdapter,
    outputs: TerraformOutputAdapter,
    deployment: DeploymentAdapter,
}

impl Adapters {
    pub fn new(client: FactoryClient) -> Self {
        let client = Arc::new(client);
        Self {
            dns_record: DnsRecordAdapter::new(Arc::clone(&client)),
            nameservers: NameserversAdapter::new(Arc::clone(&client)),
            certificate: AwsAcmCertificateAdapter::new(Arc::clone(&client)),
            write_token: WriteTokenAdapter::new(Arc::clone(&client)),
            outputs: TerraformOutputAdapter::new(Arc::clone(&client)),
            deployment: DeploymentAdapter::new(client),
        }
    }

    /// The adapter serving `kind`
    pub fn adapter(&self, kind: ResourceKind) -> &dyn RemoteAdapter {
        match kind {
            ResourceKind::DnsRecord => &self.dns_record,
            ResourceKind::Nameservers => &self.nameservers,
            ResourceKind::AwsAcmCertificate => &self.certificate,
            ResourceKind::MonitoringWriteToken => &self.write_token,
            ResourceKind::TerraformOutput => &self.outputs,
            ResourceKind::Deployment => &self.deployment,
        }
    }
}

// ============================================================================
// Record helpers
// ============================================================================

/// Scalar field as sent on the wire; absent fields are sent empty
fn text(record: &AttributeRecord, field: &str) -> String {
    record.get_str(field).unwrap_or_default().to_string()
}

fn strings(record: &AttributeRecord, field: &str) -> Vec<String> {
    record.get_set(field).map(<[String]>::to_vec).unwrap_or_default()
}

/// Copy a scalar the service may leave unset, skipping proto3 defaults.
///
/// Only for identifiers and fields the service does not always echo; fields
/// it always reports are inserted as-is so a cleared value reads as drift.
fn put(record: &mut AttributeRecord, field: &str, value: String) {
    if !value.is_empty() {
        record.insert(field, value);
    }
}

fn put_set(record: &mut AttributeRecord, field: &str, values: Vec<String>) {
    record.insert(field, Value::Set(values));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;

    #[test]
    fn test_adapter_set_covers_every_kind() {
        let client = FactoryClient::new(ClientConfig::new("key", "prod")).unwrap();
        let adapters = Adapters::new(client);
        for kind in ResourceKind::ALL {
            assert_eq!(adapters.adapter(kind).kind(), kind);
        }
    }

    #[test]
    fn test_put_skips_empty_values() {
        let mut record = AttributeRecord::new();
        put(&mut record, "id", String::new());
        put(&mut record, "name", "www".into());
        assert!(record.get("id").is_none());
        assert_eq!(record.get_str("name"), Some("www"));
    }
}

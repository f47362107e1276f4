use super::deployment::get_deployment;
use super::{put_set, strings};
use crate::client::{DEPLOYMENT_SERVICE, FactoryClient};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Nameservers delegated to the deployment's zone.
///
/// Registration replaces the whole set, so create doubles as update. The
/// registered set is read back from the deployment itself.
pub struct NameserversAdapter {
    client: Arc<FactoryClient>,
}

impl NameserversAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct RegisterNameserversRequest {
    nameservers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Empty {}

impl RemoteAdapter for NameserversAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Nameservers
    }

    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let nameservers = strings(record, "ns_records");
        let _: Empty = self.client.call(
            DEPLOYMENT_SERVICE,
            "RegisterNameservers",
            &RegisterNameserversRequest {
                nameservers: nameservers.clone(),
            },
        )?;

        let mut registered = AttributeRecord::new();
        put_set(&mut registered, "ns_records", nameservers);
        Ok(registered)
    }

    fn get(&self, _: Option<&str>) -> RemoteResult<AttributeRecord> {
        let deployment = get_deployment(&self.client)?;
        let mut record = AttributeRecord::new();
        put_set(&mut record, "ns_records", deployment.nameservers);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_wire_form() {
        let request = RegisterNameserversRequest {
            nameservers: vec!["ns-1.example.net".into(), "ns-2.example.net".into()],
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"nameservers":["ns-1.example.net","ns-2.example.net"]}"#
        );
    }
}

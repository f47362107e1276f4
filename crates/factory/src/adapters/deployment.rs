use super::put;
use crate::client::{DEPLOYMENT_SERVICE, FactoryClient};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteError, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Read-only metadata of the deployment the licence key belongs to
pub struct DeploymentAdapter {
    client: Arc<FactoryClient>,
}

impl DeploymentAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct Deployment {
    pub id: String,
    pub dns_zone_name: String,
    pub default_subdomain: String,
    pub nameservers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GetDeploymentRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetDeploymentResponse {
    deployment: Deployment,
}

/// Fetch the deployment; shared with the nameserver adapter
pub(super) fn get_deployment(client: &FactoryClient) -> RemoteResult<Deployment> {
    let response: GetDeploymentResponse =
        client.call(DEPLOYMENT_SERVICE, "GetDeployment", &GetDeploymentRequest {})?;
    Ok(response.deployment)
}

impl RemoteAdapter for DeploymentAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    fn create(&self, _: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        Err(RemoteError::unimplemented("create deployment"))
    }

    fn get(&self, _: Option<&str>) -> RemoteResult<AttributeRecord> {
        let deployment = get_deployment(&self.client)?;
        let mut record = AttributeRecord::new();
        put(&mut record, "id", deployment.id);
        put(&mut record, "dns_zone_name", deployment.dns_zone_name);
        put(&mut record, "default_subdomain", deployment.default_subdomain);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_wire_form() {
        let response: GetDeploymentResponse = serde_json::from_str(
            r#"{"deployment":{"id":"dep_123","dnsZoneName":"acme.commonfate.app","defaultSubdomain":"acme","nameservers":["ns-1.awsdns.com"]}}"#,
        )
        .unwrap();
        assert_eq!(response.deployment.dns_zone_name, "acme.commonfate.app");
        assert_eq!(response.deployment.nameservers, vec!["ns-1.awsdns.com"]);

        assert_eq!(serde_json::to_string(&GetDeploymentRequest {}).unwrap(), "{}");
    }
}

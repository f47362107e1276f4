use super::text;
use crate::client::{DEPLOYMENT_SERVICE, FactoryClient};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Terraform outputs of the deployment's infrastructure stack.
///
/// The service keeps one output bundle per deployment and overwrites it on
/// every set.
pub struct TerraformOutputAdapter {
    client: Arc<FactoryClient>,
}

impl TerraformOutputAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TerraformOutput {
    saml_sso_acs_url: String,
    saml_sso_entity_id: String,
    cognito_user_pool_id: String,
    dns_cname_record_for_app_domain: String,
    dns_cname_record_for_auth_domain: String,
    web_client_id: String,
    cli_client_id: String,
    terraform_client_id: String,
    read_only_client_id: String,
    provisioner_client_id: String,
    vpc_id: String,
}

impl TerraformOutput {
    fn from_record(record: &AttributeRecord) -> Self {
        Self {
            saml_sso_acs_url: text(record, "saml_sso_acs_url"),
            saml_sso_entity_id: text(record, "saml_sso_entity_id"),
            cognito_user_pool_id: text(record, "cognito_user_pool_id"),
            dns_cname_record_for_app_domain: text(record, "dns_cname_record_for_app_domain"),
            dns_cname_record_for_auth_domain: text(record, "dns_cname_record_for_auth_domain"),
            web_client_id: text(record, "web_client_id"),
            cli_client_id: text(record, "cli_client_id"),
            terraform_client_id: text(record, "terraform_client_id"),
            read_only_client_id: text(record, "read_only_client_id"),
            provisioner_client_id: text(record, "provisioner_client_id"),
            vpc_id: text(record, "vpc_id"),
        }
    }

    /// Every output is reported, so an empty one overwrites prior state
    fn into_record(self) -> AttributeRecord {
        AttributeRecord::new()
            .with("saml_sso_acs_url", self.saml_sso_acs_url)
            .with("saml_sso_entity_id", self.saml_sso_entity_id)
            .with("cognito_user_pool_id", self.cognito_user_pool_id)
            .with("dns_cname_record_for_app_domain", self.dns_cname_record_for_app_domain)
            .with("dns_cname_record_for_auth_domain", self.dns_cname_record_for_auth_domain)
            .with("web_client_id", self.web_client_id)
            .with("cli_client_id", self.cli_client_id)
            .with("terraform_client_id", self.terraform_client_id)
            .with("read_only_client_id", self.read_only_client_id)
            .with("provisioner_client_id", self.provisioner_client_id)
            .with("vpc_id", self.vpc_id)
    }
}

#[derive(Debug, Serialize)]
struct SetTerraformOutputRequest {
    output: TerraformOutput,
}

#[derive(Debug, Serialize)]
struct GetTerraformOutputRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetTerraformOutputResponse {
    output: TerraformOutput,
}

#[derive(Debug, Default, Deserialize)]
struct Empty {}

impl RemoteAdapter for TerraformOutputAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::TerraformOutput
    }

    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let request = SetTerraformOutputRequest {
            output: TerraformOutput::from_record(record),
        };
        let _: Empty = self
            .client
            .call(DEPLOYMENT_SERVICE, "SetTerraformOutput", &request)?;
        Ok(request.output.into_record())
    }

    fn get(&self, _: Option<&str>) -> RemoteResult<AttributeRecord> {
        let response: GetTerraformOutputResponse = self.client.call(
            DEPLOYMENT_SERVICE,
            "GetTerraformOutput",
            &GetTerraformOutputRequest {},
        )?;
        Ok(response.output.into_record())
    }
}

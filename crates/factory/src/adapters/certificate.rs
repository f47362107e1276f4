use super::{put, text};
use crate::client::{DEPLOYMENT_SERVICE, FactoryClient};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// ACM certificates registered against the deployment
pub struct AwsAcmCertificateAdapter {
    client: Arc<FactoryClient>,
}

impl AwsAcmCertificateAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AwsAcmCertificate {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    arn: String,
    domain_name: String,
    validation_cname_name: String,
    validation_cname_value: String,
    status: String,
}

impl AwsAcmCertificate {
    fn from_record(id: Option<&str>, record: &AttributeRecord) -> Self {
        Self {
            id: id.unwrap_or_default().to_string(),
            arn: text(record, "arn"),
            domain_name: text(record, "domain_name"),
            validation_cname_name: text(record, "validation_cname_name"),
            validation_cname_value: text(record, "validation_cname_value"),
            status: text(record, "status"),
        }
    }

    /// The full record as reported by a read; empty fields are kept
    fn into_record(self) -> AttributeRecord {
        let mut record = self.identity();
        record.insert("arn", self.arn);
        record.insert("domain_name", self.domain_name);
        record.insert("validation_cname_name", self.validation_cname_name);
        record.insert("validation_cname_value", self.validation_cname_value);
        record.insert("status", self.status);
        record
    }

    // Register and update only confirm the identifier
    fn identity(&self) -> AttributeRecord {
        let mut record = AttributeRecord::new();
        put(&mut record, "id", self.id.clone());
        record
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CertificateResponse {
    certificate: AwsAcmCertificate,
}

#[derive(Debug, Serialize)]
struct UpdateCertificateRequest {
    certificate: AwsAcmCertificate,
}

#[derive(Debug, Serialize)]
struct CertificateId<'a> {
    id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct Empty {}

impl RemoteAdapter for AwsAcmCertificateAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AwsAcmCertificate
    }

    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let response: CertificateResponse = self.client.call(
            DEPLOYMENT_SERVICE,
            "RegisterAWSACMCertificate",
            &AwsAcmCertificate::from_record(None, record),
        )?;
        Ok(response.certificate.identity())
    }

    fn get(&self, id: Option<&str>) -> RemoteResult<AttributeRecord> {
        let request = CertificateId {
            id: id.unwrap_or_default(),
        };
        let response: CertificateResponse =
            self.client.call(DEPLOYMENT_SERVICE, "GetAWSACMCertificate", &request)?;
        Ok(response.certificate.into_record())
    }

    fn update(&self, id: &str, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let request = UpdateCertificateRequest {
            certificate: AwsAcmCertificate::from_record(Some(id), record),
        };
        let response: CertificateResponse =
            self.client.call(DEPLOYMENT_SERVICE, "UpdateAWSACMCertificate", &request)?;
        Ok(response.certificate.identity())
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        let _: Empty = self.client.call(
            DEPLOYMENT_SERVICE,
            "DeregisterAWSACMCertificate",
            &CertificateId { id },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate() -> AttributeRecord {
        AttributeRecord::new()
            .with("arn", "arn:aws:acm:us-east-1:123456789012:certificate/abc")
            .with("domain_name", "app.example.com")
            .with("validation_cname_name", "_x.app.example.com")
            .with("validation_cname_value", "_y.acm-validations.aws")
            .with("status", "PENDING_VALIDATION")
    }

    #[test]
    fn test_register_request_has_no_id() {
        let certificate = AwsAcmCertificate::from_record(None, &certificate());
        let json = serde_json::to_value(certificate).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["domainName"], "app.example.com");
        assert_eq!(json["validationCnameValue"], "_y.acm-validations.aws");
    }

    #[test]
    fn test_update_request_wraps_certificate() {
        let request = UpdateCertificateRequest {
            certificate: AwsAcmCertificate::from_record(Some("cert-1"), &certificate()),
        };
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["certificate"]["id"], "cert-1");
        assert_eq!(json["certificate"]["status"], "PENDING_VALIDATION");
    }

    #[test]
    fn test_response_round_trips_fields() {
        let response: CertificateResponse = serde_json::from_str(
            r#"{"certificate":{"id":"cert-1","arn":"arn:x","domainName":"app.example.com","status":"ISSUED"}}"#,
        )
        .unwrap();
        let record = response.certificate.into_record();
        assert_eq!(record.get_str("id"), Some("cert-1"));
        assert_eq!(record.get_str("domain_name"), Some("app.example.com"));
        assert_eq!(record.get_str("status"), Some("ISSUED"));
        // Cleared remotely: reported empty so the prior value does not survive
        assert_eq!(record.get_str("validation_cname_name"), Some(""));
    }

    #[test]
    fn test_register_response_keeps_only_identifier() {
        let response: CertificateResponse =
            serde_json::from_str(r#"{"certificate":{"id":"cert-1","status":""}}"#).unwrap();
        let record = response.certificate.identity();
        assert_eq!(record, AttributeRecord::new().with("id", "cert-1"));
    }
}

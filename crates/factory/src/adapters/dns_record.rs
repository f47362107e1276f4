use super::{put, put_set, strings, text};
use crate::client::{DEPLOYMENT_SERVICE, FactoryClient};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const TYPE_PREFIX: &str = "DNS_RECORD_TYPE_";

/// DNS records in the deployment's zone
pub struct DnsRecordAdapter {
    client: Arc<FactoryClient>,
}

impl DnsRecordAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DnsRecord {
    id: String,
    name: String,
    dns_zone_name: String,
    #[serde(rename = "type")]
    rr_type: String,
    values: Vec<String>,
}

impl DnsRecord {
    fn into_record(self) -> AttributeRecord {
        let mut record = AttributeRecord::new();
        put(&mut record, "id", self.id);
        put(&mut record, "name", self.name);
        put(&mut record, "zone_name", self.dns_zone_name);
        // Unset types stay out of the record; an update adopts the desired one
        if let Some(rr_type) = self.rr_type.strip_prefix(TYPE_PREFIX)
            && rr_type != "UNSPECIFIED"
        {
            put(&mut record, "type", rr_type.to_string());
        }
        put_set(&mut record, "values", self.values);
        record
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDnsRecordRequest {
    name: String,
    dns_zone_name: String,
    #[serde(rename = "type")]
    rr_type: String,
    values: Vec<String>,
}

impl CreateDnsRecordRequest {
    fn from_record(record: &AttributeRecord) -> Self {
        Self {
            name: text(record, "name"),
            dns_zone_name: text(record, "zone_name"),
            rr_type: format!("{TYPE_PREFIX}{}", text(record, "type")),
            values: strings(record, "values"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateDnsRecordResponse {
    created: DnsRecord,
}

#[derive(Debug, Serialize)]
struct GetDnsRecordRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetDnsRecordResponse {
    record: DnsRecord,
}

#[derive(Debug, Serialize)]
struct UpdateDnsRecordRequest<'a> {
    id: &'a str,
    values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateDnsRecordResponse {
    updated: DnsRecord,
}

#[derive(Debug, Serialize)]
struct DeleteDnsRecordRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct Empty {}

impl RemoteAdapter for DnsRecordAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DnsRecord
    }

    fn create(&self, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let response: CreateDnsRecordResponse = self.client.call(
            DEPLOYMENT_SERVICE,
            "CreateDNSRecord",
            &CreateDnsRecordRequest::from_record(record),
        )?;
        Ok(response.created.into_record())
    }

    fn get(&self, id: Option<&str>) -> RemoteResult<AttributeRecord> {
        let id = id.unwrap_or_default();
        let request = GetDnsRecordRequest { id };
        let response: GetDnsRecordResponse =
            self.client.call(DEPLOYMENT_SERVICE, "GetDNSRecord", &request)?;
        Ok(response.record.into_record())
    }

    // Only the values travel; name, zone and type are immutable
    fn update(&self, id: &str, record: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let request = UpdateDnsRecordRequest {
            id,
            values: strings(record, "values"),
        };
        let response: UpdateDnsRecordResponse =
            self.client.call(DEPLOYMENT_SERVICE, "UpdateDNSRecord", &request)?;
        Ok(response.updated.into_record())
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        let request = DeleteDnsRecordRequest { id };
        let _: Empty = self.client.call(DEPLOYMENT_SERVICE, "DeleteDNSRecord", &request)?;
        Ok(())
    }
}

use super::put;
use crate::client::{FactoryClient, TOKEN_SERVICE};
use reconcile::{AttributeRecord, RemoteAdapter, RemoteError, RemoteResult, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Monitoring write tokens.
///
/// The token service only mints tokens: there is no get or revoke call.
pub struct WriteTokenAdapter {
    client: Arc<FactoryClient>,
}

impl WriteTokenAdapter {
    pub fn new(client: Arc<FactoryClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct CreateWriteTokenRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CreateWriteTokenResponse {
    id: String,
    write_token: String,
}

impl CreateWriteTokenResponse {
    fn into_record(self) -> AttributeRecord {
        let mut record = AttributeRecord::new();
        put(&mut record, "id", self.id);
        put(&mut record, "token", self.write_token);
        record
    }
}

impl RemoteAdapter for WriteTokenAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::MonitoringWriteToken
    }

    fn create(&self, _: &AttributeRecord) -> RemoteResult<AttributeRecord> {
        let response: CreateWriteTokenResponse =
            self.client
                .call(TOKEN_SERVICE, "CreateWriteToken", &CreateWriteTokenRequest {})?;
        Ok(response.into_record())
    }

    fn get(&self, _: Option<&str>) -> RemoteResult<AttributeRecord> {
        Err(RemoteError::unimplemented("get write token"))
    }
}

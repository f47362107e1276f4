//! Connect JSON RPC client for the configuration service.
//!
//! Every RPC is an HTTP POST to `{base_url}/{service}/{method}` with a JSON
//! body. Failures come back as a JSON body with a Connect `code` and
//! `message`; both are mapped onto a [`RemoteError`] so the reconciler can
//! classify them.

use reconcile::{ErrorCode, RemoteError, RemoteResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default service endpoint
pub const DEFAULT_BASE_URL: &str = "https://factory.commonfate.io";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment service RPC namespace
pub const DEPLOYMENT_SERVICE: &str = "commonfate.factory.deployment.v1alpha1.DeploymentService";

/// Monitoring token service RPC namespace
pub const TOKEN_SERVICE: &str = "commonfate.factory.monitoring.v1alpha1.TokenService";

const USER_AGENT: &str = concat!("deploymeta/", env!("CARGO_PKG_VERSION"));

/// Invalid client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("licence key is not set")]
    MissingLicenceKey,

    #[error("deployment name is not set")]
    MissingDeploymentName,

    #[error("base URL '{0}' must start with http:// or https://")]
    InvalidBaseUrl(String),
}

/// Connection settings, constructed by the caller and handed to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub licence_key: String,
    pub deployment_name: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(licence_key: impl Into<String>, deployment_name: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            licence_key: licence_key.into(),
            deployment_name: deployment_name.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.licence_key.trim().is_empty() {
            return Err(ConfigError::MissingLicenceKey);
        }
        if self.deployment_name.trim().is_empty() {
            return Err(ConfigError::MissingDeploymentName);
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }

    /// URL of one RPC
    pub fn rpc_url(&self, service: &str, method: &str) -> String {
        format!("{}/{service}/{method}", self.base_url.trim_end_matches('/'))
    }
}

/// Blocking client shared by all adapters
pub struct FactoryClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl FactoryClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        // Non-2xx responses carry a Connect error body we need to read
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .into();

        Ok(Self { agent, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Invoke one unary RPC.
    pub fn call<Req, Resp>(&self, service: &str, method: &str, request: &Req) -> RemoteResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = self.config.rpc_url(service, method);
        log::debug!("POST {url}");

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.licence_key))
            .header("X-Deployment-Name", &self.config.deployment_name)
            .header("Connect-Protocol-Version", "1")
            .header("User-Agent", USER_AGENT)
            .send_json(request)
            .map_err(|e| transport_error(&e))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(&e))?;
        log::trace!("{method} returned HTTP {status}");

        if !(200..300).contains(&status) {
            let err = decode_error(status, &body);
            log::debug!("{method} failed: {err}");
            return Err(err);
        }

        decode_body(method, &body)
    }
}

/// Map a transport failure onto a Connect code
fn transport_error(err: &ureq::Error) -> RemoteError {
    let code = match err {
        ureq::Error::Timeout(_) => ErrorCode::DeadlineExceeded,
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            ErrorCode::Unavailable
        }
        ureq::Error::StatusCode(status) => ErrorCode::from_http_status(*status),
        _ => ErrorCode::Unknown,
    };
    RemoteError::new(code, err.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Decode a Connect error body, falling back to the HTTP status
pub(crate) fn decode_error(status: u16, body: &str) -> RemoteError {
    let parsed: ConnectErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed
        .code
        .as_deref()
        .and_then(|code| code.parse::<ErrorCode>().ok())
        .unwrap_or_else(|| ErrorCode::from_http_status(status));

    let message = match parsed.message {
        Some(message) if !message.is_empty() => message,
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    };

    RemoteError::new(code, message)
}

/// Decode a success body; an empty body is an empty message
pub(crate) fn decode_body<Resp: DeserializeOwned>(method: &str, body: &str) -> RemoteResult<Resp> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| {
        RemoteError::new(
            ErrorCode::Internal,
            format!("invalid {method} response: {e}"),
        )
    })
}

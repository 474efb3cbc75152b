//! Reqwest-backed directory gateway.
//!
//! Owns transport details only: request serialization, timeout and HTTP error
//! mapping, and JSON decoding into directory snapshots.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use roster_core::config::GraphqlConfig;
use roster_core::{DirectoryGateway, DirectorySnapshot, FetchError, UserType};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

use crate::dto::{decode_snapshot, GraphqlRequest, GraphqlResponse};

const DEFAULT_USER_AGENT: &str = concat!("roster/", env!("CARGO_PKG_VERSION"));
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum GatewayBuildError {
    #[error("invalid graphql endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("invalid api key header: {0}")]
    InvalidHeader(String),
    #[error("http client could not be built: {0}")]
    Client(#[from] reqwest::Error),
}

struct ApiKey {
    header: HeaderName,
    value: SecretString,
}

/// Directory gateway that POSTs the customer query to one GraphQL endpoint.
pub struct GraphqlDirectoryGateway {
    client: Client,
    endpoint: Url,
    api_key: Option<ApiKey>,
}

impl GraphqlDirectoryGateway {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, GatewayBuildError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint, api_key: None })
    }

    pub fn with_api_key(
        mut self,
        header: &str,
        value: SecretString,
    ) -> Result<Self, GatewayBuildError> {
        let header = HeaderName::from_bytes(header.trim().as_bytes())
            .map_err(|error| GatewayBuildError::InvalidHeader(error.to_string()))?;
        HeaderValue::from_str(value.expose_secret())
            .map_err(|error| GatewayBuildError::InvalidHeader(error.to_string()))?;
        self.api_key = Some(ApiKey { header, value });
        Ok(self)
    }

    pub fn from_config(config: &GraphqlConfig) -> Result<Self, GatewayBuildError> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|error| {
            GatewayBuildError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: error.to_string(),
            }
        })?;
        let gateway = Self::new(endpoint, Duration::from_secs(config.timeout_secs))?;

        match &config.api_key {
            Some(key) => gateway.with_api_key(&config.api_key_header, key.clone()),
            None => Ok(gateway),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn api_key_header(&self) -> Option<(HeaderName, HeaderValue)> {
        let api_key = self.api_key.as_ref()?;
        let mut value = HeaderValue::from_str(api_key.value.expose_secret()).ok()?;
        value.set_sensitive(true);
        Some((api_key.header.clone(), value))
    }
}

#[async_trait]
impl DirectoryGateway for GraphqlDirectoryGateway {
    async fn list_customers(&self, role: UserType) -> Result<DirectorySnapshot, FetchError> {
        debug!(
            event_name = "graphql.request.sent",
            endpoint = %self.endpoint,
            role = role.query_variable(),
            "requesting customer directory"
        );

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .header(ACCEPT, "application/json")
            .json(&GraphqlRequest::list_customers(role));
        if let Some((name, value)) = self.api_key_header() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;

        debug!(
            event_name = "graphql.response.received",
            status = status.as_u16(),
            bytes = body.len(),
            "customer directory response received"
        );

        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        decode_snapshot(role, body.as_ref())
    }
}

fn map_transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(format!("directory request timed out: {error}"))
    } else {
        FetchError::transport(format!("directory request failed: {error}"))
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> FetchError {
    // GraphQL servers commonly answer validation failures with 400 + `errors`.
    if let Ok(decoded) = serde_json::from_slice::<GraphqlResponse>(body) {
        if let Some(messages) = decoded.error_messages() {
            return FetchError::graphql(messages);
        }
    }

    let preview: String =
        String::from_utf8_lossy(body).chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    let message = if preview.trim().is_empty() {
        format!("directory endpoint returned HTTP {status}")
    } else {
        format!("directory endpoint returned HTTP {status}: {}", preview.trim())
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FetchError::timeout(message),
        _ => FetchError::status(message),
    }
}

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::GateConfig;
use crate::errors::{ApiError, TransportError};
use crate::models::CreateDocumentRequest;

/// Performs the actual document creation call once admission is granted.
///
/// Returns the raw HTTP status; classifying it is up to the caller.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    async fn send_document(
        &self,
        request: &CreateDocumentRequest,
    ) -> Result<u16, TransportError>;
}

/// reqwest-backed transport. Holds one long-lived client so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ApiError::InvalidArgument(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self, ApiError> {
        Self::new(config.endpoint.clone(), config.request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentTransport for HttpTransport {
    async fn send_document(
        &self,
        request: &CreateDocumentRequest,
    ) -> Result<u16, TransportError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

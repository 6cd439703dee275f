use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GateConfig;
use crate::errors::{ApiError, TransportError};
use crate::models::CreateDocumentRequest;
use crate::rate_limiter::RateLimiter;
use crate::transport::{DocumentTransport, HttpTransport};

/// Rate-limited client for the document creation endpoint.
///
/// Every `submit` first waits for admission from the shared [`RateLimiter`],
/// then calls the transport with the limiter lock already released. Tokens
/// spent on failed calls are not refunded.
pub struct DocumentApi<T = HttpTransport> {
    rate_limiter: Arc<RateLimiter>,
    transport: T,
}

impl DocumentApi<HttpTransport> {
    pub fn from_config(config: &GateConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = HttpTransport::from_config(config)?;
        Self::new(config.window, config.capacity, transport)
    }
}

impl<T: DocumentTransport> DocumentApi<T> {
    pub fn new(window: Duration, capacity: u32, transport: T) -> Result<Self, ApiError> {
        let rate_limiter = Arc::new(RateLimiter::new(window, capacity)?);
        Ok(Self::with_rate_limiter(rate_limiter, transport))
    }

    /// Shares an existing limiter, e.g. between several transports for the same endpoint.
    pub fn with_rate_limiter(rate_limiter: Arc<RateLimiter>, transport: T) -> Self {
        Self {
            rate_limiter,
            transport,
        }
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submits `document` once the rate limit admits it.
    pub async fn submit<D: Serialize + ?Sized>(
        &self,
        document: &D,
        signature: &str,
    ) -> Result<(), ApiError> {
        let request = CreateDocumentRequest::new(document, signature)?;
        self.rate_limiter.acquire().await;
        self.send(&request).await
    }

    /// Like [`submit`](Self::submit), but fails with [`ApiError::Interrupted`]
    /// if `cancel` fires while waiting for admission.
    pub async fn submit_with_cancel<D: Serialize + ?Sized>(
        &self,
        document: &D,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let request = CreateDocumentRequest::new(document, signature)?;
        self.rate_limiter.acquire_with_cancel(cancel).await?;
        self.send(&request).await
    }

    async fn send(&self, request: &CreateDocumentRequest) -> Result<(), ApiError> {
        let submission_id = Uuid::new_v4();
        info!("Submitting document: {}", submission_id);

        match self.transport.send_document(request).await {
            Ok(status) if status >= 400 => {
                warn!("Document {} rejected with status {}", submission_id, status);
                Err(TransportError::Status(status).into())
            }
            Ok(status) => {
                info!("Document {} accepted with status {}", submission_id, status);
                Ok(())
            }
            Err(e) => {
                warn!("Document {} failed to send: {}", submission_id, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingTransport {
        status: u16,
        sent: Mutex<Vec<CreateDocumentRequest>>,
    }

    impl RecordingTransport {
        fn new(status: u16) -> Self {
            Self {
                status,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentTransport for RecordingTransport {
        async fn send_document(
            &self,
            request: &CreateDocumentRequest,
        ) -> Result<u16, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(self.status)
        }
    }

    struct UnreachableTransport;

    #[async_trait]
    impl DocumentTransport for UnreachableTransport {
        async fn send_document(
            &self,
            _request: &CreateDocumentRequest,
        ) -> Result<u16, TransportError> {
            Err(TransportError::Network("connection refused".to_string()))
        }
    }

    #[test]
    fn zero_capacity_fails_construction() {
        let result = DocumentApi::new(Duration::from_secs(1), 0, RecordingTransport::new(200));
        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_passes_request_to_transport() {
        let api =
            DocumentApi::new(Duration::from_secs(1), 2, RecordingTransport::new(201)).unwrap();

        api.submit(&json!({"doc_id": "42"}), "signed").await.unwrap();

        let sent = api.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].signature, "signed");
        assert_eq!(api.rate_limiter().available_tokens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_consumes_token() {
        let api =
            DocumentApi::new(Duration::from_secs(1), 3, RecordingTransport::new(500)).unwrap();

        for expected_left in [2, 1, 0] {
            let err = api.submit(&"doc", "sig").await.unwrap_err();
            assert!(matches!(
                err,
                ApiError::TransportFailure(TransportError::Status(500))
            ));
            assert_eq!(api.rate_limiter().available_tokens(), expected_left);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_is_transport_failure() {
        let api = DocumentApi::new(Duration::from_secs(1), 1, UnreachableTransport).unwrap();

        let err = api.submit(&"doc", "sig").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::TransportFailure(TransportError::Network(_))
        ));
        assert_eq!(api.rate_limiter().available_tokens(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_399_is_success() {
        let api =
            DocumentApi::new(Duration::from_secs(1), 1, RecordingTransport::new(399)).unwrap();
        assert!(api.submit(&"doc", "sig").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_submit_never_reaches_transport() {
        let api =
            DocumentApi::new(Duration::from_secs(1), 1, RecordingTransport::new(200)).unwrap();
        api.submit(&"first", "sig").await.unwrap();

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let err = api.submit_with_cancel(&"second", "sig", &cancel).await.unwrap_err();
        assert!(matches!(err, ApiError::Interrupted));
        assert_eq!(api.transport().sent.lock().unwrap().len(), 1);
        assert_eq!(api.rate_limiter().available_tokens(), 0);
    }
}

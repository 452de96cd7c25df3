//! OCR service client facade.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::payload::{
    HEALTH_PATH, INFO_PATH, ImageSource, MODELS_PATH, RecognitionOptions, RecognitionRequest,
    STATS_PATH, build_request,
};
use crate::result::{BatchResult, RecognitionResult, parse_batch, parse_recognition};
use crate::status::{HealthStatus, ModelInfo, ServiceInfo, StatsSnapshot, parse_status};
use crate::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::{CLIENT_TARGET, Error, OcrConfig, Result};

/// Outcome of [`OcrClient::recognize`], shaped by the kind of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// Result for a single-image source.
    Single(RecognitionResult),
    /// Index-aligned results for a batch source.
    Batch(BatchResult),
}

impl Recognition {
    /// Returns true for batch outcomes.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Returns every per-image result in input order.
    pub fn into_results(self) -> Vec<RecognitionResult> {
        match self {
            Self::Single(result) => vec![result],
            Self::Batch(batch) => batch.results,
        }
    }
}

/// Client for a PaddleOCR-style HTTP recognition service.
///
/// The client is stateless between calls: it holds only its configuration
/// and a shared [`Transport`], so clones are cheap and may be used from
/// several tasks at once.
///
/// Every method follows the same contract. Local validation failures are
/// returned before any request is sent; transport failures, non-2xx statuses
/// and unreadable bodies are returned as [`Error`]s; a recognition the
/// service could not complete is returned as a result with
/// `success == false`.
///
/// # Examples
///
/// ```rust,no_run
/// use paddleocr_client::{OcrClient, OcrConfig, RecognitionOptions};
///
/// # async fn run() -> paddleocr_client::Result<()> {
/// let client = OcrClient::new(OcrConfig::new("http://localhost:8000")?)?;
///
/// let result = client
///     .recognize_file("receipt.jpg", RecognitionOptions::default().with_language("en"))
///     .await?;
///
/// if result.success {
///     println!("{}", result.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OcrClient {
    config: OcrConfig,
    transport: Arc<dyn Transport>,
}

impl OcrClient {
    /// Creates a client that talks HTTP to `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;

        info!(
            target: CLIENT_TARGET,
            base_url = %config.base_url(),
            timeout_ms = config.effective_timeout().as_millis(),
            "OCR client initialized"
        );

        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client on top of a custom transport.
    pub fn with_transport(config: OcrConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Creates a client on top of a custom transport with default settings.
    pub fn from_transport(transport: impl Transport + 'static) -> Self {
        Self::with_transport(OcrConfig::default(), transport)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Queries `GET /api/v1/health`.
    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.get_status(HEALTH_PATH).await
    }

    /// Returns true if the service answers its health check with `healthy`.
    ///
    /// Any error is logged and reported as `false`.
    pub async fn is_healthy(&self) -> bool {
        match self.health_check().await {
            Ok(health) => health.is_healthy(),
            Err(error) => {
                warn!(target: CLIENT_TARGET, error = %error, "Health check failed");
                false
            }
        }
    }

    /// Queries `GET /api/v1/info`.
    pub async fn get_service_info(&self) -> Result<ServiceInfo> {
        self.get_status(INFO_PATH).await
    }

    /// Queries `GET /api/v1/stats`.
    pub async fn get_stats(&self) -> Result<StatsSnapshot> {
        self.get_status(STATS_PATH).await
    }

    /// Queries `GET /api/v1/models`.
    pub async fn get_models(&self) -> Result<ModelInfo> {
        self.get_status(MODELS_PATH).await
    }

    /// Recognizes a local image file, uploaded as multipart.
    ///
    /// # Errors
    ///
    /// Returns an input error, without sending anything, if the file does not
    /// exist.
    pub async fn recognize_file(
        &self,
        path: impl AsRef<Path>,
        options: RecognitionOptions,
    ) -> Result<RecognitionResult> {
        let request = RecognitionRequest::file(path.as_ref()).with_options(options);
        self.recognize_single(&request).await
    }

    /// Recognizes Base64 image data.
    ///
    /// Both raw Base64 and `data:image/...;base64,` URIs are accepted and sent
    /// as given.
    pub async fn recognize_base64(
        &self,
        data: impl Into<String>,
        options: RecognitionOptions,
    ) -> Result<RecognitionResult> {
        let request = RecognitionRequest::base64(data).with_options(options);
        self.recognize_single(&request).await
    }

    /// Recognizes an image the service downloads from `url`.
    ///
    /// The URL is not validated locally.
    pub async fn recognize_url(
        &self,
        url: impl Into<String>,
        options: RecognitionOptions,
    ) -> Result<RecognitionResult> {
        let request = RecognitionRequest::url(url).with_options(options);
        self.recognize_single(&request).await
    }

    /// Recognizes several Base64 images in one call.
    ///
    /// The result has exactly one entry per input, in input order, even when
    /// some items fail.
    ///
    /// # Errors
    ///
    /// Returns an input error if `images` is empty.
    pub async fn recognize_batch<I, S>(
        &self,
        images: I,
        options: RecognitionOptions,
    ) -> Result<BatchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = RecognitionRequest::batch_base64(images).with_options(options);
        self.recognize_many(&request).await
    }

    /// Recognizes several local files in one multipart call.
    ///
    /// # Errors
    ///
    /// Returns an input error naming the first missing path, or if `paths` is
    /// empty.
    pub async fn recognize_batch_files<I, P>(
        &self,
        paths: I,
        options: RecognitionOptions,
    ) -> Result<BatchResult>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let request = RecognitionRequest::batch_files(paths).with_options(options);
        self.recognize_many(&request).await
    }

    /// Recognizes any [`RecognitionRequest`].
    pub async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition> {
        if request.source.is_batch() {
            self.recognize_many(request).await.map(Recognition::Batch)
        } else {
            self.recognize_single(request).await.map(Recognition::Single)
        }
    }

    /// Recognizes a local file and returns the span texts, one per line.
    ///
    /// A recognition the service could not complete yields an empty string.
    pub async fn recognize_text(
        &self,
        path: impl AsRef<Path>,
        options: RecognitionOptions,
    ) -> Result<String> {
        let result = self.recognize_file(path, options).await?;
        Ok(result.texts().join("\n"))
    }

    async fn recognize_single(&self, request: &RecognitionRequest) -> Result<RecognitionResult> {
        let body = self.dispatch(request).await?;
        let result = parse_recognition(&body)?;

        debug!(
            target: CLIENT_TARGET,
            source = request.source.kind(),
            success = result.success,
            spans = result.word_count,
            "Recognition completed"
        );

        Ok(result)
    }

    async fn recognize_many(&self, request: &RecognitionRequest) -> Result<BatchResult> {
        let submitted = request.source.image_count();
        let body = self.dispatch(request).await?;
        let batch = parse_batch(&body, submitted)?;

        debug!(
            target: CLIENT_TARGET,
            source = request.source.kind(),
            submitted,
            succeeded = batch.successful_count(),
            "Batch recognition completed"
        );

        Ok(batch)
    }

    async fn dispatch(&self, request: &RecognitionRequest) -> Result<Bytes> {
        if let ImageSource::Url(url) = &request.source {
            debug!(target: CLIENT_TARGET, url = %url, "Recognizing remote image");
        }

        let transport_request = build_request(request)?;
        self.send(transport_request).await
    }

    async fn get_status<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(TransportRequest::get(path)).await?;
        parse_status(&body)
    }

    /// Executes a request and returns the body of a 2xx response.
    async fn send(&self, request: TransportRequest) -> Result<Bytes> {
        let path = request.path.clone();
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            let body = response.text();
            warn!(
                target: CLIENT_TARGET,
                path = %path,
                status = response.status,
                "Service returned an error status"
            );
            return Err(Error::http_status(response.status, &body));
        }

        Ok(response.body)
    }
}

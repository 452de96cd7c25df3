//! Reqwest-backed [`Transport`].

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;

use super::{
    FormPart, Method, MultipartForm, RequestBody, Transport, TransportRequest, TransportResponse,
};
use crate::{Error, OcrConfig, Result, TRANSPORT_TARGET};

/// Inner transport state shared between clones.
struct ReqwestTransportInner {
    http: Client,
    base_url: String,
}

/// [`Transport`] implementation on top of a pooled [`reqwest::Client`].
///
/// Cloning is cheap and every clone shares the same connection pool. The
/// configured timeout covers the whole request, from connecting to reading
/// the last byte of the response.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a transport for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRANSPORT_TARGET,
            base_url = %config.base_url(),
            timeout_ms = timeout.as_millis(),
            "Creating reqwest transport"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                Error::configuration(format!("failed to build HTTP client: {e}")).with_source(e)
            })?;

        let inner = ReqwestTransportInner {
            http,
            base_url: config.base_url().to_owned(),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Builds a reqwest multipart form, streaming file parts from disk.
    async fn build_form(form: MultipartForm) -> Result<Form> {
        let mut multipart = Form::new();

        for part in form.parts {
            multipart = match part {
                FormPart::Text { name, value } => multipart.text(name, value),
                FormPart::File {
                    name,
                    path,
                    file_name,
                    mime,
                } => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .map_err(|_| Error::file_not_found(&path))?;
                    let length = file.metadata().await?.len();
                    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

                    let part = Part::stream_with_length(body, length)
                        .file_name(file_name)
                        .mime_str(mime)?;
                    multipart.part(name, part)
                }
            };
        }

        Ok(multipart)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let started_at = Instant::now();
        let url = format!("{}{}", self.inner.base_url, request.path);

        tracing::debug!(
            target: TRANSPORT_TARGET,
            method = %request.method,
            url = %url,
            "Sending request"
        );

        let builder = match request.method {
            Method::Get => self.inner.http.get(&url),
            Method::Post => self.inner.http.post(&url),
        };

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(Self::build_form(form).await?),
        };

        let result = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(TransportResponse::new(status, body))
        }
        .await;

        let elapsed = started_at.elapsed();

        match result {
            Ok(response) => {
                tracing::debug!(
                    target: TRANSPORT_TARGET,
                    url = %url,
                    status = response.status,
                    body_bytes = response.body.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Received response"
                );
                Ok(response)
            }
            Err(err) => {
                let error = Error::from(err);
                tracing::warn!(
                    target: TRANSPORT_TARGET,
                    url = %url,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Request failed"
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ErrorKind;

    fn transport_for(server: &MockServer) -> ReqwestTransport {
        let config = OcrConfig::new(server.uri()).unwrap();
        ReqwestTransport::new(&config).unwrap()
    }

    #[test]
    fn test_transport_creation() {
        let config = OcrConfig::new("http://localhost:8000/").unwrap();
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"healthy\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport_for(&server)
            .execute(TransportRequest::get("/api/v1/health"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "{\"status\":\"healthy\"}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let response = transport_for(&server)
            .execute(TransportRequest::get("/api/v1/stats"))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({ "url": "http://img", "lang": "en", "use_gpu": false });
        Mock::given(method("POST"))
            .and(path("/api/v1/ocr/url"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport_for(&server)
            .execute(TransportRequest::post_json("/api/v1/ocr/url", payload))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_post_multipart_streams_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("scan.png");
        std::fs::write(&file_path, b"\x89PNG fake image").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ocr/file"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let form = MultipartForm::new()
            .file("file", &file_path, "scan.png", "image/png")
            .text("lang", "ch")
            .text("use_gpu", "false");

        let response = transport_for(&server)
            .execute(TransportRequest::post_multipart("/api/v1/ocr/file", form))
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"file\"; filename=\"scan.png\""));
        assert!(body.contains("PNG fake image"));
        assert!(body.contains("name=\"use_gpu\""));
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = OcrConfig::new(server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(100));
        let transport = ReqwestTransport::new(&config).unwrap();

        let error = transport
            .execute(TransportRequest::get("/api/v1/health"))
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Timeout);
        assert!(error.is_transport_error());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let config = OcrConfig::new(format!("http://{address}")).unwrap();
        let transport = ReqwestTransport::new(&config).unwrap();

        let error = transport
            .execute(TransportRequest::get("/api/v1/health"))
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::NetworkError);
    }
}

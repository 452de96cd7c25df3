//! HTTP transport abstraction.
//!
//! The [`Transport`] trait is the only seam between the client facade and the
//! network. [`ReqwestTransport`] is the production implementation; the
//! recording [`MockTransport`] is available in tests and behind the
//! `test-utils` feature.

use std::fmt;

mod http;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod request;

pub use http::ReqwestTransport;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTransport;
pub use request::{
    FormPart, Method, MultipartForm, RequestBody, TransportRequest, TransportResponse,
};

use crate::Result;

/// Executes HTTP requests against the OCR service.
///
/// Implementations resolve [`TransportRequest::path`] against their own base
/// address, enforce their own timeout, and report connection-level failures
/// as [`ErrorKind::NetworkError`] or [`ErrorKind::Timeout`]. Non-2xx statuses
/// are *not* errors at this layer: they are returned as a normal
/// [`TransportResponse`] and classified by the caller.
///
/// Implementations must be safe to share across concurrent calls.
///
/// [`ErrorKind::NetworkError`]: crate::ErrorKind::NetworkError
/// [`ErrorKind::Timeout`]: crate::ErrorKind::Timeout
#[async_trait::async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a single request and reads the full response body.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

//! Structured error handling for OCR client operations.
//!
//! Failures fall into three groups that callers usually branch on:
//!
//! - **Input errors** are raised locally before any request is sent
//!   (missing file, empty batch, bad configuration).
//! - **Transport errors** mean the request never produced a response
//!   (connection refused, DNS failure, timeout).
//! - **Protocol errors** mean the service answered, but with a non-2xx
//!   status or a body that could not be understood.
//!
//! A recognition that the service *understood* but could not complete is not
//! an error at all: it comes back as a result with `success == false`.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Maximum number of characters of a failed response body kept in the error.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 1024;

/// Categories of errors that can occur when talking to the OCR service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Local input validation failed (missing file, empty batch, bad Base64).
    InvalidInput,
    /// The client configuration is invalid.
    Configuration,
    /// The request could not be delivered or the response could not be read.
    NetworkError,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The service answered with a non-2xx status.
    HttpStatus,
    /// The service answered 2xx, but the body was not the expected JSON.
    InvalidResponse,
}

impl ErrorKind {
    /// Returns true for errors raised before any network call.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::InvalidInput | Self::Configuration)
    }

    /// Returns true for connection-level failures, including timeouts.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout)
    }

    /// Returns true when the service responded but not in the expected way.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::HttpStatus | Self::InvalidResponse)
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// HTTP status code, set for [`ErrorKind::HttpStatus`].
    pub status: Option<u16>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            source: Some(source.into()),
        }
    }

    /// Creates an input validation error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput).with_message(message)
    }

    /// Creates a "file not found" input error for the given path.
    pub fn file_not_found(path: &std::path::Path) -> Self {
        Self::invalid_input(format!("file not found: {}", path.display()))
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }

    /// Creates an error for a non-2xx response.
    ///
    /// The body is truncated to keep error values small.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("service responded with status {status}")
        } else {
            let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("service responded with status {status}: {excerpt}")
        };

        Self {
            kind: ErrorKind::HttpStatus,
            message: Some(message),
            status: Some(status),
            source: None,
        }
    }

    /// Creates an error for a 2xx body that could not be interpreted.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse).with_message(message)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns true for errors raised locally before any network call.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        self.kind.is_input()
    }

    /// Returns true for connection-level failures, including timeouts.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        self.kind.is_transport()
    }

    /// Returns true if the request was aborted by the configured timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Returns true when the service responded but not in the expected way.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        self.kind.is_protocol()
    }

    /// Returns the HTTP status code, if the service produced one.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::new(ErrorKind::Timeout)
                .with_message("request timed out")
                .with_source(error)
        } else if error.is_connect() {
            Self::new(ErrorKind::NetworkError)
                .with_message("connection failed")
                .with_source(error)
        } else {
            Self::new(ErrorKind::NetworkError)
                .with_message(error.to_string())
                .with_source(error)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidResponse)
            .with_message(format!("malformed JSON body: {error}"))
            .with_source(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(ErrorKind::InvalidInput, error).with_message("I/O operation failed")
    }
}

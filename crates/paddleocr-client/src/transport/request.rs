//! Wire-level request and response envelopes.

use std::path::PathBuf;

use bytes::Bytes;
use strum::{AsRefStr, Display};

/// HTTP method used by the OCR REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// `GET`, used by the status endpoints.
    Get,
    /// `POST`, used by every recognition endpoint.
    Post,
}

/// A request ready to be executed by a [`Transport`].
///
/// [`Transport`]: super::Transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the service base URL, starting with `/`.
    pub path: String,
    /// Request body.
    pub body: RequestBody,
}

impl TransportRequest {
    /// Creates a `GET` request with no body.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    /// Creates a `POST` request with a JSON body.
    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    /// Creates a `POST` request with a multipart form body.
    pub fn post_multipart(path: impl Into<String>, form: MultipartForm) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::Multipart(form),
        }
    }
}

/// Body of a [`TransportRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// UTF-8 JSON object.
    Json(serde_json::Value),
    /// `multipart/form-data` body.
    Multipart(MultipartForm),
}

/// Ordered list of multipart form fields.
///
/// File parts hold a path rather than bytes so the transport can stream the
/// file from disk while sending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    /// Form parts in the order they are sent.
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a file field streamed from `path`.
    pub fn file(
        mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        mime: &'static str,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            path: path.into(),
            file_name: file_name.into(),
            mime,
        });
        self
    }

    /// Returns the value of the first text field with the given name.
    pub fn text_value(&self, field: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name, value } if name == field => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns the file parts in form order.
    pub fn files(&self) -> impl Iterator<Item = &FormPart> {
        self.parts
            .iter()
            .filter(|part| matches!(part, FormPart::File { .. }))
    }
}

/// A single multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// Binary file field.
    File {
        /// Field name.
        name: String,
        /// Local path the content is read from.
        path: PathBuf,
        /// File name sent in the part's `Content-Disposition`.
        file_name: String,
        /// Content type of the part.
        mime: &'static str,
    },
}

/// Fully-read response from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Creates a response from a status code and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a response carrying a JSON body.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.as_ref(), "POST");
    }

    #[test]
    fn test_form_lookup() {
        let form = MultipartForm::new()
            .file("file", "/tmp/a.png", "a.png", "image/png")
            .text("lang", "en")
            .text("use_gpu", "false");

        assert_eq!(form.text_value("lang"), Some("en"));
        assert_eq!(form.text_value("use_gpu"), Some("false"));
        assert_eq!(form.text_value("missing"), None);
        assert_eq!(form.files().count(), 1);
    }

    #[test]
    fn test_response_status() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(301, "").is_success());
        assert!(!TransportResponse::new(500, "boom").is_success());
        assert_eq!(TransportResponse::new(500, "boom").text(), "boom");
    }
}

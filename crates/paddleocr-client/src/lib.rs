#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod client;
pub mod encoding;
pub mod payload;
pub mod result;
pub mod status;
pub mod transport;

pub use client::{OcrClient, OcrConfig, Recognition};
pub use encoding::{
    encode_base64, file_to_base64, image_to_base64, is_supported_image_format, mime_type_for,
    save_base64_image,
};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use payload::{ImageSource, RecognitionOptions, RecognitionRequest};
pub use result::{
    BatchResult, Point, RecognitionResult, TextSpan, extract_text_only, text_with_confidence,
};
pub use status::{HealthStatus, ModelInfo, ServiceInfo, StatsSnapshot};
pub use transport::Transport;

/// Tracing target for client facade operations.
pub const CLIENT_TARGET: &str = "paddleocr_client::client";

/// Tracing target for HTTP requests and responses.
pub const TRANSPORT_TARGET: &str = "paddleocr_client::transport";

/// Tracing target for response normalization.
pub const NORMALIZER_TARGET: &str = "paddleocr_client::normalizer";

//! OCR service client.
//!
//! [`OcrClient`] is the single entry point: one method per service
//! operation, all configured through [`OcrConfig`].

mod ocr_client;
mod ocr_config;

pub use ocr_client::{OcrClient, Recognition};
pub use ocr_config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS, OcrConfig};

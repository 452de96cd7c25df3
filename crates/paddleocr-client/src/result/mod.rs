//! Typed recognition results.
//!
//! Every response body the service produces for a recognition call is
//! normalized into a [`RecognitionResult`] (or a [`BatchResult`] for batch
//! calls) by the dialect resolver in this module, regardless of which JSON
//! shape the service used.

use serde::{Deserialize, Serialize};

mod dialect;

pub use dialect::{normalize_batch, normalize_recognition, parse_batch, parse_recognition};

/// A corner of a bounding polygon, as `[x, y]`.
pub type Point = [f64; 2];

/// One detected text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Recognized text.
    pub text: String,
    /// Recognition confidence, in `[0, 1]`.
    pub confidence: f64,
    /// Corner points in service order (top-left, top-right, bottom-right,
    /// bottom-left). Not reordered or validated.
    #[serde(default)]
    pub bbox: Vec<Point>,
}

impl TextSpan {
    /// Creates a span.
    pub fn new(text: impl Into<String>, confidence: f64, bbox: Vec<Point>) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }
}

/// Outcome of recognizing a single image.
///
/// `success == false` is a data-level failure: the service understood the
/// request but could not recognize the image. It is reported here rather than
/// as an [`Error`](crate::Error), so callers must check `success`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Whether recognition succeeded.
    pub success: bool,
    /// Full recognized text; may be empty.
    pub text: String,
    /// Number of entries in `details`.
    pub word_count: usize,
    /// Mean span confidence; only meaningful when `success` is true.
    pub avg_confidence: f64,
    /// Detected spans in service order.
    pub details: Vec<TextSpan>,
    /// Language the service used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Service-side timestamp, as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Informational message (e.g. nothing detected).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure description, set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure category reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl RecognitionResult {
    /// Creates a successful result from spans, deriving text, count and mean
    /// confidence.
    pub fn from_spans(details: Vec<TextSpan>) -> Self {
        let text = details
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            success: true,
            text,
            word_count: details.len(),
            avg_confidence: mean_confidence(&details),
            details,
            ..Self::default()
        }
    }

    /// Creates a data-level failure.
    pub fn failure(error: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_type: Some(error_type.into()),
            ..Self::default()
        }
    }

    /// Span texts in detection order; empty when `success` is false.
    pub fn texts(&self) -> Vec<&str> {
        if !self.success {
            return Vec::new();
        }
        self.details.iter().map(|span| span.text.as_str()).collect()
    }

    /// Returns true if nothing was recognized.
    pub fn is_empty(&self) -> bool {
        self.details.is_empty() && self.text.trim().is_empty()
    }
}

/// Outcome of a batch call, index-aligned with the submitted inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Whether the batch as a whole was accepted.
    pub success: bool,
    /// Number of inputs submitted.
    pub total: usize,
    /// One result per input, in input order.
    pub results: Vec<RecognitionResult>,
    /// Batch-level failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Service-side timestamp, as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl BatchResult {
    /// Number of items that were recognized successfully.
    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }

    /// Number of items that failed.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.successful_count()
    }
}

/// Returns the recognized texts, or nothing if recognition failed.
pub fn extract_text_only(result: &RecognitionResult) -> Vec<String> {
    result.texts().into_iter().map(str::to_owned).collect()
}

/// Returns the spans with text, confidence and bounding box, or nothing if
/// recognition failed.
///
/// Spans that came from a bare-string entry carry a confidence of `1.0`.
pub fn text_with_confidence(result: &RecognitionResult) -> Vec<TextSpan> {
    if !result.success {
        return Vec::new();
    }
    result.details.clone()
}

pub(crate) fn mean_confidence(spans: &[TextSpan]) -> f64 {
    if spans.is_empty() {
        return 0.0;
    }
    spans.iter().map(|span| span.confidence).sum::<f64>() / spans.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, confidence: f64) -> TextSpan {
        TextSpan::new(text, confidence, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
    }

    #[test]
    fn test_from_spans() {
        let result = RecognitionResult::from_spans(vec![span("hello", 0.5), span("world", 1.0)]);

        assert!(result.success);
        assert_eq!(result.text, "hello world");
        assert_eq!(result.word_count, 2);
        assert!((result.avg_confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failure_hides_details() {
        let mut result = RecognitionResult::failure("boom", "ValueError");
        result.details.push(span("stale", 0.9));

        assert!(extract_text_only(&result).is_empty());
        assert!(text_with_confidence(&result).is_empty());
        assert!(result.texts().is_empty());
    }

    #[test]
    fn test_extraction_keeps_order() {
        let result = RecognitionResult::from_spans(vec![span("b", 0.9), span("a", 0.8)]);

        assert_eq!(extract_text_only(&result), vec!["b", "a"]);
        let spans = text_with_confidence(&result);
        assert_eq!(spans[0].text, "b");
        assert_eq!(spans[1].confidence, 0.8);
    }

    #[test]
    fn test_empty_result() {
        let result = RecognitionResult::from_spans(Vec::new());
        assert!(result.is_empty());
        assert_eq!(result.avg_confidence, 0.0);
    }

    #[test]
    fn test_batch_counts() {
        let batch = BatchResult {
            success: true,
            total: 3,
            results: vec![
                RecognitionResult::from_spans(vec![span("a", 1.0)]),
                RecognitionResult::failure("bad image", "ImageReadError"),
                RecognitionResult::from_spans(Vec::new()),
            ],
            ..BatchResult::default()
        };

        assert_eq!(batch.successful_count(), 2);
        assert_eq!(batch.failed_count(), 1);
    }
}

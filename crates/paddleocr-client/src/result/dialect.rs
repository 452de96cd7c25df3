//! Resolution of the JSON shapes the service uses for recognition results.
//!
//! Three shapes are understood, told apart once by looking at the top-level
//! `data` key:
//!
//! - **flat**: `{success, text, word_count, avg_confidence, details: [...]}`;
//! - **positional**: `{success?, data: [[bbox, textInfo], ...]}`, where
//!   `textInfo` is `[text, confidence]` or a bare string;
//! - **envelope**: `{success, timestamp, data: {...}}` around either of the
//!   above.
//!
//! Keys are matched case-insensitively. Malformed spans are dropped with a
//! warning instead of failing the whole result.

use serde_json::{Map, Value};

use super::{BatchResult, Point, RecognitionResult, TextSpan, mean_confidence};
use crate::{Error, NORMALIZER_TARGET, Result};

const DATA_KEY: &str = "data";

/// Parses a recognition response body.
///
/// # Errors
///
/// Returns an [`ErrorKind::InvalidResponse`] error if the body is not JSON,
/// is not an object, or carries neither `success` nor `text`.
///
/// [`ErrorKind::InvalidResponse`]: crate::ErrorKind::InvalidResponse
pub fn parse_recognition(body: &[u8]) -> Result<RecognitionResult> {
    let value: Value = serde_json::from_slice(body)?;
    normalize_recognition(value)
}

/// Normalizes an already-parsed recognition payload.
pub fn normalize_recognition(value: Value) -> Result<RecognitionResult> {
    Dialect::detect(lowercase_keys(value))?.into_result()
}

/// Parses a batch response body for a batch of `submitted` inputs.
///
/// The returned [`BatchResult::results`] always has exactly `submitted`
/// entries; see [`normalize_batch`].
pub fn parse_batch(body: &[u8], submitted: usize) -> Result<BatchResult> {
    let value: Value = serde_json::from_slice(body)?;
    normalize_batch(value, submitted)
}

/// Normalizes an already-parsed batch payload for `submitted` inputs.
///
/// Each item goes through the same dialect resolution as a single result; an
/// item that cannot be understood becomes a failed result at its index. If
/// the service returned fewer items than were submitted, the missing tail is
/// filled with failed results; extra items are dropped.
///
/// # Errors
///
/// Returns an [`ErrorKind::InvalidResponse`] error if the body is not an
/// object, or reports success without a `results` array.
///
/// [`ErrorKind::InvalidResponse`]: crate::ErrorKind::InvalidResponse
pub fn normalize_batch(value: Value, submitted: usize) -> Result<BatchResult> {
    let Value::Object(fields) = lowercase_keys(value) else {
        return Err(Error::invalid_response("batch response is not a JSON object"));
    };
    let mut fields = unwrap_batch_envelope(fields);

    let success = bool_field(&fields, "success");
    let error = string_field(&fields, "error");
    let timestamp = string_field(&fields, "timestamp");

    if let Some(total) = field(&fields, "total").and_then(Value::as_u64) {
        if total as usize != submitted {
            tracing::warn!(
                target: NORMALIZER_TARGET,
                reported = total,
                submitted,
                "Batch total differs from submitted input count"
            );
        }
    }

    let results = match fields.remove("results") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| batch_item(index, item))
            .collect(),
        _ if success == Some(false) => Vec::new(),
        _ => {
            return Err(Error::invalid_response(
                "batch response has no `results` array",
            ));
        }
    };

    let success = success.unwrap_or(true);
    let results = align_batch(results, submitted, success, error.as_deref());

    Ok(BatchResult {
        success,
        total: submitted,
        results,
        error,
        timestamp,
    })
}

/// The response shapes a recognition endpoint may produce.
#[derive(Debug)]
enum Dialect {
    /// Fields already named like [`RecognitionResult`].
    Flat(Map<String, Value>),
    /// A `data` array of `[bbox, textInfo]` pairs.
    Positional {
        fields: Map<String, Value>,
        items: Vec<Value>,
    },
    /// A status envelope whose `data` object holds the actual result.
    Envelope {
        fields: Map<String, Value>,
        inner: Value,
    },
}

impl Dialect {
    fn detect(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::invalid_response(
                "recognition response is not a JSON object",
            ));
        };

        let has_flat_fields = fields.contains_key("text") || fields.contains_key("details");

        match fields.remove(DATA_KEY) {
            Some(Value::Array(items)) if !has_flat_fields => Ok(Self::Positional { fields, items }),
            Some(inner @ Value::Object(_)) if !has_flat_fields => {
                Ok(Self::Envelope { fields, inner })
            }
            Some(other) => {
                fields.insert(DATA_KEY.to_owned(), other);
                Self::flat(fields)
            }
            None => Self::flat(fields),
        }
    }

    fn flat(fields: Map<String, Value>) -> Result<Self> {
        if fields.contains_key("success") || fields.contains_key("text") {
            Ok(Self::Flat(fields))
        } else {
            Err(Error::invalid_response(
                "recognition response has neither `success` nor `text`",
            ))
        }
    }

    fn into_result(self) -> Result<RecognitionResult> {
        match self {
            Self::Flat(fields) => Ok(from_flat(&fields)),
            Self::Positional { fields, items } => Ok(from_positional(&fields, &items)),
            Self::Envelope { fields, inner } => {
                let outer_success = bool_field(&fields, "success");

                let mut result = match Self::detect(inner).and_then(Self::into_result) {
                    Ok(result) => result,
                    // A failed envelope may carry an empty or partial payload.
                    Err(_) if outer_success == Some(false) => RecognitionResult {
                        success: false,
                        ..RecognitionResult::default()
                    },
                    Err(error) => return Err(error),
                };

                if outer_success == Some(false) {
                    result.success = false;
                }
                fill_meta(&mut result, &fields);
                Ok(result)
            }
        }
    }
}

fn from_flat(fields: &Map<String, Value>) -> RecognitionResult {
    let details = match field(fields, "details") {
        Some(Value::Array(entries)) => collect_spans(entries, span_from_entry),
        _ => Vec::new(),
    };

    if let Some(reported) = field(fields, "word_count").and_then(Value::as_u64) {
        if reported as usize != details.len() {
            tracing::debug!(
                target: NORMALIZER_TARGET,
                reported,
                spans = details.len(),
                "Reported word count differs from span count"
            );
        }
    }

    let mut result = assemble(
        bool_field(fields, "success").unwrap_or(true),
        details,
        string_field(fields, "text"),
        field(fields, "avg_confidence").and_then(Value::as_f64),
    );
    fill_meta(&mut result, fields);
    result
}

fn from_positional(fields: &Map<String, Value>, items: &[Value]) -> RecognitionResult {
    let details = collect_spans(items, span_from_pair);

    let mut result = assemble(
        bool_field(fields, "success").unwrap_or(true),
        details,
        string_field(fields, "text"),
        field(fields, "avg_confidence").and_then(Value::as_f64),
    );
    fill_meta(&mut result, fields);
    result
}

fn assemble(
    success: bool,
    details: Vec<TextSpan>,
    text: Option<String>,
    avg_confidence: Option<f64>,
) -> RecognitionResult {
    let text = text.unwrap_or_else(|| {
        details
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    });

    RecognitionResult {
        success,
        text,
        word_count: details.len(),
        avg_confidence: avg_confidence.unwrap_or_else(|| mean_confidence(&details)),
        details,
        ..RecognitionResult::default()
    }
}

/// Copies metadata fields that the result does not already have.
fn fill_meta(result: &mut RecognitionResult, fields: &Map<String, Value>) {
    let slots = [
        (&mut result.lang, "lang"),
        (&mut result.timestamp, "timestamp"),
        (&mut result.message, "message"),
        (&mut result.error, "error"),
        (&mut result.error_type, "error_type"),
    ];

    for (slot, key) in slots {
        if slot.is_none() {
            *slot = string_field(fields, key);
        }
    }
}

fn collect_spans(entries: &[Value], parse: fn(&Value) -> Option<TextSpan>) -> Vec<TextSpan> {
    let spans: Vec<TextSpan> = entries.iter().filter_map(parse).collect();

    let dropped = entries.len() - spans.len();
    if dropped > 0 {
        tracing::warn!(
            target: NORMALIZER_TARGET,
            dropped,
            kept = spans.len(),
            "Dropped malformed text spans"
        );
    }

    spans
}

/// Parses a `details` entry, which is normally an object but may also be a
/// positional pair.
fn span_from_entry(entry: &Value) -> Option<TextSpan> {
    match entry {
        Value::Object(span) => {
            let text = field(span, "text")?.as_str()?;
            let confidence = match field(span, "confidence") {
                Some(value) => value.as_f64()?,
                None => 1.0,
            };
            let bbox = field(span, "bbox").map(parse_bbox).unwrap_or_default();
            Some(TextSpan::new(text, confidence, bbox))
        }
        Value::Array(_) => span_from_pair(entry),
        _ => None,
    }
}

/// Parses a `[bbox, textInfo]` pair.
fn span_from_pair(item: &Value) -> Option<TextSpan> {
    let pair = item.as_array().filter(|pair| pair.len() >= 2)?;
    let (text, confidence) = text_info(&pair[1])?;
    Some(TextSpan::new(text, confidence, parse_bbox(&pair[0])))
}

/// Reads `[text, confidence]` or a bare `text`, which counts as certain.
fn text_info(value: &Value) -> Option<(&str, f64)> {
    match value {
        Value::String(text) => Some((text.as_str(), 1.0)),
        Value::Array(parts) if parts.len() >= 2 => Some((parts[0].as_str()?, parts[1].as_f64()?)),
        _ => None,
    }
}

/// Reads corner points, skipping any that are not at least two numbers.
fn parse_bbox(value: &Value) -> Vec<Point> {
    let Some(points) = value.as_array() else {
        return Vec::new();
    };

    points
        .iter()
        .filter_map(|point| {
            let coords = point.as_array()?;
            Some([coords.first()?.as_f64()?, coords.get(1)?.as_f64()?])
        })
        .collect()
}

fn batch_item(index: usize, item: Value) -> RecognitionResult {
    Dialect::detect(item)
        .and_then(Dialect::into_result)
        .unwrap_or_else(|error| {
            tracing::warn!(
                target: NORMALIZER_TARGET,
                index,
                error = %error,
                "Malformed batch entry"
            );
            RecognitionResult::failure(
                format!("malformed batch entry {index}: {error}"),
                "InvalidResponse",
            )
        })
}

fn align_batch(
    mut results: Vec<RecognitionResult>,
    submitted: usize,
    success: bool,
    batch_error: Option<&str>,
) -> Vec<RecognitionResult> {
    if results.len() > submitted {
        tracing::warn!(
            target: NORMALIZER_TARGET,
            returned = results.len(),
            submitted,
            "Service returned more batch results than inputs"
        );
        results.truncate(submitted);
    }

    if results.len() < submitted {
        tracing::warn!(
            target: NORMALIZER_TARGET,
            returned = results.len(),
            submitted,
            "Service returned fewer batch results than inputs"
        );

        for index in results.len()..submitted {
            let filler = match batch_error {
                Some(error) if !success => RecognitionResult::failure(error, "BatchFailed"),
                _ => RecognitionResult::failure(
                    format!("no result returned for batch item {index}"),
                    "MissingResult",
                ),
            };
            results.push(filler);
        }
    }

    results
}

/// Merges `{success, data: {total, results}}` into a single object.
fn unwrap_batch_envelope(mut fields: Map<String, Value>) -> Map<String, Value> {
    if fields.contains_key("results") {
        return fields;
    }

    let Some(Value::Object(mut inner)) = fields.remove(DATA_KEY) else {
        return fields;
    };

    let outer_success = bool_field(&fields, "success");
    for (key, value) in fields {
        inner.entry(key).or_insert(value);
    }
    if outer_success == Some(false) {
        inner.insert("success".to_owned(), Value::Bool(false));
    }

    inner
}

/// Looks up `key`, also accepting the key with underscores removed
/// (`wordcount` for `word_count`), since keys are already lowercased.
fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).or_else(|| {
        key.contains('_')
            .then(|| key.replace('_', ""))
            .and_then(|compact| fields.get(&compact))
    })
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    match field(fields, key)? {
        Value::Bool(value) => Some(*value),
        Value::String(value) => value.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match field(fields, key)? {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

/// Lowercases every object key, recursively.
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

//! Recognition requests and their wire encodings.
//!
//! A [`RecognitionRequest`] pairs exactly one [`ImageSource`] with the shared
//! [`RecognitionOptions`]. [`build_request`] turns it into a
//! [`TransportRequest`] using one of two encodings:
//!
//! - `multipart/form-data` for file uploads: `file` (or one `files` part per
//!   path for batches), `lang`, and `use_gpu` as the string `"true"`/`"false"`;
//! - a JSON object for everything else: `image`, `url` or `images`, plus
//!   `lang` and `use_gpu` as a boolean.
//!
//! All local validation happens here, so an invalid request never reaches the
//! transport.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::encoding::{ensure_file, mime_type_for};
use crate::transport::{MultipartForm, TransportRequest};
use crate::{Error, Result};

/// Language code used when the caller does not pick one.
pub const DEFAULT_LANGUAGE: &str = "ch";

/// `GET` service health.
pub const HEALTH_PATH: &str = "/api/v1/health";
/// `GET` service description.
pub const INFO_PATH: &str = "/api/v1/info";
/// `GET` request counters.
pub const STATS_PATH: &str = "/api/v1/stats";
/// `GET` loaded model information.
pub const MODELS_PATH: &str = "/api/v1/models";
/// `POST` multipart file recognition.
pub const OCR_FILE_PATH: &str = "/api/v1/ocr/file";
/// `POST` JSON Base64 recognition.
pub const OCR_BASE64_PATH: &str = "/api/v1/ocr/base64";
/// `POST` JSON URL recognition.
pub const OCR_URL_PATH: &str = "/api/v1/ocr/url";
/// `POST` batch recognition (JSON or multipart).
pub const OCR_BATCH_PATH: &str = "/api/v1/ocr/batch";

/// Options shared by every recognition call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecognitionOptions {
    /// Free-form language code understood by the service (`ch`, `en`, ...).
    pub language: String,
    /// Ask the service to run on GPU.
    pub use_gpu: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            use_gpu: false,
        }
    }
}

impl RecognitionOptions {
    /// Default options: language `ch`, CPU.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set whether the service should use the GPU.
    #[must_use]
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    fn use_gpu_field(&self) -> &'static str {
        if self.use_gpu { "true" } else { "false" }
    }
}

/// Where the image(s) to recognize come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A local file, uploaded as multipart.
    File(PathBuf),
    /// Base64 image data, raw or as a `data:image/...;base64,` URI.
    Base64(String),
    /// A URL the service downloads itself.
    Url(String),
    /// Several Base64 images recognized in one call.
    BatchBase64(Vec<String>),
    /// Several local files recognized in one call.
    BatchFiles(Vec<PathBuf>),
}

impl ImageSource {
    /// Returns true for the batch variants.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::BatchBase64(_) | Self::BatchFiles(_))
    }

    /// Number of images carried by this source.
    pub fn image_count(&self) -> usize {
        match self {
            Self::File(_) | Self::Base64(_) | Self::Url(_) => 1,
            Self::BatchBase64(images) => images.len(),
            Self::BatchFiles(paths) => paths.len(),
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Base64(_) => "base64",
            Self::Url(_) => "url",
            Self::BatchBase64(_) => "batch_base64",
            Self::BatchFiles(_) => "batch_files",
        }
    }
}

/// A single recognition call: one image source plus options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Input to recognize.
    pub source: ImageSource,
    /// Language and device options.
    pub options: RecognitionOptions,
}

impl RecognitionRequest {
    /// Creates a request with default options.
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            options: RecognitionOptions::default(),
        }
    }

    /// Recognize a local file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(ImageSource::File(path.into()))
    }

    /// Recognize Base64 data.
    pub fn base64(data: impl Into<String>) -> Self {
        Self::new(ImageSource::Base64(data.into()))
    }

    /// Recognize an image the service fetches from `url`.
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(ImageSource::Url(url.into()))
    }

    /// Recognize several Base64 images.
    pub fn batch_base64<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ImageSource::BatchBase64(
            images.into_iter().map(Into::into).collect(),
        ))
    }

    /// Recognize several local files.
    pub fn batch_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(ImageSource::BatchFiles(
            paths.into_iter().map(Into::into).collect(),
        ))
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: RecognitionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the language code.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.options.language = language.into();
        self
    }

    /// Set whether the service should use the GPU.
    #[must_use]
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.options.use_gpu = use_gpu;
        self
    }
}

#[derive(Serialize)]
struct Base64Body<'a> {
    image: &'a str,
    lang: &'a str,
    use_gpu: bool,
}

#[derive(Serialize)]
struct UrlBody<'a> {
    url: &'a str,
    lang: &'a str,
    use_gpu: bool,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    images: &'a [String],
    lang: &'a str,
    use_gpu: bool,
}

/// Encodes a recognition request for the transport.
///
/// # Errors
///
/// Returns an [`ErrorKind::InvalidInput`] error, without touching the
/// network, when a referenced file does not exist or a batch is empty. For
/// file batches the error names the first missing path.
///
/// [`ErrorKind::InvalidInput`]: crate::ErrorKind::InvalidInput
pub fn build_request(request: &RecognitionRequest) -> Result<TransportRequest> {
    let options = &request.options;
    let lang = options.language.as_str();
    let use_gpu = options.use_gpu;

    match &request.source {
        ImageSource::File(path) => {
            ensure_file(path)?;
            let form = file_part(MultipartForm::new(), "file", path);
            Ok(TransportRequest::post_multipart(
                OCR_FILE_PATH,
                with_options(form, options),
            ))
        }
        ImageSource::Base64(image) => to_json(
            OCR_BASE64_PATH,
            &Base64Body {
                image,
                lang,
                use_gpu,
            },
        ),
        ImageSource::Url(url) => to_json(OCR_URL_PATH, &UrlBody { url, lang, use_gpu }),
        ImageSource::BatchBase64(images) => {
            if images.is_empty() {
                return Err(Error::invalid_input("batch must contain at least one image"));
            }
            to_json(
                OCR_BATCH_PATH,
                &BatchBody {
                    images,
                    lang,
                    use_gpu,
                },
            )
        }
        ImageSource::BatchFiles(paths) => {
            if paths.is_empty() {
                return Err(Error::invalid_input("batch must contain at least one file"));
            }
            for path in paths {
                ensure_file(path)?;
            }

            let form = paths
                .iter()
                .fold(MultipartForm::new(), |form, path| {
                    file_part(form, "files", path)
                });
            Ok(TransportRequest::post_multipart(
                OCR_BATCH_PATH,
                with_options(form, options),
            ))
        }
    }
}

fn file_part(form: MultipartForm, field: &str, path: &Path) -> MultipartForm {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());

    form.file(field, path, file_name, mime_type_for(path))
}

fn with_options(form: MultipartForm, options: &RecognitionOptions) -> MultipartForm {
    form.text("lang", options.language.as_str())
        .text("use_gpu", options.use_gpu_field())
}

fn to_json<T: Serialize>(path: &str, body: &T) -> Result<TransportRequest> {
    let value = serde_json::to_value(body)
        .map_err(|e| Error::invalid_input(format!("failed to encode request body: {e}")))?;
    Ok(TransportRequest::post_json(path, value))
}

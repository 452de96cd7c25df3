//! Pure helpers for preparing image payloads.
//!
//! Nothing here touches the network or depends on client state.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// MIME type used when the extension is not recognized.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Extensions the reference service accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Returns the MIME type for a path's extension.
///
/// Only `.png`, `.gif` and `.webp` map to their own type; everything else,
/// including files without an extension, is sent as `image/jpeg`.
pub fn mime_type_for(path: impl AsRef<Path>) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// Returns true if the path has an extension the service accepts.
pub fn is_supported_image_format(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Encodes bytes as standard, padded Base64.
pub fn encode_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Reads a file and returns its content as raw Base64.
///
/// # Errors
///
/// Returns an input error if the file does not exist or cannot be read.
pub fn image_to_base64(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    ensure_file(path)?;

    let bytes = std::fs::read(path).map_err(|e| {
        Error::invalid_input(format!("failed to read '{}': {e}", path.display())).with_source(e)
    })?;
    Ok(encode_base64(bytes))
}

/// Reads a file and returns it as a `data:<mime>;base64,` URI.
///
/// The MIME type comes from [`mime_type_for`].
///
/// # Errors
///
/// Returns an input error if the file does not exist or cannot be read.
pub fn file_to_base64(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let encoded = image_to_base64(path)?;
    Ok(format!("data:{};base64,{encoded}", mime_type_for(path)))
}

/// Strips a `data:...;base64,` prefix, if present.
pub fn strip_data_uri(data: &str) -> &str {
    match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map_or(data, |(_, payload)| payload),
        None => data,
    }
}

/// Decodes Base64 image data (raw or data URI) and writes it to `path`.
///
/// # Errors
///
/// Returns an input error if the data is not valid Base64 or the file cannot
/// be written.
pub fn save_base64_image(data: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = STANDARD
        .decode(strip_data_uri(data).trim())
        .map_err(|e| {
            Error::invalid_input(format!("invalid Base64 image data: {e}")).with_source(e)
        })?;

    std::fs::write(path, bytes).map_err(|e| {
        Error::invalid_input(format!("failed to write '{}': {e}", path.display())).with_source(e)
    })
}

/// Checks that `path` names an existing regular file.
pub(crate) fn ensure_file(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(Error::invalid_input(format!(
            "not a regular file: {}",
            path.display()
        ))),
        Err(_) => Err(Error::file_not_found(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(mime_type_for("photo.png"), "image/png");
        assert_eq!(mime_type_for("photo.PNG"), "image/png");
        assert_eq!(mime_type_for("anim.gif"), "image/gif");
        assert_eq!(mime_type_for("pic.webp"), "image/webp");
        assert_eq!(mime_type_for("photo.jpg"), "image/jpeg");
        assert_eq!(mime_type_for("photo.unknownext"), "image/jpeg");
        assert_eq!(mime_type_for("noextension"), "image/jpeg");
    }

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_image_format("a.jpg"));
        assert!(is_supported_image_format("a.TIF"));
        assert!(is_supported_image_format("dir/a.webp"));
        assert!(!is_supported_image_format("a.gif"));
        assert!(!is_supported_image_format("a.pdf"));
        assert!(!is_supported_image_format("a"));
    }

    #[test]
    fn test_file_to_base64_prefixes() {
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("photo.png");
        std::fs::write(&png, b"abc").unwrap();
        assert_eq!(file_to_base64(&png).unwrap(), "data:image/png;base64,YWJj");

        let other = dir.path().join("photo.unknownext");
        std::fs::write(&other, b"abc").unwrap();
        assert!(
            file_to_base64(&other)
                .unwrap()
                .starts_with("data:image/jpeg;base64,")
        );
    }

    #[test]
    fn test_image_to_base64_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bmp");
        std::fs::write(&path, &bytes).unwrap();

        let encoded = image_to_base64(&path).unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
        assert_eq!(STANDARD.decode(encode_base64(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let error = file_to_base64("/no/such/file.png").unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);

        let dir = tempfile::tempdir().unwrap();
        let error = image_to_base64(dir.path()).unwrap_err();
        assert!(error.message.unwrap().contains("not a regular file"));
    }

    #[test]
    fn test_strip_data_uri() {
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
        assert_eq!(strip_data_uri("data:text/plain,hello"), "data:text/plain,hello");
    }

    #[test]
    fn test_save_base64_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        save_base64_image("data:image/png;base64,YWJj", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");

        let error = save_base64_image("%%%not-base64%%%", &path).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }
}

//! Image encoding: photo file → base64 `ImageData`.
//!
//! The raw bytes are forwarded untouched: no resizing, re-encoding or format
//! check. Anything the model cannot read is rejected by the provider and
//! surfaces as an invocation failure. Upload size is bounded upstream by the
//! HTTP layer.

use crate::error::ListingError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::path::Path;
use tracing::debug;

/// MIME type used when the bytes match no known image signature.
pub const FALLBACK_MIME: &str = "image/png";

/// Read `path` and encode its bytes as base64 `ImageData`.
pub async fn encode_image_file(path: &Path) -> Result<ImageData, ListingError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ListingError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(encode_image_bytes(&bytes))
}

/// Encode in-memory image bytes.
pub fn encode_image_bytes(bytes: &[u8]) -> ImageData {
    let mime = sniff_mime(bytes);
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes ({}) → {} bytes base64", bytes.len(), mime, b64.len());

    ImageData::new(b64, mime)
}

/// Guess the data-URI MIME type from magic bytes.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn encodes_raw_bytes_as_standard_base64() {
        let data = encode_image_bytes(b"hello");
        assert_eq!(data.data, "aGVsbG8=");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), b"hello");
    }

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(encode_image_bytes(PNG_MAGIC).mime_type, "image/png");
        assert_eq!(encode_image_bytes(JPEG_MAGIC).mime_type, "image/jpeg");
    }

    #[test]
    fn unknown_bytes_fall_back_to_png() {
        assert_eq!(encode_image_bytes(b"not an image").mime_type, FALLBACK_MIME);
    }

    #[tokio::test]
    async fn encodes_file_contents() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(JPEG_MAGIC).unwrap();
        let data = encode_image_file(tmp.path()).await.expect("encode");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), JPEG_MAGIC);
        assert_eq!(data.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn missing_file_is_image_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = encode_image_file(&dir.path().join("nope.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::ImageRead { .. }));
    }
}

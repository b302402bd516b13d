//! Upload staging: write the received photo to disk for the duration of one
//! request.
//!
//! Every upload gets its own [`TempDir`] inside the configured upload
//! directory. The directory (and the photo in it) is removed when the
//! [`StagedUpload`] is dropped, so cleanup happens on every exit path of the
//! handler, including early returns and panics.

use crate::error::ListingError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Name used when sanitising leaves nothing behind.
pub const FALLBACK_FILENAME: &str = "upload";

static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Reduce a client-supplied filename to something safe to join onto a path.
///
/// Compatibility-decomposed (NFKD), then ASCII only, so accents fall off
/// their base letters. Path separators and whitespace become `_`; anything outside
/// `[A-Za-z0-9_.-]` is dropped; leading and trailing `.`/`_` are stripped.
/// `../../etc/passwd` becomes `etc_passwd`.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = RE_UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A photo written to a private temporary directory.
pub struct StagedUpload {
    path: PathBuf,
    _dir: TempDir,
}

impl StagedUpload {
    /// Write `bytes` as `<upload_dir>/<random>/<sanitised filename>`.
    pub async fn write(
        upload_dir: &Path,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Self, ListingError> {
        let failed = |source: std::io::Error| ListingError::UploadFailed {
            dir: upload_dir.to_path_buf(),
            source,
        };

        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(upload_dir)
            .map_err(failed)?;
        let path = dir.path().join(sanitize_filename(filename));
        tokio::fs::write(&path, bytes).await.map_err(failed)?;

        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(Self { path, _dir: dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

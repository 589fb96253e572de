//! Filename codec
//!
//! The externally visible filename is URL-safe base64 of the backing store's
//! fid, optionally suffixed with a file extension. The extension is a hint
//! for browsers and caches only: it is preserved when serving but stripped
//! before decoding, so two filenames that differ only in extension name the
//! same file.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use crate::error::AppError;

/// Encode a fid into a URL-safe filename.
pub fn encode_fid(fid: &str) -> String {
    URL_SAFE.encode(fid.as_bytes())
}

/// Decode a filename back into a fid. Everything after the first `.` is
/// ignored.
pub fn decode_filename(filename: &str) -> Result<String, AppError> {
    let head = filename.split('.').next().unwrap_or("");
    let raw = URL_SAFE
        .decode(head)
        .map_err(|_| AppError::InvalidFilename(filename.to_string()))?;
    String::from_utf8(raw).map_err(|_| AppError::InvalidFilename(filename.to_string()))
}

/// The extension of a filename including the leading dot, or `""`.
pub fn extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) => &filename[i..],
        None => "",
    }
}

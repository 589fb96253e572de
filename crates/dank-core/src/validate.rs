//! Upload validation
//!
//! Enforces the declared policy against an incoming body: the size limit is
//! applied before reading (declared length) and during reading (bounded
//! stream), and image uploads are buffered and decode-probed. Bodies with
//! no declared length are rejected when a size limit is set.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::{future, stream::BoxStream, StreamExt};
use image::ImageFormat;

use crate::error::AppError;
use crate::policy::AssignPolicy;

/// A stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// An upload body after shape resolution: either fully in memory (form
/// fields, data URLs, validated images) or still streaming (raw bodies).
pub enum UploadBody {
    Buffered(Bytes),
    Streaming(ByteStream),
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadBody::Buffered(bytes) => f.debug_tuple("Buffered").field(bytes).finish(),
            UploadBody::Streaming(_) => f.debug_tuple("Streaming").field(&"..").finish(),
        }
    }
}

impl UploadBody {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        UploadBody::Buffered(bytes.into())
    }

    pub fn from_stream(stream: ByteStream) -> Self {
        UploadBody::Streaming(stream)
    }

    /// Number of bytes, when already known.
    pub fn len(&self) -> Option<u64> {
        match self {
            UploadBody::Buffered(b) => Some(b.len() as u64),
            UploadBody::Streaming(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UploadBody::Buffered(b) if b.is_empty())
    }

    /// Cap the body at `max` bytes. Streams are truncated once the limit is
    /// reached, matching a bounded reader.
    fn limited(self, max: u64) -> Self {
        match self {
            UploadBody::Buffered(mut b) => {
                b.truncate(max as usize);
                UploadBody::Buffered(b)
            }
            UploadBody::Streaming(inner) => {
                let limited = inner.scan(max, |remaining, chunk| {
                    let item = match chunk {
                        Ok(mut bytes) => {
                            if *remaining == 0 {
                                return future::ready(None);
                            }
                            if bytes.len() as u64 > *remaining {
                                bytes.truncate(*remaining as usize);
                                *remaining = 0;
                            } else {
                                *remaining -= bytes.len() as u64;
                            }
                            Some(Ok(bytes))
                        }
                        Err(e) => Some(Err(e)),
                    };
                    future::ready(item)
                });
                UploadBody::Streaming(limited.boxed())
            }
        }
    }

    /// Read the whole body into memory.
    pub async fn into_bytes(self) -> Result<Bytes, AppError> {
        match self {
            UploadBody::Buffered(b) => Ok(b),
            UploadBody::Streaming(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| AppError::InvalidBody(e.to_string()))?;
                    buf.extend_from_slice(&chunk);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Convert into a stream regardless of current shape.
    pub fn into_stream(self) -> ByteStream {
        match self {
            UploadBody::Buffered(b) => futures::stream::once(future::ready(Ok(b))).boxed(),
            UploadBody::Streaming(s) => s,
        }
    }
}

/// Validate a body against the policy it was assigned under.
///
/// `declared_len` is the request's content length (or the resolved part's
/// size). Returns the body to forward to storage; for validated images this
/// is the buffered bytes, otherwise the (possibly capped) input.
pub async fn validate_upload(
    body: UploadBody,
    declared_len: Option<u64>,
    policy: &AssignPolicy,
) -> Result<UploadBody, AppError> {
    let mut body = body;
    if policy.max_size_bytes() > 0 {
        let max = policy.max_size_bytes() as u64;
        let len = body.len().or(declared_len);
        match len {
            Some(len) if len > max => return Err(AppError::RequestTooLarge),
            Some(_) => {}
            // unknown length against a size cap: fail closed
            None => return Err(AppError::RequestTooLarge),
        }
        body = body.limited(max);
    }

    match policy.file_type.as_str() {
        "image" => {
            let buf = body.into_bytes().await?;
            probe_image(&buf)?;
            tracing::debug!(len = buf.len(), "validated image");
            Ok(UploadBody::Buffered(buf))
        }
        _ => {
            tracing::debug!(file_type = %policy.file_type, "skipping body validation");
            Ok(body)
        }
    }
}

/// Decode-probe the buffer as GIF, JPEG, or PNG.
fn probe_image(buf: &[u8]) -> Result<(), AppError> {
    let reader = image::ImageReader::new(io::Cursor::new(buf))
        .with_guessed_format()
        .map_err(|_| AppError::InvalidFiletype)?;
    match reader.format() {
        Some(ImageFormat::Gif | ImageFormat::Jpeg | ImageFormat::Png) => {}
        _ => {
            tracing::info!(
                head = ?&buf[..buf.len().min(3)],
                "upload does not start with a known image magic"
            );
            return Err(AppError::InvalidFiletype);
        }
    }
    reader.decode().map_err(|e| {
        tracing::info!(error = %e, "image decode failed");
        AppError::InvalidFiletype
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_policy(max_size: &str) -> AssignPolicy {
        AssignPolicy {
            file_type: "image".to_string(),
            max_size: max_size.to_string(),
            ..Default::default()
        }
    }

    /// Minimal valid 1x1 PNG bytes.
    fn minimal_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00,
            0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08,
            0xD7, 0x63, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D,
            0x89, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ]
    }

    /// Minimal valid 1x1 GIF bytes.
    fn minimal_gif() -> Vec<u8> {
        vec![
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C,
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00,
            0x3B,
        ]
    }

    fn chunked(chunks: Vec<&'static [u8]>) -> UploadBody {
        let stream = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<Result<Bytes, io::Error>>>(),
        );
        UploadBody::from_stream(stream.boxed())
    }

    #[tokio::test]
    async fn test_declared_length_over_max_rejected() {
        let policy = image_policy("100");
        let body = chunked(vec![b"x"]);
        let err = validate_upload(body, Some(9999), &policy).await.unwrap_err();
        assert!(matches!(err, AppError::RequestTooLarge));
    }

    #[tokio::test]
    async fn test_unknown_length_with_cap_rejected() {
        let policy = AssignPolicy {
            max_size: "100".to_string(),
            ..Default::default()
        };
        let body = chunked(vec![b"x"]);
        let err = validate_upload(body, None, &policy).await.unwrap_err();
        assert!(matches!(err, AppError::RequestTooLarge));
    }

    #[tokio::test]
    async fn test_stream_truncated_at_max() {
        // declared length lies; the stream must still be capped
        let policy = AssignPolicy {
            max_size: "5".to_string(),
            ..Default::default()
        };
        let body = chunked(vec![b"abc", b"defgh"]);
        let out = validate_upload(body, Some(4), &policy).await.unwrap();
        let bytes = out.into_bytes().await.unwrap();
        assert_eq!(&bytes[..], b"abcde");
    }

    #[tokio::test]
    async fn test_no_policy_passes_through() {
        let policy = AssignPolicy::default();
        let body = chunked(vec![b"anything ", b"goes"]);
        let out = validate_upload(body, None, &policy).await.unwrap();
        let bytes = out.into_bytes().await.unwrap();
        assert_eq!(&bytes[..], b"anything goes");
    }

    #[tokio::test]
    async fn test_valid_png_accepted() {
        let png = minimal_png();
        let len = png.len() as u64;
        let body = UploadBody::from_bytes(png.clone());
        let out = validate_upload(body, Some(len), &image_policy("1024"))
            .await
            .unwrap();
        let bytes = out.into_bytes().await.unwrap();
        assert_eq!(&bytes[..], &png[..]);
    }

    #[tokio::test]
    async fn test_valid_gif_accepted() {
        let gif = minimal_gif();
        let len = gif.len() as u64;
        let body = UploadBody::from_bytes(gif);
        assert!(validate_upload(body, Some(len), &image_policy("1024"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_non_image_rejected() {
        let body = UploadBody::from_bytes(&b"not an image"[..]);
        let err = validate_upload(body, Some(12), &image_policy("1024"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFiletype));
    }

    #[tokio::test]
    async fn test_unbounded_image_policy_still_validates() {
        let body = UploadBody::from_bytes(&b"junk"[..]);
        let err = validate_upload(body, Some(4), &image_policy(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFiletype));
    }
}

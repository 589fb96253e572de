//! Needle location
//!
//! A `NeedleLocation` pairs the backing store's fid with the volume that
//! holds it. It is produced by the master on assign and reconstructed from
//! `{signature, filename}` on every later request; the gateway never
//! persists it.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::filename;

/// Where a needle lives: the fid (shape `"<volumeId>,<needleKey>"`) and the
/// `host:port` of the volume that stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedleLocation {
    fid: String,
    volume_host: String,
}

impl NeedleLocation {
    pub fn new(volume_host: impl Into<String>, fid: impl Into<String>) -> Self {
        Self {
            fid: fid.into(),
            volume_host: volume_host.into(),
        }
    }

    /// Reconstruct a location from a volume host and an encoded filename.
    /// Used when a signature is decoded.
    pub fn from_filename(volume_host: &str, filename_str: &str) -> Result<Self, AppError> {
        let fid = filename::decode_filename(filename_str)?;
        Ok(Self {
            fid,
            volume_host: volume_host.to_string(),
        })
    }

    /// The externally visible filename: base64 of the fid, no extension.
    pub fn filename(&self) -> String {
        filename::encode_fid(&self.fid)
    }

    pub fn fid(&self) -> &str {
        &self.fid
    }

    /// The volume id part of the fid.
    pub fn volume_id(&self) -> &str {
        self.fid.split(',').next().unwrap_or("")
    }

    /// The `host:port` of the volume holding this needle.
    pub fn volume_host(&self) -> &str {
        &self.volume_host
    }

    /// Full URL of the needle on its volume.
    pub fn public_url(&self) -> String {
        format!("http://{}/{}", self.volume_host, self.fid)
    }
}

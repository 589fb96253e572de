//! Capability signer
//!
//! A capability token binds the declared upload policy to a backing-store
//! location and filename so any gateway instance sharing the secret can
//! verify it statelessly. The token is `"1$" + b64url(nonce) + "$" +
//! b64url(ciphertext)` where the ciphertext is the AES-128-GCM seal of a
//! MessagePack record `{policy, volume host, crc32(filename), expiry}`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes128Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::location::NeedleLocation;
use crate::policy::{unix_now, AssignPolicy, CompactPolicy};

const TOKEN_VERSION: &str = "1";
const NONCE_LEN: usize = 12;

/// The sealed signature record. Field names are the on-wire MessagePack map
/// keys.
#[derive(Debug, Serialize, Deserialize)]
struct SignatureRecord {
    #[serde(rename = "r")]
    policy: CompactPolicy,
    /// Volume `host:port`, so the upload needs no second lookup.
    #[serde(rename = "u")]
    volume_host: String,
    /// CRC-32 (IEEE) of the encoded filename.
    #[serde(rename = "c")]
    crc: u32,
    /// Unix-seconds expiry, 0 = never.
    #[serde(rename = "e")]
    expires_at: i64,
}

/// Signs and verifies capability tokens under a shared 16-byte secret.
///
/// The cipher is safe for concurrent use, so one `Signer` is shared across
/// all request handlers.
#[derive(Clone)]
pub struct Signer {
    cipher: Aes128Gcm,
}

impl Signer {
    /// Create a signer from the configured secret. The secret must be
    /// exactly 16 bytes (AES-128).
    pub fn new(secret: &str) -> Result<Self, AppError> {
        let key_bytes = secret.as_bytes();
        if key_bytes.len() != 16 {
            return Err(AppError::Internal(
                "signing secret must be exactly 16 bytes".to_string(),
            ));
        }
        let key = Key::<Aes128Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes128Gcm::new(key),
        })
    }

    /// Seal a capability token for the given policy and location.
    pub fn sign(&self, policy: &AssignPolicy, location: &NeedleLocation) -> Result<String, AppError> {
        let record = SignatureRecord {
            policy: policy.compact(),
            volume_host: location.volume_host().to_string(),
            crc: crc32fast::hash(location.filename().as_bytes()),
            expires_at: policy.expires_at(),
        };
        let plain = rmp_serde::to_vec_named(&record)
            .map_err(|e| AppError::Internal(format!("signature encoding failed: {}", e)))?;

        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plain.as_slice())
            .map_err(|e| AppError::Internal(format!("signature sealing failed: {}", e)))?;

        Ok(format!(
            "{}${}${}",
            TOKEN_VERSION,
            URL_SAFE.encode(nonce),
            URL_SAFE.encode(sealed)
        ))
    }

    /// Open a capability token and check it authorizes `filename`.
    ///
    /// Returns the policy the signature was issued under and the location
    /// reconstructed from the sealed volume host plus the filename's fid.
    pub fn verify(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<(AssignPolicy, NeedleLocation), AppError> {
        let parts: Vec<&str> = token.split('$').collect();
        if parts.len() != 3 || parts[0] != TOKEN_VERSION {
            tracing::debug!(parts = parts.len(), "signature had invalid shape");
            return Err(AppError::InvalidSignature);
        }
        let nonce = URL_SAFE
            .decode(parts[1])
            .map_err(|_| AppError::InvalidSignature)?;
        let sealed = URL_SAFE
            .decode(parts[2])
            .map_err(|_| AppError::InvalidSignature)?;
        if nonce.len() != NONCE_LEN {
            return Err(AppError::InvalidSignature);
        }

        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| AppError::InvalidSignature)?;
        let record: SignatureRecord =
            rmp_serde::from_slice(&plain).map_err(|_| AppError::InvalidSignature)?;

        if record.expires_at > 0 && unix_now() > record.expires_at {
            tracing::debug!(expires_at = record.expires_at, "signature expired");
            return Err(AppError::SignatureExpired);
        }

        let location = NeedleLocation::from_filename(&record.volume_host, filename)
            .map_err(|_| AppError::UnauthorizedFilename)?;
        if crc32fast::hash(location.filename().as_bytes()) != record.crc {
            tracing::debug!(filename = %filename, "filename does not match signature crc");
            return Err(AppError::UnauthorizedFilename);
        }

        Ok((record.policy.expand(), location))
    }
}

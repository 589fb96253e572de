//! Upload policy model
//!
//! The declared policy arrives as query parameters on assign and constrains
//! the later upload. A compact projection of it travels inside the
//! capability signature; fields the gateway never re-consults after
//! verification (replication, the signature-expiry duration) are not
//! carried.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Known file-type tags. Index 0 is the unset tag; only `image` is validated
/// against content today.
const FILE_TYPES: [&str; 2] = ["", "image"];

/// Unix seconds now.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn file_type_index(t: &str) -> Option<i64> {
    FILE_TYPES.iter().position(|v| *v == t).map(|i| i as i64)
}

fn is_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// Parse a digit-string field where `""` and `"0"` both mean unset.
fn parse_or_unset(s: &str) -> i64 {
    if s.is_empty() || s == "0" {
        return 0;
    }
    s.parse().unwrap_or(0)
}

/// The constraints a client declares for a future upload.
///
/// The numeric fields are kept as the digit strings they arrive as in the
/// query; zero/empty means unset (`max_size` unbounded, `sig_expires` never
/// expires). Use [`AssignPolicy::max_size_bytes`] and
/// [`AssignPolicy::expires_at`] for the parsed values. `replication` and
/// `ttl` are opaque and forwarded to the backing store verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignPolicy {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub file_type: String,

    /// Maximum number of bytes the uploaded file can be, as a digit string.
    #[serde(rename = "max_size", default, skip_serializing_if = "String::is_empty")]
    pub max_size: String,

    /// Forwarded to the backing store on assign, never interpreted here.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub replication: String,

    /// Forwarded to the backing store on assign and upload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ttl: String,

    /// Lifetime of the generated signature in seconds, as a digit string.
    #[serde(rename = "sig_expires", default, skip_serializing_if = "String::is_empty")]
    pub sig_expires: String,
}

impl AssignPolicy {
    /// Admission check for a declared policy: the file type must be a known
    /// tag and the numeric fields must be all-digit strings (empty allowed).
    pub fn validate(&self) -> Result<(), AppError> {
        if file_type_index(&self.file_type).is_none() {
            return Err(AppError::InvalidArguments(format!(
                "unknown type: {}",
                self.file_type
            )));
        }
        if !is_digits(&self.max_size) {
            return Err(AppError::InvalidArguments(
                "max_size must be a non-negative integer".to_string(),
            ));
        }
        if !is_digits(&self.sig_expires) {
            return Err(AppError::InvalidArguments(
                "sig_expires must be a non-negative integer".to_string(),
            ));
        }
        Ok(())
    }

    /// The size cap in bytes, 0 if unset.
    pub fn max_size_bytes(&self) -> i64 {
        parse_or_unset(&self.max_size)
    }

    /// Unix time at which a signature generated from this policy expires, or
    /// 0 if it never does. Consumed at sign time only.
    pub fn expires_at(&self) -> i64 {
        let seconds = parse_or_unset(&self.sig_expires);
        if seconds == 0 {
            0
        } else {
            unix_now() + seconds
        }
    }

    /// Query parameters equivalent to this policy, for clients building an
    /// assign request.
    pub fn url_values(&self) -> Vec<(&'static str, String)> {
        let mut v = Vec::new();
        if !self.file_type.is_empty() {
            v.push(("type", self.file_type.clone()));
        }
        if !self.max_size.is_empty() {
            v.push(("max_size", self.max_size.clone()));
        }
        if !self.replication.is_empty() {
            v.push(("replication", self.replication.clone()));
        }
        if !self.ttl.is_empty() {
            v.push(("ttl", self.ttl.clone()));
        }
        if !self.sig_expires.is_empty() {
            v.push(("sig_expires", self.sig_expires.clone()));
        }
        v
    }

    /// Project this policy onto the fields the gateway re-consults when the
    /// upload arrives.
    pub fn compact(&self) -> CompactPolicy {
        CompactPolicy {
            file_type_index: file_type_index(&self.file_type).unwrap_or(0),
            max_size: self.max_size_bytes(),
            ttl: self.ttl.clone(),
        }
    }
}

/// The in-signature form of a policy. Field names are the on-wire
/// MessagePack map keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactPolicy {
    #[serde(rename = "i")]
    pub file_type_index: i64,
    #[serde(rename = "s")]
    pub max_size: i64,
    #[serde(rename = "t")]
    pub ttl: String,
}

impl CompactPolicy {
    /// Rebuild a declared policy from the compact form. Fields not carried
    /// in the signature come back zeroed.
    pub fn expand(&self) -> AssignPolicy {
        let file_type = usize::try_from(self.file_type_index)
            .ok()
            .and_then(|i| FILE_TYPES.get(i))
            .copied()
            .unwrap_or("")
            .to_string();
        let max_size = if self.max_size > 0 {
            self.max_size.to_string()
        } else {
            String::new()
        };
        AssignPolicy {
            file_type,
            max_size,
            ttl: self.ttl.clone(),
            ..Default::default()
        }
    }
}

/// An assignment: the signature and filename a client needs to upload one
/// file. The signature is the sole authorization for that upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "sig")]
    pub signature: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known_types() {
        assert!(AssignPolicy::default().validate().is_ok());
        let p = AssignPolicy {
            file_type: "image".to_string(),
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let p = AssignPolicy {
            file_type: "video".to_string(),
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(AppError::InvalidArguments(_))));
    }

    #[test]
    fn test_validate_rejects_non_numeric_strings() {
        let p = AssignPolicy {
            max_size: "-1".to_string(),
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = AssignPolicy {
            sig_expires: "2m".to_string(),
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_empty_numeric_fields_are_unset() {
        // present-but-empty query values arrive as empty strings
        let p = AssignPolicy {
            max_size: String::new(),
            sig_expires: String::new(),
            ..Default::default()
        };
        assert!(p.validate().is_ok());
        assert_eq!(p.max_size_bytes(), 0);
        assert_eq!(p.expires_at(), 0);
    }

    #[test]
    fn test_zero_string_is_unset() {
        let p = AssignPolicy {
            max_size: "0".to_string(),
            sig_expires: "0".to_string(),
            ..Default::default()
        };
        assert!(p.validate().is_ok());
        assert_eq!(p.max_size_bytes(), 0);
        assert_eq!(p.expires_at(), 0);
    }

    #[test]
    fn test_max_size_bytes_parses() {
        let p = AssignPolicy {
            max_size: "1024".to_string(),
            ..Default::default()
        };
        assert_eq!(p.max_size_bytes(), 1024);
    }

    #[test]
    fn test_compact_round_trip_preserved_fields() {
        let p = AssignPolicy {
            file_type: "image".to_string(),
            max_size: "1024".to_string(),
            replication: "001".to_string(),
            ttl: "2m".to_string(),
            sig_expires: "60".to_string(),
        };
        let expanded = p.compact().expand();
        assert_eq!(expanded.file_type, "image");
        assert_eq!(expanded.max_size, "1024");
        assert_eq!(expanded.ttl, "2m");
        // not carried through the signature
        assert_eq!(expanded.replication, "");
        assert_eq!(expanded.sig_expires, "");
    }

    #[test]
    fn test_expand_out_of_range_index_is_unset() {
        let c = CompactPolicy {
            file_type_index: 99,
            max_size: 0,
            ttl: String::new(),
        };
        let expanded = c.expand();
        assert_eq!(expanded.file_type, "");
        assert_eq!(expanded.max_size, "");
    }

    #[test]
    fn test_expires_at() {
        let p = AssignPolicy::default();
        assert_eq!(p.expires_at(), 0);

        let p = AssignPolicy {
            sig_expires: "60".to_string(),
            ..Default::default()
        };
        let at = p.expires_at();
        assert!(at > unix_now() + 58 && at <= unix_now() + 60);
    }

    #[test]
    fn test_url_values_skips_unset() {
        let p = AssignPolicy {
            file_type: "image".to_string(),
            max_size: "1024".to_string(),
            ..Default::default()
        };
        let vals = p.url_values();
        assert_eq!(
            vals,
            vec![("type", "image".to_string()), ("max_size", "1024".to_string())]
        );
    }
}

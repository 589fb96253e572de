//! Dank core library
//!
//! This crate provides the domain types shared across the dank gateway:
//! the declared upload policy, the filename codec, the capability signer,
//! the upload validator, configuration, and the unified error type.

pub mod config;
pub mod error;
pub mod filename;
pub mod location;
pub mod policy;
pub mod signer;
pub mod validate;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, LogLevel};
pub use location::NeedleLocation;
pub use policy::{AssignPolicy, Assignment, CompactPolicy};
pub use signer::Signer;
pub use validate::{validate_upload, UploadBody};

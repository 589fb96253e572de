//! Error types module
//!
//! All errors observable at the gateway boundary are unified under the
//! `AppError` enum. Each variant knows its HTTP status code and whether its
//! message may be shown to clients; 500-class errors always render as an
//! opaque "internal error" so upstream details never leak.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like upstream 404s
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid arguments sent: {0}")]
    InvalidArguments(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("signature expired")]
    SignatureExpired,

    #[error("unauthorized filename sent")]
    UnauthorizedFilename,

    #[error("invalid filename sent: {0}")]
    InvalidFilename(String),

    #[error("invalid body uploaded: {0}")]
    InvalidBody(String),

    #[error("invalid filetype uploaded")]
    InvalidFiletype,

    #[error("request too large")]
    RequestTooLarge,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code this error renders as.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidArguments(_)
            | AppError::InvalidSignature
            | AppError::SignatureExpired
            | AppError::UnauthorizedFilename
            | AppError::InvalidFilename(_)
            | AppError::InvalidBody(_)
            | AppError::InvalidFiletype => 400,
            AppError::NotFound(_) => 404,
            AppError::RequestTooLarge => 413,
            AppError::Storage(_) | AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::SignatureExpired => "SIGNATURE_EXPIRED",
            AppError::UnauthorizedFilename => "UNAUTHORIZED_FILENAME",
            AppError::InvalidFilename(_) => "INVALID_FILENAME",
            AppError::InvalidBody(_) => "INVALID_BODY",
            AppError::InvalidFiletype => "INVALID_FILETYPE",
            AppError::RequestTooLarge => "REQUEST_TOO_LARGE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Public (non-500) errors propagate their message
    /// verbatim; everything else is opaque.
    pub fn client_message(&self) -> String {
        if self.http_status_code() < 500 {
            self.to_string()
        } else {
            "internal error".to_string()
        }
    }

    /// Log level for this error.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Storage(_) | AppError::Internal(_) => LogLevel::Error,
            AppError::NotFound(_) => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

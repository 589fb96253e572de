//! Storage operation errors

use dank_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SeaweedError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("filename not found: {0}")]
    NotFound(String),

    #[error("invalid filename sent: {0}")]
    InvalidFilename(String),

    #[error("invalid response from master: {0}")]
    Decode(String),
}

impl From<SeaweedError> for AppError {
    fn from(err: SeaweedError) -> Self {
        match err {
            SeaweedError::NotFound(f) => AppError::NotFound(format!("filename not found: {}", f)),
            SeaweedError::InvalidFilename(f) => AppError::InvalidFilename(f),
            other => AppError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = SeaweedError::NotFound("abc".to_string()).into();
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_upstream_status_maps_to_500() {
        let err: AppError = SeaweedError::UnexpectedStatus {
            status: 502,
            url: "http://master/dir/assign".to_string(),
        }
        .into();
        assert_eq!(err.http_status_code(), 500);
        // upstream details stay out of the client message
        assert_eq!(err.client_message(), "internal error");
    }

    #[test]
    fn test_invalid_filename_maps_to_400() {
        let err: AppError = SeaweedError::InvalidFilename("!!".to_string()).into();
        assert_eq!(err.http_status_code(), 400);
    }
}

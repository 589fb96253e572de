//! Verify handler
//!
//! Validates a `{sig, filename}` pair without any side effect. Clients use
//! it to check an assignment they were handed before acting on it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use dank_core::AppError;

use crate::error::HttpAppError;
use crate::extract::ArgsQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyArgs {
    pub sig: String,
    pub filename: String,
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    ArgsQuery(args): ArgsQuery<VerifyArgs>,
) -> Result<StatusCode, HttpAppError> {
    tracing::debug!(filename = %args.filename, "received request to verify");

    if args.sig.is_empty() || args.filename.is_empty() {
        return Err(AppError::InvalidArguments("sig and filename are required".to_string()).into());
    }

    state.signer.verify(&args.sig, &args.filename)?;
    Ok(StatusCode::OK)
}

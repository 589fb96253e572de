//! Delete handlers
//!
//! When a signature is supplied it is verified against the filename first.
//! A bare filename is also accepted and deletes unauthenticated; this
//! mirrors the admin-style delete path and is called out in DESIGN.md.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use dank_core::AppError;

use crate::error::HttpAppError;
use crate::extract::ArgsQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteArgs {
    #[serde(default)]
    pub sig: String,
    #[serde(default)]
    pub filename: String,
}

pub async fn delete_query(
    State(state): State<Arc<AppState>>,
    ArgsQuery(args): ArgsQuery<DeleteArgs>,
) -> Result<StatusCode, HttpAppError> {
    delete_file(state, args).await
}

pub async fn delete_path(
    State(state): State<Arc<AppState>>,
    Path(path_filename): Path<String>,
    ArgsQuery(mut args): ArgsQuery<DeleteArgs>,
) -> Result<StatusCode, HttpAppError> {
    if args.filename.is_empty() {
        args.filename = path_filename;
    }
    delete_file(state, args).await
}

async fn delete_file(state: Arc<AppState>, args: DeleteArgs) -> Result<StatusCode, HttpAppError> {
    tracing::debug!(filename = %args.filename, "received request to delete");

    if args.filename.is_empty() {
        return Err(AppError::NotFound("no filename sent".to_string()).into());
    }

    if !args.sig.is_empty() {
        state.signer.verify(&args.sig, &args.filename)?;
    }

    state.seaweed.delete(&args.filename).await?;
    Ok(StatusCode::OK)
}

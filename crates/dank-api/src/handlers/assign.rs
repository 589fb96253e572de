//! Assign handler
//!
//! Admits a declared policy, asks the master for a location, and returns
//! the `{sig, filename}` assignment that authorizes exactly one upload.

use std::sync::Arc;

use axum::{extract::State, Json};
use dank_core::{AssignPolicy, Assignment};

use crate::error::HttpAppError;
use crate::extract::ArgsQuery;
use crate::state::AppState;

pub async fn assign(
    State(state): State<Arc<AppState>>,
    ArgsQuery(policy): ArgsQuery<AssignPolicy>,
) -> Result<Json<Assignment>, HttpAppError> {
    tracing::debug!(
        file_type = %policy.file_type,
        max_size = %policy.max_size,
        "received request to assign"
    );
    policy.validate()?;

    let location = state
        .seaweed
        .assign(&policy.replication, &policy.ttl)
        .await?;
    let signature = state.signer.sign(&policy, &location)?;

    tracing::debug!(
        filename = %location.filename(),
        volume = %location.volume_host(),
        "created signature for file"
    );

    Ok(Json(Assignment {
        signature,
        filename: location.filename(),
    }))
}

//! Get handlers
//!
//! Serves a file by proxying the volume through the master lookup, or, for
//! HEAD requests carrying `X-Upstream-Redirect`, answers 307 with the
//! volume URL so the client can fetch the bytes itself.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::Response;
use serde::Deserialize;

use dank_core::AppError;

use crate::error::HttpAppError;
use crate::extract::ArgsQuery;
use crate::state::AppState;

/// Request headers forwarded to the volume.
static HEADERS_TO_SEND: [HeaderName; 4] = [
    header::IF_MODIFIED_SINCE,
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::RANGE,
];

/// Response headers copied back to the client.
static HEADERS_TO_COPY: [HeaderName; 7] = [
    header::CONTENT_TYPE,
    header::LAST_MODIFIED,
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
    header::ACCEPT_RANGES,
    header::EXPIRES,
    header::CACHE_CONTROL,
];

static X_UPSTREAM_REDIRECT: HeaderName = HeaderName::from_static("x-upstream-redirect");

#[derive(Debug, Default, Deserialize)]
pub struct GetArgs {
    #[serde(default)]
    pub filename: String,
}

pub async fn get_query(
    State(state): State<Arc<AppState>>,
    ArgsQuery(args): ArgsQuery<GetArgs>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, HttpAppError> {
    serve_file(state, args.filename, method, headers, raw_query).await
}

pub async fn get_path(
    State(state): State<Arc<AppState>>,
    Path(path_filename): Path<String>,
    ArgsQuery(args): ArgsQuery<GetArgs>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, HttpAppError> {
    let filename = if args.filename.is_empty() {
        path_filename
    } else {
        args.filename
    };
    serve_file(state, filename, method, headers, raw_query).await
}

async fn serve_file(
    state: Arc<AppState>,
    filename: String,
    method: Method,
    headers: HeaderMap,
    raw_query: Option<String>,
) -> Result<Response, HttpAppError> {
    tracing::debug!(filename = %filename, method = %method, "received request to get");

    if filename.is_empty() {
        return Err(AppError::NotFound("no filename sent".to_string()).into());
    }

    let url_params = first_query_vals(raw_query.as_deref(), &filename);

    if method == Method::HEAD && headers.contains_key(&X_UPSTREAM_REDIRECT) {
        let url = state.seaweed.lookup(&filename, &url_params).await?;
        tracing::debug!(url = %url, "returning location for upstream redirect");
        let resp = Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, url.as_str())
            .body(Body::empty())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        return Ok(resp);
    }

    let mut forwarded = HeaderMap::new();
    for name in &HEADERS_TO_SEND {
        if let Some(value) = headers.get(name) {
            forwarded.insert(name.clone(), value.clone());
        }
    }

    let upstream = state.seaweed.get(&filename, forwarded, &url_params).await?;

    let mut builder = Response::builder().status(upstream.status);
    for name in &HEADERS_TO_COPY {
        if let Some(value) = upstream.headers.get(name) {
            builder = builder.header(name.clone(), value.clone());
        }
    }

    // HEAD responses never carry a body; the upstream GET body is dropped
    let body = match upstream.body {
        Some(stream) if method == Method::GET => Body::from_stream(stream),
        _ => Body::empty(),
    };
    builder
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()).into())
}

/// First value per key of the raw query, minus the filename param that
/// routed the request (everything else passes through to the volume).
fn first_query_vals(raw_query: Option<&str>, filename: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let Some(raw) = raw_query else {
        return out;
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
    for (key, value) in pairs {
        if key == "filename" && value == filename {
            continue;
        }
        if !out.iter().any(|(k, _)| *k == key) {
            out.push((key, value));
        }
    }
    out
}

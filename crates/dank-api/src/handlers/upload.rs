//! Upload handler
//!
//! Reduces the three accepted body shapes (raw stream, multipart/urlencoded
//! form field, data URL) to a single `(body, content type)` pair, then
//! verifies the capability, validates the body against the sealed policy,
//! and streams it to the volume the signature names.

use std::io;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::Json;
use bytes::Bytes;
use data_url::DataUrl;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use dank_core::{validate_upload, AppError, UploadBody};

use crate::error::HttpAppError;
use crate::extract::ArgsQuery;
use crate::state::AppState;

const DEFAULT_FORM_KEY: &str = "file";

#[derive(Debug, Deserialize)]
pub struct UploadArgs {
    pub sig: String,
    pub filename: String,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub form_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    ArgsQuery(args): ArgsQuery<UploadArgs>,
    req: Request,
) -> Result<Json<UploadResponse>, HttpAppError> {
    if args.sig.is_empty() || args.filename.is_empty() {
        return Err(AppError::InvalidArguments("sig and filename are required".to_string()).into());
    }

    let content_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let outer_ct = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    // an unparseable content type falls through to the raw-body path
    let media_type = outer_ct
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();

    tracing::debug!(
        filename = %args.filename,
        length = ?content_length,
        content_type = %outer_ct,
        media_type = %media_type,
        "received request to upload file"
    );

    let form_key = args.form_key.as_deref().unwrap_or(DEFAULT_FORM_KEY).to_string();
    let (body, content_type) = resolve_body(req, &media_type, &outer_ct, &form_key).await?;

    let (policy, location) = state.signer.verify(&args.sig, &args.filename)?;
    let body = validate_upload(body, content_length, &policy).await?;

    let ts = args.last_modified.clone().unwrap_or_else(now_unix_string);
    let mut url_params = vec![("ts".to_string(), ts)];
    if !policy.ttl.is_empty() {
        url_params.push(("ttl".to_string(), policy.ttl.clone()));
    }

    state
        .seaweed
        .upload(&location, body, &content_type, &url_params)
        .await?;

    Ok(Json(UploadResponse {
        filename: args.filename,
        content_type,
    }))
}

/// Reduce the request to `(body, content type)` according to its media type.
async fn resolve_body(
    req: Request,
    media_type: &str,
    outer_ct: &str,
    form_key: &str,
) -> Result<(UploadBody, String), HttpAppError> {
    match media_type {
        "multipart/form-data" => {
            let mut multipart = Multipart::from_request(req, &())
                .await
                .map_err(|e| AppError::InvalidBody(format!("error reading form: {}", e)))?;
            loop {
                let field = multipart
                    .next_field()
                    .await
                    .map_err(|e| AppError::InvalidBody(format!("error reading form: {}", e)))?;
                let Some(field) = field else {
                    return Err(
                        AppError::InvalidBody(format!("error reading form key: {}", form_key))
                            .into(),
                    );
                };
                if field.name() == Some(form_key) {
                    let ct = field.content_type().unwrap_or("").to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::InvalidBody(format!("error reading form key: {}", e))
                    })?;
                    return Ok((UploadBody::from_bytes(bytes), ct));
                }
            }
        }
        "application/x-www-form-urlencoded" => {
            let bytes = read_all(req).await?;
            let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| AppError::InvalidBody(format!("error reading form: {}", e)))?;
            match fields.into_iter().find(|(k, _)| k == form_key) {
                Some((_, value)) => Ok((
                    UploadBody::from_bytes(Bytes::from(value.into_bytes())),
                    String::new(),
                )),
                None => Err(
                    AppError::InvalidBody(format!("error reading form key: {}", form_key)).into(),
                ),
            }
        }
        "application/data-url" => {
            let bytes = read_all(req).await?;
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| AppError::InvalidBody(format!("error reading data-url: {}", e)))?;
            let du = DataUrl::process(text.trim())
                .map_err(|e| AppError::InvalidBody(format!("error reading data-url: {}", e)))?;
            let ct = du.mime_type().to_string();
            let (data, _) = du
                .decode_to_vec()
                .map_err(|e| AppError::InvalidBody(format!("error reading data-url: {}", e)))?;
            Ok((UploadBody::from_bytes(data), ct))
        }
        _ => {
            let stream = req
                .into_body()
                .into_data_stream()
                .map(|chunk| chunk.map_err(io::Error::other))
                .boxed();
            Ok((UploadBody::from_stream(stream), outer_ct.to_string()))
        }
    }
}

async fn read_all(req: Request) -> Result<Bytes, HttpAppError> {
    axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|e| AppError::InvalidBody(format!("error reading body: {}", e)).into())
}

fn now_unix_string() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}

//! Seaweed master and volume operations

use futures::StreamExt;
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode, Url};
use serde::Deserialize;
use std::io;
use std::time::Duration;

use dank_core::validate::{ByteStream, UploadBody};
use dank_core::{filename, NeedleLocation};

use crate::error::SeaweedError;
use crate::resolve::SrvResolver;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Assign response from the master. Only the fields the gateway consumes.
#[derive(Debug, Deserialize)]
struct RawAssignResult {
    fid: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[serde(default)]
    locations: Vec<LookupLocation>,
}

#[derive(Debug, Deserialize)]
struct LookupLocation {
    url: String,
}

/// Result of fetching a file from a volume. `body` is set on 200 only;
/// 304 and 416 carry headers alone.
pub struct SeaweedGetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<ByteStream>,
}

/// Client for one master (and the volumes it reports). The underlying HTTP
/// client pools connections and is shared across requests.
#[derive(Clone)]
pub struct SeaweedClient {
    master_addr: String,
    http: reqwest::Client,
    resolver: SrvResolver,
}

impl SeaweedClient {
    pub fn new(master_addr: impl Into<String>) -> Self {
        Self::with_resolver(master_addr, SrvResolver::from_system())
    }

    pub fn with_resolver(master_addr: impl Into<String>, resolver: SrvResolver) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("default reqwest client");
        Self {
            master_addr: master_addr.into(),
            http,
            resolver,
        }
    }

    /// The master address is re-resolved for every request so SRV changes
    /// take effect immediately.
    async fn master_url(&self, path: &str) -> Result<Url, SeaweedError> {
        let addr = self.resolver.maybe_srv(&self.master_addr).await;
        Url::parse(&format!("http://{}{}", addr, path))
            .map_err(|e| SeaweedError::Decode(format!("bad master url: {}", e)))
    }

    /// Ask the master for a fresh fid and the volume to upload it to.
    pub async fn assign(
        &self,
        replication: &str,
        ttl: &str,
    ) -> Result<NeedleLocation, SeaweedError> {
        let mut url = self.master_url("/dir/assign").await?;
        {
            let mut q = url.query_pairs_mut();
            if !replication.is_empty() {
                q.append_pair("replication", replication);
            }
            if !ttl.is_empty() {
                q.append_pair("ttl", ttl);
            }
        }
        tracing::debug!(url = %url, "making seaweed assign request");

        let resp = self.http.get(url.clone()).send().await.map_err(|e| transport(&url, e))?;
        let resp = expect_status(resp, &[StatusCode::OK], &url).await?;
        let raw: RawAssignResult = resp
            .json()
            .await
            .map_err(|e| SeaweedError::Decode(format!("assign response: {}", e)))?;
        Ok(NeedleLocation::new(raw.url, raw.fid))
    }

    /// Resolve a filename to the absolute URL of its needle on one of the
    /// volumes currently holding it, chosen uniformly at random.
    pub async fn lookup(
        &self,
        filename_str: &str,
        url_params: &[(String, String)],
    ) -> Result<Url, SeaweedError> {
        let fid = filename::decode_filename(filename_str)
            .map_err(|_| SeaweedError::InvalidFilename(filename_str.to_string()))?;
        let volume_id = fid.split(',').next().unwrap_or("");

        let mut url = self.master_url("/dir/lookup").await?;
        url.query_pairs_mut().append_pair("volumeId", volume_id);
        tracing::debug!(url = %url, "making seaweed lookup request");

        let resp = self.http.get(url.clone()).send().await.map_err(|e| transport(&url, e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SeaweedError::NotFound(filename_str.to_string()));
        }
        let resp = expect_status(resp, &[StatusCode::OK], &url).await?;
        let result: LookupResult = resp
            .json()
            .await
            .map_err(|e| SeaweedError::Decode(format!("lookup response: {}", e)))?;
        if result.locations.is_empty() {
            return Err(SeaweedError::NotFound(filename_str.to_string()));
        }

        let i = rand::rng().random_range(0..result.locations.len());
        let volume = &result.locations[i].url;
        let ext = filename::extension(filename_str);
        let mut needle_url = Url::parse(&format!("http://{}/{}{}", volume, fid, ext))
            .map_err(|e| SeaweedError::Decode(format!("bad volume url: {}", e)))?;
        if !url_params.is_empty() {
            let mut q = needle_url.query_pairs_mut();
            for (k, v) in url_params {
                q.append_pair(k, v);
            }
        }
        Ok(needle_url)
    }

    /// Stream a validated body to the volume named in the location. The
    /// volume only accepts multipart, so the body is wrapped in a single
    /// `file` form part.
    pub async fn upload(
        &self,
        location: &NeedleLocation,
        body: UploadBody,
        content_type: &str,
        url_params: &[(String, String)],
    ) -> Result<(), SeaweedError> {
        let mut url = Url::parse(&location.public_url())
            .map_err(|e| SeaweedError::Decode(format!("bad volume url: {}", e)))?;
        if !url_params.is_empty() {
            let mut q = url.query_pairs_mut();
            for (k, v) in url_params {
                q.append_pair(k, v);
            }
        }
        tracing::debug!(url = %url, "making seaweed upload request");

        let ct = if content_type.is_empty() {
            "application/octet-stream"
        } else {
            content_type
        };
        let part = match body.len() {
            Some(len) => Part::stream_with_length(Body::wrap_stream(body.into_stream()), len),
            None => Part::stream(Body::wrap_stream(body.into_stream())),
        };
        let part = part
            .file_name(location.filename())
            .mime_str(ct)
            .map_err(|e| SeaweedError::Decode(format!("bad content type {}: {}", ct, e)))?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .put(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SeaweedError::NotFound(location.filename()));
        }
        expect_status(resp, &[StatusCode::CREATED], &url).await?;
        Ok(())
    }

    /// Fetch a file, forwarding the given (already whitelisted) request
    /// headers. 304 and 416 are passed back without a body.
    pub async fn get(
        &self,
        filename_str: &str,
        headers: HeaderMap,
        url_params: &[(String, String)],
    ) -> Result<SeaweedGetResponse, SeaweedError> {
        let url = self.lookup(filename_str, url_params).await?;
        tracing::debug!(url = %url, filename = %filename_str, "making seaweed get request");

        let resp = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SeaweedError::NotFound(filename_str.to_string()));
        }
        let resp = expect_status(
            resp,
            &[
                StatusCode::OK,
                StatusCode::NOT_MODIFIED,
                StatusCode::RANGE_NOT_SATISFIABLE,
            ],
            &url,
        )
        .await?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body: Option<ByteStream> = if status == StatusCode::OK {
            Some(
                resp.bytes_stream()
                    .map(|chunk| chunk.map_err(io::Error::other))
                    .boxed(),
            )
        } else {
            None
        };
        Ok(SeaweedGetResponse {
            status,
            headers,
            body,
        })
    }

    /// Delete a file everywhere the master says it lives.
    pub async fn delete(&self, filename_str: &str) -> Result<(), SeaweedError> {
        let url = self.lookup(filename_str, &[]).await?;
        tracing::debug!(url = %url, filename = %filename_str, "making seaweed delete request");

        let resp = self
            .http
            .delete(url.clone())
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SeaweedError::NotFound(filename_str.to_string()));
        }
        expect_status(resp, &[StatusCode::ACCEPTED], &url).await?;
        Ok(())
    }
}

fn transport(url: &Url, source: reqwest::Error) -> SeaweedError {
    tracing::warn!(url = %url, error = %source, "seaweed request failed");
    SeaweedError::Transport {
        url: url.to_string(),
        source,
    }
}

async fn expect_status(
    resp: reqwest::Response,
    expected: &[StatusCode],
    url: &Url,
) -> Result<reqwest::Response, SeaweedError> {
    let status = resp.status();
    if expected.contains(&status) {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(url = %url, status = %status, body = %body, "unexpected seaweed status");
    Err(SeaweedError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

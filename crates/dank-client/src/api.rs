//! Domain methods for the dank client: assign, upload, verify, delete.

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

use dank_core::{AssignPolicy, Assignment};

use crate::Client;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: String,
}

impl Client {
    /// Request an assignment. Send `None` for a policy with no restrictions.
    pub async fn assign(&self, policy: Option<&AssignPolicy>) -> Result<Assignment> {
        let url = self.base_url("/assign").await;
        let mut req = self.http().get(&url);
        if let Some(policy) = policy {
            req = req.query(&policy.url_values());
        }

        let resp = req.send().await.context("assign request failed")?;
        if !resp.status().is_success() {
            bail!("unexpected code from dank: {}", resp.status().as_u16());
        }
        resp.json().await.context("decode assign response")
    }

    /// Upload a byte buffer under the given assignment, creating one when
    /// `None` is passed. Returns the filename uploaded to.
    pub async fn upload(&self, body: Vec<u8>, assignment: Option<Assignment>) -> Result<String> {
        let assignment = match assignment {
            Some(a) => a,
            None => self.assign(None).await?,
        };

        // content type from the assigned filename's extension, when it has one
        let mime = mime_guess::from_path(&assignment.filename)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let part = Part::bytes(body)
            .file_name(assignment.filename.clone())
            .mime_str(mime)
            .context("build upload part")?;
        let form = Form::new().part("file", part);

        let url = self.base_url("/upload").await;
        let resp = self
            .http()
            .put(&url)
            .query(&[
                ("sig", assignment.signature.as_str()),
                ("filename", assignment.filename.as_str()),
            ])
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;
        if !resp.status().is_success() {
            bail!("unexpected code from dank: {}", resp.status().as_u16());
        }
        let uploaded: UploadResponse = resp.json().await.context("decode upload response")?;
        Ok(uploaded.filename)
    }

    /// Read a file off disk and upload it.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        assignment: Option<Assignment>,
    ) -> Result<String> {
        let path = path.as_ref();
        let body = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        self.upload(body, assignment).await
    }

    /// Check that an assignment's signature still authorizes its filename.
    pub async fn verify(&self, assignment: &Assignment) -> Result<()> {
        let url = self.base_url("/verify").await;
        let resp = self
            .http()
            .get(&url)
            .query(&[
                ("sig", assignment.signature.as_str()),
                ("filename", assignment.filename.as_str()),
            ])
            .send()
            .await
            .context("verify request failed")?;
        if !resp.status().is_success() {
            bail!("unexpected code from dank: {}", resp.status().as_u16());
        }
        Ok(())
    }

    /// Delete the assignment's file from the gateway.
    pub async fn delete(&self, assignment: &Assignment) -> Result<()> {
        let url = self.base_url("/delete").await;
        let resp = self
            .http()
            .post(&url)
            .query(&[
                ("sig", assignment.signature.as_str()),
                ("filename", assignment.filename.as_str()),
            ])
            .send()
            .await
            .context("delete request failed")?;
        if !resp.status().is_success() {
            bail!("unexpected code from dank: {}", resp.status().as_u16());
        }
        Ok(())
    }
}

//! Client for a dank gateway.
//!
//! The gateway hostname is optimistically resolved through a SRV record
//! before each request; resolution failures fall back to the configured
//! name.

mod api;

use dank_seaweed::SrvResolver;

pub use dank_core::{AssignPolicy, Assignment};

pub struct Client {
    hostname: String,
    http: reqwest::Client,
    resolver: SrvResolver,
}

impl Client {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::with_resolver(hostname, SrvResolver::from_system())
    }

    pub fn with_resolver(hostname: impl Into<String>, resolver: SrvResolver) -> Self {
        Self {
            hostname: hostname.into(),
            http: reqwest::Client::new(),
            resolver,
        }
    }

    pub(crate) async fn base_url(&self, path: &str) -> String {
        let addr = self.resolver.maybe_srv(&self.hostname).await;
        format!("http://{}{}", addr, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

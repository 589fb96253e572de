//! Service registry registration
//!
//! When a registry address is configured, a background task keeps this
//! instance advertised as `{service: "dank", addr: <listen addr>}` over a
//! long-lived TCP connection with periodic keepalives. Losing the
//! connection more times than the reconnect budget allows is fatal: an
//! instance nobody can discover should not keep serving.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use dank_seaweed::SrvResolver;

const SERVICE_NAME: &str = "dank";
const RECONNECT_ATTEMPTS: u32 = 3;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct Registration<'a> {
    service: &'a str,
    addr: &'a str,
}

/// Keep this instance registered. Only returns once the reconnect budget is
/// spent; the caller treats that as fatal.
pub async fn maintain(registry_addr: String, listen_addr: String) -> Result<()> {
    let resolver = SrvResolver::from_system();
    let mut attempts = 0;
    loop {
        let addr = resolver.maybe_srv(&registry_addr).await;
        tracing::info!(registry = %addr, "connecting to service registry");
        let err = match advertise(&addr, &listen_addr).await {
            Ok(never) => match never {},
            Err(e) => e,
        };
        attempts += 1;
        tracing::warn!(error = %err, attempts, "registry connection lost");
        if attempts >= RECONNECT_ATTEMPTS {
            bail!("registry unreachable after {} attempts: {}", attempts, err);
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Register and hold the connection, writing a keepalive line on an
/// interval. The connection breaking is the only way out.
async fn advertise(addr: &str, listen_addr: &str) -> Result<Infallible> {
    let mut stream = TcpStream::connect(addr)
        .await
        .context("connect to registry")?;

    let mut line = serde_json::to_vec(&Registration {
        service: SERVICE_NAME,
        addr: listen_addr,
    })?;
    line.push(b'\n');
    stream.write_all(&line).await.context("send registration")?;
    tracing::info!(registry = %addr, service = SERVICE_NAME, "registered with service registry");

    loop {
        tokio::time::sleep(KEEPALIVE_INTERVAL).await;
        stream.write_all(b"{}\n").await.context("send keepalive")?;
    }
}

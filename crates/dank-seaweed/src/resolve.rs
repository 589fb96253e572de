//! Optimistic DNS-SRV resolution
//!
//! Addresses like `seaweed-master.service.consul` can be resolved through a
//! SRV record to a concrete `host:port` before each request. Resolution is
//! best-effort: anything that already carries a port, or fails to resolve,
//! is used as configured.

use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;

/// Wraps a tokio resolver built from the system configuration. When the
/// system configuration cannot be read, resolution is disabled and every
/// address passes through unchanged.
#[derive(Clone)]
pub struct SrvResolver {
    inner: Option<Resolver<TokioConnectionProvider>>,
}

impl SrvResolver {
    pub fn from_system() -> Self {
        let inner = match Resolver::builder_tokio() {
            Ok(builder) => Some(builder.build()),
            Err(e) => {
                tracing::warn!(error = %e, "system resolver unavailable, SRV resolution disabled");
                None
            }
        };
        Self { inner }
    }

    /// A resolver that never resolves. Used by tests talking to literal
    /// addresses.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Resolve `addr` via SRV when it names a service, otherwise return it
    /// unchanged. Called before every upstream request so a service-mesh
    /// re-pointing takes effect without a restart.
    pub async fn maybe_srv(&self, addr: &str) -> String {
        // host:port never has a SRV record
        if addr.contains(':') {
            return addr.to_string();
        }
        let Some(resolver) = &self.inner else {
            return addr.to_string();
        };
        match resolver.srv_lookup(addr).await {
            Ok(lookup) => match lookup.iter().next() {
                Some(srv) => {
                    let target = srv.target().to_utf8();
                    let target = target.trim_end_matches('.');
                    format!("{}:{}", target, srv.port())
                }
                None => addr.to_string(),
            },
            Err(e) => {
                tracing::debug!(addr = %addr, error = %e, "SRV lookup failed, using address as-is");
                addr.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_addr_with_port_passes_through() {
        let resolver = SrvResolver::disabled();
        assert_eq!(resolver.maybe_srv("127.0.0.1:9333").await, "127.0.0.1:9333");
    }

    #[tokio::test]
    async fn test_disabled_resolver_passes_through() {
        let resolver = SrvResolver::disabled();
        assert_eq!(resolver.maybe_srv("seaweed.internal").await, "seaweed.internal");
    }
}

//! Configuration module
//!
//! All configurable parameters for a gateway instance. The config is built
//! once at startup from command-line flags and is read-only afterwards;
//! constructors that need parts of it take them explicitly, so several
//! configurations can coexist in one process (tests do this).

use anyhow::{bail, Result};

/// Required length of the signing secret (AES-128).
pub const SECRET_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    /// `address:port` to listen for HTTP requests on.
    pub listen_addr: String,
    /// Address of the master instance of the backing store.
    pub master_addr: String,
    /// Secret used to seal upload signatures. Must be 16 bytes.
    pub secret: String,
    /// Address of the service registry; unset means don't register.
    pub registry_addr: Option<String>,
    /// Minimum log level to show.
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            bail!("listen address is required");
        }
        if self.master_addr.is_empty() {
            bail!("master address is required");
        }
        if self.secret.len() != SECRET_LEN {
            bail!(
                "secret must be exactly {} bytes, got {}",
                SECRET_LEN,
                self.secret.len()
            );
        }
        Ok(())
    }
}

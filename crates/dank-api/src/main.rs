use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dank_api::{registry, setup, AppState};
use dank_core::{Config, Signer};
use dank_seaweed::SeaweedClient;

#[derive(Parser)]
#[command(name = "dank", about = "Validating upload gateway in front of a seaweed cluster")]
struct Args {
    /// address:port to listen for http requests on
    #[arg(long, default_value = "0.0.0.0:8333")]
    listen_addr: String,

    /// Address of the master seaweed instance
    #[arg(long, default_value = "127.0.0.1:9333")]
    master_addr: String,

    /// Secret used to seal the signature when uploading. Must be 16 characters.
    #[arg(long, default_value = "uShouldChangThis")]
    secret: String,

    /// Hostname of the service registry, looked up via a SRV request.
    /// Unset means don't register.
    #[arg(long)]
    registry_addr: Option<String>,

    /// Minimum log level to show: debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            listen_addr: self.listen_addr,
            master_addr: self.master_addr,
            secret: self.secret,
            registry_addr: self.registry_addr,
            log_level: self.log_level,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config();
    init_tracing(&config.log_level);
    config.validate()?;

    let signer = Signer::new(&config.secret)?;
    let seaweed = SeaweedClient::new(&config.master_addr);
    let state = Arc::new(AppState::new(signer, seaweed));

    if let Some(registry_addr) = config.registry_addr.clone() {
        let listen_addr = config.listen_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = registry::maintain(registry_addr, listen_addr).await {
                tracing::error!(error = %e, "registry giving up reconnecting");
                std::process::exit(1);
            }
        });
    }

    let router = setup::routes::build_router(state);
    setup::server::start_server(&config, router).await
}

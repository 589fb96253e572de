//! SeaweedFS client
//!
//! Talks to two endpoint shapes: the master (`/dir/assign`, `/dir/lookup`)
//! and the volume nodes it reports (`PUT`/`GET`/`DELETE` on `/<fid>`). The
//! master address may be resolved through DNS-SRV before each request; the
//! volume addresses come back from the master and are used as-is.

pub mod client;
pub mod error;
pub mod resolve;

pub use client::{SeaweedClient, SeaweedGetResponse};
pub use error::SeaweedError;
pub use resolve::SrvResolver;

//! Shared application state
//!
//! Everything here is immutable after startup and safe to share across
//! request handlers: the signer reuses one AEAD instance and the seaweed
//! client pools its HTTP connections.

use dank_core::Signer;
use dank_seaweed::SeaweedClient;

pub struct AppState {
    pub signer: Signer,
    pub seaweed: SeaweedClient,
}

impl AppState {
    pub fn new(signer: Signer, seaweed: SeaweedClient) -> Self {
        Self { signer, seaweed }
    }
}

//! dank HTTP gateway
//!
//! Endpoint wiring, body shape handling, and response shaping around the
//! core signer/validator and the seaweed client. Exposed as a library so
//! integration tests can build the router in-process.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod registry;
pub mod setup;
pub mod state;

pub use state::AppState;

//! Request handlers, one module per endpoint.

pub mod assign;
pub mod delete;
pub mod get;
pub mod upload;
pub mod verify;

//! Typed query-argument extraction
//!
//! Each endpoint declares its argument record and extracts it with
//! `ArgsQuery<T>`; a parse failure renders as a 400 in our error shape
//! instead of axum's plain-text rejection.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use dank_core::AppError;
use serde::de::DeserializeOwned;

use crate::error::HttpAppError;

#[derive(Debug, Clone, Copy)]
pub struct ArgsQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ArgsQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| HttpAppError(AppError::InvalidArguments(e.body_text())))?;
        Ok(ArgsQuery(inner))
    }
}

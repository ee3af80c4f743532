use axum_core::extract::FromRequestParts;
use http::{StatusCode, request::Parts};

use crate::store::SessionStore;
use crate::{Flash, Session};

/// Axum Extractor for [`Session`].
impl<S, T> FromRequestParts<S> for Session<T>
where
    S: Sync + Send,
    T: SessionStore,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session<T>>().cloned().ok_or_else(|| {
            tracing::error!("session layer not found in the request extensions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "session not found in the request",
            )
        })
    }
}

/// Axum Extractor for the request's [`Flash`] message.
impl<S> FromRequestParts<S> for Flash
where
    S: Sync + Send,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Flash>().cloned().ok_or_else(|| {
            tracing::error!("session layer not found in the request extensions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "flash not found in the request",
            )
        })
    }
}

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

use super::handlers::blocking;
use super::Hireboard;
use crate::auth::{session_token, TenantContext};
use crate::domain::UserId;
use crate::error::ApiError;
use crate::store::Store;

/// A verified session without tenant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<Arc<Hireboard<S>>> for SessionUser
where
    S: Store + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<Hireboard<S>>,
    ) -> Result<Self, Self::Rejection> {
        state
            .gate()
            .authenticate(session_token(&parts.headers))
            .map(SessionUser)
    }
}

/// The full gate: any handler taking a [`TenantContext`] is unreachable without a valid
/// session and an owned company. The company lookup runs on the blocking pool.
#[axum::async_trait]
impl<S> FromRequestParts<Arc<Hireboard<S>>> for TenantContext
where
    S: Store + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<Hireboard<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).map(str::to_owned);
        blocking(state, move |app| app.gate().authorize(token.as_deref())).await
    }
}

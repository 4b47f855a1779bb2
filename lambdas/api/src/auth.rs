//! Caller identity.
//!
//! The fronting gateway authenticates the caller; this layer only resolves
//! the user id it forwards and makes it available to handlers.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated user id, injected into request extensions by
/// [`require_user`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub String);

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<String>;
}

/// Trusts a header set by the upstream authorizer.
pub struct TrustedHeader {
    header: HeaderName,
}

impl TrustedHeader {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl IdentityResolver for TrustedHeader {
    fn resolve(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = state
        .identity
        .resolve(req.headers())
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

//! Bearer token authentication middleware and extractors.
//!
//! Checks `Authorization: Bearer <token>` headers, verifies the session
//! token, applies the stored account's role and ban state and stores the
//! [`Principal`] in request extensions. Handlers read it back through
//! [`Viewer`], [`AuthUser`] or [`AdminUser`].

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::AppError;
use crate::listing::Viewer;
use crate::models::Principal;
use crate::state::AppState;

/// Middleware to authenticate Bearer session tokens.
///
/// If a valid Bearer token is present, sets the principal in request
/// extensions. If no token is present, passes through without modification.
/// An invalid token is rejected with 401 and a banned account with 403.
pub async fn authenticate_bearer_token(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let Some(auth_header) = auth_header else {
        return next.run(request).await;
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return next.run(request).await;
    };

    let principal = match state
        .tokens()
        .verify(token.trim())
        .and_then(|claims| claims.into_principal())
    {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "invalid bearer token");
            return AppError::Unauthorized("invalid token".to_string()).into_response();
        }
    };

    // Role and ban changes made by an admin apply before the token expires
    let principal = match state.store().find_user(principal.user_id).await {
        Ok(Some(account)) => principal.with_account(&account),
        Ok(None) => principal,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    if principal.is_banned {
        debug!(user_id = %principal.user_id, "banned user rejected");
        return AppError::Forbidden("your account has been banned".to_string()).into_response();
    }

    request.extensions_mut().insert(principal);

    next.run(request).await
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Principal>()
            .map(|p| Viewer::user(p.user_id))
            .unwrap_or_default())
    }
}

/// An authenticated caller. Rejects with 401 when no valid token was sent.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::user(self.0.user_id)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// An authenticated administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }
        Ok(AdminUser(principal))
    }
}

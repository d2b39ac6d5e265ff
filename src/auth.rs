//! Bearer-token authentication.
//!
//! Tokens are checked by a [`TokenVerifier`]; the verified subject id is
//! stored in the request extensions as a [`UserId`] and read back by the
//! [`AuthUser`] extractor. Verification against a real identity provider
//! plugs in behind the same trait.
//!
//! Authentication can be disabled by setting `BUDGEX_API_TOKENS` to
//! `DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS`, in which case every request acts
//! as the configured development user.

use std::collections::HashMap;

use axum::async_trait;
use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::AuthMode;
use crate::error::AppError;
use crate::models::UserId;
use crate::state::AppState;

pub trait TokenVerifier: Send + Sync {
    /// The subject id for a valid token.
    fn verify(&self, token: &str) -> Option<UserId>;
}

/// Fixed token table, `token -> user id`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, UserId>,
}

impl StaticTokens {
    pub fn new(tokens: &HashMap<String, String>) -> Self {
        let tokens = tokens
            .iter()
            .filter_map(|(token, user)| UserId::new(user.clone()).map(|u| (token.clone(), u)))
            .collect();
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).cloned()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Rejects requests without a valid identity with 401, otherwise attaches
/// the caller's [`UserId`] to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user_id = match &state.config.auth_mode {
        AuthMode::Unauthenticated { dev_user } => UserId::new(dev_user.clone()),
        AuthMode::Bearer { .. } => {
            bearer_token(request.headers()).and_then(|token| state.verifier.verify(token))
        }
    };

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
            AppError::Unauthorized.into_response()
        }
    }
}

/// The authenticated caller. Handlers that take this never run without a
/// non-empty user id.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserId>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

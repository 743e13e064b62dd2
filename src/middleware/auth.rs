use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::session::preview;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::UserId;

/// Identity resolved from the bearer token, if any. Public routes accept
/// anonymous callers, so a missing or unreadable token is `Caller(None)`
/// rather than a rejection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn user_id(self) -> Option<UserId> {
        self.0
    }

    /// The user id, or 401 for anonymous callers
    pub fn require(self) -> Result<UserId, ApiError> {
        self.0
            .ok_or_else(|| ApiError::unauthorized("Please log in to continue."))
    }
}

/// Resolves the `Authorization: Bearer` header into a `Caller` and stores it
/// in the request extensions. Never rejects; handlers decide what anonymity means.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match extract_bearer_token(request.headers()) {
        Some(token) => {
            let user_id = state.tokens.parse(token);
            if user_id.is_none() {
                tracing::warn!("Rejected bearer token {}", preview(token));
            }
            Caller(user_id)
        }
        None => Caller(None),
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Caller>().copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens_only() {
        assert_eq!(extract_bearer_token(&headers("Bearer jwt-token-5-1")), Some("jwt-token-5-1"));
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn anonymous_caller_is_unauthorized() {
        assert_eq!(Caller(Some(3)).require().unwrap(), 3);
        assert_eq!(Caller(None).require().unwrap_err().status_code(), 401);
    }
}

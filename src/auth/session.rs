//! Bearer session tokens.
//!
//! In `Plain` mode a token is the user id in clear text:
//! `jwt-token-<user id>-<issued millis>`, or `demo-jwt-token-<issued millis>`
//! for the shared demo account. Nothing is signed and nothing is stored
//! server-side, so anyone holding a well-formed token is that user and
//! tokens cannot be revoked. The timestamp is informational and never checked.
//!
//! `Signed` mode keeps the same issue/parse contract with HS256 tokens, so a
//! tampered or foreign token parses to no identity.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SecurityConfig, TokenMode};
use crate::types::UserId;

/// Account every demo token resolves to
pub const DEMO_USER_ID: UserId = 1;

const STANDARD_PREFIX: &str = "jwt-token-";
const DEMO_PREFIX: &str = "demo-jwt-token";
const DELIMITER: char = '-';
/// Segment holding the user id in a standard token
const USER_ID_SEGMENT: usize = 2;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SECURITY_TOKEN_SECRET is required for signed session tokens")]
    MissingSecret,
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
}

#[derive(Clone)]
enum Scheme {
    Plain,
    Signed {
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
}

/// Issues and reads bearer tokens
#[derive(Clone)]
pub struct SessionTokens {
    scheme: Scheme,
}

impl SessionTokens {
    pub fn plain() -> Self {
        Self { scheme: Scheme::Plain }
    }

    pub fn signed(secret: &str) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }
        Ok(Self {
            scheme: Scheme::Signed {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            },
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, SessionError> {
        match security.token_mode {
            TokenMode::Plain => Ok(Self::plain()),
            TokenMode::Signed => {
                let secret = security
                    .token_secret
                    .as_deref()
                    .ok_or(SessionError::MissingSecret)?;
                Self::signed(secret)
            }
        }
    }

    pub fn mode(&self) -> TokenMode {
        match self.scheme {
            Scheme::Plain => TokenMode::Plain,
            Scheme::Signed { .. } => TokenMode::Signed,
        }
    }

    /// Token for `user_id`; `parse` on the result yields `user_id` again
    pub fn issue(&self, user_id: UserId) -> Result<String, SessionError> {
        let issued = Utc::now();
        match &self.scheme {
            Scheme::Plain => Ok(format!(
                "{}{}{}{}",
                STANDARD_PREFIX,
                user_id,
                DELIMITER,
                issued.timestamp_millis()
            )),
            Scheme::Signed { encoding, .. } => {
                let claims = SessionClaims {
                    sub: user_id.to_string(),
                    iat: issued.timestamp(),
                };
                encode(&Header::new(Algorithm::HS256), &claims, encoding)
                    .map_err(|e| SessionError::TokenGeneration(e.to_string()))
            }
        }
    }

    /// Token for the shared demo account
    pub fn issue_demo(&self) -> Result<String, SessionError> {
        match self.scheme {
            Scheme::Plain => Ok(format!(
                "{}{}{}",
                DEMO_PREFIX,
                DELIMITER,
                Utc::now().timestamp_millis()
            )),
            Scheme::Signed { .. } => self.issue(DEMO_USER_ID),
        }
    }

    /// User id carried by `token`, or `None` when it carries no identity.
    /// Never fails.
    pub fn parse(&self, token: &str) -> Option<UserId> {
        let token = token.trim();
        let parsed = match &self.scheme {
            Scheme::Plain => parse_plain(token),
            Scheme::Signed { decoding, .. } => parse_signed(token, decoding),
        };

        match parsed {
            Some(user_id) => tracing::debug!("Session token resolved to user {}", user_id),
            None => tracing::debug!("Session token rejected: {}", preview(token)),
        }
        parsed
    }
}

fn parse_plain(token: &str) -> Option<UserId> {
    if token.starts_with(DEMO_PREFIX) {
        return Some(DEMO_USER_ID);
    }
    if !token.starts_with(STANDARD_PREFIX) {
        return None;
    }
    token
        .split(DELIMITER)
        .nth(USER_ID_SEGMENT)?
        .parse::<UserId>()
        .ok()
}

fn parse_signed(token: &str, decoding: &DecodingKey) -> Option<UserId> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<SessionClaims>(token, decoding, &validation).ok()?;
    data.claims.sub.parse::<UserId>().ok()
}

/// First characters of a token, safe for logs
pub fn preview(token: &str) -> String {
    let head: String = token.chars().take(20).collect();
    if head.len() < token.len() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_issue_then_parse_returns_user() {
        let tokens = SessionTokens::plain();
        let token = tokens.issue(42).unwrap();
        assert!(token.starts_with("jwt-token-42-"));
        assert_eq!(token.split('-').nth(2), Some("42"));
        assert_eq!(tokens.parse(&token), Some(42));
    }

    #[test]
    fn plain_rejects_garbage() {
        let tokens = SessionTokens::plain();
        assert_eq!(tokens.parse("garbage"), None);
        assert_eq!(tokens.parse(""), None);
        assert_eq!(tokens.parse("jwt-token-abc-123"), None);
        assert_eq!(tokens.parse("jwt-token-"), None);
        assert_eq!(tokens.parse("xyz-token-5-123"), None);
    }

    #[test]
    fn demo_token_always_resolves_to_reserved_user() {
        let tokens = SessionTokens::plain();
        let token = tokens.issue_demo().unwrap();
        assert!(token.starts_with("demo-jwt-token-"));
        assert_eq!(tokens.parse(&token), Some(DEMO_USER_ID));
        assert_eq!(tokens.parse("demo-jwt-token-77-999"), Some(DEMO_USER_ID));
    }

    #[test]
    fn timestamp_is_not_validated() {
        let tokens = SessionTokens::plain();
        assert_eq!(tokens.parse("jwt-token-9-0"), Some(9));
        assert_eq!(tokens.parse("jwt-token-9"), Some(9));
    }

    #[test]
    fn signed_issue_then_parse_returns_user() {
        let tokens = SessionTokens::signed("test-secret").unwrap();
        let token = tokens.issue(42).unwrap();
        assert_eq!(tokens.parse(&token), Some(42));
        assert_eq!(tokens.parse(&tokens.issue_demo().unwrap()), Some(DEMO_USER_ID));
    }

    #[test]
    fn signed_rejects_tampered_and_foreign_tokens() {
        let tokens = SessionTokens::signed("test-secret").unwrap();
        let token = tokens.issue(42).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let signature = parts[2];
        let swapped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}.{}{}", parts[0], parts[1], swapped, &signature[1..]);
        assert_eq!(tokens.parse(&tampered), None);

        let truncated = format!("{}.{}", parts[0], parts[1]);
        assert_eq!(tokens.parse(&truncated), None);

        let other = SessionTokens::signed("other-secret").unwrap();
        assert_eq!(tokens.parse(&other.issue(42).unwrap()), None);

        assert_eq!(tokens.parse("jwt-token-42-1700000000000"), None);
        assert_eq!(tokens.parse("garbage"), None);
    }

    #[test]
    fn signed_mode_requires_secret() {
        assert!(matches!(SessionTokens::signed(""), Err(SessionError::MissingSecret)));

        let mut security = crate::config::AppConfig::development().security;
        security.token_mode = TokenMode::Signed;
        security.token_secret = None;
        assert!(matches!(
            SessionTokens::from_config(&security),
            Err(SessionError::MissingSecret)
        ));

        security.token_secret = Some("s3cret".into());
        assert_eq!(SessionTokens::from_config(&security).unwrap().mode(), TokenMode::Signed);
    }

    #[test]
    fn preview_truncates_long_tokens() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("jwt-token-42-1700000000000"), "jwt-token-42-1700000...");
    }
}

//! Registration, login and the current-user profile.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ServiceError;
use crate::auth::{hash_password, verify_password, SessionTokens, DEMO_USER_ID};
use crate::database::models::user::{NewUser, User};
use crate::database::UserStore;
use crate::types::UserId;

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "password";
const DEMO_DISPLAY_NAME: &str = "Demo User";
const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

/// `username` is accepted as an alias for `email`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub role: &'static str,
}

impl Profile {
    fn demo() -> Self {
        Self {
            id: DEMO_USER_ID,
            email: DEMO_EMAIL.to_string(),
            display_name: DEMO_DISPLAY_NAME.to_string(),
            name: None,
            profile_image: None,
            role: DEFAULT_ROLE,
        }
    }
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_label().to_string(),
            name: user.name.clone(),
            profile_image: user.profile_image.clone(),
            role: DEFAULT_ROLE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: Profile,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: SessionTokens,
    demo_login_enabled: bool,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: SessionTokens, demo_login_enabled: bool) -> Self {
        Self {
            users,
            tokens,
            demo_login_enabled,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Profile, ServiceError> {
        let (Some(email), Some(password)) = (present(request.email), request.password.filter(|p| !p.is_empty())) else {
            return Err(ServiceError::validation("email", "Email and password are required"));
        };

        if self.users.exists_by_email(&email).await? {
            return Err(ServiceError::Conflict("User with this email already exists".to_string()));
        }

        let display_name = present(request.display_name).unwrap_or_else(|| email.clone());
        let user = self
            .users
            .save(NewUser {
                email,
                password_hash: hash_password(&password)?,
                display_name: Some(display_name),
                name: None,
                profile_image: None,
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(Profile::from(&user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, ServiceError> {
        let email = present(request.email).or_else(|| present(request.username));
        let (Some(email), Some(password)) = (email, request.password.filter(|p| !p.is_empty())) else {
            return Err(ServiceError::validation("email", "Email and password are required"));
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            if self.demo_login_enabled && email == DEMO_EMAIL && password == DEMO_PASSWORD {
                tracing::info!("Demo login");
                return Ok(Session {
                    token: self.tokens.issue_demo()?,
                    user: Profile::demo(),
                });
            }
            tracing::warn!("Login failed: unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(&password, &user.password_hash) {
            tracing::warn!("Login failed for user {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!("User {} logged in", user.id);
        Ok(Session {
            token: self.tokens.issue(user.id)?,
            user: Profile::from(&user),
        })
    }

    /// Profile of the caller. The reserved demo id has a built-in profile
    /// when no account row exists for it.
    pub async fn me(&self, caller: Option<UserId>) -> Result<Profile, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;

        match self.users.find_by_id(caller).await? {
            Some(user) => Ok(Profile::from(&user)),
            None if caller == DEMO_USER_ID => Ok(Profile::demo()),
            None => Err(ServiceError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryUserStore;

    fn service(demo_login_enabled: bool) -> AccountService {
        AccountService::new(
            Arc::new(MemoryUserStore::new()),
            SessionTokens::plain(),
            demo_login_enabled,
        )
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_user() {
        let accounts = service(false);
        let profile = accounts
            .register(register_request("mali@example.com", "s3cret"))
            .await
            .unwrap();
        assert_eq!(profile.display_name, "mali@example.com");

        let session = accounts
            .login(LoginRequest {
                username: Some("mali@example.com".into()),
                password: Some("s3cret".into()),
                ..LoginRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(SessionTokens::plain().parse(&session.token), Some(profile.id));
        assert_eq!(session.user.id, profile.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_missing_fields() {
        let accounts = service(false);
        accounts
            .register(register_request("mali@example.com", "s3cret"))
            .await
            .unwrap();

        assert!(matches!(
            accounts.register(register_request("mali@example.com", "other")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            accounts.register(register_request(" ", "pw")).await,
            Err(ServiceError::Validation { .. })
        ));
        assert!(matches!(
            accounts.register(register_request("x@example.com", "")).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let accounts = service(true);
        accounts
            .register(register_request("mali@example.com", "s3cret"))
            .await
            .unwrap();

        let result = accounts
            .login(LoginRequest {
                email: Some("mali@example.com".into()),
                password: Some("password".into()),
                ..LoginRequest::default()
            })
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn demo_login_depends_on_config() {
        let demo = LoginRequest {
            email: Some("demo@example.com".into()),
            password: Some("password".into()),
            ..LoginRequest::default()
        };

        let session = service(true).login(demo.clone()).await.unwrap();
        assert!(session.token.starts_with("demo-jwt-token-"));
        assert_eq!(session.user.id, DEMO_USER_ID);

        assert!(matches!(
            service(false).login(demo).await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn me_resolves_stored_and_demo_profiles() {
        let accounts = service(true);
        assert!(matches!(accounts.me(None).await, Err(ServiceError::Unauthenticated)));
        assert_eq!(accounts.me(Some(DEMO_USER_ID)).await.unwrap(), Profile::demo());
        assert!(matches!(accounts.me(Some(42)).await, Err(ServiceError::Unauthenticated)));

        let stored = accounts
            .register(RegisterRequest {
                display_name: Some("Mali".into()),
                ..register_request("mali@example.com", "s3cret")
            })
            .await
            .unwrap();
        let me = accounts.me(Some(stored.id)).await.unwrap();
        assert_eq!(me.display_name, "Mali");
    }
}

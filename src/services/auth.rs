//! Registration, login and token resolution
//!
//! Each user holds at most one API token. Registering or logging in
//! returns the existing token when one has already been issued, so
//! repeated logins never invalidate other sessions.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::db::repositories::{NewUser, TokenRepository, UserRepository};
use crate::models::{AuthToken, User};
use crate::services::password::{hash_password, verify_password};
use crate::validation::{require_text, FieldErrors, BLANK, REQUIRED};

const PASSWORD_MIN_LENGTH: usize = 8;

/// Registration payload before validation
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login payload; absent fields are treated as empty credentials
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Account registration and credential verification.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self { users, tokens }
    }

    /// Validate and create an account, returning the new user and token.
    ///
    /// All field failures are collected into one `Validation` error rather
    /// than stopping at the first.
    pub async fn register(
        &self,
        input: RegisterInput,
    ) -> Result<(User, AuthToken), AuthServiceError> {
        let mut errors = FieldErrors::new();

        let username = require_text(&mut errors, "username", input.username.as_deref());
        let email = require_text(&mut errors, "email", input.email.as_deref());

        if let Some(ref email) = email {
            if !email.contains('@') {
                errors.push("email", "Enter a valid email address.");
            }
        }

        let password = match input.password.as_deref() {
            None => {
                errors.push("password", REQUIRED);
                None
            }
            Some(raw) if raw.trim().is_empty() => {
                errors.push("password", BLANK);
                None
            }
            Some(raw) if raw.chars().count() < PASSWORD_MIN_LENGTH => {
                errors.push(
                    "password",
                    format!(
                        "Ensure this field has at least {} characters.",
                        PASSWORD_MIN_LENGTH
                    ),
                );
                None
            }
            Some(raw) => Some(raw.to_string()),
        };

        if let Some(ref username) = username {
            if self.users.get_by_username(username).await?.is_some() {
                errors.push("username", "A user with that username already exists.");
            }
        }
        if let Some(ref email) = email {
            if self.users.get_by_email(email).await?.is_some() {
                errors.push("email", "A user with this email already exists.");
            }
        }

        if !errors.is_empty() {
            return Err(AuthServiceError::Validation(errors));
        }

        // Validation above guarantees these are present.
        let username = username.unwrap_or_default();
        let email = email.unwrap_or_default();
        let password = password.unwrap_or_default();

        let password_hash = hash_password(&password)?;
        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                first_name: input.first_name.map(|v| v.trim().to_string()).unwrap_or_default(),
                last_name: input.last_name.map(|v| v.trim().to_string()).unwrap_or_default(),
                password_hash,
            })
            .await?;

        let token = self.tokens.get_or_create(user.id, &new_token_key()).await?;
        Ok((user, token))
    }

    /// Verify credentials and return the user's token.
    ///
    /// Unknown usernames and wrong passwords both map to
    /// `InvalidCredentials` so the response does not reveal which part
    /// failed.
    pub async fn login(&self, input: LoginInput) -> Result<(User, AuthToken), AuthServiceError> {
        let user = self
            .users
            .get_by_username(&input.username)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self.tokens.get_or_create(user.id, &new_token_key()).await?;
        Ok((user, token))
    }

    /// Resolve a token key to its owning user.
    pub async fn user_for_token(&self, key: &str) -> Result<Option<User>, AuthServiceError> {
        match self.tokens.get_by_key(key).await? {
            Some(token) => Ok(self.users.get_by_id(token.user_id).await?),
            None => Ok(None),
        }
    }
}

fn new_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTokenRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        AuthService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool),
        )
    }

    fn valid_input() -> RegisterInput {
        RegisterInput {
            username: Some("alice".to_string()),
            email: Some("alice@example.com".to_string()),
            password: Some("correct horse".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_user_and_token() {
        let service = setup().await;
        let (user, token) = service.register(valid_input()).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.last_name, "");
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.key.len(), 32);
    }

    #[tokio::test]
    async fn test_register_collects_all_field_errors() {
        let service = setup().await;
        let result = service
            .register(RegisterInput {
                username: None,
                email: Some("not-an-email".to_string()),
                password: Some("short".to_string()),
                first_name: None,
                last_name: None,
            })
            .await;

        match result {
            Err(AuthServiceError::Validation(errors)) => {
                assert_eq!(errors.get("username"), Some(&[REQUIRED.to_string()][..]));
                assert_eq!(
                    errors.get("email"),
                    Some(&["Enter a valid email address.".to_string()][..])
                );
                assert_eq!(
                    errors.get("password"),
                    Some(&["Ensure this field has at least 8 characters.".to_string()][..])
                );
            }
            other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_and_email() {
        let service = setup().await;
        service.register(valid_input()).await.unwrap();

        let result = service.register(valid_input()).await;
        match result {
            Err(AuthServiceError::Validation(errors)) => {
                assert_eq!(
                    errors.get("username"),
                    Some(&["A user with that username already exists.".to_string()][..])
                );
                assert_eq!(
                    errors.get("email"),
                    Some(&["A user with this email already exists.".to_string()][..])
                );
            }
            other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_returns_same_token_as_register() {
        let service = setup().await;
        let (_, issued) = service.register(valid_input()).await.unwrap();

        let (user, token) = service
            .login(LoginInput {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(token.key, issued.key);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service.register(valid_input()).await.unwrap();

        let result = service
            .login(LoginInput {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = setup().await;
        let result = service
            .login(LoginInput {
                username: "nobody".to_string(),
                password: "whatever".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_user_for_token() {
        let service = setup().await;
        let (user, token) = service.register(valid_input()).await.unwrap();

        let resolved = service.user_for_token(&token.key).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(service.user_for_token("bogus").await.unwrap().is_none());
    }
}

//! Authentication service: registration, login and token issuance

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{user::RegisterUser, NewUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate user by email and return a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    /// Register a new member account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        if self.repository.users.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = NewUser {
            email: request.email,
            password: self.hash_password(&request.password)?,
            firstname: request.firstname,
            lastname: request.lastname,
            role: Role::Member,
        };

        let created = self.repository.users.create(&user).await?;
        tracing::info!(user_id = created.id, "User registered");
        Ok(created)
    }

    /// Create the configured administrator account when it does not exist yet
    pub async fn bootstrap_admin(&self) -> AppResult<Option<User>> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(None);
        };

        if self.repository.users.get_by_email(email).await?.is_some() {
            return Ok(None);
        }

        let admin = NewUser {
            email: email.clone(),
            password: self.hash_password(password)?,
            firstname: None,
            lastname: None,
            role: Role::Admin,
        };

        let created = self.repository.users.create(&admin).await?;
        tracing::info!(user_id = created.id, email = %created.email, "Administrator account created");
        Ok(Some(created))
    }

    /// Create JWT token for a user
    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(config: AuthConfig) -> AuthService {
        AuthService::new(Repository::in_memory(), config)
    }

    fn registration(email: &str) -> RegisterUser {
        RegisterUser {
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
            firstname: Some("Ada".to_string()),
            lastname: Some("Lovelace".to_string()),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_member_token() {
        let auth = service(AuthConfig::default());
        let user = auth.register(registration("ada@library.test")).await.unwrap();
        assert_eq!(user.role, Role::Member);
        assert_ne!(user.password, "s3cret-pass");

        let (token, logged_in) = auth.authenticate("ADA@library.test", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let claims = UserClaims::from_token(&token, &AuthConfig::default().jwt_secret).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, Role::Member);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let auth = service(AuthConfig::default());
        auth.register(registration("ada@library.test")).await.unwrap();

        let wrong = auth.authenticate("ada@library.test", "nope").await.unwrap_err();
        let unknown = auth.authenticate("bob@library.test", "nope").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let auth = service(AuthConfig::default());
        auth.register(registration("ada@library.test")).await.unwrap();
        let err = auth.register(registration("Ada@Library.test")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected() {
        let auth = service(AuthConfig::default());
        let err = auth
            .register(RegisterUser {
                password: "123".to_string(),
                ..registration("not-an-email")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn bootstrap_admin_runs_once() {
        let auth = service(AuthConfig {
            admin_email: Some("admin@library.test".to_string()),
            admin_password: Some("admin-pass".to_string()),
            ..AuthConfig::default()
        });

        let admin = auth.bootstrap_admin().await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(auth.bootstrap_admin().await.unwrap().is_none());
    }
}

//! Mart user registration and login

use loyalty_auth::{JwtService, PasswordService};
use loyalty_core::{traits::UserRepository, AppError, AppResult};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Creates accounts and issues session tokens
pub struct UserService<U: UserRepository> {
    repo: Arc<U>,
    passwords: PasswordService,
    jwt: Arc<JwtService>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: Arc<U>, passwords: PasswordService, jwt: Arc<JwtService>) -> Self {
        Self {
            repo,
            passwords,
            jwt,
        }
    }

    /// Create an account and return a session token for it
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if login or password is empty
    /// - `AlreadyExists` if the login is taken
    #[instrument(skip(self, password))]
    pub async fn register(&self, login: &str, password: &str) -> AppResult<String> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Login and password are required".to_string(),
            ));
        }

        let hash = self.passwords.hash(password)?;
        self.repo.create(login, &hash).await?;

        info!(%login, "User registered");
        self.jwt.issue_session(login)
    }

    /// Check credentials and return a session token
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> AppResult<String> {
        let login = login.trim();
        let user = self.repo.find_by_login(login).await?.ok_or_else(|| {
            info!(%login, "Login failed: unknown user");
            AppError::InvalidCredentials
        })?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| {
                error!("Password verification error: {}", e);
                AppError::Internal("Password verification failed".to_string())
            })?;

        if !valid {
            info!(%login, "Login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }

        info!(%login, "Login successful");
        self.jwt.issue_session(login)
    }

    /// Session lifetime, for the cookie max-age
    pub fn session_ttl_secs(&self) -> i64 {
        self.jwt.session_ttl_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, Arc<JwtService>, UserService<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let jwt = Arc::new(JwtService::new("test-secret-key-12345", 3600));
        let users = UserService::new(store.clone(), PasswordService::new(), jwt.clone());
        (store, jwt, users)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_, jwt, users) = service();

        let token = users.register("alice", "s3cret").await.unwrap();
        assert_eq!(jwt.verify_session(&token).unwrap().login(), "alice");

        let token = users.login("alice", "s3cret").await.unwrap();
        assert_eq!(jwt.verify_session(&token).unwrap().login(), "alice");
        assert_eq!(users.session_ttl_secs(), 3600);
    }

    #[tokio::test]
    async fn test_register_duplicate_login() {
        let (_, _, users) = service();

        users.register("alice", "s3cret").await.unwrap();
        assert!(matches!(
            users.register("alice", "other").await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let (_, _, users) = service();

        assert!(matches!(
            users.register("", "s3cret").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            users.register("alice", "").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let (_, _, users) = service();
        users.register("alice", "s3cret").await.unwrap();

        assert!(matches!(
            users.login("alice", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            users.login("bob", "s3cret").await,
            Err(AppError::InvalidCredentials)
        ));
    }
}

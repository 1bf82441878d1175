//! Accounts: registration, login, suspension and the bootstrap admin

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        AuthResponse, LoginRequest, RegisterRequest, Role, User, UserClaims, UserQuery, UserStatus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new patron account and return it logged in
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let password_hash = Self::hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(
                &request.full_name,
                &request.email,
                request.phone.as_deref(),
                &password_hash,
                Role::Patron,
            )
            .await?;

        let token = self.create_token_for(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Authenticate by email and password
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !Self::verify_password(&user.password_hash, &request.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        // Only revealed once the credentials themselves check out
        if user.status == UserStatus::Suspended {
            return Err(AppError::UserSuspended("Account is suspended".to_string()));
        }

        let token = self.create_token_for(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// List accounts, optionally filtered by a name or email substring
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    /// Patron accounts only, for lending workflows
    pub async fn list_patrons(&self) -> AppResult<Vec<User>> {
        self.repository.users.list_patrons().await
    }

    /// Suspend an account. Open loans keep running; new borrows are refused.
    pub async fn suspend(&self, id: i64) -> AppResult<User> {
        let user = self
            .repository
            .users
            .set_status(id, UserStatus::Suspended)
            .await?;
        tracing::info!(user_id = id, "Suspended account");
        Ok(user)
    }

    /// Lift a suspension
    pub async fn activate(&self, id: i64) -> AppResult<User> {
        self.repository
            .users
            .set_status(id, UserStatus::Active)
            .await
    }

    /// Delete an account. Refused while the account still has open loans.
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// Create the configured admin account on startup if it does not exist
    pub async fn ensure_admin_account(&self) -> AppResult<()> {
        if self
            .repository
            .users
            .email_exists(&self.config.admin_email)
            .await?
        {
            return Ok(());
        }

        let password_hash = Self::hash_password(&self.config.admin_password)?;
        let admin = self
            .repository
            .users
            .create(
                "Administrator",
                &self.config.admin_email,
                None,
                &password_hash,
                Role::Admin,
            )
            .await?;

        tracing::info!(email = %admin.email, "Created bootstrap admin account");
        Ok(())
    }

    fn create_token_for(&self, user: &User) -> AppResult<String> {
        UserClaims::new(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored Argon2 hash
    pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = UsersService::hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(UsersService::verify_password(&hash, "correct horse battery").unwrap());
        assert!(!UsersService::verify_password(&hash, "wrong password").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = UsersService::hash_password("same password").unwrap();
        let second = UsersService::hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(UsersService::verify_password("not-a-hash", "anything").is_err());
    }
}

use crate::models::user::{NewUser, User};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::password::{PasswordError, PasswordHasher};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("An account with this email already exists")]
    DuplicateAccount,
    #[error("No account with this email")]
    UnknownAccount,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration, login, and session identity resolution.
///
/// Built once at startup and shared through `AppState`.
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self {
            user_repository,
            hasher,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthServiceError> {
        let name = request.name.trim();
        let email = request.email.trim();
        validate_registration(name, email, &request.password)?;

        // Skip the expensive hash for the common duplicate case. The insert
        // below is still the authoritative check.
        if self.user_repository.find_by_email(email).await?.is_some() {
            warn!("Registration rejected: email already registered");
            return Err(AuthServiceError::DuplicateAccount);
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let new_user = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        };

        match self.user_repository.insert(&new_user).await {
            Ok(user) => {
                info!(user_id = user.id, "Registered new user");
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => {
                warn!("Registration lost a race on a duplicate email");
                Err(AuthServiceError::DuplicateAccount)
            }
            Err(e) => Err(AuthServiceError::Repository(e)),
        }
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or(AuthServiceError::UnknownAccount)?;

        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthServiceError::InvalidCredentials);
        }

        info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    /// Resolves a session's user id into the stored user.
    pub async fn resolve_session_user(
        &self,
        user_id: Option<i64>,
    ) -> Result<User, AuthServiceError> {
        let user_id = user_id.ok_or(AuthServiceError::Unauthenticated)?;
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::NotFound)
    }

    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, AuthServiceError> {
        Ok(self.user_repository.list_users(limit, offset).await?)
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthServiceError> {
    if name.is_empty() {
        return Err(AuthServiceError::InvalidInput("Please enter your name"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AuthServiceError::InvalidInput("Name is too long"));
    }
    if email.is_empty() || !email.contains('@') || email.chars().count() > MAX_EMAIL_LEN {
        return Err(AuthServiceError::InvalidInput(
            "Please enter a valid email address",
        ));
    }
    if password.is_empty() {
        return Err(AuthServiceError::InvalidInput("Please enter a password"));
    }
    Ok(())
}

pub mod auth_service;
pub mod password;

pub use auth_service::{AuthService, AuthServiceError, LoginRequest, RegisterRequest};
pub use password::{PasswordError, PasswordHasher};

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CSRF_TOKEN_KEY: &str = "csrf_token";

const TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    #[error("No CSRF token in session")]
    Missing,
    #[error("CSRF token expired")]
    Expired,
    #[error("CSRF token mismatch")]
    Mismatch,
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// CSRF token as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    pub value: String,
    pub created_at: i64,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Tokens live for 24 hours.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now - self.created_at > TOKEN_TTL_SECS
    }
}

impl Default for CsrfToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a new CSRF token and store in session
pub async fn generate_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token = CsrfToken::new();
    let value = token.value.clone();

    session.insert(CSRF_TOKEN_KEY, token).await?;

    debug!("Generated new CSRF token: {}", &value[..8]);
    Ok(value)
}

/// Get or create a CSRF token for the session
pub async fn get_or_create_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await?;

    match token {
        Some(existing_token) if !existing_token.is_expired() => Ok(existing_token.value),
        _ => generate_csrf_token(session).await,
    }
}

/// Checks a submitted form token against the session and rotates it.
pub async fn validate_csrf_form_field(
    session: &Session,
    form_token: &str,
) -> Result<(), CsrfError> {
    let stored_token: CsrfToken = session
        .get(CSRF_TOKEN_KEY)
        .await?
        .ok_or(CsrfError::Missing)?;

    if stored_token.is_expired() {
        warn!("CSRF token expired during form validation");
        return Err(CsrfError::Expired);
    }

    if form_token != stored_token.value {
        warn!("CSRF form token mismatch");
        return Err(CsrfError::Mismatch);
    }

    // Replay protection
    generate_csrf_token(session).await?;

    Ok(())
}

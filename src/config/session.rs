use sha2::{Digest, Sha512};
use time::Duration;
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer, SessionStore,
};
use tower_sessions_sqlx_store::SqliteStore;

use super::{AppConfig, Environment};

/// Convenience alias for the signed session layer produced by `SessionConfig`.
pub type SessionLayer<Store = SqliteStore> = SessionManagerLayer<Store, SignedCookie>;

/// Table holding session records next to `users`.
pub const SESSION_TABLE: &str = "sessions";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub expiry: Duration,
    pub name: String,
}

impl SessionConfig {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => SessionConfig {
                secure: true,
                http_only: true,
                same_site: SameSite::Strict,
                expiry: Duration::hours(2),
                name: "__Host-session".to_string(),
            },
            Environment::Development => SessionConfig {
                secure: false,
                http_only: true,
                same_site: SameSite::Lax,
                expiry: Duration::days(7),
                name: "session".to_string(),
            },
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::for_environment(config.environment)
    }

    pub fn create_layer<Store: SessionStore>(&self, store: Store, key: Key) -> SessionLayer<Store> {
        SessionManagerLayer::new(store)
            .with_secure(self.secure)
            .with_http_only(self.http_only)
            .with_same_site(self.same_site)
            .with_name(self.name.clone())
            .with_path("/")
            .with_expiry(Expiry::OnInactivity(self.expiry))
            .with_signed(key)
    }
}

/// Derives the cookie signing key from the configured secret.
///
/// `Key::from` needs at least 64 bytes; shorter secrets are stretched with
/// SHA-512.
pub fn signing_key(secret: &[u8]) -> Key {
    if secret.len() >= 64 {
        Key::from(&secret[..64])
    } else {
        let digest = Sha512::digest(secret);
        Key::from(digest.as_slice())
    }
}

/// Creates the session table store on the application pool.
pub async fn create_store(pool: sqlx::SqlitePool) -> Result<SqliteStore, sqlx::Error> {
    let store = SqliteStore::new(pool)
        .with_table_name(SESSION_TABLE)
        .map_err(|e| sqlx::Error::Configuration(e.into()))?;
    store.migrate().await?;
    Ok(store)
}

pub mod test_helpers {
    use std::{net::IpAddr, path::PathBuf, sync::Arc};

    use axum::Router;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    use crate::config::{
        session::{create_store, signing_key, SessionConfig},
        AppConfig, Environment,
    };
    use crate::models::user::NewUser;
    use crate::repositories::user_repository::{SqliteUserRepository, UserRepository};
    use crate::services::password::PasswordHasher;
    use crate::{build_router, AppState};

    /// Iteration count used by tests; verification reads it from each hash.
    pub const TEST_ROUNDS: u32 = 1_000;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        crate::db::run_migrations(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when you need several connections to see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await?;

        crate::db::run_migrations(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Development-mode config pointing at `download_path`.
    pub fn test_config(download_path: PathBuf) -> AppConfig {
        AppConfig {
            environment: Environment::Development,
            session_secret: b"test-session-secret".to_vec(),
            database_url: "sqlite::memory:".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            force_https: false,
            download_path,
            static_dir: PathBuf::from("static"),
            pbkdf2_rounds: TEST_ROUNDS,
        }
    }

    /// Full application router on `pool`, sessions included.
    pub async fn create_test_app(
        pool: SqlitePool,
        config: AppConfig,
    ) -> Result<Router, sqlx::Error> {
        let store = create_store(pool.clone()).await?;
        let session_layer = SessionConfig::from_config(&config)
            .create_layer(store, signing_key(&config.session_secret));

        let repository: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool));
        let state = AppState::new(repository, config);

        Ok(build_router(state, session_layer))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = PasswordHasher::new(TEST_ROUNDS)
            .hash(password)
            .map_err(|e| sqlx::Error::Configuration(e.to_string().into()))?;

        let user = SqliteUserRepository::new(pool.clone())
            .insert(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        Ok(user.id)
    }

    pub async fn count_users(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}

// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

/// Opens the SQLite pool, creating the database file and its directory if
/// they do not exist yet.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let path = std::path::Path::new(database_url.trim_start_matches("sqlite://"));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("Connected to database");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_makes_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/keyhole.db");

        let pool = create_pool(&format!("sqlite://{}", db_path.display()))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_create_pool_reports_directory_error() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let db_path = blocker.path().join("keyhole.db");

        let result = create_pool(&format!("sqlite://{}", db_path.display())).await;
        assert!(matches!(result, Err(sqlx::Error::Io(_))));
    }
}

//! Session identity: which user, if any, a signed session cookie belongs to.

use tower_sessions::{session::Error, Session};
use tracing::debug;

pub const USER_ID_KEY: &str = "user_id";

/// Binds the session to `user_id` under a fresh session id.
pub async fn establish(session: &Session, user_id: i64) -> Result<(), Error> {
    // A new id on every login keeps a pre-login cookie from inheriting the identity.
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await?;
    debug!(user_id, "Session established");
    Ok(())
}

pub async fn current_user_id(session: &Session) -> Result<Option<i64>, Error> {
    session.get::<i64>(USER_ID_KEY).await
}

/// Drops all session data and deletes the stored record.
pub async fn end(session: &Session) -> Result<(), Error> {
    session.flush().await?;
    debug!("Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_establish_then_end() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        assert_eq!(current_user_id(&session).await.unwrap(), None);

        establish(&session, 42).await.unwrap();
        assert_eq!(current_user_id(&session).await.unwrap(), Some(42));

        end(&session).await.unwrap();
        assert_eq!(current_user_id(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_establish_stores_only_the_user_id() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        establish(&session, 7).await.unwrap();
        session.remove_value(USER_ID_KEY).await.unwrap();
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn test_establish_replaces_previous_identity() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        establish(&session, 1).await.unwrap();
        establish(&session, 2).await.unwrap();
        assert_eq!(current_user_id(&session).await.unwrap(), Some(2));
    }
}

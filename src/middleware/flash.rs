use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

pub const FLASH_KEY: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashLevel::Info => "flash-info",
            FlashLevel::Warning => "flash-warning",
            FlashLevel::Error => "flash-error",
        }
    }
}

/// One-time notice that survives a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut messages: Vec<FlashMessage> = session.get(FLASH_KEY).await?.unwrap_or_default();
    messages.push(FlashMessage {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, messages).await
}

/// Removes and returns all pending messages.
pub async fn take_flashes(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(FLASH_KEY).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            warn!("Failed to read flash messages from session: {}", e);
            Vec::new()
        }
    }
}

/// Queues a message and redirects. The redirect still happens if the
/// session store rejects the message.
pub async fn flash_redirect(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    if let Err(e) = push_flash(session, level, message).await {
        warn!("Failed to store flash message: {}", e);
    }
    Redirect::to(to).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        let store = Arc::new(MemoryStore::default());
        Session::new(None, store, None)
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once_in_order() {
        let session = session();

        push_flash(&session, FlashLevel::Warning, "first").await.unwrap();
        push_flash(&session, FlashLevel::Info, "second").await.unwrap();

        let messages = take_flashes(&session).await;
        assert_eq!(
            messages,
            vec![
                FlashMessage {
                    level: FlashLevel::Warning,
                    message: "first".to_string()
                },
                FlashMessage {
                    level: FlashLevel::Info,
                    message: "second".to_string()
                },
            ]
        );

        assert!(take_flashes(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_flash_redirect() {
        let session = session();

        let response = flash_redirect(&session, FlashLevel::Error, "nope", "/login").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        let messages = take_flashes(&session).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "nope");
    }
}

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::auth::session;
use crate::error::AppError;
use crate::middleware::flash::{push_flash, FlashLevel};
use crate::models::user::User;
use crate::services::auth_service::AuthServiceError;
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";

/// Outcome of resolving the caller's session.
///
/// As an extractor it never rejects; handlers that tolerate anonymous callers
/// match on it. Protected routes sit behind [`require_auth`] instead.
#[derive(Debug, Clone)]
pub enum AuthState {
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// Resolves the session's user id against the store.
    ///
    /// A session pointing at a user that no longer exists is cleared and
    /// treated as logged out.
    pub async fn resolve(state: &AppState, session: &Session) -> Result<Self, AppError> {
        let user_id = session::current_user_id(session).await?;

        match state.auth_service.resolve_session_user(user_id).await {
            Ok(user) => Ok(AuthState::Authenticated(user)),
            Err(AuthServiceError::Unauthenticated) => Ok(AuthState::Unauthenticated),
            Err(AuthServiceError::NotFound) => {
                warn!(user_id, "Session refers to a missing user; clearing it");
                session::end(session).await?;
                push_flash(session, FlashLevel::Warning, "Please log in again.").await?;
                Ok(AuthState::Unauthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl FromRequestParts<AppState> for AuthState {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        AuthState::resolve(state, &session)
            .await
            .map_err(IntoResponse::into_response)
    }
}

/// The user behind an authenticated request, placed in request extensions
/// by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Runs the wrapped routes only for a resolvable session; everyone else is
/// redirected to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match AuthState::resolve(&state, &session).await {
        Ok(AuthState::Authenticated(user)) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(AuthState::Unauthenticated) => {
            debug!(path = %request.uri().path(), "Unauthenticated request redirected to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => e.into_response(),
    }
}

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::auth::{AuthState, CurrentUser};
use crate::middleware::flash::{take_flashes, FlashMessage};

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexTemplate {
    logged_in: bool,
    flashes: Vec<FlashMessage>,
}

#[derive(Template, WebTemplate)]
#[template(path = "secrets.html")]
struct SecretsTemplate {
    logged_in: bool,
    flashes: Vec<FlashMessage>,
    name: String,
}

pub async fn home(auth: AuthState, session: Session) -> Response {
    IndexTemplate {
        logged_in: auth.is_authenticated(),
        flashes: take_flashes(&session).await,
    }
    .into_response()
}

/// Mounted behind `require_auth`.
pub async fn secrets(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    session: Session,
) -> Response {
    SecretsTemplate {
        logged_in: true,
        flashes: take_flashes(&session).await,
        name: user.name,
    }
    .into_response()
}

use crate::auth::guard::{AuthState, CurrentUser, LOGIN_PATH};
use crate::auth::session;
use crate::error::AppError;
use crate::middleware::csrf::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::middleware::flash::{
    flash_redirect, push_flash, take_flashes, FlashLevel, FlashMessage,
};
use crate::services::auth_service::{AuthServiceError, LoginRequest, RegisterRequest};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

pub const REGISTER_PATH: &str = "/register";
pub const SECRETS_PATH: &str = "/secrets";

const INVALID_TOKEN_MSG: &str = "Invalid security token. Please refresh the page and try again.";

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    logged_in: bool,
    flashes: Vec<FlashMessage>,
    csrf_token: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    logged_in: bool,
    flashes: Vec<FlashMessage>,
    csrf_token: String,
}

/// Absent fields arrive empty and fail CSRF or input validation.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    name: String,
    email: String,
    password: String,
    csrf_token: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    email: String,
    password: String,
    csrf_token: String,
}

pub async fn register_page(auth: AuthState, session: Session) -> Result<Response, AppError> {
    let csrf_token = get_or_create_csrf_token(&session).await?;

    Ok(RegisterTemplate {
        logged_in: auth.is_authenticated(),
        flashes: take_flashes(&session).await,
        csrf_token,
    }
    .into_response())
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(
            flash_redirect(&session, FlashLevel::Error, INVALID_TOKEN_MSG, REGISTER_PATH).await,
        );
    }

    let request = RegisterRequest {
        name: form.name,
        email: form.email,
        password: form.password,
    };

    match app_state.auth_service.register(request).await {
        Ok(user) => {
            session::establish(&session, user.id).await?;
            Ok(Redirect::to(SECRETS_PATH).into_response())
        }
        Err(AuthServiceError::DuplicateAccount) => Ok(flash_redirect(
            &session,
            FlashLevel::Warning,
            "You've already signed up with that email, log in instead.",
            LOGIN_PATH,
        )
        .await),
        Err(AuthServiceError::InvalidInput(msg)) => {
            Ok(flash_redirect(&session, FlashLevel::Error, msg, REGISTER_PATH).await)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_page(auth: AuthState, session: Session) -> Result<Response, AppError> {
    let csrf_token = get_or_create_csrf_token(&session).await?;

    Ok(LoginTemplate {
        logged_in: auth.is_authenticated(),
        flashes: take_flashes(&session).await,
        csrf_token,
    }
    .into_response())
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(
            flash_redirect(&session, FlashLevel::Error, INVALID_TOKEN_MSG, LOGIN_PATH).await,
        );
    }

    let request = LoginRequest {
        email: form.email,
        password: form.password,
    };

    match app_state.auth_service.authenticate(request).await {
        Ok(user) => {
            session::establish(&session, user.id).await?;
            Ok(Redirect::to(SECRETS_PATH).into_response())
        }
        Err(AuthServiceError::UnknownAccount) => Ok(flash_redirect(
            &session,
            FlashLevel::Error,
            "That email does not exist, please try again.",
            LOGIN_PATH,
        )
        .await),
        Err(AuthServiceError::InvalidCredentials) => Ok(flash_redirect(
            &session,
            FlashLevel::Error,
            "Password incorrect, please try again.",
            LOGIN_PATH,
        )
        .await),
        Err(e) => Err(e.into()),
    }
}

/// Mounted behind `require_auth`.
pub async fn logout_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    session: Session,
) -> Result<Response, AppError> {
    session::end(&session).await?;
    push_flash(&session, FlashLevel::Info, "You have logged out.").await?;
    info!(user_id = user.id, "User logged out");
    Ok(Redirect::to("/").into_response())
}

use axum::{
    body::Body,
    extract::{Extension, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info};

use crate::auth::CurrentUser;
use crate::AppState;

/// Serves the single protected file. Mounted behind `require_auth`.
pub async fn download(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    request: Request,
) -> Response {
    let path = &state.config.download_path;

    let mut response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(infallible) => match infallible {},
    };

    match response.status() {
        StatusCode::NOT_FOUND => {
            error!(path = %path.display(), "Download file is missing");
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
        status if status.is_success() => {
            info!(user_id = user.id, "Protected file downloaded");
        }
        _ => {}
    }

    if let Some(disposition) = attachment_header(path) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }

    response
}

fn attachment_header(path: &std::path::Path) -> Option<HeaderValue> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.contains('"') {
        return None;
    }
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)).ok()
}

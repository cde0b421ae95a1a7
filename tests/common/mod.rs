#![allow(dead_code)]

use std::io::Write;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use keyhole::{config::AppConfig, test_utils::test_helpers};
use sqlx::SqlitePool;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use tower_sessions::cookie::Cookie;

pub const DOWNLOAD_BYTES: &[u8] = b"%PDF-1.4\n% keyhole test file\n";

const SESSION_COOKIE: &str = "session";

/// Drives the full router and carries the session cookie between requests
/// the way a browser would.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
    pub pool: SqlitePool,
    _download: Option<std::sync::Arc<NamedTempFile>>,
}

impl TestClient {
    pub async fn new() -> Self {
        let mut download = tempfile::Builder::new()
            .prefix("cheat_sheet")
            .suffix(".pdf")
            .tempfile()
            .unwrap();
        download.write_all(DOWNLOAD_BYTES).unwrap();
        download.flush().unwrap();

        let config = test_helpers::test_config(download.path().to_path_buf());
        let mut client = Self::with_config(config).await;
        client._download = Some(std::sync::Arc::new(download));
        client
    }

    /// A client against an app built from `config` as given.
    pub async fn with_config(config: AppConfig) -> Self {
        let pool = test_helpers::create_test_db().await.unwrap();
        let app = test_helpers::create_test_app(pool.clone(), config)
            .await
            .unwrap();

        Self {
            app,
            cookie: None,
            pool,
            _download: None,
        }
    }

    /// A second browser against the same application and database.
    pub fn fresh_browser(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookie: None,
            pool: self.pool.clone(),
            _download: self._download.clone(),
        }
    }

    pub fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, path: &str) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn csrf_token(&mut self, form_path: &str) -> String {
        let response = self.get(form_path).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        extract_csrf_token(&html)
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Response<Body> {
        let token = self.csrf_token("/register").await;
        self.post_form(
            "/register",
            &[
                ("name", name),
                ("email", email),
                ("password", password),
                ("csrf_token", token.as_str()),
            ],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Response<Body> {
        let token = self.csrf_token("/login").await;
        self.post_form(
            "/login",
            &[
                ("email", email),
                ("password", password),
                ("csrf_token", token.as_str()),
            ],
        )
        .await
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let cookie = Cookie::parse(value.to_str().unwrap().to_string()).unwrap();
            if cookie.name() != SESSION_COOKIE {
                continue;
            }
            let removed = cookie.value().is_empty()
                || cookie.max_age() == Some(time::Duration::ZERO);
            self.cookie = if removed {
                None
            } else {
                Some(format!("{}={}", cookie.name(), cookie.value()))
            };
        }

        response
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect to carry a Location header")
        .to_str()
        .unwrap()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

fn extract_csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("form to carry a csrf token") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

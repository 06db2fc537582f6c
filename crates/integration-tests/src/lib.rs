//! Integration test harness for Fashion Advisor.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`
//! against an in-memory `SQLite` database and a temporary static directory.
//! The generative model is replaced by a [`ScriptedGenerator`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fashion-advisor-integration-tests
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use secrecy::SecretString;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use fashion_advisor_server::app;
use fashion_advisor_server::config::{GeminiConfig, ServerConfig};
use fashion_advisor_server::db;
use fashion_advisor_server::gemini::{ContentGenerator, GeminiError, GenerateRequest};
use fashion_advisor_server::state::AppState;

/// Password used by [`TestApp::register_default`].
pub const DEFAULT_PASSWORD: &str = "linen-and-denim";

// =============================================================================
// Scripted generator
// =============================================================================

/// What the fake model does when called.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with this text.
    Reply(String),
    /// Fail as an overloaded upstream would.
    Fail,
}

/// A [`ContentGenerator`] that follows a script and records every request.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Mutex<Script>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    /// Generator that always answers `text`.
    #[must_use]
    pub fn replying(text: &str) -> Self {
        Self {
            script: Mutex::new(Script::Reply(text.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Generator that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(Script::Fail),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        match self.script.lock().expect("script lock").clone() {
            Script::Reply(text) => Ok(text),
            Script::Fail => Err(GeminiError::Api {
                status: 503,
                message: "The model is overloaded. Please try again later.".to_string(),
            }),
        }
    }
}

// =============================================================================
// Test application
// =============================================================================

/// A fully wired application backed by throwaway storage.
pub struct TestApp {
    router: Router,
    pool: SqlitePool,
    generator: Arc<ScriptedGenerator>,
    static_dir: TempDir,
}

impl TestApp {
    /// Build an app whose model answers `reply`.
    pub async fn new(reply: &str) -> Self {
        Self::with_generator(ScriptedGenerator::replying(reply)).await
    }

    /// Build an app around a specific generator.
    ///
    /// # Panics
    ///
    /// Panics if any part of the stack fails to initialize.
    pub async fn with_generator(generator: ScriptedGenerator) -> Self {
        let pool = db::create_memory_pool().await.expect("memory pool");
        db::run_migrations(&pool).await.expect("migrations");

        let static_dir = tempfile::tempdir().expect("static tempdir");
        let config = test_config(static_dir.path());

        let generator = Arc::new(generator);
        let state = AppState::with_generator(config, pool.clone(), generator.clone());
        let store = app::session_store(&pool).await.expect("session store");
        let router = app::build_app(state, store).await.expect("router");

        Self {
            router,
            pool,
            generator,
            static_dir,
        }
    }

    /// Database pool behind the app.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The fake model.
    #[must_use]
    pub fn generator(&self) -> &ScriptedGenerator {
        &self.generator
    }

    /// Directory served at `/static`.
    #[must_use]
    pub fn static_dir(&self) -> &Path {
        self.static_dir.path()
    }

    /// Path on disk of an uploaded file.
    #[must_use]
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.static_dir.path().join("uploads").join(filename)
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router returns an error (it is infallible).
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    /// `POST` a urlencoded form.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Register a user with a fixed profile.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response<Body> {
        self.post_form(
            "/register",
            &[
                ("name", name),
                ("email", email),
                ("password", password),
                ("height", "168"),
                ("weight", "60"),
                ("skin_color", "wheatish"),
                ("body_shape", "hourglass"),
                ("gender", "female"),
                ("age", "26"),
            ],
        )
        .await
    }

    /// Register `Priya <priya@example.com>` with [`DEFAULT_PASSWORD`].
    pub async fn register_default(&self) -> Response<Body> {
        self.register("Priya", "priya@example.com", DEFAULT_PASSWORD)
            .await
    }

    /// Log in and return the `name=value` session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login does not set a session cookie.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_form("/login", &[("email", email), ("password", password)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login should redirect");
        session_cookie(response.headers()).expect("login sets a session cookie")
    }

    /// Register and log in the default user.
    pub async fn logged_in(&self) -> String {
        self.register_default().await;
        self.login("priya@example.com", DEFAULT_PASSWORD).await
    }

    /// `POST /fashion-advisor` with a multipart body.
    pub async fn ask(&self, cookie: Option<&str>, form: MultipartForm) -> Response<Body> {
        let mut builder = Request::post("/fashion-advisor")
            .header(header::CONTENT_TYPE, form.content_type());
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.into_body())).expect("request"))
            .await
    }
}

fn test_config(static_dir: &Path) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().expect("ip"),
        port: 5000,
        base_url: "http://127.0.0.1:5000".to_string(),
        static_dir: static_dir.to_path_buf(),
        upload_subdir: "uploads".to_string(),
        gemini: GeminiConfig {
            api_key: None,
            timeout: Duration::from_secs(1),
            ..GeminiConfig::default()
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// The `name=value` part of the `fa_session` Set-Cookie header, if any.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("fa_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Read the whole body.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
}

/// Read the body as UTF-8 text.
///
/// # Panics
///
/// Panics if the body is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).expect("utf-8 body")
}

/// Read the body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

// =============================================================================
// Multipart
// =============================================================================

const BOUNDARY: &str = "fa-test-boundary-7d1f";

/// Minimal `multipart/form-data` body builder.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    /// Empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    /// Finish the body.
    #[must_use]
    pub fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

//! Registration, login, session, and logout flows.

use axum::http::StatusCode;

use fashion_advisor_integration_tests::{
    DEFAULT_PASSWORD, TestApp, body_text, location, session_cookie,
};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new("unused").await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_page_renders() {
    let app = TestApp::new("unused").await;

    let response = app.get("/register", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"skin_color\""));
    assert!(html.contains("name=\"body_shape\""));
}

#[tokio::test]
async fn test_register_redirects_to_login() {
    let app = TestApp::new("unused").await;

    let response = app.register_default().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new("unused").await;
    app.register_default().await;

    let response = app
        .register("Another Priya", "PRIYA@example.com", "different-pass")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/register?error=email_taken"));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(app.pool())
        .await
        .expect("count");
    assert_eq!(users, 1);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new("unused").await;

    let response = app.register("Priya", "priya.example.com", DEFAULT_PASSWORD).await;
    assert_eq!(location(&response), Some("/register?error=invalid_email"));
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new("unused").await;

    let response = app.register("Priya", "priya@example.com", "short").await;
    assert_eq!(location(&response), Some("/register?error=password_too_short"));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(app.pool())
        .await
        .expect("count");
    assert_eq!(users, 0);
}

#[tokio::test]
async fn test_register_error_is_shown_on_page() {
    let app = TestApp::new("unused").await;

    let html = body_text(app.get("/register?error=email_taken", None).await).await;
    assert!(html.contains("An account with this email already exists."));
}

#[tokio::test]
async fn test_register_missing_fields_is_client_error() {
    let app = TestApp::new("unused").await;

    let response = app
        .post_form(
            "/register",
            &[("name", "Priya"), ("email", "priya@example.com")],
        )
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_register_non_numeric_height_is_client_error() {
    let app = TestApp::new("unused").await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Priya"),
                ("email", "priya@example.com"),
                ("password", DEFAULT_PASSWORD),
                ("height", "tall"),
                ("weight", "60"),
                ("skin_color", "wheatish"),
                ("body_shape", "hourglass"),
                ("gender", "female"),
                ("age", "26"),
            ],
        )
        .await;
    assert!(response.status().is_client_error());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_register_then_login_reaches_home() {
    let app = TestApp::new("unused").await;
    app.register_default().await;

    let response = app
        .post_form(
            "/login",
            &[("email", "priya@example.com"), ("password", DEFAULT_PASSWORD)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let cookie = session_cookie(response.headers()).expect("session cookie");
    let home = app.get("/", Some(&cookie)).await;
    assert_eq!(home.status(), StatusCode::OK);
    assert!(body_text(home).await.contains("Hi Priya"));
}

#[tokio::test]
async fn test_login_cookie_attributes() {
    let app = TestApp::new("unused").await;
    app.register_default().await;

    let response = app
        .post_form(
            "/login",
            &[("email", "priya@example.com"), ("password", DEFAULT_PASSWORD)],
        )
        .await;

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(set_cookie.starts_with("fa_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let app = TestApp::new("unused").await;
    app.register_default().await;

    let cookie = app.login("  Priya@Example.COM ", DEFAULT_PASSWORD).await;
    assert!(cookie.starts_with("fa_session="));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new("unused").await;
    app.register_default().await;

    let response = app
        .post_form(
            "/login",
            &[("email", "priya@example.com"), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(response.headers()).is_none());
    assert_eq!(
        body_text(response).await,
        "Invalid credentials. Please try again."
    );
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let app = TestApp::new("unused").await;

    let response = app
        .post_form(
            "/login",
            &[("email", "ghost@example.com"), ("password", DEFAULT_PASSWORD)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(response).await,
        "Invalid credentials. Please try again."
    );
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new("unused").await;

    let response = app.get("/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("action=\"/login\""));
}

// ============================================================================
// Protected pages and logout
// ============================================================================

#[tokio::test]
async fn test_home_without_session_redirects_to_login() {
    let app = TestApp::new("unused").await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_home_with_bogus_cookie_redirects_to_login() {
    let app = TestApp::new("unused").await;

    let response = app.get("/", Some("fa_session=not-a-real-session")).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new("unused").await;
    let cookie = app.logged_in().await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_logout_without_session_redirects_to_login() {
    let app = TestApp::new("unused").await;

    let response = app.get("/logout", None).await;
    assert_eq!(location(&response), Some("/login"));
}

//! Fashion Advisor server binary.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for the few HTML pages
//! - `SQLite` for users and sessions (tower-sessions store on the same pool)
//! - Google Gemini for styling advice, behind the `ContentGenerator` trait
//! - Uploaded images written under the static directory and served back

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::ExpiredDeletion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fashion_advisor_server::config::ServerConfig;
use fashion_advisor_server::state::AppState;
use fashion_advisor_server::{app, db};

/// How often expired sessions are purged.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fashion_advisor_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; advice requests will return the fallback reply");
    } else if let Some(warning) = config.gemini.api_key_warning() {
        tracing::warn!("{warning}; advice requests may return the fallback reply");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let store = app::session_store(&pool)
        .await
        .expect("Failed to prepare session store");
    tokio::spawn(store.clone().continuously_delete_expired(SESSION_CLEANUP_INTERVAL));

    let state = AppState::new(config.clone(), pool).expect("Failed to initialize application state");

    let app = app::build_app(state, store)
        .await
        .expect("Failed to build router")
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("fashion advisor listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

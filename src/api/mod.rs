//! HTTP API.
//!
//! JSON in, JSON out. Public routes serve the marketing site; everything
//! under `/api/admin` requires the admin bearer token. Compressed media is
//! served statically from `/media`.
//!
//! | Status | Meaning |
//! |---|---|
//! | 400 | validation or malformed request |
//! | 401 | missing or wrong admin token |
//! | 404 | unknown id or slug |
//! | 422 | no file in an upload could be compressed |
//! | 503 | admin API disabled (no token configured) |
//! | 500 | store or filesystem failure |
//!
//! Reorder endpoints answer 200 with the new order even when it could not
//! be saved; the body then carries `persisted: false` and a `warning`.

pub mod admin;
mod auth;
pub mod error;
pub mod public;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::config::{DeskConfig, ServerConfig};
use crate::media::MEDIA_URL_PREFIX;
use crate::store::StoreError;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::{net::TcpListener, signal::ctrl_c};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Largest accepted request body (multipart uploads included).
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/properties", post(admin::create_property))
        .route(
            "/properties/{id}",
            put(admin::update_property).delete(admin::delete_property),
        )
        .route(
            "/properties/{id}/gallery/reorder",
            post(admin::reorder_gallery),
        )
        .route("/portfolio", post(admin::create_portfolio_item))
        .route("/portfolio/reorder", post(admin::reorder_portfolio))
        .route(
            "/portfolio/{id}",
            put(admin::update_portfolio_item).delete(admin::delete_portfolio_item),
        )
        .route(
            "/blog",
            get(admin::list_blog_posts).post(admin::create_blog_post),
        )
        .route(
            "/blog/{id}",
            put(admin::update_blog_post).delete(admin::delete_blog_post),
        )
        .route("/homepage", put(admin::update_homepage))
        .route("/leads", get(admin::list_leads))
        .route(
            "/media",
            get(admin::list_media_files).post(admin::upload_media),
        )
        .route_layer(from_fn_with_state(state, auth::require_admin))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = if server.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins(server))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

fn allowed_origins(server: &ServerConfig) -> Vec<HeaderValue> {
    server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// The full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(public::health))
        .route("/api/chat/conversations", get(public::list_conversations))
        .route("/api/chat/messages", post(public::post_chat_message))
        .route("/api/leads", post(public::create_lead))
        .route("/api/properties", get(public::list_properties))
        .route("/api/properties/{id}", get(public::get_property))
        .route("/api/portfolio", get(public::list_portfolio))
        .route("/api/blog", get(public::list_blog))
        .route("/api/blog/{slug}", get(public::get_blog_post))
        .route("/api/homepage", get(public::get_homepage))
        .nest("/api/admin", admin_routes(state.clone()))
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(state.media_dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&state.config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl-C or SIGTERM.
pub async fn serve(config: DeskConfig, admin_token: Option<String>) -> Result<(), ServeError> {
    let address = config.bind_address();

    info!("Initializing state...");
    let state = AppState::new(config, admin_token)?;
    info!(
        data_dir = %state.config.storage.data_dir.display(),
        media_dir = %state.media_dir().display(),
        "store ready"
    );
    if state.admin_token.is_none() {
        warn!(
            "{} is not set; admin routes will answer 503",
            crate::config::ADMIN_TOKEN_ENV
        );
    }

    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

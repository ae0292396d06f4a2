use axum::Router;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::Response;
use axum::routing::get;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{
    AuthState, create_auth_router, create_logout_router, login_redirect_middleware,
    session_middleware,
};
use crate::config::Config;
use crate::session::SessionService;
use crate::todo::{TodoState, create_todo_actions_router, create_todo_pages_router};

pub mod htmx;
pub mod trace;

use trace::FilteredMakeSpan;

/// Builds the application router on top of an already migrated database.
pub fn create_app(config: &Config, db: DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let auth_state = Arc::new(AuthState::from_config(config, db.clone()));
    let todo_state = Arc::new(TodoState {
        db,
        select_limit: config.todos_select_limit,
    });

    let protected_routes = Router::new()
        .merge(create_todo_pages_router(todo_state.clone()))
        .merge(create_logout_router(auth_state.clone()))
        .layer(from_fn(login_redirect_middleware));

    let public_routes = Router::new()
        .route("/health", get(health_check_handler))
        .route("/", get(root_handler))
        .merge(create_auth_router(auth_state.clone()))
        .merge(create_todo_actions_router(todo_state));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveHeadersLayer::new([COOKIE, SET_COOKIE]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::new().expose_headers([
                    htmx::HX_RETARGET,
                    htmx::HX_RESWAP,
                    htmx::HX_REDIRECT,
                ]))
                .layer(from_fn_with_state(auth_state, session_middleware)),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let removed = SessionService::new(&db).delete_expired_sessions().await?;
    tracing::info!(removed, "Expired sessions cleaned up");

    let app = create_app(&config, db);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument(skip(headers))]
pub async fn root_handler(headers: HeaderMap) -> Response {
    htmx::redirect(&headers, "/todos")
}

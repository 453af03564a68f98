use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{auth, posts};
use crate::auth::access::AccessController;
use crate::auth::tokens::Tokens;
use crate::db::posts::{InMemoryPostStore, PostStore};
use crate::db::users::SqliteUserStore;

pub struct AppState {
    pub access: AccessController,
    pub posts: Arc<dyn PostStore>,
}

pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite::memory:".to_string()),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| "super-secret".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/login", post(auth::login))
        .route("/api/register", post(auth::register))
        .route(
            "/api/posts/",
            get(posts::get_all_posts).post(posts::create_post),
        )
        .route("/api/posts/{category}", get(posts::get_posts_by_category))
        .route("/api/user/{login}", get(posts::get_posts_by_user))
        .route(
            "/api/post/{id}",
            get(posts::get_post_by_id).delete(posts::delete_post),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: Config) {
    // An in-memory database only exists on the connection that opened it,
    // so keep the pool at a single connection for that case.
    let max_connections = if config.database_url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to SQLite");

    let users = SqliteUserStore::new(pool)
        .await
        .expect("Failed to prepare users table");

    let state = Arc::new(AppState {
        access: AccessController::new(Arc::new(users), Tokens::new(config.jwt_secret.as_bytes())),
        posts: Arc::new(InMemoryPostStore::new()),
    });

    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");

    info!(addr = %config.bind_addr, "server running");

    axum::serve(listener, app).await.expect("Server failed");
}

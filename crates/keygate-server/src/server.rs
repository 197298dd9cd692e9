use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth::require_admin_key,
    handlers::{
        add_apikey, add_update, check_apikey, check_update, edit_apikey, health, list_apikey,
        update_limit,
    },
    store::Store,
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admin_key: String,
    pub data_dir: Option<PathBuf>,
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("KEYGATE_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("KEYGATE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admin_key: std::env::var("KEYGATE_ADMIN_KEY").unwrap_or_default(),
            data_dir: std::env::var("KEYGATE_DATA_DIR").ok().map(PathBuf::from),
            cors_origins: std::env::var("KEYGATE_CORS_ORIGINS").ok(),
        }
    }
}

/// Use `explicit` when given (creating it if needed), else the platform data dir.
pub fn resolve_data_dir(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(d) => {
            std::fs::create_dir_all(d).context("create data dir")?;
            Ok(d.clone())
        }
        None => crate::dirs::data_dir(),
    }
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    if cfg.admin_key.is_empty() {
        anyhow::bail!("KEYGATE_ADMIN_KEY must be set to a non-empty value");
    }

    let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
    info!(data_dir = %data_dir.display(), "using data directory");

    let db_path = data_dir.join("keygate.db");
    let store = Store::open(&db_path).context("open store")?;

    let state = AppState::new(store, cfg.admin_key);
    let app = build_router(state, cfg.cors_origins.as_deref());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "keygate server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app).await.context("server error")
}

pub fn build_router(state: AppState, cors_origins: Option<&str>) -> Router {
    // Public routes: the key in the body is the caller's only credential.
    let public = Router::new()
        .route("/health", get(health))
        .route("/check_apikey", post(check_apikey))
        .route("/update_limit", post(update_limit))
        .route("/check_update", post(check_update));

    let admin = Router::new()
        .route("/add_apikey", post(add_apikey))
        .route("/edit_apikey", post(edit_apikey))
        .route("/list_apikey", get(list_apikey))
        .route("/add_update", post(add_update))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}

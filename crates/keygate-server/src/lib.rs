pub mod auth;
pub mod dirs;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod store;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: registry::KeyRegistry,
    pub gate: gate::UpdateGate,
    /// Shared secret expected in `X-Admin-Key` on admin routes.
    pub admin_key: String,
}

impl AppState {
    pub fn new(store: store::Store, admin_key: String) -> Self {
        let registry = registry::KeyRegistry::new(store.clone());
        let gate = gate::UpdateGate::new(store, registry.clone());
        Self {
            registry,
            gate,
            admin_key,
        }
    }
}

pub use error::ApiError;
pub use server::{build_router, resolve_data_dir, run, ServerConfig};

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{JwtDecoder, TokenDecoder};
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::attach_scope_middleware;
use crate::services::{InMemoryDirectory, PgDirectory, WorkerDirectory};

/// Shared, read-only application state. Nothing request-specific lives here.
#[derive(Clone)]
pub struct AppState {
    pub decoder: Arc<dyn TokenDecoder>,
    pub directory: Arc<dyn WorkerDirectory>,
    pub audit_logging: bool,
}

impl AppState {
    pub fn new(decoder: Arc<dyn TokenDecoder>, directory: Arc<dyn WorkerDirectory>) -> Self {
        Self {
            decoder,
            directory,
            audit_logging: false,
        }
    }

    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.audit_logging = enabled;
        self
    }

    /// Wire the JWT decoder and the directory named by the configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let decoder = JwtDecoder::from_config(&config.security)
            .map_err(|e| anyhow::anyhow!("cannot build token decoder: {} (set JWT_SECRET)", e))?;

        let directory: Arc<dyn WorkerDirectory> = match config.database.url {
            Some(_) => Arc::new(PgDirectory::connect_lazy(&config.database)?),
            None => {
                tracing::warn!("DATABASE_URL not set; serving workers from an empty in-memory directory");
                Arc::new(InMemoryDirectory::default())
            }
        };

        Ok(Self::new(Arc::new(decoder), directory).with_audit_logging(config.security.enable_audit_logging))
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Scoped API
        .merge(auth_routes())
        .merge(scope_routes())
        .merge(worker_routes())
        .layer(middleware::from_fn_with_state(state.clone(), attach_scope_middleware))
        .with_state(state);

    let app = if config.api.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(protected::auth::whoami))
}

fn scope_routes() -> Router<AppState> {
    use protected::scope;

    Router::new()
        .route("/api/scope", get(scope::show))
        .route("/api/sites/:site_id/access", get(scope::site_access))
        .route("/api/sites/:site_id/subsites/:subsite_id/access", get(scope::subsite_access))
}

fn worker_routes() -> Router<AppState> {
    Router::new().route("/api/workers", get(protected::workers::list))
}

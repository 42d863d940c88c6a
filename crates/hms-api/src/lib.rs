//! HTTP surface of the token authority
//!
//! Login, registration and refresh endpoints plus the bearer/role gates that
//! protect the rest of the HMS API.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use hms_auth::TokenIssuer;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

use crate::store::UserStore;

/// Application state shared across handlers
pub struct AppState {
    pub issuer: TokenIssuer,
    pub users: Arc<dyn UserStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HMS Auth API",
        version = "0.1.0",
        description = "Staff authentication for the hospital records backend"
    ),
    paths(
        handlers::health_check,
        handlers::register,
        handlers::login,
        handlers::refresh,
        handlers::get_current_user,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::UserRole,
            models::User,
            models::RegisterRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::RefreshRequest,
            models::RefreshResponse,
            models::CurrentUser,
        )
    ),
    tags(
        (name = "auth", description = "Authentication and token endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, issuer: TokenIssuer, users: Arc<dyn UserStore>) -> Self {
        let state = Arc::new(AppState { issuer, users });
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let jwt_state = Arc::new(middleware::JwtState::new(self.state.issuer.verifier()));

        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route(
                "/api/openapi.json",
                get(|| async { Json(ApiDoc::openapi()) }),
            )
            .route("/api/v1/register", post(handlers::register))
            .route("/api/v1/login", post(handlers::login))
            .route("/api/v1/refresh", post(handlers::refresh))
            .with_state(self.state.clone());

        // PROTECTED routes (require a valid bearer token)
        let protected_router = Router::new()
            .route("/api/v1/me", get(handlers::get_current_user))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state,
                middleware::require_auth,
            ));

        public_router
            .merge(protected_router)
            .layer(TraceLayer::new_for_http())
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

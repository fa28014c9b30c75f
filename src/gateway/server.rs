//! Gateway server setup.
//!
//! # Responsibilities
//! - Build the axum router with the ordered filter chain
//! - Hold the shared application state (route table, verifier, limiter,
//!   upstream client)
//! - Serve connections with graceful shutdown
//! - Apply hot-reloaded route tables atomically

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{body::Body, middleware, routing::any, Router};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::token::parse_algorithm;
use crate::auth::TokenVerifier;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, GatewayConfig};
use crate::filters::{
    authentication::authentication_filter, cors::cors_layer, logging::logging_filter,
    rate_limit::rate_limit_filter,
};
use crate::gateway::proxy::proxy_handler;
use crate::gateway::StartupError;
use crate::ratelimit::RateLimitStore;
use crate::routing::RouteTable;

/// How often quiet rate-limit keys are swept out of the store.
const LIMITER_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state injected into filters and the proxy handler.
///
/// Every handle here is built once at startup and passed explicitly; the
/// route table is the only piece replaced at runtime, and only as a whole.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ArcSwap<RouteTable>>,
    pub verifier: Arc<TokenVerifier>,
    pub limiter: Arc<RateLimitStore>,
    pub client: Client<HttpConnector, Body>,
    pub config: Arc<GatewayConfig>,
}

/// HTTP server for the edge gateway.
pub struct GatewayServer {
    router: Router,
    state: AppState,
}

impl GatewayServer {
    /// Build the server from a configuration, re-running semantic
    /// validation so a hand-constructed config cannot bypass the fail-fast
    /// rules (missing signing secret, empty route table).
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let table = Arc::new(ArcSwap::from_pointee(RouteTable::from_config(
            &config.routes,
        )?));
        // Validation guarantees a known algorithm name.
        let algorithm =
            parse_algorithm(&config.auth.algorithm).unwrap_or(jsonwebtoken::Algorithm::HS512);
        let verifier = Arc::new(TokenVerifier::new(
            &config.auth.signing_secret,
            algorithm,
            Duration::from_secs(config.auth.token_ttl_secs),
        ));
        let limiter = Arc::new(RateLimitStore::new());
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            table,
            verifier,
            limiter,
            client,
            config: Arc::new(config),
        };

        let router = Self::build_router(&state);
        Ok(Self { router, state })
    }

    /// Build the axum router.
    ///
    /// The filter chain order is declared here, outermost first:
    /// Logging → Authentication → Rate Limiting → dispatch. Axum applies
    /// layers inside-out, so the stack below reads innermost first. The
    /// request timeout sits inside the logging wrap: a timed-out request
    /// still travels back through the logging filter and yields its
    /// completion record. CORS is outermost so preflights are answered
    /// before the chain.
    fn build_router(state: &AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_filter,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_filter,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(
                state.config.timeouts.request_secs,
            )))
            .layer(middleware::from_fn(logging_filter))
            .layer(TraceLayer::new_for_http());

        if state.config.cors.enabled {
            router.layer(cors_layer(&state.config.cors))
        } else {
            router
        }
    }

    /// Run the server until the shutdown signal fires.
    ///
    /// `config_updates` delivers hot-reloaded configurations (already
    /// validated by the watcher); only their route tables are applied.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.table.load().len(),
            "Gateway server starting"
        );

        self.spawn_reload_task(config_updates, shutdown.resubscribe());
        self.spawn_purge_task(shutdown.resubscribe());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Gateway server stopped");
        Ok(())
    }

    fn spawn_reload_task(
        &self,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let table = self.state.table.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(new_config) => match RouteTable::from_config(&new_config.routes) {
                            Ok(new_table) => {
                                tracing::info!(routes = new_table.len(), "Route table replaced");
                                table.store(Arc::new(new_table));
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Rejected reloaded route table");
                            }
                        },
                        None => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
        });
    }

    fn spawn_purge_task(&self, mut shutdown: broadcast::Receiver<()>) {
        let limiter = self.state.limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIMITER_PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => limiter.purge_expired(),
                    _ = shutdown.recv() => break,
                }
            }
        });
    }

    /// The shared state, exposed for tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

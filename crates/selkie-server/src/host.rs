//! Actor host entry point
//!
//! TigerStyle: Explicit builder, registrations frozen before serving.

use crate::health::{AlwaysHealthy, HealthCheck};
use crate::routes::{router, AppState};
use axum::Router;
use selkie_core::{ActorKey, Error, HostConfig, Result};
use selkie_runtime::{ActorRegistry, Dispatcher, VirtualActor};
use selkie_state::{MemoryStateBackend, StateBackend, StateCell, StateEngine, StateSchema};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Initialize tracing with the standard env-filter setup
///
/// Applications embedding the host call this once at startup; a second
/// call is a no-op.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();
}

/// The actor host: registrations, config, and the serve loop
///
/// Defaults to the in-memory state backend; production hosts point at the
/// sidecar with [`ActorHost::with_state_backend`].
pub struct ActorHost {
    registry: ActorRegistry,
    config: HostConfig,
    backend: Arc<dyn StateBackend>,
    health: Arc<dyn HealthCheck>,
}

impl ActorHost {
    pub fn new() -> Self {
        Self {
            registry: ActorRegistry::new(),
            config: HostConfig::new(),
            backend: Arc::new(MemoryStateBackend::new()),
            health: Arc::new(AlwaysHealthy),
        }
    }

    /// Use the given state backend for all actor state
    pub fn with_state_backend(mut self, backend: Arc<dyn StateBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Override the liveness probe behind `GET /healthz`
    pub fn with_health_check(mut self, health: Arc<dyn HealthCheck>) -> Self {
        self.health = health;
        self
    }

    /// Set the idle timeout advertised to the sidecar
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_idle_timeout(timeout);
        self
    }

    /// Set the idle-actor scan interval advertised to the sidecar
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_scan_interval(interval);
        self
    }

    /// Set the drain timeout advertised to the sidecar
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_drain_timeout(timeout);
        self
    }

    /// Set whether rebalanced actors are drained before deactivation
    pub fn with_drain_rebalanced(mut self, drain: bool) -> Self {
        self.config = self.config.with_drain_rebalanced(drain);
        self
    }

    /// Register an actor type with no declared state
    pub fn register<A, F>(mut self, actor_type: impl Into<String>, make: F) -> Self
    where
        A: VirtualActor + 'static,
        F: Fn(ActorKey) -> A + Send + Sync + 'static,
    {
        self.registry.register(actor_type, make);
        self
    }

    /// Register a state-bearing actor type
    pub fn register_stateful<A, S, F>(mut self, actor_type: impl Into<String>, make: F) -> Self
    where
        A: VirtualActor + 'static,
        S: StateSchema,
        F: Fn(ActorKey, StateCell<S>) -> A + Send + Sync + 'static,
    {
        self.registry.register_stateful(actor_type, make);
        self
    }

    /// Freeze registrations and build the router
    pub fn into_router(self) -> Router {
        let document = self.config.document(self.registry.entities());
        let engine = Arc::new(StateEngine::new(self.backend));
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(self.registry), engine));
        router(AppState::new(dispatcher, document, self.health))
    }

    /// Serve until the listener fails or the process is stopped
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let entities = self.registry.entities().to_vec();
        let app = self.into_router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("failed to bind {}: {}", addr, e)))?;
        info!(%addr, ?entities, "actor host listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("serve failed: {}", e)))
    }
}

impl Default for ActorHost {
    fn default() -> Self {
        Self::new()
    }
}

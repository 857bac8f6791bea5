//! `PairquizServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → binding → rooms, and
//! runs the background disuse sweeper that removes rooms nobody ever
//! joined.

use std::sync::Arc;
use std::time::Duration;

use pairquiz_binding::BindingManager;
use pairquiz_catalog::ChallengeCatalog;
use pairquiz_protocol::JsonCodec;
use pairquiz_room::{RoomRegistry, RuleConfig};
use pairquiz_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::PairquizError;
use crate::handler::handle_connection;

/// How often the registry is scanned for unused rooms.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) bindings: Mutex<BindingManager>,
    pub(crate) codec: JsonCodec,
    pub(crate) rules: Arc<RuleConfig>,
}

/// Builder for configuring and starting a pairquiz server.
pub struct PairquizServerBuilder {
    bind_addr: String,
    rules: RuleConfig,
}

impl PairquizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            rules: RuleConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the game rules.
    pub fn rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Builds the server over an already-loaded challenge catalog.
    pub async fn build(self, catalog: ChallengeCatalog) -> Result<PairquizServer, PairquizError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        if catalog.is_empty() {
            tracing::warn!("starting with an empty challenge catalog — rounds cannot be served");
        }

        let rules = Arc::new(self.rules);
        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(Arc::new(catalog), Arc::clone(&rules))),
            bindings: Mutex::new(BindingManager::new()),
            codec: JsonCodec,
            rules,
        });

        Ok(PairquizServer { transport, state })
    }
}

impl Default for PairquizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running pairquiz server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PairquizServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl PairquizServer {
    /// Creates a new builder.
    pub fn builder() -> PairquizServerBuilder {
        PairquizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Spawns the disuse sweeper, then accepts connections and hands each
    /// one its own handler task.
    pub async fn run(mut self) -> Result<(), PairquizError> {
        tracing::info!("pairquiz server running");

        let sweeper_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let grace = sweeper_state.rules.disuse_grace;
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = sweeper_state
                    .registry
                    .lock()
                    .await
                    .sweep_unused(grace)
                    .await;
                if removed > 0 {
                    tracing::debug!(removed, "disuse sweep removed rooms");
                }
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

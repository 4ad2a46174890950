// src/server/mod.rs

//! Server bootstrap: resolve configuration into shared state, run the
//! replica handshake if configured, then accept connections until shutdown.

mod connection_loop;
mod initialization;

use crate::config::ServerConfig;
use crate::core::KvNodeError;
use std::sync::Arc;
use tracing::info;

/// Starts the server: binds the listen socket, selects role from `config`,
/// runs the replica handshake against the configured upstream master (if
/// any), then accepts connections until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), KvNodeError> {
    Server::bind(config).await?.serve().await;
    Ok(())
}

/// A bound, handshake-complete server, not yet accepting connections.
///
/// Split out from [`run`] so tests can bind to an ephemeral port (`config.port
/// == 0`), read back the address the OS actually chose via [`Server::local_addr`],
/// and drive [`Server::serve`] as a background task against a real socket.
pub struct Server {
    ctx: ServerContext,
}

impl Server {
    /// Binds the listen socket, selects role from `config`, and runs the
    /// replica handshake against the configured upstream master (if any).
    /// Does not accept connections yet.
    pub async fn bind(config: ServerConfig) -> Result<Self, KvNodeError> {
        let ctx = initialization::setup(config).await?;
        info!(port = ctx.state.config.port, "server initialized");

        if let crate::core::replication::Role::Replica(replica) = &ctx.state.role {
            initialization::run_replica_handshake(replica.clone(), ctx.state.clone()).await?;
        }

        Ok(Self { ctx })
    }

    /// The address of the bound listen socket, useful when `config.port == 0`
    /// asked the OS to pick one.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.ctx.listener.local_addr()
    }

    /// Accepts connections until a shutdown signal arrives.
    pub async fn serve(self) {
        connection_loop::run(self.ctx).await;
    }
}

/// Bundles the state handed from initialization into the connection-accept
/// loop.
pub(crate) struct ServerContext {
    pub state: Arc<crate::core::context::ServerState>,
    pub listener: tokio::net::TcpListener,
}

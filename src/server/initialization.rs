// src/server/initialization.rs

//! Resolves a `ServerConfig` into the shared `ServerState` and a bound
//! listen socket, and drives the replica-side handshake when configured.

use super::ServerContext;
use crate::config::ServerConfig;
use crate::connection;
use crate::core::context::ServerState;
use crate::core::replication::{self, MasterState, ReplicaState, Role};
use crate::core::store::Store;
use crate::core::{rdb, KvNodeError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Binds the listen socket and builds the process-wide `ServerState`. A
/// missing RDB file or a bind failure is a startup error (exit code 1 at
/// the process boundary).
pub async fn setup(config: ServerConfig) -> Result<ServerContext, KvNodeError> {
    let rdb_snapshot = rdb::load(&config.rdb_path)?;

    let role = match &config.replicaof {
        Some(upstream) => Role::Replica(ReplicaState {
            upstream_host: upstream.host.clone(),
            upstream_port: upstream.port,
        }),
        None => Role::Master(Arc::new(MasterState::new()?)),
    };

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| KvNodeError::Startup(format!("failed to bind port {}: {e}", config.port)))?;
    info!(port = config.port, "listening for connections");

    let state = Arc::new(ServerState {
        config,
        store: Arc::new(Store::new()),
        role,
        rdb_snapshot,
    });

    Ok(ServerContext { state, listener })
}

/// Runs the replica-side PSYNC handshake against `replica`'s upstream
/// master, then hands the resulting connection off to the ordinary
/// connection-handling loop as a background task so propagated writes keep
/// being ingested for the rest of the process's life.
pub async fn run_replica_handshake(
    replica: ReplicaState,
    state: Arc<ServerState>,
) -> Result<(), KvNodeError> {
    let outcome = replication::handshake::run(
        &replica.upstream_host,
        replica.upstream_port,
        state.config.port,
    )
    .await?;

    let addr = outcome
        .stream
        .peer_addr()
        .map_err(KvNodeError::from)?;

    tokio::spawn(connection::serve_master_link(
        outcome.stream,
        addr,
        state,
        outcome.leftover,
    ));
    Ok(())
}

// src/server/connection_loop.rs

//! The main accept loop: every accepted socket becomes an independently
//! scheduled connection-handler task. A SIGINT/SIGTERM (or Ctrl-C on
//! Windows) stops accepting new connections and waits for in-flight
//! connection tasks to wind down before returning.

use super::ServerContext;
use crate::connection;
use tokio::task::JoinSet;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, shutting down"),
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        }
    }
    #[cfg(windows)]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received, shutting down");
    }
}

pub async fn run(ctx: ServerContext) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = await_shutdown_signal() => break,

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!(%addr, "accepted connection");
                        let state = ctx.state.clone();
                        tasks.spawn(connection::serve_client(socket, addr, state));
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                }
            }

            Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = res {
                    if e.is_panic() {
                        error!("a connection handler panicked: {e:?}");
                    }
                }
            }
        }
    }

    info!("no longer accepting new connections, waiting for in-flight connections to finish");
    tasks.shutdown().await;
    info!("shutdown complete");
}

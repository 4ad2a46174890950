// src/connection/mod.rs

//! Per-connection command handling: feeding bytes through the wire codec,
//! parsing commands, and dispatching them against shared server state.

mod handler;

pub use handler::{serve_client, serve_master_link};

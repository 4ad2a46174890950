// src/core/context.rs

//! The process-wide state shared by every task: the store, the role, and
//! the fixed RDB snapshot. Passed around as an explicit `Arc<ServerState>`
//! rather than through global mutable state.

use crate::config::ServerConfig;
use crate::core::replication::Role;
use crate::core::store::Store;
use bytes::Bytes;
use std::sync::Arc;

pub struct ServerState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
    pub role: Role,
    pub rdb_snapshot: Bytes,
}

// src/core/dispatcher.rs

//! Per-command execution against shared state. `PSYNC` is handled directly
//! by the connection handler (it needs to drive the socket through several
//! sequential writes and a registry mutation) rather than going through
//! `dispatch`; every other command is a single reply computation with, for
//! `SET`, a replication side effect.

use crate::core::command::Command;
use crate::core::context::ServerState;
use crate::core::protocol::RespFrame;
use crate::core::replication::state::{propagate, Role};
use crate::core::store::{schedule_expiry, Lookup};
use crate::core::KvNodeError;
use bytes::Bytes;
use tracing::debug;

/// Executes `cmd`, mutating the store and replication state as needed, and
/// returns the reply frame to write back (`None` for commands that reply
/// with nothing, e.g. `REPLCONF ACK`). `raw` is the exact wire bytes the
/// command was decoded from; it is only used when `cmd` is write-replicated.
pub async fn dispatch(
    cmd: &Command,
    raw: &Bytes,
    state: &ServerState,
) -> Result<Option<RespFrame>, KvNodeError> {
    match cmd {
        Command::Ping => Ok(Some(RespFrame::SimpleString("PONG".to_string()))),

        Command::Echo(msg) => Ok(Some(RespFrame::BulkString(msg.clone()))),

        Command::Set { key, value, px } => {
            match &state.role {
                // The store mutation, write-log append and registry snapshot
                // must happen as one atomic step so that two concurrent SETs
                // land in the log in the same order they land in the store;
                // `apply_write` does the mutation itself while holding its
                // own lock, rather than this call site taking the store's
                // lock and `MasterState`'s lock as two separate steps.
                Role::Master(master) => {
                    let snapshot = master.apply_write(&state.store, key.clone(), value.clone(), raw.clone());
                    debug!(replicas = snapshot.len(), "propagating write to replicas");
                    propagate(&snapshot, raw).await;
                }
                Role::Replica(_) => {
                    state.store.set(key.clone(), value.clone());
                }
            }
            if let Some(millis) = px {
                schedule_expiry(state.store.clone(), key.clone(), *millis);
            }
            Ok(Some(RespFrame::ok()))
        }

        Command::Get { key } => match state.store.get(key) {
            Lookup::Found(value) => Ok(Some(RespFrame::BulkString(value))),
            Lookup::Absent => Ok(Some(RespFrame::Null)),
        },

        Command::InfoReplication => Ok(Some(RespFrame::BulkString(Bytes::from(
            info_replication_payload(state),
        )))),

        Command::InfoOther => Err(KvNodeError::UnsupportedInfoArgument),

        Command::ReplconfListeningPort | Command::ReplconfCapa => Ok(Some(RespFrame::ok())),

        Command::ReplconfGetAck => Ok(Some(RespFrame::Array(vec![
            RespFrame::BulkString(Bytes::from_static(b"REPLCONF")),
            RespFrame::BulkString(Bytes::from_static(b"ACK")),
            RespFrame::BulkString(Bytes::from_static(b"0")),
        ]))),

        Command::ReplconfAck => Ok(None),

        // The connection handler intercepts PSYNC before calling dispatch.
        Command::Psync => Err(KvNodeError::BadRequest),

        Command::Unknown => Err(KvNodeError::UnsupportedCommand),
    }
}

fn info_replication_payload(state: &ServerState) -> String {
    match &state.role {
        Role::Master(master) => format!(
            "# Replication\r\nrole:master\r\nconnected_slaves:{}\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
            master.connected_replica_count(),
            master.replid,
            master.offset.load(std::sync::atomic::Ordering::Relaxed),
        ),
        Role::Replica(_) => "# Replication\r\nrole:slave\r\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::core::replication::state::MasterState;
    use crate::core::store::Store;
    use std::sync::Arc;

    fn master_state() -> ServerState {
        ServerState {
            config: ServerConfig::default(),
            store: Arc::new(Store::new()),
            role: Role::Master(Arc::new(MasterState::new().unwrap())),
            rdb_snapshot: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let state = master_state();
        let reply = dispatch(&Command::Ping, &Bytes::new(), &state).await.unwrap();
        assert_eq!(reply, Some(RespFrame::SimpleString("PONG".to_string())));
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let state = master_state();
        let set = Command::Set {
            key: Bytes::from_static(b"k"),
            value: Bytes::from_static(b"v"),
            px: None,
        };
        dispatch(&set, &Bytes::from_static(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n"), &state)
            .await
            .unwrap();

        let get = Command::Get { key: Bytes::from_static(b"k") };
        let reply = dispatch(&get, &Bytes::new(), &state).await.unwrap();
        assert_eq!(reply, Some(RespFrame::BulkString(Bytes::from_static(b"v"))));
    }

    #[tokio::test]
    async fn get_missing_key_returns_null() {
        let state = master_state();
        let get = Command::Get { key: Bytes::from_static(b"missing") };
        let reply = dispatch(&get, &Bytes::new(), &state).await.unwrap();
        assert_eq!(reply, Some(RespFrame::Null));
    }

    #[tokio::test]
    async fn set_appends_raw_bytes_to_write_log_and_propagates() {
        let state = master_state();
        let raw = Bytes::from_static(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
        let set = Command::Set {
            key: Bytes::from_static(b"foo"),
            value: Bytes::from_static(b"bar"),
            px: None,
        };
        dispatch(&set, &raw, &state).await.unwrap();

        let Role::Master(master) = &state.role else { unreachable!() };
        assert_eq!(master.write_log_snapshot(), vec![raw]);
    }

    #[tokio::test]
    async fn info_other_is_unsupported() {
        let state = master_state();
        let err = dispatch(&Command::InfoOther, &Bytes::new(), &state).await.unwrap_err();
        assert_eq!(err, KvNodeError::UnsupportedInfoArgument);
    }

    #[tokio::test]
    async fn unknown_command_is_unsupported() {
        let state = master_state();
        let err = dispatch(&Command::Unknown, &Bytes::new(), &state).await.unwrap_err();
        assert_eq!(err, KvNodeError::UnsupportedCommand);
    }

    #[tokio::test]
    async fn replconf_getack_replies_with_ack_zero() {
        let state = master_state();
        let reply = dispatch(&Command::ReplconfGetAck, &Bytes::new(), &state).await.unwrap();
        assert_eq!(
            reply,
            Some(RespFrame::Array(vec![
                RespFrame::BulkString(Bytes::from_static(b"REPLCONF")),
                RespFrame::BulkString(Bytes::from_static(b"ACK")),
                RespFrame::BulkString(Bytes::from_static(b"0")),
            ]))
        );
    }

    #[tokio::test]
    async fn replconf_ack_has_no_reply() {
        let state = master_state();
        let reply = dispatch(&Command::ReplconfAck, &Bytes::new(), &state).await.unwrap();
        assert_eq!(reply, None);
    }
}

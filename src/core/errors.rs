// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum KvNodeError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Incomplete frame")]
    IncompleteFrame,

    #[error("Unsupported command")]
    UnsupportedCommand,

    #[error("Unsupported INFO argument")]
    UnsupportedInfoArgument,

    #[error("Bad request")]
    BadRequest,

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Replication error: {0}")]
    Replication(String),
}

// `std::io::Error` is not `Clone`, so it is wrapped in an `Arc` and the impl written by hand.
impl Clone for KvNodeError {
    fn clone(&self) -> Self {
        match self {
            KvNodeError::Io(e) => KvNodeError::Io(Arc::clone(e)),
            KvNodeError::Protocol(s) => KvNodeError::Protocol(s.clone()),
            KvNodeError::IncompleteFrame => KvNodeError::IncompleteFrame,
            KvNodeError::UnsupportedCommand => KvNodeError::UnsupportedCommand,
            KvNodeError::UnsupportedInfoArgument => KvNodeError::UnsupportedInfoArgument,
            KvNodeError::BadRequest => KvNodeError::BadRequest,
            KvNodeError::WrongArgumentCount(s) => KvNodeError::WrongArgumentCount(s.clone()),
            KvNodeError::Startup(s) => KvNodeError::Startup(s.clone()),
            KvNodeError::Replication(s) => KvNodeError::Replication(s.clone()),
        }
    }
}

impl PartialEq for KvNodeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KvNodeError::Io(e1), KvNodeError::Io(e2)) => e1.to_string() == e2.to_string(),
            (KvNodeError::Protocol(s1), KvNodeError::Protocol(s2)) => s1 == s2,
            (KvNodeError::WrongArgumentCount(s1), KvNodeError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (KvNodeError::Startup(s1), KvNodeError::Startup(s2)) => s1 == s2,
            (KvNodeError::Replication(s1), KvNodeError::Replication(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

/// Maps a dispatcher-facing error onto the short, human-readable text sent
/// back to the client as a RESP simple error.
impl KvNodeError {
    pub fn as_reply_message(&self) -> String {
        match self {
            KvNodeError::UnsupportedCommand => "Unsupported command".to_string(),
            KvNodeError::UnsupportedInfoArgument => "Unsupported INFO argument".to_string(),
            KvNodeError::BadRequest => "Bad request".to_string(),
            KvNodeError::WrongArgumentCount(cmd) => {
                format!("wrong number of arguments for '{cmd}' command")
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for KvNodeError {
    fn from(e: std::io::Error) -> Self {
        KvNodeError::Io(Arc::new(e))
    }
}

impl From<ParseIntError> for KvNodeError {
    fn from(_: ParseIntError) -> Self {
        KvNodeError::BadRequest
    }
}

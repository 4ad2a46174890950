// src/core/command.rs

//! The command model: the small, fixed set of operations this server
//! understands, and the parse step that turns a decoded `RespFrame::Array`
//! of bulk strings into one of them.

use crate::core::KvNodeError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// A parsed client/replica command, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Echo(Bytes),
    Set { key: Bytes, value: Bytes, px: Option<u64> },
    Get { key: Bytes },
    InfoReplication,
    InfoOther,
    ReplconfListeningPort,
    ReplconfCapa,
    ReplconfGetAck,
    ReplconfAck,
    Psync,
    Unknown,
}

impl Command {
    /// A command is "write-replicated" iff its uppercased name is `SET`.
    pub fn is_write(&self) -> bool {
        matches!(self, Command::Set { .. })
    }
}

/// Parses a fully-decoded `RespFrame` into a `Command`. Only `Array` frames
/// whose elements are all `BulkString`s are valid requests; anything else is
/// a bad request.
pub fn parse(frame: &RespFrame) -> Result<Command, KvNodeError> {
    let RespFrame::Array(elements) = frame else {
        return Err(KvNodeError::BadRequest);
    };

    let mut args = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            RespFrame::BulkString(b) => args.push(b.clone()),
            _ => return Err(KvNodeError::BadRequest),
        }
    }
    if args.is_empty() {
        return Err(KvNodeError::BadRequest);
    }

    let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
    match name.as_str() {
        "PING" => Ok(Command::Ping),
        "ECHO" => {
            if args.len() != 2 {
                return Err(KvNodeError::WrongArgumentCount("echo".to_string()));
            }
            Ok(Command::Echo(args[1].clone()))
        }
        "SET" => parse_set(&args),
        "GET" => {
            if args.len() != 2 {
                return Err(KvNodeError::WrongArgumentCount("get".to_string()));
            }
            Ok(Command::Get { key: args[1].clone() })
        }
        "INFO" => parse_info(&args),
        "REPLCONF" => parse_replconf(&args),
        "PSYNC" => Ok(Command::Psync),
        _ => Ok(Command::Unknown),
    }
}

fn parse_set(args: &[Bytes]) -> Result<Command, KvNodeError> {
    if args.len() == 3 {
        return Ok(Command::Set {
            key: args[1].clone(),
            value: args[2].clone(),
            px: None,
        });
    }
    if args.len() == 5 {
        let subcommand = String::from_utf8_lossy(&args[3]).to_ascii_uppercase();
        if subcommand != "PX" {
            return Err(KvNodeError::BadRequest);
        }
        let millis = std::str::from_utf8(&args[4])
            .map_err(|_| KvNodeError::BadRequest)?
            .parse::<u64>()
            .map_err(|_| KvNodeError::BadRequest)?;
        return Ok(Command::Set {
            key: args[1].clone(),
            value: args[2].clone(),
            px: Some(millis),
        });
    }
    Err(KvNodeError::WrongArgumentCount("set".to_string()))
}

fn parse_info(args: &[Bytes]) -> Result<Command, KvNodeError> {
    if args.len() != 2 {
        return Ok(Command::InfoOther);
    }
    let section = String::from_utf8_lossy(&args[1]).to_ascii_lowercase();
    if section == "replication" {
        Ok(Command::InfoReplication)
    } else {
        Ok(Command::InfoOther)
    }
}

fn parse_replconf(args: &[Bytes]) -> Result<Command, KvNodeError> {
    if args.len() < 2 {
        return Err(KvNodeError::WrongArgumentCount("replconf".to_string()));
    }
    let subcommand = String::from_utf8_lossy(&args[1]).to_ascii_uppercase();
    match subcommand.as_str() {
        "LISTENING-PORT" => Ok(Command::ReplconfListeningPort),
        "CAPA" => Ok(Command::ReplconfCapa),
        "GETACK" => Ok(Command::ReplconfGetAck),
        "ACK" => Ok(Command::ReplconfAck),
        _ => Ok(Command::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_array(parts: &[&str]) -> RespFrame {
        RespFrame::Array(
            parts
                .iter()
                .map(|p| RespFrame::BulkString(Bytes::copy_from_slice(p.as_bytes())))
                .collect(),
        )
    }

    #[test]
    fn parses_ping() {
        assert_eq!(parse(&bulk_array(&["PING"])).unwrap(), Command::Ping);
    }

    #[test]
    fn parses_echo_case_insensitively() {
        assert_eq!(
            parse(&bulk_array(&["echo", "hello"])).unwrap(),
            Command::Echo(Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn parses_set_without_px() {
        assert_eq!(
            parse(&bulk_array(&["SET", "k", "v"])).unwrap(),
            Command::Set {
                key: Bytes::from_static(b"k"),
                value: Bytes::from_static(b"v"),
                px: None
            }
        );
    }

    #[test]
    fn parses_set_with_px_case_insensitive_keyword() {
        assert_eq!(
            parse(&bulk_array(&["SET", "k", "v", "px", "100"])).unwrap(),
            Command::Set {
                key: Bytes::from_static(b"k"),
                value: Bytes::from_static(b"v"),
                px: Some(100)
            }
        );
    }

    #[test]
    fn set_with_invalid_px_is_bad_request() {
        let err = parse(&bulk_array(&["SET", "k", "v", "PX", "not-a-number"])).unwrap_err();
        assert_eq!(err, KvNodeError::BadRequest);
    }

    #[test]
    fn parses_info_replication_case_insensitively() {
        assert_eq!(
            parse(&bulk_array(&["INFO", "Replication"])).unwrap(),
            Command::InfoReplication
        );
    }

    #[test]
    fn parses_info_other_section_as_unsupported() {
        assert_eq!(parse(&bulk_array(&["INFO", "server"])).unwrap(), Command::InfoOther);
    }

    #[test]
    fn parses_replconf_subcommands() {
        assert_eq!(
            parse(&bulk_array(&["REPLCONF", "listening-port", "6380"])).unwrap(),
            Command::ReplconfListeningPort
        );
        assert_eq!(
            parse(&bulk_array(&["REPLCONF", "GETACK", "*"])).unwrap(),
            Command::ReplconfGetAck
        );
    }

    #[test]
    fn parses_psync() {
        assert_eq!(parse(&bulk_array(&["PSYNC", "?", "-1"])).unwrap(), Command::Psync);
    }

    #[test]
    fn unknown_command_name_yields_unknown() {
        assert_eq!(parse(&bulk_array(&["FLUBBER"])).unwrap(), Command::Unknown);
    }

    #[test]
    fn non_array_frame_is_bad_request() {
        let err = parse(&RespFrame::SimpleString("PING".to_string())).unwrap_err();
        assert_eq!(err, KvNodeError::BadRequest);
    }

    #[test]
    fn write_detection_is_case_insensitive_by_construction() {
        let set = Command::Set {
            key: Bytes::from_static(b"k"),
            value: Bytes::from_static(b"v"),
            px: None,
        };
        assert!(set.is_write());
        assert!(!Command::Get { key: Bytes::from_static(b"k") }.is_write());
    }
}

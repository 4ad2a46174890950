// src/core/protocol/mod.rs

pub mod frame;

pub use frame::{RespFrame, RespFrameCodec};

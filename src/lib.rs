//! XML-RPC codec: encode method calls from a dynamic value model, and decode
//! responses back into it with a streaming, stack-based decoder.

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod xmlrpc;

pub use crate::config::EncoderConfig;
pub use crate::error::{Error, Result};
pub use crate::xmlrpc::{
    decode_call, decode_iso8601, decode_response, encode_call, encode_iso8601, encode_response, DateTime, Fault, Value,
};

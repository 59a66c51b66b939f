use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::xmlrpc::Fault;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while encoding or decoding XML-RPC.
#[derive(Debug, Error)]
pub enum Error {
    /// A dynamic input had no XML-RPC representation.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),
    /// The XML writer refused an event, or produced invalid output.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Structurally invalid XML, or XML that ends before every element is closed.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// A `<value>` child that is not an XML-RPC type.
    #[error("unknown type <{0}>")]
    UnknownType(String),
    #[error("malformed <{tag}> number {text:?}")]
    MalformedNumber { tag: String, text: String },
    #[error("malformed timestamp {0:?}")]
    MalformedTimestamp(String),
    /// The peer answered with a `<fault>` instead of params.
    #[error("fault {}: {}", .0.code, .0.message)]
    Fault(Fault),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<xml::writer::Error> for Error {
    fn from(err: xml::writer::Error) -> Error {
        Error::Serialization(err.to_string())
    }
}

impl From<xml::reader::Error> for Error {
    fn from(err: xml::reader::Error) -> Error {
        Error::MalformedDocument(err.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error::Serialization(err.to_string())
    }
}

use std::path::PathBuf;

/// Output options for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Start the document with `<?xml version="1.0" ...?>`.
    pub write_declaration: bool,
    /// Indent nested elements. Off by default: whitespace between tags is
    /// legal XML-RPC but some servers choke on it.
    pub indent: bool,
}

impl Default for EncoderConfig {
    fn default() -> EncoderConfig {
        EncoderConfig {
            write_declaration: true,
            indent: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build a `methodCall` from a method name and JSON params.
    Encode { method: String, params: Vec<String> },
    /// Read a `methodResponse` from a file, or stdin when `None`.
    Decode { input: Option<PathBuf> },
}

pub struct Config {
    pub command: Command,
    pub encoder: EncoderConfig,
    pub verbosity: u8,
}

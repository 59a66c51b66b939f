#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use xmlrpc_codec::config::{Command, Config, EncoderConfig};
use xmlrpc_codec::xmlrpc::{self, Value};
use xmlrpc_codec::{Error, Result};

#[derive(Parser)]
#[command(name = "xrc", version, about = "Encode XML-RPC calls and decode XML-RPC responses")]
struct Cli {
    /// Verbose mode, repeat for trace output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the methodCall document for a method and its params
    Encode {
        method: String,
        /// Params as JSON texts, e.g. 42 '"text"' '{"k": [1, 2.5]}'
        params: Vec<String>,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
        /// Leave out the <?xml ...?> declaration
        #[arg(long)]
        no_declaration: bool,
    },
    /// Decode a methodResponse into a JSON array of its params
    Decode {
        /// Read from this file instead of stdin
        file: Option<PathBuf>,
    },
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Config {
        let mut encoder = EncoderConfig::default();
        let command = match cli.command {
            Commands::Encode {
                method,
                params,
                pretty,
                no_declaration,
            } => {
                encoder.indent = pretty;
                encoder.write_declaration = !no_declaration;
                Command::Encode { method, params }
            }
            Commands::Decode { file } => Command::Decode { input: file },
        };
        Config {
            command,
            encoder,
            verbosity: cli.verbose,
        }
    }
}

fn main() {
    let config = Config::from(Cli::parse());

    // -v and -vv override RUST_LOG
    let mut logger = env_logger::Builder::from_default_env();
    match config.verbosity {
        0 => {}
        1 => {
            logger.filter_level(LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(LevelFilter::Trace);
        }
    }
    logger.init();

    if let Err(err) = run(&config) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    match config.command {
        Command::Encode {
            ref method,
            ref params,
        } => {
            let values = params
                .iter()
                .map(|text| {
                    let json: serde_json::Value = serde_json::from_str(text)?;
                    Value::from_json(&json)
                })
                .collect::<Result<Vec<Value>>>()?;
            debug!("method: {}, params: {:?}", method, values);

            let body = xmlrpc::encode_call_with(&config.encoder, method, &values)?;
            println!("{}", body);
        }
        Command::Decode { ref input } => {
            let decoded = match *input {
                Some(ref path) => {
                    debug!("reading response from {}", path.display());
                    xmlrpc::decode_response_from(BufReader::new(File::open(path)?))
                }
                None => xmlrpc::decode_response_from(io::stdin().lock()),
            };
            let params = match decoded {
                Ok(params) => params,
                Err(Error::Fault(fault)) => {
                    println!("{}", serde_json::to_string_pretty(&fault.to_value().to_json())?);
                    return Err(Error::Fault(fault));
                }
                Err(err) => return Err(err),
            };
            let json = serde_json::Value::Array(params.iter().map(Value::to_json).collect());
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use dpslink_bridge::QueryPolicy;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod probe;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bridge: serial device on one side, TCP clients on the other.
    Serve(ServeArgs),
    /// Send one command frame to the device and print its response.
    Probe(ProbeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum QueryPolicyArg {
    Log,
    Discard,
}

impl From<QueryPolicyArg> for QueryPolicy {
    fn from(arg: QueryPolicyArg) -> Self {
        match arg {
            QueryPolicyArg::Log => QueryPolicy::Log,
            QueryPolicyArg::Discard => QueryPolicy::Discard,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    pub device: String,
    /// Serial baud rate.
    #[arg(long, default_value_t = 9600)]
    pub baud: u32,
    /// TCP address to listen on.
    #[arg(long, default_value = "0.0.0.0:5005")]
    pub listen: SocketAddr,
    /// Maximum simultaneous client connections.
    #[arg(long, default_value_t = 4)]
    pub max_clients: usize,
    /// Maximum frame length in bytes, markers included.
    #[arg(long, default_value_t = 2048)]
    pub max_frame: usize,
    /// Device response deadline (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
    /// Attach the local console as an endpoint.
    #[arg(long)]
    pub console: bool,
    /// Disposition of failed internally generated queries.
    #[arg(long, value_enum, default_value = "log")]
    pub query_policy: QueryPolicyArg,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    pub device: String,
    /// Serial baud rate.
    #[arg(long, default_value_t = 9600)]
    pub baud: u32,
    /// Hex-encoded raw payload to seal into the command frame.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw payload bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Device response deadline (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
    /// Maximum frame length in bytes, markers included.
    #[arg(long, default_value_t = 2048)]
    pub max_frame: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use gamelink_session::SessionConfig;

use crate::catalog::Catalog;
use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod connect;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a game server and print received packets.
    Connect(ConnectArgs),
    /// Connect, send one packet, and disconnect.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Connect(args) => connect::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ChannelFilter {
    Game,
    System,
    #[default]
    All,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server address (host:port).
    pub address: String,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Which channel to print.
    #[arg(long, value_enum, default_value_t = ChannelFilter::All)]
    pub channel: ChannelFilter,
    /// JSON packet catalogue for catalogue framing.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    /// Pre-framed packet to send after connecting, as hex. Repeatable.
    #[arg(long = "send-hex", value_name = "HEX")]
    pub send_hex: Vec<String>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// How long to sleep when both queues are empty (e.g. 10ms).
    #[arg(long, default_value = "10ms")]
    pub poll_interval: String,
    /// Game queue bound.
    #[arg(long)]
    pub game_queue_capacity: Option<usize>,
    /// System queue bound.
    #[arg(long)]
    pub system_queue_capacity: Option<usize>,
    /// Print session counters on exit.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address (host:port).
    pub address: String,
    /// Pre-framed packet bytes as hex.
    #[arg(long, conflicts_with_all = ["type_id", "data"], required_unless_present = "type_id")]
    pub hex: Option<String>,
    /// Packet type to frame the payload with (e.g. 0x01).
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_type_id)]
    pub type_id: Option<u8>,
    /// UTF-8 payload for --type.
    #[arg(long, requires = "type_id")]
    pub data: Option<String>,
    /// JSON packet catalogue used to frame --type.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn session_config(catalog: Option<&Path>, timeout: &str) -> CliResult<SessionConfig> {
    let mut config = SessionConfig {
        connect_timeout: parse_duration(timeout)?,
        ..SessionConfig::default()
    };
    if let Some(path) = catalog {
        Catalog::load(path)?.apply(&mut config)?;
    }
    Ok(config)
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
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
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Decode hex such as `01 00 04 aabbccdd` or `0x0100`. Separators are ignored.
pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'_' | b'-'))
        .collect();

    if digits.is_empty() {
        return Err(CliError::usage("hex input must not be empty"));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::usage(format!(
            "hex input has an odd number of digits: {input}"
        )));
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| CliError::usage(format!("invalid hex input: {input}")))
        })
        .collect()
}

fn parse_type_id(input: &str) -> Result<u8, String> {
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse::<u8>(),
    };
    parsed.map_err(|_| format!("packet type must be 0-255 or 0x00-0xFF, got {input}"))
}

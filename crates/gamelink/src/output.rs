use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gamelink_frame::{packet_name, Channel, Packet};
use gamelink_session::SessionStats;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    channel: &'a str,
    type_id: u8,
    name: &'a str,
    wire_size: usize,
    payload_size: usize,
    payload_hex: String,
    server: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    server: &'a str,
    state: &'a str,
    reason: Option<String>,
    #[serde(flatten)]
    stats: StatsFields,
}

#[derive(Serialize)]
struct StatsFields {
    bytes_received: u64,
    bytes_sent: u64,
    game_packets: u64,
    system_packets: u64,
    game_evicted: u64,
    system_evicted: u64,
}

impl From<SessionStats> for StatsFields {
    fn from(stats: SessionStats) -> Self {
        Self {
            bytes_received: stats.bytes_received,
            bytes_sent: stats.bytes_sent,
            game_packets: stats.game_packets,
            system_packets: stats.system_packets,
            game_evicted: stats.game_evicted,
            system_evicted: stats.system_evicted,
        }
    }
}

pub fn print_packet(packet: &Packet, channel: Channel, server: &str, format: OutputFormat) {
    let type_id = packet.type_id();
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                channel: channel.as_str(),
                type_id,
                name: packet_name(type_id),
                wire_size: packet.wire_size(),
                payload_size: packet.payload().len(),
                payload_hex: to_hex(packet.payload()),
                server,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "TYPE", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    channel.to_string(),
                    format!("0x{type_id:02X}"),
                    packet_name(type_id).to_string(),
                    packet.wire_size().to_string(),
                    payload_preview(packet.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "channel={} type=0x{:02X} ({}) size={} payload={}",
                channel,
                type_id,
                packet_name(type_id),
                packet.wire_size(),
                payload_preview(packet.payload())
            );
        }
        OutputFormat::Raw => {
            print_raw(packet.wire());
        }
    }
}

pub fn print_stats(
    server: &str,
    state: &str,
    reason: Option<String>,
    stats: SessionStats,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = StatsOutput {
                server,
                state,
                reason,
                stats: stats.into(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["server".to_string(), server.to_string()])
                .add_row(vec!["state".to_string(), state.to_string()])
                .add_row(vec![
                    "reason".to_string(),
                    reason.unwrap_or_else(|| "-".to_string()),
                ])
                .add_row(vec![
                    "bytes_received".to_string(),
                    stats.bytes_received.to_string(),
                ])
                .add_row(vec!["bytes_sent".to_string(), stats.bytes_sent.to_string()])
                .add_row(vec![
                    "game_packets".to_string(),
                    stats.game_packets.to_string(),
                ])
                .add_row(vec![
                    "system_packets".to_string(),
                    stats.system_packets.to_string(),
                ])
                .add_row(vec![
                    "evicted".to_string(),
                    format!("game={} system={}", stats.game_evicted, stats.system_evicted),
                ]);
            eprintln!("{table}");
        }
        // Raw output carries packet bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn payload_preview(payload: &[u8]) -> String {
    const PREVIEW_BYTES: usize = 32;

    if payload.is_empty() {
        return "-".to_string();
    }
    if payload.len() <= PREVIEW_BYTES {
        return to_hex(payload);
    }
    format!(
        "{}.. ({} bytes)",
        to_hex(&payload[..PREVIEW_BYTES]),
        payload.len()
    )
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

//! JSON packet catalogues for servers that frame some types without a
//! length prefix.
//!
//! ```json
//! {
//!   "max_packet_size": 4096,
//!   "system_types": [143, 174, 175, 176, 177],
//!   "packets": [
//!     { "type": 1, "length": "prefixed" },
//!     { "type": 2, "length": 6 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use gamelink_frame::{FramingTable, PacketLength, ProtocolVariant};
use gamelink_session::SessionConfig;
use serde::Deserialize;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub max_packet_size: Option<usize>,
    #[serde(default)]
    pub system_types: Option<Vec<u8>>,
    pub packets: Vec<PacketEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacketEntry {
    #[serde(rename = "type")]
    pub type_id: u8,
    pub length: LengthEntry,
}

/// A fixed payload size, or the string `"prefixed"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LengthEntry {
    Fixed(u16),
    Named(String),
}

impl Catalog {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        Self::parse(&text)
            .map_err(|err| CliError::new(err.code, format!("{}: {}", path.display(), err.message)))
    }

    pub fn parse(text: &str) -> CliResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid catalog: {err}")))
    }

    pub fn framing_table(&self) -> CliResult<FramingTable> {
        let mut table = FramingTable::empty();
        for entry in &self.packets {
            if table.rule(entry.type_id).is_some() {
                return Err(CliError::new(
                    DATA_INVALID,
                    format!("packet type 0x{:02X} listed twice", entry.type_id),
                ));
            }
            let rule = match &entry.length {
                LengthEntry::Fixed(len) => PacketLength::Fixed(*len),
                LengthEntry::Named(name) if name == "prefixed" => PacketLength::Prefixed,
                LengthEntry::Named(name) => {
                    return Err(CliError::new(
                        DATA_INVALID,
                        format!(
                            "packet type 0x{:02X}: length must be a number or \"prefixed\", got {name:?}",
                            entry.type_id
                        ),
                    ))
                }
            };
            table.set(entry.type_id, Some(rule));
        }
        Ok(table)
    }

    /// Switch `config` to catalogue framing and apply the catalogue's overrides.
    pub fn apply(&self, config: &mut SessionConfig) -> CliResult<()> {
        config.framing.variant = ProtocolVariant::Catalogue(self.framing_table()?);
        if let Some(max) = self.max_packet_size {
            config.framing.max_packet_size = max;
        }
        if let Some(types) = &self.system_types {
            config.system_types = types.clone();
        }
        Ok(())
    }
}

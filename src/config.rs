use crate::error::Error;
use crate::register::WordOrder;
use crate::rtu::{FlowControl, LineMode, Parity};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileType {
    Toml,
    Json,
}

impl FileType {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Connection defaults stored in a profile file.
///
/// Every field is optional; values given on the command line take precedence.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub device: Option<String>,
    pub baud_rate: Option<u32>,
    pub data_bits: Option<u8>,
    pub parity: Option<Parity>,
    pub stop_bits: Option<u8>,
    pub line_mode: Option<LineMode>,
    pub flow_control: Option<FlowControl>,
    pub word_order: Option<WordOrder>,
    pub retries: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl Profile {
    /// Read a profile from a `.toml` or `.json` file.
    pub fn read(path: &str) -> Result<Self, Error> {
        let path = Path::new(path);
        let profile: Profile = match FileType::from_path(path) {
            Some(FileType::Toml) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read TOML file {} [{}].", path.display(), e))
                })?;
                toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to deserialize TOML [{}].", e))
                })?
            }
            Some(FileType::Json) => {
                let file = File::open(path).map_err(|e| {
                    Error::Config(format!("Failed to open JSON file {} [{}].", path.display(), e))
                })?;
                serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                    Error::Config(format!("Failed to deserialize JSON [{}].", e))
                })?
            }
            None => {
                return Err(Error::Config(format!(
                    "Unsupported profile file {}, expected .toml or .json",
                    path.display()
                )))
            }
        };
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), Error> {
        if let Some(v) = self.data_bits {
            if !(5..=8).contains(&v) {
                return Err(Error::Config(format!("invalid UART data bits setting -- {v}")));
            }
        }
        if let Some(v) = self.stop_bits {
            if v != 1 && v != 2 {
                return Err(Error::Config(format!("invalid UART stop bits setting -- {v}")));
            }
        }
        if self.retries == Some(0) {
            return Err(Error::Config("invalid retry count -- 0".to_owned()));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::Config("invalid timeout -- 0".to_owned()));
        }
        Ok(())
    }
}

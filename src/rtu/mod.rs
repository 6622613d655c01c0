pub mod client;

use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_DATA_BITS: u8 = 8;
pub const DEFAULT_STOP_BITS: u8 = 1;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    #[value(alias = "N")]
    None,
    #[value(alias = "E")]
    Even,
    #[value(alias = "O")]
    Odd,
}

impl Display for Parity {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parity::None => fmt.write_str("N"),
            Parity::Even => fmt.write_str("E"),
            Parity::Odd => fmt.write_str("O"),
        }
    }
}

/// Electrical mode of the serial line.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    /// Half-duplex two wire bus, direction switching is left to the transceiver
    #[default]
    Rs485,
    /// Point to point line, honors the configured flow control
    Rs232,
}

impl Display for LineMode {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineMode::Rs485 => fmt.write_str("RS485"),
            LineMode::Rs232 => fmt.write_str("RS232"),
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

impl Display for FlowControl {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowControl::None => fmt.write_str("NONE"),
            FlowControl::Software => fmt.write_str("SOFTWARE"),
            FlowControl::Hardware => fmt.write_str("HARDWARE"),
        }
    }
}

/// Line settings of a serial (RTU) connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub baud_rate: u32,
    /// Data bits [values: 5, 6, 7, 8]
    pub data_bits: u8,
    pub parity: Parity,
    /// Stop bits [values: 1, 2]
    pub stop_bits: u8,
    pub line_mode: LineMode,
    pub flow_control: FlowControl,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            parity: Parity::None,
            stop_bits: DEFAULT_STOP_BITS,
            line_mode: LineMode::Rs485,
            flow_control: FlowControl::None,
        }
    }
}

impl Config {
    /// Flow control actually applied to the port.
    ///
    /// An RS485 bus never uses handshake lines, whatever was configured.
    pub fn effective_flow_control(&self) -> FlowControl {
        match self.line_mode {
            LineMode::Rs485 => FlowControl::None,
            LineMode::Rs232 => self.flow_control,
        }
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            fmt,
            "{} {}/{}/{} {}",
            self.baud_rate, self.data_bits, self.parity, self.stop_bits, self.line_mode
        )?;
        if self.line_mode == LineMode::Rs232 {
            write!(fmt, ", flow control: {}", self.flow_control)?;
        }
        Ok(())
    }
}

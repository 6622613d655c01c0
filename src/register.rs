use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Maximum number of 16 bit registers a single read request may return.
pub const MAX_READ_REGISTERS: u16 = 125;

/// Maximum number of coils a single read request may return.
pub const MAX_READ_BITS: u16 = 2000;

/// The addressable object class to read.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RegisterKind {
    /// Input registers (function code 0x04)
    #[value(alias = "i")]
    Input,
    /// Holding registers (function code 0x03)
    #[value(alias = "r")]
    Holding,
    /// Reserved, no read is implemented for this kind
    #[value(alias = "b")]
    Bit,
    /// Coils (function code 0x01)
    #[value(alias = "c")]
    Coil,
    /// Pairs of input registers interpreted as IEEE-754 single precision values
    #[value(alias = "f")]
    Float32,
}

impl RegisterKind {
    /// Format used if the caller did not select one.
    pub fn default_format(&self) -> OutputFormat {
        match self {
            Self::Input | Self::Holding => OutputFormat::Hex,
            Self::Bit | Self::Coil | Self::Float32 => OutputFormat::Decimal,
        }
    }

    /// Largest cell count a single request of this kind may cover.
    pub fn max_count(&self) -> u16 {
        match self {
            Self::Coil | Self::Bit => MAX_READ_BITS,
            Self::Input | Self::Holding | Self::Float32 => MAX_READ_REGISTERS,
        }
    }
}

impl Display for RegisterKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => fmt.write_str("input register"),
            Self::Holding => fmt.write_str("holding register"),
            Self::Bit => fmt.write_str("bit"),
            Self::Coil => fmt.write_str("coil"),
            Self::Float32 => fmt.write_str("float32"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Lowercase hexadecimal without prefix
    #[value(alias = "H", alias = "h")]
    Hex,
    /// Unsigned decimal
    #[value(alias = "D", alias = "d")]
    Decimal,
}

/// Order of the two registers forming a Float32 value.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WordOrder {
    /// The first transmitted register holds the high word
    #[default]
    HighFirst,
    /// The first transmitted register holds the low word
    LowFirst,
}

/// A validated, contiguous range of cells of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterRange {
    start: u16,
    count: u16,
    kind: RegisterKind,
}

impl RegisterRange {
    pub fn new(start: u16, count: u16, kind: RegisterKind) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::InvalidRegisterRange(format!(
                "at least one {kind} must be read"
            )));
        }
        if count > kind.max_count() {
            return Err(Error::InvalidRegisterRange(format!(
                "too many registers to be read -- {count}. Only {} allowed",
                kind.max_count()
            )));
        }
        if kind == RegisterKind::Float32 && count % 2 != 0 {
            return Err(Error::InvalidRegisterRange(format!(
                "for Float32 type number of registers must be even, but {count} given"
            )));
        }
        if start as u32 + count as u32 - 1 > u16::MAX as u32 {
            return Err(Error::InvalidRegisterRange(format!(
                "range starting at {start} with {count} registers exceeds address 65535"
            )));
        }
        Ok(Self { start, count, kind })
    }

    /// Build a range from inclusive start and optional end register numbers.
    ///
    /// An end register less or equal to the start register reads only the start register.
    pub fn from_bounds(start: u16, end: Option<u16>, kind: RegisterKind) -> Result<Self, Error> {
        let count = match end {
            Some(end) if end > start => end - start + 1,
            Some(_) => {
                log::warn!(
                    "end register is less or equal to start register. Only one start register will be read."
                );
                1
            }
            None => 1,
        };
        Self::new(start, count, kind)
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    /// Inclusive number of the last cell in the range.
    pub fn end(&self) -> u16 {
        self.start + (self.count - 1)
    }

    pub fn kind(&self) -> RegisterKind {
        self.kind
    }
}

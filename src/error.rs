use std::process::ExitCode;

use thiserror::Error;

use crate::register::RegisterKind;

/// Process exit status reported by a single invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// Input rejected before any I/O took place
    InvalidInput = 1,
    /// Connection failed or all read attempts were exhausted
    Failure = 2,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve device '{device}': {reason}")]
    UnresolvableDevice { device: String, reason: String },

    #[error("invalid register range: {0}")]
    InvalidRegisterRange(String),

    #[error("reading {0} values is not implemented")]
    NotImplemented(RegisterKind),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("MODBUS connection error: {cause}")]
    Connection { cause: anyhow::Error },

    #[error("MODBUS read error: {cause}")]
    Read { cause: anyhow::Error },

    #[error("failed to write output [{0}]")]
    Output(#[from] std::io::Error),
}

impl Error {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::UnresolvableDevice { .. }
            | Self::InvalidRegisterRange(_)
            | Self::NotImplemented(_)
            | Self::Config(_) => ExitStatus::InvalidInput,
            Self::Connection { .. } | Self::Read { .. } | Self::Output(_) => ExitStatus::Failure,
        }
    }
}

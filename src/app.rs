use crate::device;
use crate::dispatch::{dispatch, ReadStatus};
use crate::error::{Error, ExitStatus};
use crate::format;
use crate::register::{OutputFormat, RegisterKind, RegisterRange, WordOrder};
use crate::rtu;
use crate::session::{RegisterReader, Session};

use anyhow::anyhow;
use std::io::Write;
use tokio_modbus::prelude::SlaveId;

/// Everything a single read invocation needs, already validated by the argument layer.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub device: String,
    pub line: rtu::Config,
    pub slave: SlaveId,
    pub start: u16,
    /// Inclusive end register, reads a single register if absent
    pub end: Option<u16>,
    pub kind: RegisterKind,
    /// Falls back to the default format of `kind`
    pub format: Option<OutputFormat>,
    pub word_order: WordOrder,
    pub retries: u32,
    pub timeout_ms: u64,
}

impl Invocation {
    fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| self.kind.default_format())
    }
}

/// Read the requested range and print it to `out`.
///
/// Diagnostics go to the log, never to `out`.
pub async fn run<W: Write>(invocation: &Invocation, out: &mut W) -> ExitStatus {
    match execute(invocation, out).await {
        Ok(()) => ExitStatus::Success,
        Err(e) => {
            log::error!("{e}");
            e.exit_status()
        }
    }
}

async fn execute<W: Write>(invocation: &Invocation, out: &mut W) -> Result<(), Error> {
    let range = RegisterRange::from_bounds(invocation.start, invocation.end, invocation.kind)?;
    if range.kind() == RegisterKind::Bit {
        return Err(Error::NotImplemented(RegisterKind::Bit));
    }
    if invocation.retries == 0 {
        return Err(Error::Config("invalid retry count -- 0".to_owned()));
    }
    let endpoint = device::resolve(&invocation.device, &invocation.line)?;

    log::debug!("Device: {endpoint}");
    log::debug!("Type: {}", range.kind());
    log::debug!("Address: {}", invocation.slave);
    log::debug!("Start reg: {}", range.start());
    log::debug!("End reg: {}", range.end());
    log::debug!("Register count: {}", range.count());

    let mut session = Session::connect(&endpoint, invocation.slave, invocation.timeout_ms).await?;
    let result = read_and_print(&mut session, invocation, &range, out).await;
    session.close().await;
    result
}

async fn read_and_print<R, W>(
    reader: &mut R,
    invocation: &Invocation,
    range: &RegisterRange,
    out: &mut W,
) -> Result<(), Error>
where
    R: RegisterReader + ?Sized,
    W: Write,
{
    let outcome = dispatch(reader, invocation.slave, range, invocation.retries).await?;
    log::debug!("Retries left: {}", outcome.retries_remaining);
    match outcome.status {
        ReadStatus::Ok => {
            format::write(
                out,
                &outcome.raw,
                invocation.output_format(),
                invocation.word_order,
            )?;
            Ok(())
        }
        ReadStatus::Failed => Err(Error::Read {
            cause: outcome
                .last_error
                .unwrap_or_else(|| anyhow!("no read attempt was made")),
        }),
    }
}

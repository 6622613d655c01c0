use crate::error::Error;
use crate::register::{RegisterKind, RegisterRange};
use crate::session::RegisterReader;

use anyhow::anyhow;
use tokio_modbus::prelude::SlaveId;

/// Default number of read attempts.
pub const DEFAULT_RETRIES: u32 = 3;

/// Cells returned by one successful read, tagged by how they have to be decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum RawBuffer {
    /// 16 bit input or holding registers
    Registers(Vec<u16>),
    /// 16 bit input registers, two of them forming one Float32 value
    Float32(Vec<u16>),
    /// One cell (0 or 1) per coil
    Bits(Vec<u8>),
}

impl RawBuffer {
    fn empty(kind: RegisterKind) -> Self {
        match kind {
            RegisterKind::Float32 => Self::Float32(Vec::new()),
            RegisterKind::Coil | RegisterKind::Bit => Self::Bits(Vec::new()),
            RegisterKind::Input | RegisterKind::Holding => Self::Registers(Vec::new()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    Ok,
    Failed,
}

#[derive(Debug)]
pub struct ReadOutcome {
    pub status: ReadStatus,
    pub raw: RawBuffer,
    /// Attempts left when the loop stopped, counting the successful one
    pub retries_remaining: u32,
    /// Cause of the most recent failed attempt
    pub last_error: Option<anyhow::Error>,
}

fn check_count<T>(mut values: Vec<T>, count: u16, truncate: bool) -> anyhow::Result<Vec<T>> {
    let count = count as usize;
    if values.len() == count || (truncate && values.len() > count) {
        values.truncate(count);
        Ok(values)
    } else {
        Err(anyhow!(
            "Expected {} values but received {}",
            count,
            values.len()
        ))
    }
}

async fn read_once<R>(reader: &mut R, range: &RegisterRange) -> anyhow::Result<RawBuffer>
where
    R: RegisterReader + ?Sized,
{
    let (start, count) = (range.start(), range.count());
    match range.kind() {
        RegisterKind::Input => {
            let values = reader.read_input_registers(start, count).await?;
            Ok(RawBuffer::Registers(check_count(values, count, false)?))
        }
        RegisterKind::Holding => {
            let values = reader.read_holding_registers(start, count).await?;
            Ok(RawBuffer::Registers(check_count(values, count, false)?))
        }
        RegisterKind::Float32 => {
            let values = reader.read_input_registers(start, count).await?;
            Ok(RawBuffer::Float32(check_count(values, count, false)?))
        }
        // Coil responses are packed into whole bytes and may carry padding bits.
        RegisterKind::Coil => {
            let values = reader.read_coils(start, count).await?;
            let values = check_count(values, count, true)?;
            Ok(RawBuffer::Bits(values.into_iter().map(u8::from).collect()))
        }
        RegisterKind::Bit => Err(anyhow!("{} reads are not implemented", RegisterKind::Bit)),
    }
}

/// Read `range` from `slave`, making at most `retries` attempts.
///
/// Stops at the first successful attempt. A failed attempt never yields partial data.
pub async fn dispatch<R>(
    reader: &mut R,
    slave: SlaveId,
    range: &RegisterRange,
    retries: u32,
) -> Result<ReadOutcome, Error>
where
    R: RegisterReader + ?Sized,
{
    if range.kind() == RegisterKind::Bit {
        return Err(Error::NotImplemented(RegisterKind::Bit));
    }
    if retries == 0 {
        return Err(Error::Config(
            "retry count must be greater than zero".to_owned(),
        ));
    }

    reader.set_slave(slave);

    let mut remaining = retries;
    let mut last_error = None;
    while remaining > 0 {
        match read_once(reader, range).await {
            Ok(raw) => {
                log::debug!(
                    "Read {} [{}, {}] from slave {} successful.",
                    range.kind(),
                    range.start(),
                    range.end(),
                    slave
                );
                return Ok(ReadOutcome {
                    status: ReadStatus::Ok,
                    raw,
                    retries_remaining: remaining,
                    last_error: None,
                });
            }
            Err(e) => {
                log::debug!(
                    "Read attempt {} of {} failed [{}]",
                    retries - remaining + 1,
                    retries,
                    e
                );
                last_error = Some(e);
                remaining -= 1;
            }
        }
    }

    Ok(ReadOutcome {
        status: ReadStatus::Failed,
        raw: RawBuffer::empty(range.kind()),
        retries_remaining: remaining,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::{dispatch, RawBuffer, ReadStatus};
    use crate::error::Error;
    use crate::register::{RegisterKind, RegisterRange};
    use crate::test::ScriptedReader;

    fn range(start: u16, count: u16, kind: RegisterKind) -> RegisterRange {
        RegisterRange::new(start, count, kind).unwrap()
    }

    #[tokio::test]
    async fn ut_dispatch_input_registers() {
        let mut reader = ScriptedReader::new(0).with_registers(&[0x0001, 0x0002, 0x00FF, 0x1234]);
        let outcome = dispatch(&mut reader, 17, &range(0, 4, RegisterKind::Input), 3)
            .await
            .unwrap();
        assert_eq!(outcome.status, ReadStatus::Ok);
        assert_eq!(
            outcome.raw,
            RawBuffer::Registers(vec![0x0001, 0x0002, 0x00FF, 0x1234])
        );
        assert_eq!(outcome.retries_remaining, 3);
        assert_eq!(reader.attempts(), 1);
        assert_eq!(reader.slave(), Some(17));
        assert_eq!(reader.calls(), ["input 0 4"]);
    }

    #[tokio::test]
    async fn ut_dispatch_selects_wire_operation() {
        let mut reader = ScriptedReader::new(0).with_registers(&[1, 2]);
        let outcome = dispatch(&mut reader, 1, &range(8, 2, RegisterKind::Holding), 3)
            .await
            .unwrap();
        assert_eq!(outcome.raw, RawBuffer::Registers(vec![1, 2]));

        let outcome = dispatch(&mut reader, 1, &range(8, 2, RegisterKind::Float32), 3)
            .await
            .unwrap();
        assert_eq!(outcome.raw, RawBuffer::Float32(vec![1, 2]));

        let mut coils = ScriptedReader::new(0).with_coils(&[true, false, true]);
        let outcome = dispatch(&mut coils, 1, &range(3, 3, RegisterKind::Coil), 3)
            .await
            .unwrap();
        assert_eq!(outcome.raw, RawBuffer::Bits(vec![1, 0, 1]));

        assert_eq!(reader.calls(), ["holding 8 2", "input 8 2"]);
        assert_eq!(coils.calls(), ["coils 3 3"]);
    }

    #[tokio::test]
    async fn ut_dispatch_exhausts_retries() {
        let mut reader = ScriptedReader::new(u32::MAX).with_registers(&[1]);
        let outcome = dispatch(&mut reader, 1, &range(0, 1, RegisterKind::Input), 3)
            .await
            .unwrap();
        assert_eq!(outcome.status, ReadStatus::Failed);
        assert_eq!(outcome.raw, RawBuffer::Registers(Vec::new()));
        assert_eq!(outcome.retries_remaining, 0);
        assert_eq!(reader.attempts(), 3);
        let cause = outcome.last_error.unwrap().to_string();
        assert_eq!(cause, "Scripted failure 3");
    }

    #[tokio::test]
    async fn ut_dispatch_stops_on_first_success() {
        let mut reader = ScriptedReader::new(2).with_registers(&[7, 8]);
        let outcome = dispatch(&mut reader, 1, &range(0, 2, RegisterKind::Holding), 5)
            .await
            .unwrap();
        assert_eq!(outcome.status, ReadStatus::Ok);
        assert_eq!(outcome.retries_remaining, 3);
        assert_eq!(reader.attempts(), 3);
        assert!(outcome.last_error.is_none());
    }

    #[tokio::test]
    async fn ut_dispatch_short_response_is_failed_attempt() {
        let mut reader = ScriptedReader::new(0).with_registers(&[1, 2, 3]);
        let outcome = dispatch(&mut reader, 1, &range(0, 4, RegisterKind::Input), 2)
            .await
            .unwrap();
        assert_eq!(outcome.status, ReadStatus::Failed);
        assert_eq!(reader.attempts(), 2);
    }

    #[tokio::test]
    async fn ut_dispatch_coil_padding_is_dropped() {
        let mut reader = ScriptedReader::new(0).with_coils(&[true, true, false, false]);
        let outcome = dispatch(&mut reader, 1, &range(0, 2, RegisterKind::Coil), 1)
            .await
            .unwrap();
        assert_eq!(outcome.raw, RawBuffer::Bits(vec![1, 1]));
    }

    #[tokio::test]
    async fn ut_dispatch_bit_not_implemented() {
        let mut reader = ScriptedReader::new(0);
        let result = dispatch(&mut reader, 1, &range(0, 1, RegisterKind::Bit), 3).await;
        assert!(matches!(result, Err(Error::NotImplemented(RegisterKind::Bit))));
        assert_eq!(reader.attempts(), 0);
    }

    #[tokio::test]
    async fn ut_dispatch_zero_retries_rejected() {
        let mut reader = ScriptedReader::new(0).with_registers(&[1]);
        let result = dispatch(&mut reader, 1, &range(0, 1, RegisterKind::Input), 0).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(reader.attempts(), 0);
    }
}

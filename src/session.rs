use crate::device::DeviceEndpoint;
use crate::error::Error;
use crate::{rtu, tcp};

use anyhow::anyhow;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::{Client as ModbusClient, Reader, Slave, SlaveContext, SlaveId};

/// Typed read primitives the dispatcher issues requests through.
///
/// Every call is one complete request: it either returns all requested cells or an error
/// carrying a human readable cause.
#[async_trait]
pub trait RegisterReader: Send {
    fn set_slave(&mut self, slave: SlaveId);

    async fn read_input_registers(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<u16>>;

    async fn read_holding_registers(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<u16>>;

    async fn read_coils(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<bool>>;
}

fn flatten<T>(result: Result<tokio_modbus::Result<T>, Elapsed>) -> anyhow::Result<T> {
    match result {
        Ok(Ok(Ok(v))) => Ok(v),
        Ok(Ok(Err(e))) => Err(anyhow!("Exception {}", e)),
        Ok(Err(e)) => Err(anyhow!("{}", e)),
        Err(_) => Err(anyhow!("Timeout elapsed")),
    }
}

/// An open Modbus client connection.
///
/// Must be released with [`Session::close`] on every path once it was opened.
pub struct Session {
    context: Context,
    timeout_ms: u64,
}

impl Session {
    /// Open a connection to `endpoint` addressing `slave`.
    pub async fn connect(
        endpoint: &DeviceEndpoint,
        slave: SlaveId,
        timeout_ms: u64,
    ) -> Result<Self, Error> {
        let context = match endpoint {
            DeviceEndpoint::Serial { path, line } => rtu::client::connect(path, line, slave),
            DeviceEndpoint::Network(config) => tcp::client::connect(config, slave, timeout_ms).await,
        }
        .map_err(|cause| Error::Connection { cause })?;
        log::debug!("Connected to {endpoint}");
        Ok(Self {
            context,
            timeout_ms,
        })
    }

    /// Disconnect and release the underlying transport.
    pub async fn close(mut self) {
        match tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            self.context.disconnect(),
        )
        .await
        {
            Ok(Ok(_)) => log::debug!("Disconnected"),
            Ok(Err(e)) => log::debug!("Disconnect failed [{e}]"),
            Err(_) => log::debug!("Disconnect timed out"),
        }
    }
}

#[async_trait]
impl RegisterReader for Session {
    fn set_slave(&mut self, slave: SlaveId) {
        self.context.set_slave(Slave(slave));
    }

    async fn read_input_registers(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<u16>> {
        let timeout = Duration::from_millis(self.timeout_ms);
        flatten(tokio::time::timeout(timeout, self.context.read_input_registers(addr, cnt)).await)
    }

    async fn read_holding_registers(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<u16>> {
        let timeout = Duration::from_millis(self.timeout_ms);
        flatten(tokio::time::timeout(timeout, self.context.read_holding_registers(addr, cnt)).await)
    }

    async fn read_coils(&mut self, addr: u16, cnt: u16) -> anyhow::Result<Vec<bool>> {
        let timeout = Duration::from_millis(self.timeout_ms);
        flatten(tokio::time::timeout(timeout, self.context.read_coils(addr, cnt)).await)
    }
}

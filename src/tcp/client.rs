use crate::tcp::Config;

use anyhow::anyhow;
use std::time::Duration;
use tokio_modbus::client::{tcp, Context};
use tokio_modbus::prelude::{Slave, SlaveId};

/// Connect to a Modbus TCP device, giving up after `timeout_ms`.
pub async fn connect(config: &Config, slave: SlaveId, timeout_ms: u64) -> anyhow::Result<Context> {
    let addr = config.socket_addr();
    match tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tcp::connect_slave(addr, Slave(slave)),
    )
    .await
    {
        Ok(Ok(context)) => Ok(context),
        Ok(Err(e)) => Err(anyhow!("{addr}: {e}")),
        Err(_) => Err(anyhow!("{addr}: Timeout elapsed")),
    }
}

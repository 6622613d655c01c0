use crate::rtu::{Config, FlowControl, LineMode, Parity};

use anyhow::anyhow;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::{rtu, Slave, SlaveId};
use tokio_serial::{DataBits, SerialPortBuilder, SerialStream, StopBits};

fn create_serial_builder(path: &str, config: &Config) -> anyhow::Result<SerialPortBuilder> {
    let mut builder = tokio_serial::new(path, config.baud_rate);

    builder = builder.data_bits(match config.data_bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        8 => DataBits::Eight,
        v => return Err(anyhow!("invalid data bits {v}")),
    });

    builder = builder.stop_bits(match config.stop_bits {
        1 => StopBits::One,
        2 => StopBits::Two,
        v => return Err(anyhow!("invalid stop bits {v}")),
    });

    builder = builder.parity(match config.parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    });

    builder = builder.flow_control(match config.effective_flow_control() {
        FlowControl::None => tokio_serial::FlowControl::None,
        FlowControl::Software => tokio_serial::FlowControl::Software,
        FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
    });

    Ok(builder)
}

/// Switch the opened port into the configured line mode.
///
/// In RS485 mode the kernel drives RTS as transmitter enable. Adapters switching direction in
/// hardware may not support this, they have to be used in RS232 mode.
#[cfg(target_os = "linux")]
fn apply_line_mode(port: &SerialStream, path: &str, config: &Config) -> anyhow::Result<()> {
    use std::os::unix::io::AsRawFd;

    match config.line_mode {
        LineMode::Rs485 => rs485::SerialRs485::new()
            .set_enabled(true)
            .set_rts_on_send(true)
            .set_on_fd(port.as_raw_fd())
            .map_err(|e| anyhow!("{path}: unable to enable RS485 mode [{e}]")),
        LineMode::Rs232 => Ok(()),
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_line_mode(_port: &SerialStream, _path: &str, config: &Config) -> anyhow::Result<()> {
    if config.line_mode == LineMode::Rs485 {
        log::debug!("RS485 mode is not configurable on this platform, using the port as is");
    }
    Ok(())
}

/// Open the serial device and attach a Modbus RTU client context to it.
pub fn connect(path: &str, config: &Config, slave: SlaveId) -> anyhow::Result<Context> {
    let builder = create_serial_builder(path, config)?;
    let port = SerialStream::open(&builder).map_err(|e| anyhow!("{path}: {e}"))?;
    apply_line_mode(&port, path, config)?;
    Ok(rtu::attach_slave(port, Slave(slave)))
}

mod app;
mod config;
mod device;
mod dispatch;
mod error;
mod format;
mod logger;
mod register;
mod rtu;
mod session;
mod tcp;
mod util;

use crate::app::Invocation;
use crate::config::{Profile, DEFAULT_DEVICE, DEFAULT_TIMEOUT_MS};
use crate::dispatch::DEFAULT_RETRIES;
use crate::error::ExitStatus;
use crate::register::{OutputFormat, RegisterKind, WordOrder};
use crate::rtu::{FlowControl, LineMode, Parity};
use crate::util::{parse_number, Expect};

use clap::Parser;
use std::process::ExitCode;
use tokio_modbus::prelude::SlaveId;

fn parse_slave(s: &str) -> Result<SlaveId, String> {
    let address: u8 = parse_number(s)?;
    if address > 247 {
        Err(format!(
            "invalid bus address -- {address}, MODBUS allows from 1 to 247 and 0 for broadcast"
        ))
    } else {
        Ok(address)
    }
}

/// Read registers, coils or Float32 values from a Modbus RTU or TCP device and write them
/// tab-delimited to standard output.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Bus address of the device [values: 1-247, 0 for broadcast]
    #[arg(value_parser = parse_slave)]
    address: SlaveId,

    /// First register to read (decimal or 0x prefixed hexadecimal).
    #[arg(value_parser = parse_number::<u16>)]
    start: u16,

    /// Last register to read, inclusive. Only the start register is read if omitted.
    #[arg(value_parser = parse_number::<u16>)]
    end: Option<u16>,

    /// Serial device path or IP[:port] of a Modbus TCP device [default: /dev/ttyUSB0]
    #[arg(short, long)]
    device: Option<String>,

    /// The baud rate to use for the serial connection [default: 9600]
    #[arg(short = 'r', long)]
    baud_rate: Option<u32>,

    /// The serial data bits [values: 5, 6, 7, 8] [default: 8]
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u8).range(5..=8))]
    data_bits: Option<u8>,

    /// The serial parity [default: none]
    #[arg(short, long, value_enum)]
    parity: Option<Parity>,

    /// The serial stop bits [values: 1, 2] [default: 1]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    stop_bits: Option<u8>,

    /// The serial line mode [default: rs485]
    #[arg(long, value_enum)]
    line_mode: Option<LineMode>,

    /// The flow control, only used in RS232 line mode [default: none]
    #[arg(long, value_enum)]
    flow_control: Option<FlowControl>,

    /// The register type to read
    #[arg(short = 't', long = "type", value_enum, default_value_t = RegisterKind::Input)]
    kind: RegisterKind,

    /// The output format, no effect on float32 [default: hex for registers, decimal otherwise]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Order of the two registers forming a float32 value [default: high-first]
    #[arg(long, value_enum)]
    word_order: Option<WordOrder>,

    /// Number of read attempts [default: 3]
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    retries: Option<u32>,

    /// The timeout in milliseconds for connecting and for each read attempt [default: 3000]
    #[arg(long = "timeout", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Print a debug trace to standard error.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Profile file (TOML or JSON) providing connection defaults.
    #[arg(long)]
    config: Option<String>,
}

impl Args {
    /// Merge the arguments over `profile`, falling back to the built-in defaults.
    fn into_invocation(self, profile: Profile) -> Invocation {
        let defaults = rtu::Config::default();
        let line = rtu::Config {
            baud_rate: self
                .baud_rate
                .or(profile.baud_rate)
                .unwrap_or(defaults.baud_rate),
            data_bits: self
                .data_bits
                .or(profile.data_bits)
                .unwrap_or(defaults.data_bits),
            parity: self.parity.or(profile.parity).unwrap_or(defaults.parity),
            stop_bits: self
                .stop_bits
                .or(profile.stop_bits)
                .unwrap_or(defaults.stop_bits),
            line_mode: self
                .line_mode
                .or(profile.line_mode)
                .unwrap_or(defaults.line_mode),
            flow_control: self
                .flow_control
                .or(profile.flow_control)
                .unwrap_or(defaults.flow_control),
        };
        Invocation {
            device: self
                .device
                .or(profile.device)
                .unwrap_or_else(|| DEFAULT_DEVICE.to_owned()),
            line,
            slave: self.address,
            start: self.start,
            end: self.end,
            kind: self.kind,
            format: self.format,
            word_order: self.word_order.or(profile.word_order).unwrap_or_default(),
            retries: self.retries.or(profile.retries).unwrap_or(DEFAULT_RETRIES),
            timeout_ms: self
                .timeout_ms
                .or(profile.timeout_ms)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitStatus::InvalidInput.into()
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logger::init(args.verbose);

    let profile = match args.config.as_deref().map(Profile::read).transpose() {
        Ok(profile) => profile.unwrap_or_default(),
        Err(e) => {
            log::error!("{e}");
            return e.exit_status().into();
        }
    };
    let invocation = args.into_invocation(profile);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .panic(|e| format!("Failed to create runtime. [{}]", e));

    let mut stdout = std::io::stdout().lock();
    runtime.block_on(app::run(&invocation, &mut stdout)).into()
}

#[cfg(test)]
mod tests {
    use super::Args;
    use crate::config::{Profile, DEFAULT_DEVICE, DEFAULT_TIMEOUT_MS};
    use crate::register::{OutputFormat, RegisterKind, WordOrder};
    use crate::rtu::{LineMode, Parity};
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("modbus-read").chain(args.iter().copied()))
    }

    #[test]
    fn ut_defaults() {
        let inv = parse(&["1", "100"])
            .unwrap()
            .into_invocation(Profile::default());
        assert_eq!(inv.device, DEFAULT_DEVICE);
        assert_eq!(inv.slave, 1);
        assert_eq!(inv.start, 100);
        assert_eq!(inv.end, None);
        assert_eq!(inv.kind, RegisterKind::Input);
        assert_eq!(inv.format, None);
        assert_eq!(inv.retries, 3);
        assert_eq!(inv.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(inv.line.to_string(), "9600 8/N/1 RS485");
        assert_eq!(inv.word_order, WordOrder::HighFirst);
    }

    #[test]
    fn ut_short_flags_and_aliases() {
        let inv = parse(&[
            "-d", "10.0.0.5:5020", "-r", "19200", "-b", "7", "-p", "E", "-s", "2", "-t", "f",
            "-f", "D", "-n", "5", "0x10", "0x20", "0x21",
        ])
        .unwrap()
        .into_invocation(Profile::default());
        assert_eq!(inv.device, "10.0.0.5:5020");
        assert_eq!(inv.line.baud_rate, 19200);
        assert_eq!(inv.line.data_bits, 7);
        assert_eq!(inv.line.parity, Parity::Even);
        assert_eq!(inv.line.stop_bits, 2);
        assert_eq!(inv.kind, RegisterKind::Float32);
        assert_eq!(inv.format, Some(OutputFormat::Decimal));
        assert_eq!(inv.retries, 5);
        assert_eq!(inv.slave, 16);
        assert_eq!(inv.start, 32);
        assert_eq!(inv.end, Some(33));
    }

    #[test]
    fn ut_register_kind_aliases() {
        for (alias, kind) in [
            ("i", RegisterKind::Input),
            ("r", RegisterKind::Holding),
            ("b", RegisterKind::Bit),
            ("c", RegisterKind::Coil),
            ("f", RegisterKind::Float32),
            ("holding", RegisterKind::Holding),
        ] {
            assert_eq!(parse(&["-t", alias, "1", "0"]).unwrap().kind, kind);
        }
    }

    #[test]
    fn ut_reject_invalid_arguments() {
        assert!(parse(&["248", "0"]).is_err());
        assert!(parse(&["1", "65536"]).is_err());
        assert!(parse(&["-b", "9", "1", "0"]).is_err());
        assert!(parse(&["-s", "3", "1", "0"]).is_err());
        assert!(parse(&["-n", "0", "1", "0"]).is_err());
        assert!(parse(&["-p", "X", "1", "0"]).is_err());
        assert!(parse(&["-t", "x", "1", "0"]).is_err());
        assert!(parse(&["1"]).is_err());
        assert!(parse(&["--timeout", "0", "1", "0"]).is_err());
        assert_eq!(
            parse(&["--timeout", "250", "1", "0"]).unwrap().timeout_ms,
            Some(250)
        );
        assert!(parse(&["0", "0"]).is_ok());
    }

    #[test]
    fn ut_profile_precedence() {
        let profile = Profile {
            device: Some("192.168.0.10".to_owned()),
            baud_rate: Some(38400),
            parity: Some(Parity::Odd),
            line_mode: Some(LineMode::Rs232),
            word_order: Some(WordOrder::LowFirst),
            retries: Some(7),
            timeout_ms: Some(500),
            ..Default::default()
        };
        let inv = parse(&["-r", "115200", "-n", "2", "1", "0"])
            .unwrap()
            .into_invocation(profile);
        assert_eq!(inv.device, "192.168.0.10");
        assert_eq!(inv.line.baud_rate, 115200);
        assert_eq!(inv.line.parity, Parity::Odd);
        assert_eq!(inv.line.line_mode, LineMode::Rs232);
        assert_eq!(inv.line.data_bits, 8);
        assert_eq!(inv.word_order, WordOrder::LowFirst);
        assert_eq!(inv.retries, 2);
        assert_eq!(inv.timeout_ms, 500);
    }
}

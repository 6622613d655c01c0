use std::fmt::Display;
use std::net::Ipv4Addr;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::util::str;
use crate::{rtu, tcp};

static NETWORK_ENDPOINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})(?::([0-9]{1,5}))?$")
        .expect("static network endpoint pattern")
});

/// Transport a device identifier resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEndpoint {
    Serial { path: String, line: rtu::Config },
    Network(tcp::Config),
}

impl Display for DeviceEndpoint {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial { path, line } => write!(fmt, "{path} {line}"),
            Self::Network(config) => write!(fmt, "{config} [TCP]"),
        }
    }
}

#[cfg(unix)]
fn is_serial_device(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    metadata.file_type().is_char_device()
}

#[cfg(not(unix))]
fn is_serial_device(metadata: &std::fs::Metadata) -> bool {
    !metadata.is_dir()
}

fn unresolvable(device: &str, reason: &str) -> Error {
    Error::UnresolvableDevice {
        device: str!(device),
        reason: str!(reason),
    }
}

/// Classify `device` as a serial character device or a `A.B.C.D[:port]` network endpoint.
///
/// `line` is attached to the endpoint if the device turns out to be a serial device.
pub fn resolve(device: &str, line: &rtu::Config) -> Result<DeviceEndpoint, Error> {
    if let Ok(metadata) = std::fs::metadata(Path::new(device)) {
        return if is_serial_device(&metadata) {
            Ok(DeviceEndpoint::Serial {
                path: str!(device),
                line: line.clone(),
            })
        } else {
            Err(unresolvable(device, "not a character device"))
        };
    }

    let captures = NETWORK_ENDPOINT
        .captures(device)
        .ok_or_else(|| {
            unresolvable(
                device,
                "neither an existing character device nor an IPv4 address with optional port",
            )
        })?;
    let host: Ipv4Addr = captures[1]
        .parse()
        .map_err(|_| unresolvable(device, "invalid IPv4 address"))?;
    let port = match captures.get(2) {
        Some(port) => port
            .as_str()
            .parse::<u16>()
            .map_err(|_| unresolvable(device, "invalid port"))?,
        None => tcp::DEFAULT_PORT,
    };
    Ok(DeviceEndpoint::Network(tcp::Config { host, port }))
}

#[cfg(test)]
mod tests {
    use super::{resolve, DeviceEndpoint};
    use crate::error::Error;
    use crate::{rtu, tcp};

    #[test]
    fn ut_resolve_network_with_port() {
        let endpoint = resolve("10.0.0.5:5020", &rtu::Config::default()).unwrap();
        match endpoint {
            DeviceEndpoint::Network(config) => {
                assert_eq!(config.host.to_string(), "10.0.0.5");
                assert_eq!(config.port, 5020);
            }
            _ => panic!("Expected network endpoint"),
        }
    }

    #[test]
    fn ut_resolve_network_default_port() {
        let endpoint = resolve("10.0.0.5", &rtu::Config::default()).unwrap();
        assert_eq!(
            endpoint,
            DeviceEndpoint::Network(tcp::Config {
                host: [10, 0, 0, 5].into(),
                port: tcp::DEFAULT_PORT,
            })
        );
        assert_eq!(endpoint.to_string(), "10.0.0.5:502 [TCP]");
    }

    #[test]
    fn ut_resolve_rejects_malformed_network() {
        for device in [
            "10.0.0",
            "10.0.0.5:",
            "10.0.0.5:99999",
            "300.0.0.1",
            "host.local:502",
            "10.0.0.5:502x",
        ] {
            assert!(
                matches!(
                    resolve(device, &rtu::Config::default()),
                    Err(Error::UnresolvableDevice { .. })
                ),
                "{device} should not resolve"
            );
        }
    }

    #[test]
    fn ut_resolve_missing_serial_device() {
        assert!(matches!(
            resolve("/dev/ttyUSB9", &rtu::Config::default()),
            Err(Error::UnresolvableDevice { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn ut_resolve_character_device() {
        let line = rtu::Config {
            baud_rate: 115200,
            ..Default::default()
        };
        let endpoint = resolve("/dev/null", &line).unwrap();
        assert_eq!(
            endpoint,
            DeviceEndpoint::Serial {
                path: "/dev/null".to_owned(),
                line,
            }
        );
    }

    #[test]
    fn ut_resolve_regular_file_is_not_serial() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        assert!(matches!(
            resolve(&path, &rtu::Config::default()),
            Err(Error::UnresolvableDevice { .. })
        ));
    }
}

/// Simple macro to prevent boilerplate of `.to_owned()`
///
/// The macro returns a `String` from the given `&str` value.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::util::str;
///
/// let value: String = str!("/dev/ttyUSB0");
/// ```
macro_rules! str {
    ($a:expr) => {
        $a.to_owned()
    };
}
pub(crate) use str;

/// Trait providing the `panic()` method that calls the given function and panics with the returned
/// message
///
/// Same as `expect()` but the error is available to include it into the panic message. Only
/// used for failures that leave the process without any sensible way to continue (e.g. no
/// runtime could be created).
pub trait Expect<F: FnOnce(Self::Error) -> String> {
    type Value;
    type Error;

    fn panic(self, f: F) -> Self::Value;
}

impl<T, E, F: FnOnce(E) -> String> Expect<F> for Result<T, E> {
    type Value = T;
    type Error = E;
    fn panic(self, f: F) -> Self::Value {
        match self {
            Ok(v) => v,
            Err(e) => panic!("{}", f(e)),
        }
    }
}

/// Parse an unsigned number given either in decimal or `0x` prefixed hexadecimal notation.
pub fn parse_number<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<u64>,
{
    let s = s.trim();
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse::<u64>()
    }
    .map_err(|e| format!("'{s}' is not a number [{e}]"))?;
    T::try_from(value).map_err(|_| format!("'{s}' is out of range"))
}

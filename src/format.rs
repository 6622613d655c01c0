use crate::dispatch::RawBuffer;
use crate::register::{OutputFormat, WordOrder};

use byteorder::{BigEndian, ByteOrder};
use itertools::Itertools;
use std::io::Write;

/// Reconstruct IEEE-754 values from consecutive register pairs.
///
/// A trailing register without partner is ignored.
pub fn decode_float32(words: &[u16], order: WordOrder) -> Vec<f32> {
    words
        .chunks_exact(2)
        .map(|pair| {
            let (high, low) = match order {
                WordOrder::HighFirst => (pair[0], pair[1]),
                WordOrder::LowFirst => (pair[1], pair[0]),
            };
            let mut bytes = [0u8; 4];
            BigEndian::write_u16(&mut bytes[..2], high);
            BigEndian::write_u16(&mut bytes[2..], low);
            BigEndian::read_f32(&bytes)
        })
        .collect()
}

fn token<T: std::fmt::LowerHex + std::fmt::Display>(value: T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Hex => format!("{:x}", value),
        OutputFormat::Decimal => format!("{}", value),
    }
}

/// Render the cells of `raw` as output text.
///
/// Registers and Float32 values are tab separated on a single line, coils are printed one per
/// line. `format` has no effect on Float32 values.
pub fn render(raw: &RawBuffer, format: OutputFormat, order: WordOrder) -> String {
    match raw {
        RawBuffer::Registers(values) => {
            format!("{}\n", values.iter().map(|v| token(*v, format)).join("\t"))
        }
        RawBuffer::Float32(words) => {
            let values = decode_float32(words, order);
            format!("{}\n", values.iter().map(|v| format!("{:.6}", v)).join("\t"))
        }
        RawBuffer::Bits(values) => values
            .iter()
            .map(|v| format!("{}\n", token(*v, format)))
            .collect(),
    }
}

/// Write the rendered cells of `raw` to `out`.
pub fn write<W: Write>(
    out: &mut W,
    raw: &RawBuffer,
    format: OutputFormat,
    order: WordOrder,
) -> std::io::Result<()> {
    out.write_all(render(raw, format, order).as_bytes())?;
    out.flush()
}

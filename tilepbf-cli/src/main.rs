use std::error::Error;
use std::fs;

use tilepbf::wire::{ErrorKind, Reader, WireError};

struct Args {
    /// File of wire-format bytes to dump.
    file: String,

    /// Print length-delimited fields without attempting a nested decode.
    raw: bool,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut file = None;
    let mut raw = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => file = Some(val.string()?),
            Short('r') | Long("raw") => raw = true,
            Short('h') | Long("help") => {
                println!(
                    "Dump the field structure of a wire-format message file.

Usage: {bin_name} [OPTIONS] <file>

  -r, --raw   Do not attempt to decode length-delimited fields as
              nested messages
  -h, --help  Print help
",
                    bin_name = parser.bin_name().unwrap_or("tilepbf")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let file = file.ok_or("missing `<file>` arg")?;

    Ok(Args { file, raw })
}

/// Check whether `buf` parses exactly as a sequence of fields with valid
/// tags and wire types.
///
/// Used to decide whether a length-delimited payload should be shown as a
/// nested message. The check is a heuristic: short strings can coincide
/// with valid field encodings.
fn looks_like_message(buf: &[u8]) -> bool {
    if buf.is_empty() {
        return false;
    }
    let mut reader = Reader::new(buf);
    while reader.pos() < buf.len() {
        let tag_and_type = match reader.read_varint() {
            Ok(val) => val,
            Err(_) => return false,
        };
        if tag_and_type >> 3 == 0 || reader.skip_field(tag_and_type).is_err() {
            return false;
        }
    }
    reader.pos() == buf.len()
}

/// Render a length-delimited payload that is not shown as a nested message.
fn format_payload(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => format!("{text:?}"),
        _ => format!("{} bytes", payload.len()),
    }
}

/// Print one line per field of `buf`, recursing into length-delimited
/// payloads that parse as messages.
fn dump_message(buf: &[u8], indent: usize, raw: bool) -> Result<(), WireError> {
    let pad = "  ".repeat(indent);
    let mut reader = Reader::new(buf);

    while reader.pos() < buf.len() {
        let tag_and_type = reader.read_varint()?;
        let tag = tag_and_type >> 3;
        match tag_and_type & 0x7 {
            0 => {
                let value = reader.read_varint()?;
                println!("{pad}#{tag} varint = {value}");
            }
            1 => {
                // The reader only decodes the low half of a 64-bit slot;
                // fetch the high half separately to show the full value.
                let low = reader.read_fixed64()?;
                let high = reader.read_fixed32()?;
                let value = low | (u64::from(high) << 32);
                println!(
                    "{pad}#{tag} fixed64 = {value} ({})",
                    f64::from_bits(value)
                );
            }
            2 => {
                let len = reader.read_varint()? as usize;
                let start = reader.pos();
                let payload = start
                    .checked_add(len)
                    .and_then(|end| buf.get(start..end))
                    .ok_or_else(|| WireError::new(ErrorKind::Eof))?;
                if !raw && looks_like_message(payload) {
                    println!("{pad}#{tag} message ({len} bytes) {{");
                    dump_message(payload, indent + 1, raw)?;
                    println!("{pad}}}");
                } else {
                    println!("{pad}#{tag} len({len}) = {}", format_payload(payload));
                }
                reader = Reader::at(buf, start + len);
            }
            5 => {
                let value = reader.read_fixed32()?;
                println!(
                    "{pad}#{tag} fixed32 = {value} ({})",
                    f32::from_bits(value)
                );
            }
            wire_type => {
                return Err(WireError::new(ErrorKind::UnimplementedWireType(wire_type)));
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    let buf = fs::read(&args.file)?;
    dump_message(&buf, 0, args.raw)?;
    Ok(())
}

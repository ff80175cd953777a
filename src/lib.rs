//! Codec for the Protocol Buffers wire format used to exchange map tile and
//! style data.
//!
//! Vector tiles, glyph ranges and sprite metadata travel between a fetch
//! layer and a parser as dense Protocol Buffers byte streams. This crate
//! implements the wire-format subset those streams use: varints, zigzag
//! signed integers, tag-based field multiplexing, length-delimited values,
//! packed repeated fields and a schema-driven generic decoder. It does not
//! define the tile or style schemas themselves; callers supply a
//! [`Schema`](wire::Schema) per message type.
//!
//! # Usage
//!
//! Encoding drives a [`Writer`](wire::Writer) field by field; decoding hands
//! a schema and a [`Reader`](wire::Reader) to
//! [`decode_message`](wire::Reader::decode_message):
//!
//! ```
//! use tilepbf::wire::{FieldDescriptor, FieldKind, Reader, Schema, Writer};
//!
//! fn main() -> Result<(), tilepbf::wire::WireError> {
//!     let mut writer = Writer::new();
//!     writer.write_tagged_varint(1, 42)?;
//!     writer.write_tagged_string(2, "water")?;
//!
//!     let schema = Schema::new()
//!         .field(1, FieldDescriptor::new("id", FieldKind::Varint))
//!         .field(2, FieldDescriptor::new("name", FieldKind::String));
//!
//!     let bytes = writer.finish();
//!     let mut reader = Reader::new(bytes);
//!     let record = reader.decode_message(&schema, Some(bytes.len()))?;
//!
//!     assert_eq!(record.get("id").and_then(|v| v.as_uint()), Some(42));
//!     assert_eq!(record.get("name").and_then(|v| v.as_str()), Some("water"));
//!     Ok(())
//! }
//! ```
//!
//! # Limits
//!
//! This codec is wire-compatible with standard Protocol Buffers for the
//! subset it implements, but it is not a general-purpose implementation:
//! varint decoding stops at 5 bytes and encoding at 4, 64-bit fixed slots
//! are only half-decoded, and there is no support for groups or map fields.
//! See the [`wire`] module documentation for details.

// Tile and style data arrive from untrusted sources, so unsafe code is
// banned in this crate.
#![forbid(unsafe_code)]

pub mod wire;

//! Low-level wire-format codec.
//!
//! Messages are sequences of tagged fields. Each field starts with a varint
//! tag whose low 3 bits select the wire type and whose remaining bits are
//! the field number. See
//! <https://protobuf.dev/programming-guides/encoding/#structure> for a guide
//! to the encoding.
//!
//! [`Reader`] decodes primitives from an immutable byte buffer, [`Writer`]
//! encodes them into a growable one, and
//! [`decode_message`](Reader::decode_message) drives a Reader from a
//! [`Schema`] to produce a [`Record`] without a hand-written decoder per
//! message type.
//!
//! Two behaviors are compatibility constraints of the tile streams this
//! codec exchanges, not bugs to fix:
//!
//! - Varint decoding accepts up to 5 bytes (35 value bits) while encoding
//!   emits at most 4 (28 value bits). Streams produced by other encoders may
//!   carry values this crate can read but never writes.
//! - [`Reader::read_fixed64`] decodes only the low half of a 64-bit slot and
//!   advances the cursor 4 bytes, not 8. Existing consumers depend on that
//!   cursor position.

mod errors;
mod reader;
mod schema;
pub mod varint;
mod writer;

pub use errors::{ErrorKind, WireError};
pub use reader::Reader;
pub use schema::{FieldDescriptor, FieldKind, Record, Schema, Span, Value};
pub use writer::{WireType, Writer};

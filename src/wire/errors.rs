use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Errors encoding or decoding wire-format data.
#[derive(Debug)]
pub struct WireError {
    kind: ErrorKind,
    field: Option<u64>,
}

impl WireError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, field: None }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the field number associated with this error, if known.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// Associate a field number with this error.
    pub fn with_field(mut self, field: u64) -> Self {
        self.field = Some(field);
        self
    }
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "error in field {}: {}", field, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for WireError {}

/// Enum describing the kind of a [`WireError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A read or skip would cross the end of the input buffer.
    Eof,

    /// A varint exceeded the supported length: a decode that would need a
    /// 6th continuation byte, or an encode of a value above 28 bits.
    UnsupportedVarint,

    /// A zigzag decode of a value whose magnitude exceeds 2^31 - 1. Sign
    /// reconstruction is unreliable beyond that range.
    SignedVarintOutOfRange,

    /// [`skip_field`](crate::wire::Reader::skip_field) encountered a wire
    /// type other than 0, 1, 2 or 5.
    UnimplementedWireType(u64),

    /// A schema decode completed without a value for a required field.
    RequiredField(String),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Eof => write!(f, "unexpected end of input"),
            ErrorKind::UnsupportedVarint => write!(f, "unsupported varint length"),
            ErrorKind::SignedVarintOutOfRange => write!(f, "signed varint out of range"),
            ErrorKind::UnimplementedWireType(wire_type) => {
                write!(f, "unimplemented wire type {wire_type}")
            }
            ErrorKind::RequiredField(name) => write!(f, "field {name} is required"),
        }
    }
}

//! Schema-driven generic message decoding.
//!
//! A [`Schema`] maps field tags to [`FieldDescriptor`]s for one message
//! type. [`Reader::decode_message`] walks the tagged fields of a
//! length-delimited region, decodes the ones the schema knows about and
//! skips the rest, producing a [`Record`] of name → [`Value`] pairs.
//! Schemas are built once per message type and reused across decodes.

use rustc_hash::FxHashMap;

use crate::wire::errors::{ErrorKind, WireError};
use crate::wire::reader::Reader;

/// Scalar type of a schema field, selecting the primitive reader used to
/// decode it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned varint.
    Varint,
    /// Zigzag-encoded signed varint.
    SVarint,
    /// 32-bit fixed-width value.
    Fixed32,
    /// 64-bit fixed-width slot. Only the low word is decoded; see
    /// [`Reader::read_fixed64`].
    Fixed64,
    /// Length-prefixed UTF-8 string.
    String,
}

/// A decoded field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Uint(u64),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Return the unsigned integer in this value, if it holds one.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// Return the signed integer in this value, if it holds one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Return the string in this value, if it holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Return the element list in this value, if it holds one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Describes one field of a message: its name, scalar kind and decoding
/// flags.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    repeated: bool,
    packed: bool,
    required: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repeated: false,
            packed: false,
            required: false,
            default: None,
        }
    }

    /// Mark the field repeated: each wire occurrence appends one element,
    /// and the field is seeded with an empty list before decoding.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Mark the field packed: a single length-delimited run of untagged
    /// elements, which replaces the field's value wholesale.
    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    /// Mark the field required: decoding fails if the message produced no
    /// value for it.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Seed the field with `value` before decoding. The default survives
    /// only if no wire occurrence overwrites it.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Mapping from field tag to descriptor for one message type.
///
/// Immutable for the duration of a decode; the codec never mutates it.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: FxHashMap<u64, FieldDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor under `tag`, replacing any previous one.
    pub fn field(mut self, tag: u64, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(tag, descriptor);
        self
    }

    /// Look up the descriptor for `tag`.
    pub fn get(&self, tag: u64) -> Option<&FieldDescriptor> {
        self.fields.get(&tag)
    }

    /// Iterate over `(tag, descriptor)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &FieldDescriptor)> {
        self.fields.iter().map(|(tag, descriptor)| (*tag, descriptor))
    }
}

/// Byte-offset range of a decoded message region.
///
/// `begin` is the cursor position when decoding started, before any length
/// prefix; `end` is the position after the last field; `len` is their
/// difference.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
    pub len: usize,
}

/// A decoded message: field names mapped to values.
///
/// Records carry a [`Span`] of the region they were decoded from when the
/// reader's debug mode is on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: FxHashMap<String, Value>,
    span: Option<Span>,
}

impl Record {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Byte span of the decoded region, when the reader's debug mode was
    /// on.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn insert(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl Reader<'_> {
    /// Decode a message according to `schema`.
    ///
    /// With `end` unset the message is treated as length-delimited: one
    /// varint byte length is read first and bounds the field loop, which is
    /// how embedded messages are stored. Callers decoding a top-level or
    /// already-bounded region pass the end offset explicitly.
    ///
    /// Fields are decoded per their descriptor: packed fields replace the
    /// whole list, repeated fields append one element per occurrence,
    /// scalars overwrite. Tags absent from the schema are skipped, never an
    /// error. After the loop, any descriptor marked required that produced
    /// no value fails the decode.
    pub fn decode_message(
        &mut self,
        schema: &Schema,
        end: Option<usize>,
    ) -> Result<Record, WireError> {
        let mut record = Record::default();
        for (_, descriptor) in schema.iter() {
            if let Some(default) = descriptor.default() {
                record.insert(descriptor.name(), default.clone());
            }
            if descriptor.is_repeated() {
                record.insert(descriptor.name(), Value::List(Vec::new()));
            }
        }

        let begin = self.pos();
        let end = match end {
            Some(end) => end,
            None => {
                let len = self.read_varint()? as usize;
                self.pos()
                    .checked_add(len)
                    .ok_or_else(|| WireError::new(ErrorKind::Eof))?
            }
        };

        while self.pos() < end {
            let tag_and_type = self.read_varint()?;
            let tag = tag_and_type >> 3;
            match schema.get(tag) {
                Some(descriptor) if descriptor.is_packed() => {
                    let values = self
                        .read_packed(descriptor.kind())
                        .map_err(|err| err.with_field(tag))?;
                    record.insert(descriptor.name(), Value::List(values));
                }
                Some(descriptor) if descriptor.is_repeated() => {
                    let value = self
                        .read_value(descriptor.kind())
                        .map_err(|err| err.with_field(tag))?;
                    let list = record
                        .fields
                        .entry(descriptor.name().to_string())
                        .or_insert_with(|| Value::List(Vec::new()));
                    if let Value::List(values) = list {
                        values.push(value);
                    } else {
                        *list = Value::List(vec![value]);
                    }
                }
                Some(descriptor) => {
                    let value = self
                        .read_value(descriptor.kind())
                        .map_err(|err| err.with_field(tag))?;
                    record.insert(descriptor.name(), value);
                }
                None => self.skip_field(tag_and_type)?,
            }
        }

        if self.debug() {
            record.span = Some(Span {
                begin,
                end,
                len: end - begin,
            });
        }

        for (_, descriptor) in schema.iter() {
            if descriptor.is_required() && !record.contains(descriptor.name()) {
                return Err(WireError::new(ErrorKind::RequiredField(
                    descriptor.name().to_string(),
                )));
            }
        }

        Ok(record)
    }
}

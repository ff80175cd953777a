use smallvec::SmallVec;

use crate::wire::errors::WireError;
use crate::wire::varint;

/// Wire type of an encoded field, stored in the low 3 bits of its tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WireType {
    /// Integer encoded as a varint.
    Varint = 0,
    /// 64-bit fixed-width value.
    Fixed64 = 1,
    /// Length-delimited value: string, raw bytes, embedded message or
    /// packed repeated field.
    Len = 2,
    /// 32-bit fixed-width value.
    Fixed32 = 5,
}

/// Inline buffer capacity. Typical tile fields fit within it, so the
/// throwaway writers built for embedded messages and packed fields stay on
/// the stack.
const INLINE_CAP: usize = 128;

/// Append-only encoder for wire-format messages.
///
/// A writer is created per message. Fields are written in caller order;
/// embedded messages are built with their own writer and spliced in via
/// [`write_message`](Self::write_message). [`finish`](Self::finish) borrows
/// the bytes written so far without consuming the writer.
///
/// The buffer spills to the heap with amortized doubling growth once it
/// outgrows the inline capacity.
#[derive(Default)]
pub struct Writer {
    buf: SmallVec<[u8; INLINE_CAP]>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write position (the number of bytes written so far).
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    /// Return the bytes written so far.
    ///
    /// The writer is not consumed or reset; this may be called speculatively
    /// and more fields appended after.
    pub fn finish(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    /// Write a field tag: `varint((tag << 3) | wire_type)`.
    pub fn write_tag(&mut self, tag: u64, wire_type: WireType) -> Result<(), WireError> {
        self.write_varint((tag << 3) | wire_type as u64)
    }

    /// Write an unsigned varint.
    ///
    /// Values above 28 bits are not representable by this encoder and fail;
    /// see the [varint module docs](crate::wire::varint).
    pub fn write_varint(&mut self, value: u64) -> Result<(), WireError> {
        let (bytes, len) = varint::encode_varint(value)?;
        self.buf.extend_from_slice(&bytes[..len]);
        Ok(())
    }

    /// Write a numeric value as a varint, coercing degenerate input instead
    /// of failing: NaN and negative values are written as 0 and fractional
    /// values truncate.
    pub fn write_varint_lossy(&mut self, value: f64) -> Result<(), WireError> {
        self.write_varint(value as u64)
    }

    /// Write a boolean as a varint 0 or 1.
    pub fn write_boolean(&mut self, value: bool) -> Result<(), WireError> {
        self.write_varint(u64::from(value))
    }

    /// Write 4 bytes little-endian.
    pub fn write_fixed32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write an IEEE-754 single-precision float, little-endian.
    pub fn write_float32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write an IEEE-754 double-precision float, little-endian.
    pub fn write_float64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        self.write_bytes(value.as_bytes())
    }

    /// Write a varint length prefix followed by a raw byte copy.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.write_varint(bytes.len() as u64)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write a tagged varint field.
    pub fn write_tagged_varint(&mut self, tag: u64, value: u64) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Varint)?;
        self.write_varint(value)
    }

    /// Write a tagged boolean field.
    pub fn write_tagged_boolean(&mut self, tag: u64, value: bool) -> Result<(), WireError> {
        self.write_tagged_varint(tag, u64::from(value))
    }

    /// Write a tagged 32-bit fixed-width field.
    pub fn write_tagged_fixed32(&mut self, tag: u64, value: u32) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Fixed32)?;
        self.write_fixed32(value);
        Ok(())
    }

    /// Write a tagged float field (32-bit wire type).
    pub fn write_tagged_float32(&mut self, tag: u64, value: f32) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Fixed32)?;
        self.write_float32(value);
        Ok(())
    }

    /// Write a tagged double field (64-bit wire type).
    pub fn write_tagged_float64(&mut self, tag: u64, value: f64) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Fixed64)?;
        self.write_float64(value);
        Ok(())
    }

    /// Write a tagged string field.
    pub fn write_tagged_string(&mut self, tag: u64, value: &str) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Len)?;
        self.write_string(value)
    }

    /// Write an embedded message as a length-delimited field.
    ///
    /// The message is built with its own writer and spliced in as a
    /// length-prefixed byte copy.
    pub fn write_message(&mut self, tag: u64, message: &Writer) -> Result<(), WireError> {
        self.write_tag(tag, WireType::Len)?;
        self.write_bytes(message.finish())
    }

    /// Write one full tag+value pair per element.
    fn write_repeated_with<T: Copy>(
        &mut self,
        items: &[T],
        mut write_item: impl FnMut(&mut Writer, T) -> Result<(), WireError>,
    ) -> Result<(), WireError> {
        for &item in items {
            write_item(self, item)?;
        }
        Ok(())
    }

    /// Write a non-packed repeated varint field: one tag+value wire entry
    /// per element.
    pub fn write_repeated_varints(&mut self, tag: u64, items: &[u64]) -> Result<(), WireError> {
        self.write_repeated_with(items, |writer, item| writer.write_tagged_varint(tag, item))
    }

    /// Write a non-packed repeated string field.
    pub fn write_repeated_strings(&mut self, tag: u64, items: &[&str]) -> Result<(), WireError> {
        self.write_repeated_with(items, |writer, item| writer.write_tagged_string(tag, item))
    }

    /// Write elements untagged into a throwaway writer and emit them as a
    /// single length-delimited field. An empty `items` writes nothing at
    /// all: the field is absent, not empty.
    fn write_packed_with<T: Copy>(
        &mut self,
        tag: u64,
        items: &[T],
        mut write_item: impl FnMut(&mut Writer, T) -> Result<(), WireError>,
    ) -> Result<(), WireError> {
        if items.is_empty() {
            return Ok(());
        }
        let mut packed = Writer::new();
        for &item in items {
            write_item(&mut packed, item)?;
        }
        self.write_tag(tag, WireType::Len)?;
        self.write_bytes(packed.finish())
    }

    /// Write a packed repeated varint field.
    pub fn write_packed_varints(&mut self, tag: u64, items: &[u64]) -> Result<(), WireError> {
        self.write_packed_with(tag, items, |writer, item| writer.write_varint(item))
    }

    /// Write a packed repeated float field.
    pub fn write_packed_floats(&mut self, tag: u64, items: &[f32]) -> Result<(), WireError> {
        self.write_packed_with(tag, items, |writer, item| {
            writer.write_float32(item);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Writer;
    use crate::wire::{ErrorKind, Reader};

    #[test]
    fn test_write_tagged_varint() {
        // Field 1, varint 150: the canonical `08 96 01` example message.
        let mut writer = Writer::new();
        writer.write_tagged_varint(1, 150).unwrap();
        assert_eq!(writer.finish(), [0x08, 0x96, 0x01]);
    }

    #[test]
    fn test_write_tagged_string() {
        let mut writer = Writer::new();
        writer.write_tagged_string(2, "testing").unwrap();
        assert_eq!(
            writer.finish(),
            [0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g']
        );
    }

    #[test]
    fn test_write_tagged_fixed_width() {
        let mut writer = Writer::new();
        writer.write_tagged_fixed32(1, 1).unwrap();
        writer.write_tagged_float32(2, 1.0).unwrap();
        writer.write_tagged_float64(3, 1.0).unwrap();
        assert_eq!(
            writer.finish(),
            [
                0x0d, 0x01, 0x00, 0x00, 0x00, // field 1, fixed32
                0x15, 0x00, 0x00, 0x80, 0x3f, // field 2, float32
                0x19, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // field 3, float64
            ]
        );
    }

    #[test]
    fn test_write_boolean() {
        let mut writer = Writer::new();
        writer.write_tagged_boolean(1, true).unwrap();
        writer.write_tagged_boolean(2, false).unwrap();
        assert_eq!(writer.finish(), [0x08, 0x01, 0x10, 0x00]);
    }

    #[test]
    fn test_write_varint_lossy() {
        let mut writer = Writer::new();
        writer.write_varint_lossy(f64::NAN).unwrap();
        writer.write_varint_lossy(-1.0).unwrap();
        writer.write_varint_lossy(150.9).unwrap();
        assert_eq!(writer.finish(), [0x00, 0x00, 0x96, 0x01]);
    }

    #[test]
    fn test_write_varint_too_large() {
        let mut writer = Writer::new();
        let err = writer.write_varint(1 << 28).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::UnsupportedVarint));
    }

    #[test]
    fn test_write_message() {
        let mut inner = Writer::new();
        inner.write_tagged_varint(1, 150).unwrap();

        let mut outer = Writer::new();
        outer.write_message(3, &inner).unwrap();
        assert_eq!(outer.finish(), [0x1a, 0x03, 0x08, 0x96, 0x01]);
    }

    #[test]
    fn test_write_packed_varints() {
        let mut writer = Writer::new();
        writer.write_packed_varints(4, &[3, 270, 86942]).unwrap();
        // One length-delimited field holding all three values, from the
        // packed example at
        // https://protobuf.dev/programming-guides/encoding/#packed.
        assert_eq!(
            writer.finish(),
            [0x22, 0x06, 0x03, 0x8e, 0x02, 0x9e, 0xa7, 0x05]
        );
    }

    #[test]
    fn test_write_packed_empty_writes_nothing() {
        let mut writer = Writer::new();
        writer.write_packed_varints(4, &[]).unwrap();
        writer.write_packed_floats(5, &[]).unwrap();
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn test_write_repeated_varints() {
        let mut writer = Writer::new();
        writer.write_repeated_varints(1, &[1, 2, 3]).unwrap();
        assert_eq!(writer.finish(), [0x08, 0x01, 0x08, 0x02, 0x08, 0x03]);
    }

    #[test]
    fn test_finish_is_speculative() {
        let mut writer = Writer::new();
        writer.write_tagged_varint(1, 1).unwrap();
        assert_eq!(writer.finish().len(), 2);

        writer.write_tagged_varint(2, 2).unwrap();
        assert_eq!(writer.finish().len(), 4);
    }

    #[test]
    fn test_growth_past_inline_capacity() {
        let mut writer = Writer::new();
        for i in 0..200 {
            writer.write_varint(i % 0x80).unwrap();
        }
        assert_eq!(writer.pos(), 200);

        let mut reader = Reader::new(writer.finish());
        for i in 0..200 {
            assert_eq!(reader.read_varint().unwrap(), i % 0x80);
        }
    }
}

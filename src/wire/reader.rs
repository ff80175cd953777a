use crate::wire::errors::{ErrorKind, WireError};
use crate::wire::schema::{FieldKind, Value};
use crate::wire::varint;

/// Sequential decode cursor over an immutable byte buffer.
///
/// A reader is created per message and holds no state beyond the buffer and
/// the cursor. The cursor only moves forward, advances by exactly the bytes
/// each primitive consumes, and never passes the end of the buffer: a read
/// that would cross it fails with [`ErrorKind::Eof`] instead.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    debug: bool,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Create a reader positioned at `pos`.
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self {
            buf,
            pos,
            debug: false,
        }
    }

    /// Current cursor position, as a byte offset from the start of the
    /// buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Record byte-offset spans on records produced by
    /// [`decode_message`](Self::decode_message).
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    /// Consume `n` bytes, failing without moving the cursor if fewer remain.
    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| WireError::new(ErrorKind::Eof))?;
        if end > self.buf.len() {
            return Err(WireError::new(ErrorKind::Eof));
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read 4 bytes little-endian.
    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let mut out = [0; 4];
        out.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(out))
    }

    /// Read the low half of a 64-bit fixed-width slot.
    ///
    /// Only 4 of the slot's 8 bytes are decoded and consumed; the cursor is
    /// left in the middle of the slot. Callers that need the full slot must
    /// read or skip the remaining 4 bytes themselves. See the
    /// [module docs](crate::wire) for why this is not widened.
    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        self.read_fixed32().map(u64::from)
    }

    /// Read an unsigned varint.
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let (value, len) = varint::decode_varint(self.buf, self.pos)?;
        self.pos += len;
        Ok(value)
    }

    /// Read a zigzag-encoded signed varint.
    pub fn read_svarint(&mut self) -> Result<i32, WireError> {
        let value = self.read_varint()?;
        varint::decode_zigzag(value)
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD rather than
    /// rejected.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_varint()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read one scalar of the given kind.
    pub fn read_value(&mut self, kind: FieldKind) -> Result<Value, WireError> {
        let value = match kind {
            FieldKind::Varint => Value::Uint(self.read_varint()?),
            FieldKind::SVarint => Value::Int(self.read_svarint()? as i64),
            FieldKind::Fixed32 => Value::Uint(u64::from(self.read_fixed32()?)),
            FieldKind::Fixed64 => Value::Uint(self.read_fixed64()?),
            FieldKind::String => Value::Str(self.read_string()?),
        };
        Ok(value)
    }

    /// Read a packed repeated field: a varint byte length followed by
    /// untagged scalars until the delimited region is exhausted.
    ///
    /// Values are returned in read order.
    pub fn read_packed(&mut self, kind: FieldKind) -> Result<Vec<Value>, WireError> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| WireError::new(ErrorKind::Eof))?;
        let mut values = Vec::new();
        while self.pos < end {
            values.push(self.read_value(kind)?);
        }
        Ok(values)
    }

    /// Skip a field, given the just-read tag-and-wire-type varint.
    ///
    /// Dispatches on the low 3 bits: varints are consumed through the first
    /// byte without the continuation bit, 64-bit slots skip 8 bytes,
    /// length-delimited fields skip their varint length, 32-bit slots skip
    /// 4 bytes. Any other wire type fails with
    /// [`ErrorKind::UnimplementedWireType`].
    pub fn skip_field(&mut self, tag_and_type: u64) -> Result<(), WireError> {
        match tag_and_type & 0x7 {
            0 => loop {
                let byte = *self
                    .buf
                    .get(self.pos)
                    .ok_or_else(|| WireError::new(ErrorKind::Eof))?;
                self.pos += 1;
                if byte <= 0x7f {
                    break;
                }
            },
            1 => {
                self.take(8)?;
            }
            2 => {
                let len = self.read_varint()? as usize;
                self.take(len)?;
            }
            5 => {
                self.take(4)?;
            }
            wire_type => {
                return Err(WireError::new(ErrorKind::UnimplementedWireType(wire_type)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::wire::schema::{FieldKind, Value};
    use crate::wire::{ErrorKind, Writer};

    #[test]
    fn test_read_fixed32() {
        let buf = 0xdeadbeefu32.to_le_bytes();
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_fixed32().unwrap(), 0xdeadbeef);
        assert_eq!(reader.pos(), 4);
    }

    #[test]
    fn test_read_fixed64_consumes_half_slot() {
        let buf = 0x1122334455667788u64.to_le_bytes();
        let mut reader = Reader::new(&buf);

        // Only the low word is decoded and only 4 bytes are consumed.
        assert_eq!(reader.read_fixed64().unwrap(), 0x55667788);
        assert_eq!(reader.pos(), 4);

        assert_eq!(reader.read_fixed32().unwrap(), 0x11223344);
        assert_eq!(reader.pos(), 8);
    }

    #[test]
    fn test_read_varint_sequence() {
        // Example message from
        // https://protobuf.dev/programming-guides/encoding/#simple.
        let buf = [0x08, 0x96, 0x01];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_varint().unwrap(), 8);
        assert_eq!(reader.read_varint().unwrap(), 150);
        assert!(matches!(
            reader.read_varint().err().unwrap().kind(),
            ErrorKind::Eof
        ));
    }

    #[test]
    fn test_read_svarint() {
        let mut writer = Writer::new();
        writer.write_varint(crate::wire::varint::encode_zigzag(-42)).unwrap();
        let mut reader = Reader::new(writer.finish());
        assert_eq!(reader.read_svarint().unwrap(), -42);
    }

    #[test]
    fn test_read_string() {
        #[derive(Debug)]
        struct Case {
            value: &'static str,
        }

        let cases = [
            Case { value: "" },
            Case { value: "water" },
            Case { value: "日本語" },
            Case { value: "naïve" },
        ];

        for case in cases {
            let mut writer = Writer::new();
            writer.write_string(case.value).unwrap();
            let bytes = writer.finish();
            let mut reader = Reader::new(bytes);
            assert_eq!(reader.read_string().unwrap(), case.value);
            assert_eq!(reader.pos(), bytes.len());
        }
    }

    #[test]
    fn test_read_string_invalid_utf8() {
        // Length prefix 2, then an invalid sequence. Decoding is lossy.
        let buf = [0x02, 0xc3, 0x28];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_string().unwrap(), "\u{fffd}(");
    }

    #[test]
    fn test_read_string_truncated() {
        let buf = [0x05, b'a', b'b'];
        let mut reader = Reader::new(&buf);
        let err = reader.read_string().err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::Eof));
    }

    #[test]
    fn test_read_packed() {
        let mut writer = Writer::new();
        writer.write_packed_varints(1, &[1, 150, 3]).unwrap();
        let bytes = writer.finish();

        let mut reader = Reader::new(bytes);
        let tag_and_type = reader.read_varint().unwrap();
        assert_eq!(tag_and_type >> 3, 1);
        let values = reader.read_packed(FieldKind::Varint).unwrap();
        assert_eq!(
            values,
            [Value::Uint(1), Value::Uint(150), Value::Uint(3)]
        );
        assert_eq!(reader.pos(), bytes.len());
    }

    #[test]
    fn test_skip_field_all_wire_types() {
        let mut writer = Writer::new();
        writer.write_tagged_varint(1, 150).unwrap();
        writer.write_tagged_float64(2, 2.5).unwrap();
        writer.write_tagged_string(3, "skipped").unwrap();
        writer.write_tagged_fixed32(4, 99).unwrap();
        writer.write_tagged_varint(5, 7).unwrap();
        let bytes = writer.finish();

        let mut reader = Reader::new(bytes);
        for _ in 0..4 {
            let tag_and_type = reader.read_varint().unwrap();
            reader.skip_field(tag_and_type).unwrap();
        }

        // The cursor lands exactly on the final field.
        let tag_and_type = reader.read_varint().unwrap();
        assert_eq!(tag_and_type >> 3, 5);
        assert_eq!(reader.read_varint().unwrap(), 7);
        assert_eq!(reader.pos(), bytes.len());
    }

    #[test]
    fn test_skip_field_unimplemented_wire_type() {
        let mut reader = Reader::new(&[0x00]);
        // Wire type 3 (start-of-group) is not implemented.
        let err = reader.skip_field(3).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::UnimplementedWireType(3)));
    }

    #[test]
    fn test_skip_field_truncated() {
        let mut reader = Reader::new(&[0x80, 0x80]);
        let err = reader.skip_field(0).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::Eof));
    }
}

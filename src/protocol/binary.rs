//! Bit-exact reader/writer for the Thrift Binary Protocol.
//!
//! All integers are big-endian two's complement; doubles are big-endian
//! IEEE-754 binary64. Binary blobs (and strings, which share the wire
//! representation) are `len:i32` followed by `len` bytes.

use crate::error::ProtocolError;
use crate::wire::{FieldValue, StructValue, TType, ValueVisitor, WireValue};

use super::buffer::{ReadBuffer, WriteBuffer};

const STRUCT_END: i8 = 0;

/// Parser for the binary protocol. Wraps a [`ReadBuffer`] over the full
/// input; nothing here performs I/O, the caller is responsible for having
/// the entire message in memory (or framed by a collaborator transport).
pub struct BinaryReader<'a> {
    buf: ReadBuffer<'a>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            buf: ReadBuffer::new(bytes),
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn byte(&mut self) -> Result<i8, ProtocolError> {
        Ok(self.buf.take(1)?[0] as i8)
    }

    fn i16(&mut self) -> Result<i16, ProtocolError> {
        let chunk = self.buf.take(2)?;
        Ok(i16::from_be_bytes([chunk[0], chunk[1]]))
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        let chunk = self.buf.take(4)?;
        Ok(i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }

    fn i64(&mut self) -> Result<i64, ProtocolError> {
        let chunk = self.buf.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(chunk);
        Ok(i64::from_be_bytes(arr))
    }

    fn f64(&mut self) -> Result<f64, ProtocolError> {
        let chunk = self.buf.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(chunk);
        Ok(f64::from_be_bytes(arr))
    }

    /// Dispatches to the handler for `ttype`. An unrecognized byte has
    /// already been rejected by [`TType::from_code`] before reaching here.
    pub fn read(&mut self, ttype: TType) -> Result<WireValue, ProtocolError> {
        match ttype {
            TType::Bool => self.read_bool(),
            TType::Byte => self.read_byte(),
            TType::Double => self.read_double(),
            TType::I16 => self.read_i16(),
            TType::I32 => self.read_i32(),
            TType::I64 => self.read_i64(),
            TType::Binary => self.read_binary(),
            TType::Struct => self.read_struct(),
            TType::Map => self.read_map(),
            TType::Set => self.read_set(),
            TType::List => self.read_list(),
        }
    }

    /// Reads a ttype tag byte and dispatches, surfacing `UnknownTType` for
    /// a byte that doesn't correspond to any known wire type.
    pub fn read_tagged(&mut self) -> Result<WireValue, ProtocolError> {
        let tag = self.byte()?;
        let ttype = TType::from_code(tag)?;
        self.read(ttype)
    }

    pub fn read_bool(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::Bool(self.byte()? == 1))
    }

    pub fn read_byte(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::Byte(self.byte()?))
    }

    pub fn read_double(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::Double(self.f64()?))
    }

    pub fn read_i16(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::I16(self.i16()?))
    }

    pub fn read_i32(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::I32(self.i32()?))
    }

    pub fn read_i64(&mut self) -> Result<WireValue, ProtocolError> {
        Ok(WireValue::I64(self.i64()?))
    }

    pub fn read_binary(&mut self) -> Result<WireValue, ProtocolError> {
        let len = self.non_negative_len()?;
        Ok(WireValue::Binary(self.buf.take(len)?.to_vec()))
    }

    pub fn read_struct(&mut self) -> Result<WireValue, ProtocolError> {
        let mut fields = Vec::new();
        loop {
            let tag = self.byte()?;
            if tag == STRUCT_END {
                break;
            }
            let ttype = TType::from_code(tag)?;
            let id = self.i16()?;
            let value = self.read(ttype)?;
            fields.push(FieldValue::new(id, ttype, value));
        }
        Ok(WireValue::Struct(StructValue::new(fields)))
    }

    pub fn read_map(&mut self) -> Result<WireValue, ProtocolError> {
        let key_ttype = TType::from_code(self.byte()?)?;
        let value_ttype = TType::from_code(self.byte()?)?;
        let len = self.non_negative_len()?;

        let mut pairs = Vec::with_capacity(len);
        for _ in 0..len {
            let k = self.read(key_ttype)?;
            let v = self.read(value_ttype)?;
            pairs.push((k, v));
        }
        Ok(WireValue::Map {
            key_ttype,
            value_ttype,
            pairs,
        })
    }

    pub fn read_set(&mut self) -> Result<WireValue, ProtocolError> {
        let value_ttype = TType::from_code(self.byte()?)?;
        let len = self.non_negative_len()?;

        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read(value_ttype)?);
        }
        Ok(WireValue::Set {
            value_ttype,
            values,
        })
    }

    pub fn read_list(&mut self) -> Result<WireValue, ProtocolError> {
        let value_ttype = TType::from_code(self.byte()?)?;
        let len = self.non_negative_len()?;

        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read(value_ttype)?);
        }
        Ok(WireValue::List {
            value_ttype,
            values,
        })
    }

    fn non_negative_len(&mut self) -> Result<usize, ProtocolError> {
        let len = self.i32()?;
        if len < 0 {
            return Err(ProtocolError::other(format!(
                "negative length {len} in encoding"
            )));
        }
        Ok(len as usize)
    }
}

/// Serializes values using the Thrift Binary protocol. Implements
/// [`ValueVisitor`] so that encoding a `WireValue` is just
/// `value.apply(&mut writer)`.
pub struct BinaryWriter<'a> {
    buf: &'a mut WriteBuffer,
}

impl<'a> BinaryWriter<'a> {
    pub fn new(buf: &'a mut WriteBuffer) -> Self {
        Self { buf }
    }

    pub fn write(&mut self, value: &WireValue) {
        value.apply(self);
    }

    fn byte(&mut self, value: i8) {
        self.buf.write_bytes(&[value as u8]);
    }

    fn i16(&mut self, value: i16) {
        self.buf.write_bytes(&value.to_be_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.buf.write_bytes(&value.to_be_bytes());
    }

    fn i64(&mut self, value: i64) {
        self.buf.write_bytes(&value.to_be_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.buf.write_bytes(&value.to_be_bytes());
    }
}

impl<'a> ValueVisitor<()> for BinaryWriter<'a> {
    fn visit_bool(&mut self, value: bool) {
        self.byte(if value { 1 } else { 0 });
    }

    fn visit_byte(&mut self, value: i8) {
        self.byte(value);
    }

    fn visit_double(&mut self, value: f64) {
        self.f64(value);
    }

    fn visit_i16(&mut self, value: i16) {
        self.i16(value);
    }

    fn visit_i32(&mut self, value: i32) {
        self.i32(value);
    }

    fn visit_i64(&mut self, value: i64) {
        self.i64(value);
    }

    fn visit_binary(&mut self, value: &[u8]) {
        self.i32(value.len() as i32);
        self.buf.write_bytes(value);
    }

    fn visit_struct(&mut self, fields: &[FieldValue]) {
        for field in fields {
            self.byte(field.ttype.code());
            self.i16(field.id);
            self.write(&field.value);
        }
        self.byte(STRUCT_END);
    }

    fn visit_map(
        &mut self,
        key_ttype: TType,
        value_ttype: TType,
        pairs: &[(WireValue, WireValue)],
    ) {
        self.byte(key_ttype.code());
        self.byte(value_ttype.code());
        self.i32(pairs.len() as i32);
        for (k, v) in pairs {
            self.write(k);
            self.write(v);
        }
    }

    fn visit_set(&mut self, value_ttype: TType, values: &[WireValue]) {
        self.byte(value_ttype.code());
        self.i32(values.len() as i32);
        for v in values {
            self.write(v);
        }
    }

    fn visit_list(&mut self, value_ttype: TType, values: &[WireValue]) {
        self.byte(value_ttype.code());
        self.i32(values.len() as i32);
        for v in values {
            self.write(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &WireValue) -> Vec<u8> {
        let mut buf = WriteBuffer::new();
        BinaryWriter::new(&mut buf).write(value);
        buf.into_vec()
    }

    #[test]
    fn encodes_bool() {
        assert_eq!(encode(&WireValue::Bool(true)), vec![0x01]);
        assert_eq!(encode(&WireValue::Bool(false)), vec![0x00]);
    }

    #[test]
    fn encodes_i32_edges() {
        assert_eq!(
            encode(&WireValue::I32(2147483647)),
            vec![0x7F, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(encode(&WireValue::I32(-1)), vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            encode(&WireValue::I32(-2147483648)),
            vec![0x80, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn encodes_binary() {
        assert_eq!(
            encode(&WireValue::Binary(b"hello".to_vec())),
            vec![0x00, 0x00, 0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F]
        );
    }

    #[test]
    fn encodes_struct_with_one_bool_field() {
        let fields = vec![FieldValue::new(1, TType::Bool, WireValue::Bool(true))];
        let sv = StructValue::new(fields);
        assert_eq!(
            encode(&WireValue::Struct(sv)),
            vec![0x02, 0x00, 0x01, 0x01, 0x00]
        );
    }

    #[test]
    fn round_trips_struct() {
        let fields = vec![
            FieldValue::new(1, TType::I32, WireValue::I32(42)),
            FieldValue::new(2, TType::Binary, WireValue::Binary(b"x".to_vec())),
        ];
        let original = WireValue::Struct(StructValue::new(fields));
        let bytes = encode(&original);
        let mut reader = BinaryReader::new(&bytes);
        let decoded = reader.read(TType::Struct).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn truncated_i32_is_end_of_input() {
        let mut reader = BinaryReader::new(&[0x00, 0x00]);
        let err = reader.read(TType::I32).unwrap_err();
        assert!(matches!(err, ProtocolError::EndOfInput { .. }));
    }

    #[test]
    fn unknown_ttype_byte_is_protocol_error() {
        let bytes = [0x7F, 0x00, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new(&bytes);
        let err = reader.read_struct().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownTType(0x7F)));
    }

    #[test]
    fn duplicate_map_keys_last_wins_on_decode() {
        // decoding itself just preserves pairs in order; last-wins is a
        // schema-layer concern applied when building a host map.
        let bytes = {
            let mut buf = WriteBuffer::new();
            let mut w = BinaryWriter::new(&mut buf);
            w.visit_map(
                TType::I32,
                TType::I32,
                &[
                    (WireValue::I32(1), WireValue::I32(100)),
                    (WireValue::I32(1), WireValue::I32(200)),
                ],
            );
            buf.into_vec()
        };
        let mut reader = BinaryReader::new(&bytes);
        let decoded = reader.read(TType::Map).unwrap();
        let WireValue::Map { pairs, .. } = decoded else {
            panic!("expected map");
        };
        // last-write-wins: fold into a plain Vec keeping only the final
        // value seen for each key, the same way the schema layer builds a
        // host `HashMap` from decoded pairs.
        let mut last: Option<&WireValue> = None;
        for (k, v) in &pairs {
            if *k == WireValue::I32(1) {
                last = Some(v);
            }
        }
        assert_eq!(last, Some(&WireValue::I32(200)));
    }
}

//! Truncation and malformed-input behavior of the Binary Protocol codec.

use thriftrw::error::ProtocolError;
use thriftrw::protocol::{BinaryReader, BinaryWriter, WriteBuffer};
use thriftrw::wire::{TType, WireValue};

fn encode(value: &WireValue) -> Vec<u8> {
    let mut buf = WriteBuffer::new();
    BinaryWriter::new(&mut buf).write(value);
    buf.into_vec()
}

#[test]
fn truncated_i32_is_end_of_input() {
    let bytes = encode(&WireValue::I32(12345));
    for len in 0..bytes.len() {
        let mut reader = BinaryReader::new(&bytes[..len]);
        let err = reader.read(TType::I32).unwrap_err();
        assert!(matches!(err, ProtocolError::EndOfInput { .. }), "prefix of len {len} should fail");
    }
}

#[test]
fn truncated_binary_is_end_of_input() {
    let bytes = encode(&WireValue::Binary(b"hello world".to_vec()));
    for len in 0..bytes.len() {
        let mut reader = BinaryReader::new(&bytes[..len]);
        let err = reader.read(TType::Binary).unwrap_err();
        assert!(matches!(err, ProtocolError::EndOfInput { .. }), "prefix of len {len} should fail");
    }
}

#[test]
fn truncated_struct_is_end_of_input() {
    let fields = WireValue::Struct(thriftrw::wire::StructValue::new(vec![
        thriftrw::wire::FieldValue::new(1, TType::Bool, WireValue::Bool(true)),
    ]));
    let bytes = encode(&fields);
    for len in 0..bytes.len() {
        let mut reader = BinaryReader::new(&bytes[..len]);
        let err = reader.read(TType::Struct).unwrap_err();
        assert!(matches!(err, ProtocolError::EndOfInput { .. }), "prefix of len {len} should fail");
    }
}

#[test]
fn unknown_ttype_byte_is_rejected() {
    // 0x05 is not assigned to any ttype in the Binary Protocol.
    let bytes = [0x05u8];
    let mut reader = BinaryReader::new(&bytes);
    let err = reader.read_tagged().unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownTType(5)));
}

#[test]
fn unknown_ttype_inside_a_struct_field_is_rejected() {
    // field header with ttype byte 0x01 (unassigned), id 1, then stop byte.
    let bytes = [0x01u8, 0x00, 0x01, 0x00];
    let mut reader = BinaryReader::new(&bytes);
    let err = reader.read(TType::Struct).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownTType(1)));
}

#[test]
fn duplicate_map_keys_resolve_last_write_wins() {
    use thriftrw::compiler::{compile, NoIncludes};
    use thriftrw::parser::parse;
    use thriftrw::runtime::loads;
    use thriftrw::schema::{TypeSpec, Value};

    let program = parse("struct M { 1: required map<i32, string> entries }").unwrap();
    let module = compile("m", "", &program, &mut NoIncludes, true).unwrap();
    let spec = module.ty("M").unwrap();

    let wire_map = WireValue::Map {
        key_ttype: TType::I32,
        value_ttype: TType::Binary,
        pairs: vec![
            (WireValue::I32(1), WireValue::Binary(b"first".to_vec())),
            (WireValue::I32(1), WireValue::Binary(b"second".to_vec())),
        ],
    };
    let field = thriftrw::wire::FieldValue::new(1, TType::Map, wire_map);
    let wire_struct = WireValue::Struct(thriftrw::wire::StructValue::new(vec![field]));
    let mut buf = WriteBuffer::new();
    BinaryWriter::new(&mut buf).write(&wire_struct);
    let bytes = buf.into_vec();

    let decoded = loads(&spec, &bytes).unwrap();
    let Value::Instance(instance) = decoded else { panic!("expected instance") };
    let Value::Map(pairs) = instance.get_by_name("entries").unwrap() else {
        panic!("expected map")
    };
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0], (Value::I32(1), Value::String("second".to_string())));
}

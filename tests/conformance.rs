//! End-to-end byte-exactness and round-trip scenarios against the
//! Binary Protocol conformance table.

use thriftrw::compiler::{compile, NoIncludes};
use thriftrw::parser::parse;
use thriftrw::protocol::{BinaryWriter, WriteBuffer};
use thriftrw::runtime::{dumps, loads};
use thriftrw::schema::{Instance, TypeSpec, Value};
use thriftrw::wire::WireValue;

fn encode(value: &WireValue) -> Vec<u8> {
    let mut buf = WriteBuffer::new();
    BinaryWriter::new(&mut buf).write(value);
    buf.into_vec()
}

#[test]
fn encodes_bool_true_and_false() {
    assert_eq!(encode(&WireValue::Bool(true)), vec![0x01]);
    assert_eq!(encode(&WireValue::Bool(false)), vec![0x00]);
}

#[test]
fn encodes_i32_boundary_values() {
    assert_eq!(encode(&WireValue::I32(i32::MAX)), vec![0x7F, 0xFF, 0xFF, 0xFF]);
    assert_eq!(encode(&WireValue::I32(-1)), vec![0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(encode(&WireValue::I32(i32::MIN)), vec![0x80, 0x00, 0x00, 0x00]);
}

#[test]
fn encodes_binary_with_length_prefix() {
    assert_eq!(
        encode(&WireValue::Binary(b"hello".to_vec())),
        vec![0x00, 0x00, 0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F]
    );
}

#[test]
fn encodes_struct_with_one_bool_field() {
    let program = parse("struct S { 1: required bool flag }").unwrap();
    let module = compile("s", "", &program, &mut NoIncludes, true).unwrap();
    let spec = module.ty("S").unwrap();
    let TypeSpec::Struct(struct_spec) = spec.clone() else { panic!("expected struct") };
    let fields = struct_spec.construct(vec![Value::Bool(true)], vec![]).unwrap();
    let value = Value::Instance(Instance::new(struct_spec, fields));

    let bytes = dumps(&spec, &value).unwrap();
    assert_eq!(bytes, vec![0x02, 0x00, 0x01, 0x01, 0x00]);
}

#[test]
fn round_trips_item_struct_to_the_exact_conformance_bytes() {
    let program =
        parse("struct Item { 1: required string key; 2: required string value }").unwrap();
    let module = compile("item", "", &program, &mut NoIncludes, true).unwrap();
    let spec = module.ty("Item").unwrap();
    let TypeSpec::Struct(struct_spec) = spec.clone() else { panic!("expected struct") };
    let fields = struct_spec
        .construct(vec![Value::String("foo".into()), Value::String("bar".into())], vec![])
        .unwrap();
    let value = Value::Instance(Instance::new(struct_spec, fields));

    let bytes = dumps(&spec, &value).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x66, 0x6F, 0x6F, 0x0B, 0x00, 0x02, 0x00,
            0x00, 0x00, 0x03, 0x62, 0x61, 0x72, 0x00,
        ]
    );

    let decoded = loads(&spec, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn compiles_enum_with_implicit_and_explicit_values() {
    let program = parse("enum Role { USER = 1, ADMIN }").unwrap();
    let module = compile("role", "", &program, &mut NoIncludes, true).unwrap();
    let TypeSpec::Enum(role) = module.ty("Role").unwrap() else { panic!("expected enum") };
    assert_eq!(role.name_of(2), Some("ADMIN"));
    assert_eq!(role.value_of("USER"), Some(1));
}

#[test]
fn round_trips_nested_containers() {
    let program = parse(
        "struct Bag { 1: required list<i32> nums; 2: required map<string, set<i32>> groups }",
    )
    .unwrap();
    let module = compile("bag", "", &program, &mut NoIncludes, true).unwrap();
    let spec = module.ty("Bag").unwrap();
    let TypeSpec::Struct(struct_spec) = spec.clone() else { panic!("expected struct") };

    let nums = Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
    let groups = Value::Map(vec![(
        Value::String("odds".into()),
        Value::Set(vec![Value::I32(1), Value::I32(3)]),
    )]);
    let fields = struct_spec.construct(vec![nums.clone(), groups.clone()], vec![]).unwrap();
    let value = Value::Instance(Instance::new(struct_spec, fields));

    let bytes = dumps(&spec, &value).unwrap();
    let decoded = loads(&spec, &bytes).unwrap();
    assert_eq!(decoded, value);
}

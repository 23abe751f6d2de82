//! Structs, services, and constants that refer back to their own
//! declaration (directly or through a chain) must compile and round-trip.

use thriftrw::compiler::{compile, NoIncludes};
use thriftrw::parser::parse;
use thriftrw::runtime::{dumps, loads};
use thriftrw::schema::{Instance, TypeSpec, Value};

#[test]
fn self_referential_struct_compiles_and_round_trips_three_deep() {
    let program =
        parse("struct Cons { 1: required i32 value; 2: optional Cons next }").unwrap();
    let module = compile("cons", "", &program, &mut NoIncludes, true).unwrap();
    let spec = module.ty("Cons").unwrap();
    let TypeSpec::Struct(struct_spec) = spec.clone() else { panic!("expected struct") };

    let tail = Value::Instance(Instance::new(
        struct_spec.clone(),
        struct_spec.construct(vec![Value::I32(3)], vec![]).unwrap(),
    ));
    let middle = Value::Instance(Instance::new(
        struct_spec.clone(),
        struct_spec
            .construct(vec![Value::I32(2)], vec![("next".to_string(), tail)])
            .unwrap(),
    ));
    let head = Value::Instance(Instance::new(
        struct_spec.clone(),
        struct_spec
            .construct(vec![Value::I32(1)], vec![("next".to_string(), middle)])
            .unwrap(),
    ));

    let bytes = dumps(&spec, &head).unwrap();
    let decoded = loads(&spec, &bytes).unwrap();
    assert_eq!(decoded, head);
}

#[test]
fn mutually_recursive_structs_link_without_infinite_recursion() {
    let program = parse(
        "struct A { 1: optional B b }\n\
         struct B { 1: optional A a }",
    )
    .unwrap();
    let module = compile("ab", "", &program, &mut NoIncludes, true).unwrap();
    assert!(module.ty("A").is_some());
    assert!(module.ty("B").is_some());
}

#[test]
fn service_inheritance_chain_of_three_resolves_every_function() {
    let program = parse(
        "service Root { void ping() }\n\
         service Middle extends Root { void pong() }\n\
         service Leaf extends Middle { void pang() }",
    )
    .unwrap();
    let module = compile("svc", "", &program, &mut NoIncludes, true).unwrap();
    let leaf = module.service("Leaf").unwrap();
    let names: Vec<&str> = leaf.all_functions().iter().map(|f| f.name.as_str()).collect();
    assert!(names.contains(&"ping"));
    assert!(names.contains(&"pong"));
    assert!(names.contains(&"pang"));
}

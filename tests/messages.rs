//! Message-envelope round trips through a compiled service, including the
//! declared-vs-unknown application exception split.

use thriftrw::compiler::{compile, NoIncludes};
use thriftrw::parser::parse;
use thriftrw::protocol::MessageType;
use thriftrw::runtime::{dumps_message, loads_message};
use thriftrw::schema::{Instance, TypeSpec, Value};

fn compile_service(src: &str) -> std::rc::Rc<thriftrw::schema::Module> {
    let program = parse(src).unwrap();
    compile("svc", "", &program, &mut NoIncludes, true).unwrap()
}

#[test]
fn call_and_reply_round_trip_through_a_function_spec() {
    let module = compile_service(
        "exception Boom { 1: required string why }\n\
         service Calc {\n\
           i32 add(1: i32 a, 2: i32 b) throws (1: Boom e)\n\
         }",
    );
    let service = module.service("Calc").unwrap();
    let function = service.function("add").unwrap();

    let args = Instance::new(
        function.request.clone(),
        function.request.construct(vec![Value::I32(2), Value::I32(3)], vec![]).unwrap(),
    );
    let call_bytes = dumps_message("add", MessageType::Call, &args, 1, true).unwrap();
    let decoded_call = loads_message(&service, &call_bytes).unwrap();
    assert_eq!(decoded_call.message_type, MessageType::Call);
    assert_eq!(decoded_call.seqid, 1);
    assert_eq!(decoded_call.body.get_by_name("a"), Some(&Value::I32(2)));

    let response = function.response.clone().unwrap();
    let reply = Instance::new(
        response.clone(),
        response.construct(vec![], vec![("success".to_string(), Value::I32(5))]).unwrap(),
    );
    let reply_bytes = dumps_message("add", MessageType::Reply, &reply, 1, true).unwrap();
    let decoded_reply = loads_message(&service, &reply_bytes).unwrap();
    assert_eq!(decoded_reply.message_type, MessageType::Reply);
    assert_eq!(decoded_reply.body.get_by_name("success"), Some(&Value::I32(5)));
}

#[test]
fn declared_exception_decodes_as_the_response_union() {
    let module = compile_service(
        "exception Boom { 1: required string why }\n\
         service Calc {\n\
           i32 add(1: i32 a, 2: i32 b) throws (1: Boom e)\n\
         }",
    );
    let service = module.service("Calc").unwrap();
    let function = service.function("add").unwrap();
    let response = function.response.clone().unwrap();

    let TypeSpec::Struct(boom_spec) = module.ty("Boom").unwrap() else { panic!("expected exception struct") };
    let boom = Value::Instance(Instance::new(
        boom_spec.clone(),
        boom_spec.construct(vec![Value::String("division by zero".into())], vec![]).unwrap(),
    ));
    let reply = Instance::new(
        response.clone(),
        response.construct(vec![], vec![("e".to_string(), boom)]).unwrap(),
    );

    let bytes = dumps_message("add", MessageType::Exception, &reply, 2, true).unwrap();
    let decoded = loads_message(&service, &bytes).unwrap();
    assert_eq!(decoded.message_type, MessageType::Exception);
    assert!(decoded.body.get_by_name("e").is_some());
}

#[test]
fn undeclared_exception_field_surfaces_as_unknown_exception() {
    let module = compile_service(
        "exception Boom { 1: required string why }\n\
         service Calc { i32 add(1: i32 a, 2: i32 b) throws (1: Boom e) }",
    );
    let service = module.service("Calc").unwrap();

    // Build a *different* union shape directly via the wire layer so the
    // field id (99) can never match a declared throws id.
    let struct_value = thriftrw::wire::StructValue::new(vec![thriftrw::wire::FieldValue::new(
        99,
        thriftrw::wire::TType::Binary,
        thriftrw::wire::WireValue::Binary(b"surprise".to_vec()),
    )]);
    let message = thriftrw::protocol::Message {
        name: "add".to_string(),
        seqid: 3,
        message_type: MessageType::Exception,
        body: struct_value,
    };
    let bytes = thriftrw::protocol::write_message(&message, true);
    let err = loads_message(&service, &bytes).unwrap_err();
    assert!(matches!(
        err,
        thriftrw::error::ThriftError::Protocol(thriftrw::error::ProtocolError::UnknownException { .. })
    ));
}

#[test]
fn reply_decode_for_oneway_function_is_rejected() {
    let module = compile_service("service Fire { oneway void go(1: i32 x) }");
    let service = module.service("Fire").unwrap();
    let function = service.function("go").unwrap();
    assert!(function.response.is_none());

    let args = Instance::new(
        function.request.clone(),
        function.request.construct(vec![Value::I32(1)], vec![]).unwrap(),
    );
    let bytes = dumps_message("go", MessageType::Oneway, &args, 4, true).unwrap();
    let decoded = loads_message(&service, &bytes).unwrap();
    assert_eq!(decoded.message_type, MessageType::Oneway);

    // A Reply for a one-way function has no response spec to decode against.
    let struct_value = thriftrw::wire::StructValue::new(vec![]);
    let fake_reply = thriftrw::protocol::Message {
        name: "go".to_string(),
        seqid: 4,
        message_type: MessageType::Reply,
        body: struct_value,
    };
    let bytes = thriftrw::protocol::write_message(&fake_reply, true);
    let err = loads_message(&service, &bytes).unwrap_err();
    assert!(matches!(
        err,
        thriftrw::error::ThriftError::Protocol(thriftrw::error::ProtocolError::Other { .. })
    ));
}

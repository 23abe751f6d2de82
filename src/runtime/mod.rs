//! Host-facing `dumps`/`loads`: the hand-off between a linked
//! [`TypeSpec`]/[`Value`] pair and Binary Protocol bytes, plus the
//! message-envelope wrappers a generated RPC client/server would use.
//!
//! Nothing here is generated code — callers drive these functions with a
//! `TypeSpec` looked up from a [`Module`] (or a `FunctionSpec` looked up
//! from a [`ServiceSpec`]) rather than a per-type static binding, since
//! this crate does not implement a code generator (see the design notes
//! on `Instance`).

use std::collections::HashSet;

use crate::error::{ProtocolError, ThriftError};
use crate::protocol::{read_message, write_message, BinaryReader, BinaryWriter, Message, MessageType, WriteBuffer};
use crate::schema::{Instance, ServiceSpec, TypeSpec, Value};
use crate::wire::WireValue;

/// Encodes `value` against `spec`: validates it, lowers it to a
/// [`WireValue`], and serializes that with the Binary Protocol.
pub fn dumps(spec: &TypeSpec, value: &Value) -> Result<Vec<u8>, ThriftError> {
    spec.validate(value)?;
    let wire = spec.to_wire(value)?;
    let mut buf = WriteBuffer::new();
    BinaryWriter::new(&mut buf).write(&wire);
    Ok(buf.into_vec())
}

/// Decodes `bytes` against `spec`: reads one wire value tagged with the
/// spec's ttype, then raises it into a host [`Value`].
pub fn loads(spec: &TypeSpec, bytes: &[u8]) -> Result<Value, ThriftError> {
    let mut reader = BinaryReader::new(bytes);
    let wire = reader.read(spec.ttype_code())?;
    spec.from_wire(&wire)
}

/// A decoded message envelope with its body raised into a host
/// [`Instance`] against the function's request or response spec.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub name: String,
    pub seqid: i32,
    pub message_type: MessageType,
    pub body: Instance,
}

/// Encodes `body` (a request or response [`Instance`]) as a message
/// envelope. `strict` selects the versioned framing; pass `true` unless
/// talking to a legacy peer that only understands the old framing.
pub fn dumps_message(
    name: impl Into<String>,
    message_type: MessageType,
    body: &Instance,
    seqid: i32,
    strict: bool,
) -> Result<Vec<u8>, ThriftError> {
    let WireValue::Struct(struct_value) = body.spec.to_wire(body)? else {
        unreachable!("StructSpec::to_wire always returns WireValue::Struct")
    };
    let message = Message {
        name: name.into(),
        seqid,
        message_type,
        body: struct_value,
    };
    Ok(write_message(&message, strict))
}

/// Decodes a message envelope and raises its body against the matching
/// function on `service`, selected by message name and declared
/// direction (`Call`/`Oneway` decode against the request struct,
/// `Reply` against the response union).
///
/// An `Exception` message whose body's field ids don't match any of the
/// response union's declared `throws` fields is not a declared
/// application exception: it's surfaced as
/// [`ProtocolError::UnknownException`] with the raw wire struct
/// preserved, rather than forced through `from_wire` against a spec it
/// doesn't actually match.
pub fn loads_message(service: &ServiceSpec, bytes: &[u8]) -> Result<DecodedMessage, ThriftError> {
    let message = read_message(bytes)?;

    let function = service.function(&message.name).ok_or_else(|| {
        ThriftError::from(ProtocolError::other(format!(
            "service has no function named '{}'",
            message.name
        )))
    })?;

    let spec = match message.message_type {
        MessageType::Call | MessageType::Oneway => function.request.clone(),
        MessageType::Reply => function.response.clone().ok_or_else(|| {
            ThriftError::from(ProtocolError::other(format!(
                "function '{}' is oneway and has no reply",
                function.name
            )))
        })?,
        MessageType::Exception => {
            let response = function.response.clone().ok_or_else(|| {
                ThriftError::from(ProtocolError::other(format!(
                    "function '{}' is oneway and has no reply",
                    function.name
                )))
            })?;

            let declared_throws: HashSet<i16> = response
                .fields()
                .iter()
                .map(|f| f.id)
                .filter(|id| *id != 0)
                .collect();
            let is_declared = message.body.fields().iter().any(|f| declared_throws.contains(&f.id));

            if !is_declared {
                return Err(ThriftError::from(ProtocolError::UnknownException {
                    thrift_response: WireValue::Struct(message.body),
                }));
            }

            response
        }
    };

    let instance = spec.from_wire(&message.body)?;
    Ok(DecodedMessage {
        name: message.name,
        seqid: message.seqid,
        message_type: message.message_type,
        body: instance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, NoIncludes};
    use crate::parser::parse;

    #[test]
    fn round_trips_a_plain_struct_through_dumps_and_loads() {
        let program = parse("struct Point { 1: required i32 x; 2: required i32 y }").unwrap();
        let module = compile("geo", "", &program, &mut NoIncludes, true).unwrap();
        let spec = module.ty("Point").unwrap();
        let TypeSpec::Struct(struct_spec) = spec.clone() else {
            panic!("expected struct");
        };

        let fields = struct_spec
            .construct(vec![Value::I32(3), Value::I32(4)], vec![])
            .unwrap();
        let value = Value::Instance(Instance::new(struct_spec, fields));

        let bytes = dumps(&spec, &value).unwrap();
        let decoded = loads(&spec, &bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn rejects_reply_decode_for_oneway_function() {
        let program = parse(
            "struct Empty {}\nservice Notifier { oneway void notify(1: required Empty e) }",
        )
        .unwrap();
        let module = compile("svc", "", &program, &mut NoIncludes, true).unwrap();
        let service = module.service("Notifier").unwrap();
        let function = service.function("notify").unwrap();
        assert!(function.response.is_none());

        let body_wire = crate::wire::StructValue::new(vec![]);
        let message = Message {
            name: "notify".to_string(),
            seqid: 1,
            message_type: MessageType::Reply,
            body: body_wire,
        };
        let bytes = write_message(&message, true);

        let err = loads_message(&service, &bytes).unwrap_err();
        assert!(matches!(err, ThriftError::Protocol(ProtocolError::Other { .. })));
    }

    #[test]
    fn exception_with_undeclared_fields_surfaces_as_unknown_exception() {
        let program = parse(
            "exception Boom { 1: required string why }\n\
             service Svc { i32 ping() throws (1: Boom boom) }",
        )
        .unwrap();
        let module = compile("svc", "", &program, &mut NoIncludes, true).unwrap();
        let service = module.service("Svc").unwrap();

        let body_wire = crate::wire::StructValue::new(vec![crate::wire::FieldValue::new(
            99,
            crate::wire::TType::I32,
            WireValue::I32(7),
        )]);
        let message = Message {
            name: "ping".to_string(),
            seqid: 1,
            message_type: MessageType::Exception,
            body: body_wire,
        };
        let bytes = write_message(&message, true);

        let err = loads_message(&service, &bytes).unwrap_err();
        assert!(matches!(
            err,
            ThriftError::Protocol(ProtocolError::UnknownException { .. })
        ));
    }
}

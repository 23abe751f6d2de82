//! Message envelope framing: the strict and non-strict forms of a Thrift
//! Binary Protocol call/reply/exception/oneway wrapper around a struct.

use crate::error::ProtocolError;
use crate::wire::{StructValue, WireValue};

use super::binary::{BinaryReader, BinaryWriter};
use super::buffer::WriteBuffer;

const VERSION_1: [u8; 2] = [0x80, 0x01];

/// The four message kinds a Binary Protocol envelope can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageType {
    fn from_i16(value: i16) -> Result<Self, ProtocolError> {
        Ok(match value {
            1 => MessageType::Call,
            2 => MessageType::Reply,
            3 => MessageType::Exception,
            4 => MessageType::Oneway,
            other => {
                return Err(ProtocolError::other(format!(
                    "unknown message type {other}"
                )))
            }
        })
    }
}

/// A decoded message envelope: the method name, sequence id, message
/// kind, and the body struct (a request or a response union).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub seqid: i32,
    pub message_type: MessageType,
    pub body: StructValue,
}

/// Encodes `message` as a Binary Protocol envelope. Strict framing is used
/// unless `strict` is false, matching the crate-wide default of strict
/// envelopes described for the runtime serializer.
pub fn write_message(message: &Message, strict: bool) -> Vec<u8> {
    let mut buf = WriteBuffer::new();
    let name_bytes = message.name.as_bytes();

    if strict {
        buf.write_bytes(&VERSION_1);
        buf.write_bytes(&(message.message_type as i16).to_be_bytes());
    }

    buf.write_bytes(&(name_bytes.len() as i32).to_be_bytes());
    buf.write_bytes(name_bytes);

    if !strict {
        buf.write_bytes(&[message.message_type as i16 as i8 as u8]);
    }

    buf.write_bytes(&message.seqid.to_be_bytes());

    let mut writer = BinaryWriter::new(&mut buf);
    writer.write(&WireValue::Struct(message.body.clone()));

    buf.into_vec()
}

/// Decodes a Binary Protocol envelope, auto-detecting strict vs.
/// non-strict framing from the high bit of the first byte.
pub fn read_message(bytes: &[u8]) -> Result<Message, ProtocolError> {
    if bytes.len() < 4 {
        return Err(ProtocolError::EndOfInput {
            expected: 4,
            observed: bytes.len(),
        });
    }

    if bytes[0] & 0x80 != 0 {
        read_strict(bytes)
    } else {
        read_non_strict(bytes)
    }
}

fn read_strict(bytes: &[u8]) -> Result<Message, ProtocolError> {
    if bytes[0..2] != VERSION_1 {
        let version = i16::from_be_bytes([bytes[0], bytes[1]]);
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    let message_type = MessageType::from_i16(i16::from_be_bytes([bytes[2], bytes[3]]))?;

    let mut reader = BinaryReader::new(&bytes[4..]);
    let name = read_name(&mut reader)?;
    let seqid = read_i32(&mut reader)?;
    let body = read_body(&mut reader)?;

    Ok(Message {
        name,
        seqid,
        message_type,
        body,
    })
}

fn read_non_strict(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let mut reader = BinaryReader::new(bytes);
    let name = read_name(&mut reader)?;
    let message_type = MessageType::from_i16(read_i8(&mut reader)? as i16)?;
    let seqid = read_i32(&mut reader)?;
    let body = read_body(&mut reader)?;

    Ok(Message {
        name,
        seqid,
        message_type,
        body,
    })
}

fn read_name(reader: &mut BinaryReader<'_>) -> Result<String, ProtocolError> {
    let WireValue::Binary(bytes) = reader.read_binary()? else {
        unreachable!("read_binary always returns WireValue::Binary")
    };
    Ok(std::str::from_utf8(&bytes)?.to_string())
}

fn read_i8(reader: &mut BinaryReader<'_>) -> Result<i8, ProtocolError> {
    let WireValue::Byte(b) = reader.read_byte()? else {
        unreachable!("read_byte always returns WireValue::Byte")
    };
    Ok(b)
}

fn read_i32(reader: &mut BinaryReader<'_>) -> Result<i32, ProtocolError> {
    let WireValue::I32(v) = reader.read_i32()? else {
        unreachable!("read_i32 always returns WireValue::I32")
    };
    Ok(v)
}

fn read_body(reader: &mut BinaryReader<'_>) -> Result<StructValue, ProtocolError> {
    let WireValue::Struct(s) = reader.read_struct()? else {
        unreachable!("read_struct always returns WireValue::Struct")
    };
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_strict_call_with_empty_body() {
        let message = Message {
            name: "getFoo".to_string(),
            seqid: 42,
            message_type: MessageType::Call,
            body: StructValue::new(vec![]),
        };
        let bytes = write_message(&message, true);
        assert_eq!(
            bytes,
            vec![
                0x80, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x67, 0x65, 0x74, 0x46, 0x6F,
                0x6F, 0x00, 0x00, 0x00, 0x2A, 0x00,
            ]
        );
    }

    #[test]
    fn round_trips_strict_envelope() {
        let message = Message {
            name: "ping".to_string(),
            seqid: 7,
            message_type: MessageType::Reply,
            body: StructValue::new(vec![]),
        };
        let bytes = write_message(&message, true);
        let decoded = read_message(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn round_trips_non_strict_envelope() {
        let message = Message {
            name: "ping".to_string(),
            seqid: 7,
            message_type: MessageType::Call,
            body: StructValue::new(vec![]),
        };
        let bytes = write_message(&message, false);
        assert_eq!(bytes[0] & 0x80, 0);
        let decoded = read_message(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = write_message(
            &Message {
                name: "x".to_string(),
                seqid: 0,
                message_type: MessageType::Call,
                body: StructValue::new(vec![]),
            },
            true,
        );
        bytes[1] = 0x02; // corrupt version
        let err = read_message(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedVersion(_)));
    }
}

//! The Thrift Binary Protocol codec: buffers, the reader/writer pair, and
//! message envelope framing.

mod binary;
mod buffer;
mod message;

pub use binary::{BinaryReader, BinaryWriter};
pub use buffer::{ReadBuffer, WriteBuffer};
pub use message::{read_message, write_message, Message, MessageType};

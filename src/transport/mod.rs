//! Transport: record framing and TCP bootstrap

pub mod codec;
pub mod connection;
pub mod message;

pub use codec::{decode, encode, ActionCodec, MAX_RECORD_LEN};
pub use connection::{accept_one, connect, listen, RecordStream};
pub use message::WireRecord;

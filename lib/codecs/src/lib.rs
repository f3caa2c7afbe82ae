//! Building, encoding and chunking of GELF (Graylog Extended Log Format)
//! messages, ready to be handed to a datagram transport.

#![deny(missing_docs)]

pub mod encoding;
pub mod gelf;
pub mod message;

pub use encoding::{
    Chunking, ChunkingError, Compression, EncodingError, GelfChunker, GelfEncoder,
    GelfSerializer, MessageIdGenerator, RandomMessageId,
};
pub use gelf::{Level, StandardField, VALID_FIELD_REGEX, gelf_fields};
pub use message::{
    BuildContext, Clock, FieldValue, Message, MessageBuilder, MessageDefaults, SystemClock,
    ValidationError,
};

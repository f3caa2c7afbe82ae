//! Emits GELF log messages to a collector over UDP.
//!
//! [`GelfSinkConfig`] describes where and how messages are sent; [`GelfSink`] builds,
//! encodes, chunks and writes them.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;
pub mod sinks;

pub use gelf_codecs::{
    BuildContext, Chunking, ChunkingError, Clock, Compression, EncodingError,
    FieldValue, GelfChunker, GelfEncoder, Level, Message, MessageBuilder, MessageDefaults,
    MessageIdGenerator, RandomMessageId, SystemClock, ValidationError, gelf_fields,
};
pub use sinks::{
    BuildError,
    gelf::{GelfError, GelfSink, GelfSinkConfig},
    util::{HostAndPort, NetError},
};

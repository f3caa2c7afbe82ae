//! A collection of formats that can be used to chunk payloads into multiple datagrams.

mod gelf;

use bytes::Bytes;
use snafu::Snafu;

pub use self::gelf::{
    ChunkHeader, GELF_CHUNK_HEADERS_LENGTH, GELF_MAGIC_BYTES, GELF_MESSAGE_ID_LENGTH, GelfChunker,
};

/// An error that occurred while chunking a payload.
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum ChunkingError {
    /// The payload needs more chunks than allowed.
    #[snafu(display("Too many chunks to generate for GELF: {chunk_count}, max: {max_chunks}."))]
    TooManyChunks {
        /// Chunks the payload would need.
        chunk_count: usize,
        /// Configured maximum.
        max_chunks: usize,
    },

    /// The datagram size leaves no room for payload.
    #[snafu(display("Maximum datagram size must be at least 1 byte, got {size}."))]
    InvalidDatagramSize {
        /// The rejected size.
        size: usize,
    },

    /// The chunk count cannot be represented in the chunk header.
    #[snafu(display("Maximum chunk count must be between 1 and {}, got {max_chunks}.", u16::MAX))]
    InvalidMaxChunks {
        /// The rejected count.
        max_chunks: usize,
    },
}

/// For chunking.
pub trait Chunking {
    /// Chunks the input into frames.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be represented within the chunking limits. No frames are
    /// produced in that case.
    fn chunk(&self, bytes: Bytes) -> Result<Vec<Bytes>, ChunkingError>;
}

/// Source of the identifier shared by every chunk of one message.
pub trait MessageIdGenerator: Send + Sync {
    /// Returns a fresh message identifier.
    fn next_id(&self) -> u64;
}

/// Random 64-bit identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomMessageId;

impl MessageIdGenerator for RandomMessageId {
    fn next_id(&self) -> u64 {
        rand::random()
    }
}

impl<F> MessageIdGenerator for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn next_id(&self) -> u64 {
        self()
    }
}

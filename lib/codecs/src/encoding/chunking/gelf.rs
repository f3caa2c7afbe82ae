use std::{fmt, sync::Arc};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use super::{Chunking, ChunkingError, MessageIdGenerator, RandomMessageId};

/// Width of the message identifier in the chunk header.
pub const GELF_MESSAGE_ID_LENGTH: usize = 8;
/// Magic bytes (2) + message id (8) + sequence number (2) + sequence count (2).
pub const GELF_CHUNK_HEADERS_LENGTH: usize = 2 + GELF_MESSAGE_ID_LENGTH + 2 + 2;
/// Marks a datagram as one chunk of a larger message.
pub const GELF_MAGIC_BYTES: [u8; 2] = [0x1e, 0x0f];

/// The framing written in front of every chunk. All integers are big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Identifier shared by all chunks of one message.
    pub message_id: u64,
    /// Zero-based position of the chunk.
    pub sequence_number: u16,
    /// Total number of chunks of the message.
    pub sequence_count: u16,
}

impl ChunkHeader {
    /// Writes the header, magic bytes included.
    pub fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_slice(&GELF_MAGIC_BYTES);
        buffer.put_u64(self.message_id);
        buffer.put_u16(self.sequence_number);
        buffer.put_u16(self.sequence_count);
    }

    /// Splits a chunked datagram into its header and payload slice. Returns `None` if the
    /// datagram does not start with chunk framing.
    pub fn parse(datagram: &[u8]) -> Option<(ChunkHeader, &[u8])> {
        if datagram.len() < GELF_CHUNK_HEADERS_LENGTH || datagram[..2] != GELF_MAGIC_BYTES {
            return None;
        }
        let mut header = &datagram[2..GELF_CHUNK_HEADERS_LENGTH];
        let parsed = ChunkHeader {
            message_id: header.get_u64(),
            sequence_number: header.get_u16(),
            sequence_count: header.get_u16(),
        };
        Some((parsed, &datagram[GELF_CHUNK_HEADERS_LENGTH..]))
    }
}

/// Chunks with GELF native chunking format, as documented from the [source][source].
///
/// Payloads up to `max_datagram_size` bytes are passed through untouched. Larger payloads are
/// cut into slices of `max_datagram_size` bytes, each prefixed with a [`ChunkHeader`].
///
/// [source]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html#chunking
#[derive(Clone)]
pub struct GelfChunker {
    max_datagram_size: usize,
    max_chunks: usize,
    message_ids: Arc<dyn MessageIdGenerator>,
}

impl GelfChunker {
    /// Payload bytes carried by one datagram unless configured otherwise.
    pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 8192;
    /// Chunks per message unless configured otherwise.
    pub const DEFAULT_MAX_CHUNKS: usize = 128;

    /// Creates a chunker using random message identifiers.
    ///
    /// # Errors
    ///
    /// `max_datagram_size` must be at least 1 and `max_chunks` must fit the 2-byte
    /// sequence count.
    pub fn new(max_datagram_size: usize, max_chunks: usize) -> Result<Self, ChunkingError> {
        if max_datagram_size == 0 {
            return Err(ChunkingError::InvalidDatagramSize {
                size: max_datagram_size,
            });
        }
        if max_chunks == 0 || max_chunks > usize::from(u16::MAX) {
            return Err(ChunkingError::InvalidMaxChunks { max_chunks });
        }
        Ok(Self {
            max_datagram_size,
            max_chunks,
            message_ids: Arc::new(RandomMessageId),
        })
    }

    /// Replaces the message identifier source.
    pub fn with_message_ids(mut self, message_ids: impl MessageIdGenerator + 'static) -> Self {
        self.message_ids = Arc::new(message_ids);
        self
    }

    /// Largest payload slice carried by one datagram.
    pub const fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    /// Largest number of chunks a message may be split into.
    pub const fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Number of chunks a payload of `len` bytes needs; 1 when it is sent whole.
    pub const fn chunk_count(&self, len: usize) -> usize {
        if len <= self.max_datagram_size {
            1
        } else {
            len.div_ceil(self.max_datagram_size)
        }
    }
}

impl Default for GelfChunker {
    fn default() -> Self {
        Self {
            max_datagram_size: Self::DEFAULT_MAX_DATAGRAM_SIZE,
            max_chunks: Self::DEFAULT_MAX_CHUNKS,
            message_ids: Arc::new(RandomMessageId),
        }
    }
}

impl fmt::Debug for GelfChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GelfChunker")
            .field("max_datagram_size", &self.max_datagram_size)
            .field("max_chunks", &self.max_chunks)
            .finish_non_exhaustive()
    }
}

impl Chunking for GelfChunker {
    fn chunk(&self, bytes: Bytes) -> Result<Vec<Bytes>, ChunkingError> {
        if bytes.len() <= self.max_datagram_size {
            return Ok(vec![bytes]);
        }

        let chunk_count = self.chunk_count(bytes.len());
        let sequence_count = match u16::try_from(chunk_count) {
            Ok(count) if chunk_count <= self.max_chunks => count,
            _ => {
                return Err(ChunkingError::TooManyChunks {
                    chunk_count,
                    max_chunks: self.max_chunks,
                });
            }
        };

        let message_id = self.message_ids.next_id();

        trace!(
            message_id = message_id,
            chunk_count = chunk_count,
            chunk_size = self.max_datagram_size,
            "Generating chunks for GELF."
        );

        // Split into chunks and add headers to each slice.
        // Zip with the sequence range to determine sequence number.
        let chunks = (0..sequence_count)
            .zip(bytes.chunks(self.max_datagram_size))
            .map(|(sequence_number, chunk)| {
                let mut framed = BytesMut::with_capacity(GELF_CHUNK_HEADERS_LENGTH + chunk.len());
                ChunkHeader {
                    message_id,
                    sequence_number,
                    sequence_count,
                }
                .encode(&mut framed);
                framed.put_slice(chunk);
                framed.freeze()
            })
            .collect();
        Ok(chunks)
    }
}

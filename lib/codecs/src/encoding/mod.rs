//! A collection of support structures that are used in the process of encoding
//! GELF messages into datagram payloads.

pub mod chunking;
pub mod compression;
pub mod format;

use bytes::{Bytes, BytesMut};
use snafu::Snafu;

pub use chunking::{
    ChunkHeader, Chunking, ChunkingError, GelfChunker, MessageIdGenerator,
    RandomMessageId,
};
pub use compression::Compression;
pub use format::GelfSerializer;

use crate::message::Message;

/// An error that occurred while turning a message into a compressed payload.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EncodingError {
    /// JSON has no representation for NaN or infinite numbers.
    #[snafu(display("Field {field} holds a non-finite number, which cannot be encoded as JSON."))]
    NonFiniteNumber {
        /// Name of the offending field.
        field: String,
    },

    /// The message could not be serialized.
    #[snafu(display("Failed to serialize GELF message: {source}"))]
    Serialize {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The serialized message could not be compressed.
    #[snafu(display("Failed to compress GELF payload: {source}"))]
    Compress {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl From<std::io::Error> for EncodingError {
    fn from(source: std::io::Error) -> Self {
        Self::Compress { source }
    }
}

/// Serializes a message to JSON and compresses the result into one opaque buffer.
#[derive(Clone, Debug, Default)]
pub struct GelfEncoder {
    serializer: GelfSerializer,
    compression: Compression,
}

impl GelfEncoder {
    /// Creates a new `GelfEncoder`.
    pub const fn new(compression: Compression) -> Self {
        Self {
            serializer: GelfSerializer,
            compression,
        }
    }

    /// The compression applied after serialization.
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Encodes the full field map of `message`.
    ///
    /// # Errors
    ///
    /// Fails if the message cannot be represented as JSON or compression fails.
    pub fn encode(&self, message: &Message) -> Result<Bytes, EncodingError> {
        let mut buffer = BytesMut::with_capacity(512);
        self.serializer.write_to(message, &mut buffer)?;
        Ok(self.compression.compress(&buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::ZlibDecoder;

    use super::*;
    use crate::message::{BuildContext, MessageBuilder, MessageDefaults};

    fn message(fields: &[(&str, f64)]) -> Message {
        MessageBuilder::new(BuildContext::new("example.org"), MessageDefaults::default())
            .create(fields.iter().copied())
            .unwrap()
    }

    #[test]
    fn encode_is_compressed_json() {
        let message = message(&[("elapsed", 1.5)]);
        let encoded = GelfEncoder::default().encode(&message).unwrap();

        let mut json = String::new();
        ZlibDecoder::new(&encoded[..])
            .read_to_string(&mut json)
            .unwrap();
        assert_eq!(json, serde_json::to_string(&message).unwrap());
    }

    #[test]
    fn non_finite_numbers_fail() {
        let message = message(&[("ratio", f64::NAN)]);
        let error = GelfEncoder::default().encode(&message).unwrap_err();
        assert!(matches!(error, EncodingError::NonFiniteNumber { ref field } if field == "_ratio"));
    }
}

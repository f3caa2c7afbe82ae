use std::time::Duration;

use bytes::Bytes;
use gelf_codecs::{
    BuildContext, Chunking, ChunkingError, FieldValue, GelfChunker, GelfEncoder, Message,
    MessageBuilder, MessageIdGenerator,
};
use snafu::ResultExt;

use super::{GelfError, GelfSinkConfig, TransportSnafu};
use crate::{
    internal_events::{GelfEncoderError, GelfMessageSent, GelfMessageTooLarge, GelfValidationError},
    sinks::{
        BuildError,
        util::{Connector, HostAndPort, UdpConnector, send_datagrams, send_datagrams_async},
    },
};

/// Sends GELF messages, opening one socket per message.
///
/// Holds only immutable configuration, so a single sink can be shared between threads.
#[derive(Clone, Debug)]
pub struct GelfSink<C = UdpConnector> {
    builder: MessageBuilder,
    encoder: GelfEncoder,
    chunker: GelfChunker,
    connector: C,
}

impl GelfSink {
    pub fn new(config: &GelfSinkConfig) -> Result<Self, BuildError> {
        let address = config
            .address
            .parse::<HostAndPort>()
            .map_err(|reason| BuildError::InvalidAddress { reason })?;
        let chunker = GelfChunker::new(config.max_datagram_size, config.max_chunks)
            .map_err(|source| BuildError::InvalidChunking { source })?;
        let connector = UdpConnector::new(address)
            .with_send_buffer_size(config.send_buffer_size)
            .with_write_timeout(config.write_timeout_secs.map(Duration::from_secs));

        Ok(Self {
            builder: MessageBuilder::new(
                BuildContext::from_environment(None),
                config.message_defaults(),
            ),
            encoder: GelfEncoder::new(config.compression),
            chunker,
            connector,
        })
    }

    /// Like [`GelfSink::send`], awaiting each write on the tokio runtime instead of blocking.
    pub async fn send_async(&self, message: &Message) -> Result<(), GelfError> {
        let datagrams = self.encode(message)?;
        send_datagrams_async(&self.connector, &datagrams)
            .await
            .context(TransportSnafu)?;
        emit_sent(&datagrams);
        Ok(())
    }
}

impl<C> GelfSink<C> {
    /// Replaces the transport, keeping every other setting.
    pub fn with_connector<T: Connector>(self, connector: T) -> GelfSink<T> {
        GelfSink {
            builder: self.builder,
            encoder: self.encoder,
            chunker: self.chunker,
            connector,
        }
    }

    pub fn with_message_ids(mut self, message_ids: impl MessageIdGenerator + 'static) -> Self {
        self.chunker = self.chunker.with_message_ids(message_ids);
        self
    }

    /// Replaces the host, file and clock written into new messages.
    pub fn with_context(mut self, context: BuildContext) -> Self {
        self.builder = MessageBuilder::new(context, self.builder.defaults().clone());
        self
    }

    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Builds a message with the configured defaults.
    pub fn create<I, K, V>(&self, fields: I) -> Result<Message, GelfError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let message = self
            .builder
            .create(fields)
            .inspect_err(|error| emit!(GelfValidationError { error }))?;
        Ok(message)
    }

    /// Serializes, compresses and chunks `message` into the datagrams to write.
    pub fn encode(&self, message: &Message) -> Result<Vec<Bytes>, GelfError> {
        let payload = self
            .encoder
            .encode(message)
            .inspect_err(|error| emit!(GelfEncoderError { error }))?;
        let byte_size = payload.len();

        self.chunker.chunk(payload).map_err(|error| {
            let (chunk_count, max_chunks) = match error {
                ChunkingError::TooManyChunks {
                    chunk_count,
                    max_chunks,
                } => (chunk_count, max_chunks),
                _ => (
                    self.chunker.chunk_count(byte_size),
                    self.chunker.max_chunks(),
                ),
            };
            emit!(GelfMessageTooLarge {
                byte_size,
                chunk_count,
                max_chunks,
            });
            GelfError::MessageTooLarge {
                chunk_count,
                max_chunks,
            }
        })
    }
}

impl<C: Connector> GelfSink<C> {
    /// Encodes `message` and writes its datagrams in order on a fresh socket.
    ///
    /// Nothing is written when the message fails to encode or needs too many chunks. A failed
    /// write stops the send; later datagrams of the message are not attempted.
    pub fn send(&self, message: &Message) -> Result<(), GelfError> {
        let datagrams = self.encode(message)?;
        send_datagrams(&self.connector, &datagrams).context(TransportSnafu)?;
        emit_sent(&datagrams);
        Ok(())
    }

    /// Creates a message from `fields` and sends it.
    pub fn log<I, K, V>(&self, fields: I) -> Result<(), GelfError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let message = self.create(fields)?;
        self.send(&message)
    }
}

fn emit_sent(datagrams: &[Bytes]) {
    emit!(GelfMessageSent {
        byte_size: datagrams.iter().map(Bytes::len).sum(),
        chunk_count: datagrams.len(),
    });
}

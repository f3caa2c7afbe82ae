use gelf_codecs::{Compression, GelfChunker, Level, MessageDefaults};
use serde::{Deserialize, Serialize};

use super::GelfSink;
use crate::sinks::BuildError;

/// Configuration for the `gelf` sink.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GelfSinkConfig {
    /// The address of the GELF collector, in `host:port` form.
    pub address: String,

    /// Payload bytes carried by one datagram. Larger payloads are chunked.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,

    /// Most chunks a single message may be split into.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Level used when the caller supplies none.
    #[serde(default)]
    pub default_level: Level,

    /// Facility used when the caller supplies none.
    #[serde(default = "default_facility")]
    pub default_facility: String,

    /// Compression applied to the JSON payload before chunking.
    #[serde(default)]
    pub compression: Compression,

    /// The size of the socket's send buffer.
    ///
    /// If set, the value of the setting is passed via the `SO_SNDBUF` option.
    #[serde(default)]
    pub send_buffer_size: Option<usize>,

    /// Upper bound, in seconds, for a single datagram write.
    #[serde(default)]
    pub write_timeout_secs: Option<u64>,
}

const fn default_max_datagram_size() -> usize {
    GelfChunker::DEFAULT_MAX_DATAGRAM_SIZE
}

const fn default_max_chunks() -> usize {
    GelfChunker::DEFAULT_MAX_CHUNKS
}

fn default_facility() -> String {
    MessageDefaults::DEFAULT_FACILITY.to_owned()
}

impl GelfSinkConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            max_datagram_size: default_max_datagram_size(),
            max_chunks: default_max_chunks(),
            default_level: Level::default(),
            default_facility: default_facility(),
            compression: Compression::default(),
            send_buffer_size: None,
            write_timeout_secs: None,
        }
    }

    pub fn message_defaults(&self) -> MessageDefaults {
        MessageDefaults {
            level: self.default_level,
            facility: self.default_facility.clone(),
        }
    }

    pub fn build(&self) -> Result<GelfSink, BuildError> {
        GelfSink::new(self)
    }
}

//! The GELF sink.
//!
//! Builds GELF messages from caller supplied fields, encodes and chunks them, and writes the
//! resulting datagrams to a collector over UDP.

use gelf_codecs::{EncodingError, ValidationError};
use snafu::Snafu;

use crate::sinks::util::NetError;

mod config;
mod sink;


pub use config::GelfSinkConfig;
pub use sink::GelfSink;

/// Any failure of the build, encode, chunk and send pipeline.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GelfError {
    #[snafu(display("Invalid GELF message: {}", source), context(false))]
    Validation { source: ValidationError },

    #[snafu(display("Failed to encode GELF message: {}", source), context(false))]
    Encoding { source: EncodingError },

    #[snafu(display(
        "GELF message needs {} chunks, more than the allowed {}.",
        chunk_count,
        max_chunks
    ))]
    MessageTooLarge {
        chunk_count: usize,
        max_chunks: usize,
    },

    #[snafu(display("Failed to send GELF message: {}", source))]
    Transport { source: NetError },
}

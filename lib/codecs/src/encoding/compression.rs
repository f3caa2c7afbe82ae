//! Compression of serialized GELF payloads.

use std::io::{self, Write};

use bytes::Bytes;
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

/// Compression applied to the serialized message. GELF receivers detect all three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// [Zlib][zlib] stream.
    ///
    /// [zlib]: https://www.zlib.net/
    #[default]
    Zlib,

    /// [Gzip][gzip] stream.
    ///
    /// [gzip]: https://www.gzip.org/
    Gzip,

    /// No compression.
    None,
}

enum Writer {
    Plain(Vec<u8>),
    Zlib(ZlibEncoder<Vec<u8>>),
    Gzip(GzEncoder<Vec<u8>>),
}

impl Writer {
    fn new(compression: Compression, capacity: usize) -> Self {
        let buffer = Vec::with_capacity(capacity);
        let level = flate2::Compression::default();
        match compression {
            Compression::None => Writer::Plain(buffer),
            Compression::Zlib => Writer::Zlib(ZlibEncoder::new(buffer, level)),
            Compression::Gzip => Writer::Gzip(GzEncoder::new(buffer, level)),
        }
    }

    fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Writer::Plain(buffer) => Ok(buffer),
            Writer::Zlib(writer) => writer.finish(),
            Writer::Gzip(writer) => writer.finish(),
        }
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Plain(inner) => inner.write(buf),
            Writer::Zlib(writer) => writer.write(buf),
            Writer::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Plain(_) => Ok(()),
            Writer::Zlib(writer) => writer.flush(),
            Writer::Gzip(writer) => writer.flush(),
        }
    }
}

impl Compression {
    /// Compresses `input` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised by the encoder, if any.
    pub fn compress(self, input: &[u8]) -> io::Result<Bytes> {
        let mut writer = Writer::new(self, input.len() / 2 + 64);
        writer.write_all(input)?;
        writer.finish().map(Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::{GzDecoder, ZlibDecoder};
    use rstest::rstest;

    use super::*;

    const INPUT: &[u8] = br#"{"version":"1.1","host":"example.org","short_message":"hello"}"#;

    fn decompress(compression: Compression, bytes: &[u8]) -> Vec<u8> {
        let mut output = Vec::new();
        match compression {
            Compression::None => output.extend_from_slice(bytes),
            Compression::Zlib => {
                ZlibDecoder::new(bytes).read_to_end(&mut output).unwrap();
            }
            Compression::Gzip => {
                GzDecoder::new(bytes).read_to_end(&mut output).unwrap();
            }
        }
        output
    }

    #[rstest]
    #[case(Compression::Zlib, &[0x78])]
    #[case(Compression::Gzip, &[0x1f, 0x8b])]
    #[case(Compression::None, b"{")]
    fn compressed_payload_is_detectable(#[case] compression: Compression, #[case] magic: &[u8]) {
        let compressed = compression.compress(INPUT).unwrap();
        assert!(compressed.starts_with(magic));
        assert_eq!(decompress(compression, &compressed), INPUT);
    }

    #[test]
    fn deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Config {
            compression: Compression,
        }
        let config: Config = serde_json::from_str(r#"{"compression":"gzip"}"#).unwrap();
        assert_eq!(config.compression, Compression::Gzip);
    }
}

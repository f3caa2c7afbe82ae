use snafu::Snafu;

pub mod gelf;
pub mod util;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BuildError {
    #[snafu(display("Address is invalid: {}", reason))]
    InvalidAddress { reason: String },
    #[snafu(display("Invalid chunking settings: {}", source))]
    InvalidChunking {
        source: gelf_codecs::ChunkingError,
    },
}

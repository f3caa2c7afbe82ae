//! Formats used to serialize messages into bytes.

mod gelf;

pub use self::gelf::GelfSerializer;

use bytes::{BufMut, BytesMut};
use snafu::ResultExt;
use tokio_util::codec::Encoder;

use crate::encoding::{EncodingError, SerializeSnafu};
use crate::message::{FieldValue, Message};

/// Serializer that converts a [`Message`] to bytes using the GELF JSON format.
/// Format: <https://docs.graylog.org/docs/gelf>
#[derive(Clone, Copy, Debug, Default)]
pub struct GelfSerializer;

impl GelfSerializer {
    /// Encode the message and represent it as a JSON value.
    ///
    /// # Errors
    ///
    /// Fails if a field cannot be represented as JSON.
    pub fn to_json_value(&self, message: &Message) -> Result<serde_json::Value, EncodingError> {
        check_representable(message)?;
        serde_json::to_value(message).context(SerializeSnafu)
    }

    /// Appends the JSON encoding of the full field map to `buffer`.
    ///
    /// # Errors
    ///
    /// Fails if a field cannot be represented as JSON.
    pub fn write_to(&self, message: &Message, buffer: &mut BytesMut) -> Result<(), EncodingError> {
        check_representable(message)?;
        serde_json::to_writer(buffer.writer(), message).context(SerializeSnafu)
    }
}

/// `serde_json` silently writes `null` for NaN and infinities, which would lose data.
fn check_representable(message: &Message) -> Result<(), EncodingError> {
    match message
        .fields()
        .iter()
        .find(|(_, value)| matches!(value, FieldValue::Float(float) if !float.is_finite()))
    {
        Some((field, _)) => Err(EncodingError::NonFiniteNumber {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

impl Encoder<&Message> for GelfSerializer {
    type Error = EncodingError;

    fn encode(&mut self, message: &Message, buffer: &mut BytesMut) -> Result<(), Self::Error> {
        self.write_to(message, buffer)
    }
}

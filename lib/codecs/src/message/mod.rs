//! The GELF message model and the builder that populates it.

mod context;
mod value;

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;
use snafu::Snafu;

pub use self::context::{BuildContext, Clock, MessageDefaults, SystemClock};
pub use self::value::FieldValue;
use crate::gelf::{
    FORBIDDEN_ADDITIONAL_FIELDS, Level, StandardField, VALID_FIELD_REGEX, gelf_fields::*,
    is_reserved,
};

/// A message field could not be written.
#[derive(Clone, Debug, PartialEq, Snafu)]
pub enum ValidationError {
    /// The field is reserved to the message builder.
    #[snafu(display("Setting value of '{field}' is not permitted."))]
    ReservedField {
        /// Name of the rejected field.
        field: String,
    },

    /// The level is outside of the syslog range.
    #[snafu(display("The level \"{value}\" is not valid."))]
    InvalidLevel {
        /// The rejected value.
        value: FieldValue,
    },

    /// The additional field would shadow a storage key.
    #[snafu(display("Additional fields may not be called \"_id\" or \"_key\", got '{field}'."))]
    ForbiddenAdditionalField {
        /// Normalized name of the rejected field.
        field: String,
    },

    /// The field name contains characters GELF does not allow.
    #[snafu(display(
        "Field name '{field}' must be non-empty and only contain word characters, periods and dashes."
    ))]
    InvalidFieldName {
        /// Name of the rejected field.
        field: String,
    },

    /// The value has the wrong type for a standard field.
    #[snafu(display("Field '{field}' should be {expected}, got {actual}."))]
    InvalidType {
        /// Name of the rejected field.
        field: &'static str,
        /// The expected type.
        expected: &'static str,
        /// The type that was supplied.
        actual: &'static str,
    },
}

/// A GELF message: an insertion-ordered map of field names to scalar values.
///
/// Messages are only created through [`MessageBuilder::create`], which writes the reserved
/// fields. Every public mutation afterwards goes through the same validation rules, and a
/// rejected mutation leaves the message untouched.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Message {
    fields: IndexMap<String, FieldValue>,
}

impl Message {
    /// Returns the value of a field by its wire name.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// All fields, in insertion order.
    pub const fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    /// Consumes the message, returning its fields.
    pub fn into_fields(self) -> IndexMap<String, FieldValue> {
        self.fields
    }

    /// Sets a standard or additional field.
    ///
    /// # Errors
    ///
    /// Fails if the field is reserved, the value does not satisfy the standard field's rule,
    /// or the additional field name is invalid.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&mut Self, ValidationError> {
        let (key, value) = validate_field(key, value.into())?;
        self.fields.insert(key.into_owned(), value);
        Ok(self)
    }

    /// Applies a batch of fields. Either every field is applied or, on the first invalid
    /// field, none is.
    ///
    /// # Errors
    ///
    /// Returns the error of the first invalid field.
    pub fn try_extend<I, K, V>(&mut self, fields: I) -> Result<&mut Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut staged = Vec::new();
        for (key, value) in fields {
            let (key, value) = validate_field(key.as_ref(), value.into())?;
            staged.push((key.into_owned(), value));
        }
        self.fields.extend(staged);
        Ok(self)
    }

    /// Removes an optional field, normalizing additional field names.
    ///
    /// # Errors
    ///
    /// Reserved fields cannot be removed.
    pub fn remove(&mut self, key: &str) -> Result<Option<FieldValue>, ValidationError> {
        if is_reserved(key) {
            return Err(ValidationError::ReservedField {
                field: key.to_owned(),
            });
        }
        let key = match StandardField::from_name(key) {
            Some(field) => Cow::Borrowed(field.as_str()),
            None => additional_key(key),
        };
        Ok(self.fields.shift_remove(key.as_ref()))
    }

    /// The GELF format version.
    pub fn version(&self) -> Option<&str> {
        self.get(VERSION).and_then(FieldValue::as_str)
    }

    /// The originating host label.
    pub fn host(&self) -> Option<&str> {
        self.get(HOST).and_then(FieldValue::as_str)
    }

    /// Seconds since the UNIX epoch.
    pub fn timestamp(&self) -> Option<f64> {
        self.get(TIMESTAMP).and_then(FieldValue::as_float)
    }

    /// The severity level.
    pub fn level(&self) -> Option<Level> {
        self.get(LEVEL)
            .and_then(FieldValue::as_integer)
            .and_then(|level| Level::try_from(level).ok())
    }

    /// The short descriptive message.
    pub fn short_message(&self) -> Option<&str> {
        self.get(SHORT_MESSAGE).and_then(FieldValue::as_str)
    }

    /// The facility.
    pub fn facility(&self) -> Option<&FieldValue> {
        self.get(FACILITY)
    }

    /// Sets the short descriptive message.
    pub fn set_short_message(&mut self, value: impl Into<String>) -> &mut Self {
        self.insert(SHORT_MESSAGE, FieldValue::String(value.into()))
    }

    /// Sets the long message, e.g. a backtrace.
    pub fn set_full_message(&mut self, value: impl Into<String>) -> &mut Self {
        self.insert(FULL_MESSAGE, FieldValue::String(value.into()))
    }

    /// Sets the severity level.
    pub fn set_level(&mut self, level: Level) -> &mut Self {
        self.insert(LEVEL, level.into())
    }

    /// Sets the facility.
    pub fn set_facility(&mut self, value: impl Into<String>) -> &mut Self {
        self.insert(FACILITY, FieldValue::String(value.into()))
    }

    /// Sets the line that caused the event.
    pub fn set_line(&mut self, line: i64) -> &mut Self {
        self.insert(LINE, FieldValue::Integer(line))
    }

    /// Sets the file that caused the event.
    pub fn set_file(&mut self, value: impl Into<String>) -> &mut Self {
        self.insert(FILE, FieldValue::String(value.into()))
    }

    /// Adds an additional field. The name is prefixed with `_` if it is not already.
    ///
    /// # Errors
    ///
    /// Fails if the normalized name is `_id` or `_key`, or contains invalid characters.
    pub fn add_additional_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&mut Self, ValidationError> {
        let key = validate_additional_key(name)?;
        self.fields.insert(key.into_owned(), value.into());
        Ok(self)
    }

    /// Returns an additional field, with or without its `_` prefix.
    pub fn additional_field(&self, name: &str) -> Option<&FieldValue> {
        self.get(&additional_key(name))
    }

    fn insert(&mut self, key: &str, value: FieldValue) -> &mut Self {
        self.fields.insert(key.to_owned(), value);
        self
    }
}

/// Creates messages, writing the reserved fields from a [`BuildContext`] and the level and
/// facility from [`MessageDefaults`].
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    context: BuildContext,
    defaults: MessageDefaults,
}

impl MessageBuilder {
    /// Creates a new `MessageBuilder`.
    pub const fn new(context: BuildContext, defaults: MessageDefaults) -> Self {
        Self { context, defaults }
    }

    /// The context reserved fields are taken from.
    pub const fn context(&self) -> &BuildContext {
        &self.context
    }

    /// The configured defaults.
    pub const fn defaults(&self) -> &MessageDefaults {
        &self.defaults
    }

    /// Creates a message from caller supplied fields.
    ///
    /// For duplicate keys the last value wins.
    ///
    /// # Errors
    ///
    /// The whole batch is rejected on the first invalid field.
    pub fn create<I, K, V>(&self, fields: I) -> Result<Message, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut message = self.base();
        message.try_extend(fields)?;
        Ok(message)
    }

    fn base(&self) -> Message {
        let mut fields = IndexMap::with_capacity(8);
        fields.insert(VERSION.to_owned(), FieldValue::from(GELF_VERSION));
        fields.insert(HOST.to_owned(), FieldValue::from(self.context.host()));
        fields.insert(
            TIMESTAMP.to_owned(),
            FieldValue::Float(self.context.timestamp()),
        );
        fields.insert(LEVEL.to_owned(), FieldValue::from(self.defaults.level));
        fields.insert(
            FACILITY.to_owned(),
            FieldValue::from(self.defaults.facility.as_str()),
        );
        if let Some(file) = self.context.file() {
            fields.insert(FILE.to_owned(), FieldValue::from(file));
        }
        Message { fields }
    }
}

fn validate_field(
    key: &str,
    value: FieldValue,
) -> Result<(Cow<'_, str>, FieldValue), ValidationError> {
    if is_reserved(key) {
        return Err(ValidationError::ReservedField {
            field: key.to_owned(),
        });
    }
    match StandardField::from_name(key) {
        Some(field) => Ok((Cow::Borrowed(field.as_str()), validate_standard(field, value)?)),
        None => Ok((validate_additional_key(key)?, value)),
    }
}

fn validate_standard(field: StandardField, value: FieldValue) -> Result<FieldValue, ValidationError> {
    let invalid_type = |expected, value: &FieldValue| ValidationError::InvalidType {
        field: field.as_str(),
        expected,
        actual: value.kind(),
    };
    match field {
        StandardField::Level => match value.as_integer().map(Level::try_from) {
            Some(Ok(level)) => Ok(level.into()),
            _ => Err(ValidationError::InvalidLevel { value }),
        },
        StandardField::ShortMessage | StandardField::FullMessage | StandardField::File => {
            match value {
                FieldValue::String(_) => Ok(value),
                other => Err(invalid_type("a string", &other)),
            }
        }
        StandardField::Line => match value {
            FieldValue::Integer(_) => Ok(value),
            other => Err(invalid_type("an integer", &other)),
        },
        StandardField::Facility => match value {
            FieldValue::String(_) | FieldValue::Integer(_) | FieldValue::Float(_) => Ok(value),
            other => Err(invalid_type("a string or a number", &other)),
        },
    }
}

fn additional_key(name: &str) -> Cow<'_, str> {
    if name.starts_with('_') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("_{name}"))
    }
}

fn validate_additional_key(name: &str) -> Result<Cow<'_, str>, ValidationError> {
    if name.is_empty() || !VALID_FIELD_REGEX.is_match(name) {
        return Err(ValidationError::InvalidFieldName {
            field: name.to_owned(),
        });
    }
    let key = additional_key(name);
    if FORBIDDEN_ADDITIONAL_FIELDS.contains(&key.as_ref()) {
        return Err(ValidationError::ForbiddenAdditionalField {
            field: key.into_owned(),
        });
    }
    Ok(key)
}

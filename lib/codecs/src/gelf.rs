//! Contains common definitions for GELF messages: the field vocabulary and the
//! severity levels.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// GELF Message fields. Definitions from <https://docs.graylog.org/docs/gelf>.
pub mod gelf_fields {

    /// (not a field) The GELF format version written by this library.
    pub const GELF_VERSION: &str = "1.1";

    /// (required) GELF format version
    pub const VERSION: &str = "version";

    /// (required) The name of the host, source or application that sent this message.
    pub const HOST: &str = "host";

    /// (required) A short descriptive message.
    pub const SHORT_MESSAGE: &str = "short_message";

    /// (optional) A long message that can i.e. contain a backtrace
    pub const FULL_MESSAGE: &str = "full_message";

    /// (optional) Seconds since UNIX epoch with optional decimal places for milliseconds.
    pub const TIMESTAMP: &str = "timestamp";

    /// (optional) The level equal to the standard syslog levels. default is 1 (ALERT).
    pub const LEVEL: &str = "level";

    /// (optional) Free-form classification of the message, string or number.
    pub const FACILITY: &str = "facility";

    /// (optional) The line in a file that caused the error (decimal).
    pub const LINE: &str = "line";

    /// (optional) The file (with path if you want) that caused the error.
    pub const FILE: &str = "file";

    /// (reserved) The message identifier. Never written by callers.
    pub const ID: &str = "id";

    /// (reserved) Storage key used by downstream document stores.
    pub const STORAGE_ID: &str = "_id";

    /// (reserved) Storage key used by downstream document stores.
    pub const STORAGE_KEY: &str = "_key";

    // < Every field with an underscore (_) prefix will be treated as an additional field. >
}

use gelf_fields::*;

/// Fields only the message builder may write, once, at construction.
pub const RESERVED_FIELDS: &[&str] = &[VERSION, HOST, TIMESTAMP, ID, STORAGE_ID, STORAGE_KEY];

/// Additional field names that collide with reserved storage keys.
pub const FORBIDDEN_ADDITIONAL_FIELDS: &[&str] = &[STORAGE_ID, STORAGE_KEY];

/// The standard GELF vocabulary.
pub const STANDARD_FIELDS: &[&str] = &[
    VERSION,
    HOST,
    SHORT_MESSAGE,
    FULL_MESSAGE,
    TIMESTAMP,
    LEVEL,
    FACILITY,
    LINE,
    FILE,
];

/// Regex for matching valid field names. Must contain only word chars, periods and dashes.
/// Additional field names must also be prefixed with an `_` , however that is intentionally
/// omitted from this regex to be checked separately.
#[allow(clippy::unwrap_used)]
pub static VALID_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w\.\-]*$").unwrap());

/// Returns true if the field may only be written by the message builder.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Standard fields a caller is allowed to write.
///
/// Reserved standard fields (`version`, `host`, `timestamp`) have no variant: they are
/// rejected before dispatch ever happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardField {
    /// `short_message`
    ShortMessage,
    /// `full_message`
    FullMessage,
    /// `level`
    Level,
    /// `facility`
    Facility,
    /// `line`
    Line,
    /// `file`
    File,
}

impl StandardField {
    /// Every writable standard field.
    pub const ALL: [StandardField; 6] = [
        Self::ShortMessage,
        Self::FullMessage,
        Self::Level,
        Self::Facility,
        Self::Line,
        Self::File,
    ];

    /// Looks up a writable standard field by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            SHORT_MESSAGE => Some(Self::ShortMessage),
            FULL_MESSAGE => Some(Self::FullMessage),
            LEVEL => Some(Self::Level),
            FACILITY => Some(Self::Facility),
            LINE => Some(Self::Line),
            FILE => Some(Self::File),
            _ => None,
        }
    }

    /// The wire name of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShortMessage => SHORT_MESSAGE,
            Self::FullMessage => FULL_MESSAGE,
            Self::Level => LEVEL,
            Self::Facility => FACILITY,
            Self::Line => LINE,
            Self::File => FILE,
        }
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syslog severity levels, as carried by the GELF `level` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Deserialize, Serialize)]
#[serde(try_from = "i64", into = "i64")]
#[repr(u8)]
pub enum Level {
    /// System is unusable.
    Emergency = 0,
    /// Action must be taken immediately.
    #[default]
    Alert = 1,
    /// Critical conditions.
    Critical = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant condition.
    Notice = 5,
    /// Informational messages.
    Informational = 6,
    /// Debug-level messages.
    Debug = 7,
}

impl Level {
    /// Every level, ordered by ordinal.
    pub const ALL: [Level; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Informational,
        Self::Debug,
    ];

    /// The syslog ordinal of this level.
    pub const fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Level {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, String> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| format!("The level \"{value}\" is not valid."))
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.as_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_total() {
        for name in STANDARD_FIELDS {
            let writable = StandardField::from_name(name).is_some();
            assert_ne!(writable, is_reserved(name), "{name}");
        }
        for field in StandardField::ALL {
            assert_eq!(StandardField::from_name(field.as_str()), Some(field));
        }
    }

    #[test]
    fn level_range() {
        for (ordinal, level) in Level::ALL.iter().enumerate() {
            assert_eq!(Level::try_from(ordinal as i64), Ok(*level));
        }
        assert!(Level::try_from(-1).is_err());
        assert_eq!(
            Level::try_from(8),
            Err("The level \"8\" is not valid.".to_owned())
        );
        assert_eq!(Level::default(), Level::Alert);
    }

    #[test]
    fn level_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Level>("6").unwrap(), Level::Informational);
        assert!(serde_json::from_str::<Level>("9").is_err());
    }

    #[test]
    fn field_name_regex() {
        assert!(VALID_FIELD_REGEX.is_match("an.add-field_int"));
        assert!(!VALID_FIELD_REGEX.is_match("has space"));
        assert!(!VALID_FIELD_REGEX.is_match("semi;colon"));
    }
}

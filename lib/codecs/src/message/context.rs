use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gelf::Level;

/// Source of the message timestamp.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Environment-derived values written into every message at construction.
#[derive(Clone)]
pub struct BuildContext {
    host: String,
    file: Option<String>,
    clock: Arc<dyn Clock>,
}

impl BuildContext {
    /// Creates a context with an explicit host label and the system clock.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            file: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Derives the context from the running process.
    ///
    /// The host label is `"<request host> (<node name>)"`, or just the node name when
    /// there is no request host. The file label is the path of the running executable.
    pub fn from_environment(request_host: Option<&str>) -> Self {
        let node = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_owned());
        let host = match request_host.map(str::trim) {
            Some(request_host) if !request_host.is_empty() => format!("{request_host} ({node})"),
            _ => node,
        };
        let file = std::env::current_exe()
            .ok()
            .map(|path| path.display().to_string());

        Self {
            host,
            file,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the emitting file label.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Replaces the clock used for timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The host label.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The emitting file label, if any.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Seconds since the UNIX epoch, with millisecond precision.
    pub fn timestamp(&self) -> f64 {
        self.clock.now().timestamp_millis() as f64 / 1000.0
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("host", &self.host)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

/// Values used for `level` and `facility` when the caller supplies none.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageDefaults {
    /// Default severity level.
    pub level: Level,
    /// Default facility.
    pub facility: String,
}

impl MessageDefaults {
    /// The facility used when none is configured.
    pub const DEFAULT_FACILITY: &'static str = "GELF";
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            level: Level::default(),
            facility: Self::DEFAULT_FACILITY.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn host_label_with_request_host() {
        let context = BuildContext::from_environment(Some("api.example.org"));
        assert!(context.host().starts_with("api.example.org ("));
        assert!(context.host().ends_with(')'));
    }

    #[test]
    fn host_label_without_request_host() {
        let context = BuildContext::from_environment(Some("  "));
        assert!(!context.host().contains('('));
        assert!(!context.host().is_empty());
    }

    #[test]
    fn timestamp_has_millisecond_precision() {
        let instant = Utc.timestamp_millis_opt(1_385_053_862_307).unwrap();
        let context = BuildContext::new("example.org").with_clock(move || instant);
        assert_eq!(context.timestamp(), 1_385_053_862.307);
    }
}

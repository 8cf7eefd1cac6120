use html::DomError;
use morph::MergeError;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Failure of one operation instance. Never escapes the batch driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperationError {
    #[error("no element matched the selector")]
    MissingElement,
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("`{kind}` requires field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("`{kind}`: field `{field}` {reason}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        reason: String,
    },
    #[error("`{kind}` cannot target {target}")]
    NotSupported {
        kind: &'static str,
        target: &'static str,
    },
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// A listener or merge hook panicked while the operation ran.
    #[error("panicked: {0}")]
    Panicked(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Target selector matched nothing.
    Resolution,
    /// The handler failed while performing its effect.
    Execution,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Resolution => "resolution",
            Severity::Execution => "execution",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Kind name as it appeared on the wire.
    pub kind: String,
    pub selector: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.kind)?;
        if let Some(selector) = &self.selector {
            write!(f, " ({selector})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The wire shape was not an object of arrays.
#[derive(Debug, Error)]
pub enum BatchDecodeError {
    #[error("batch is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("batch must be an object keyed by operation name")]
    NotAnObject,
    #[error("entries for `{0}` must be an array")]
    NotAnArray(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A failure that escaped per-entry isolation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerformError {
    #[error("batch processing panicked: {0}")]
    Panicked(String),
}

impl PerformError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        PerformError::Panicked(panic_message(payload))
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

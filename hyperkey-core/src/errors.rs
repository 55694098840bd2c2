use thiserror::Error;

macro_rules! log {
    ($a: expr) => {
        match $a {
            Ok(value) => value,
            Err(err) => tracing::error!("{}", $crate::errors::HyperError::from(err)),
        }
    };
}

pub(crate) use log;

pub type Result<T> = std::result::Result<T, HyperError>;
pub type Error = std::result::Result<(), HyperError>;

/// Where in a source file the extractor gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct SourceError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SourceError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

#[derive(Debug, Error)]
pub enum HyperError {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),
    #[error("Regex error: {0}.")]
    RegexError(#[from] regex::Error),
    #[error("Background task failed: {0}.")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Source parse error: {0}.")]
    Source(#[from] SourceError),
    #[error("Invalid value at `{path}`: {message}.")]
    Validation { path: String, message: String },
    #[error("Missing migration for version {0}.")]
    MissingMigration(u32),
    #[error("Unsupported schema version {0}.")]
    UnsupportedVersion(u32),

    #[error("Layer `{0}` already exists.")]
    LayerExists(String),
    #[error("Layer `{0}` not found.")]
    LayerNotFound(String),
    #[error("Layer `{0}` is not a sublayer.")]
    NotASublayer(String),
    #[error("No command bound to `{inner}` in layer `{layer}`.")]
    CommandNotFound { layer: String, inner: String },

    #[error("Build command `{command}` failed with {status}: {stderr}")]
    Build {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("Install to {path} failed: {source}")]
    Install {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Save queue closed.")]
    QueueClosed,
}

impl HyperError {
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::MissingMigration(_)
            | Self::UnsupportedVersion(_)
            | Self::JsonError(_)
            | Self::Source(_)
            | Self::LayerExists(_)
            | Self::LayerNotFound(_)
            | Self::NotASublayer(_)
            | Self::CommandNotFound { .. } => ErrorCategory::Validation,
            Self::Build { .. } | Self::Install { .. } => ErrorCategory::Build,
            Self::IoError(err) if is_network_error(err) => ErrorCategory::Network,
            _ => ErrorCategory::Unknown,
        }
    }
}

fn is_network_error(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::TimedOut
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Validation,
    Build,
    Unknown,
}

/// A dismissible, user-facing summary of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub category: ErrorCategory,
    pub message: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn new(category: ErrorCategory, description: impl Into<String>) -> Self {
        let message = match category {
            ErrorCategory::Network => "Network error",
            ErrorCategory::Validation => "Invalid configuration",
            ErrorCategory::Build => "Build failed",
            ErrorCategory::Unknown => "Something went wrong",
        };
        Self {
            category,
            message: message.to_owned(),
            description: Some(description.into()),
        }
    }
}

impl From<&HyperError> for Notification {
    fn from(err: &HyperError) -> Self {
        tracing::debug!("notifying about {:?}", err);
        Self::new(err.category(), err.to_string())
    }
}

use hyperkey_core::config::command::CommandError;
use hyperkey_core::errors::{ErrorCategory, HyperError, Notification, SourceError};
use thiserror::Error;

macro_rules! exit_on_error {
    ($a: expr) => {
        match $a {
            Ok(value) => value,
            Err(err) => {
                let err = $crate::errors::CliError::from(err);
                tracing::error!("Exiting due to error: {}", err);
                $crate::errors::report(&err);
                std::process::exit(1);
            }
        }
    };
}

pub(crate) use exit_on_error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] HyperError),
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),
    #[error("Ron error: {0}.")]
    RonError(#[from] ron::error::SpannedError),
    #[error("Invalid command: {0}.")]
    CommandError(#[from] CommandError),

    #[error("Missing argument `{0}`.")]
    MissingArgument(&'static str),
    #[error("No hyper layers found in {0}.")]
    NoLayers(String),
    #[error("Rules source {path} could not be parsed, fix it before editing: {source}.")]
    UnparsedSource { path: String, source: SourceError },
}

impl CliError {
    pub fn notification(&self) -> Notification {
        match self {
            Self::Core(err) => Notification::from(err),
            Self::IoError(_) => Notification::new(ErrorCategory::Unknown, self.to_string()),
            Self::RonError(_)
            | Self::CommandError(_)
            | Self::MissingArgument(_)
            | Self::NoLayers(_)
            | Self::UnparsedSource { .. } => {
                Notification::new(ErrorCategory::Validation, self.to_string())
            }
        }
    }
}

/// Prints a failure the way the editor shows it: a short message and the detail.
pub fn report(err: &CliError) {
    let notification = err.notification();
    match notification.description {
        Some(description) => eprintln!("{}: {}", notification.message, description),
        None => eprintln!("{}", notification.message),
    }
}

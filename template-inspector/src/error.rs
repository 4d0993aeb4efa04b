use std::fmt::Display;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors surfaced by the inspector.
///
/// The details are only reachable through [`Error::new`], which logs them, so
/// every error that leaves this crate has been recorded once.
#[derive(Clone, Debug, Error, Serialize)]
#[error(transparent)]
pub struct Error(Arc<ErrorDetails>);

impl Error {
    pub fn new(details: ErrorDetails) -> Self {
        details.log();
        Error(Arc::new(details))
    }

    pub fn get_details(&self) -> &ErrorDetails {
        &self.0
    }

    pub fn log(&self) {
        self.0.log();
    }
}

impl From<ErrorDetails> for Error {
    fn from(details: ErrorDetails) -> Self {
        Error::new(details)
    }
}

/// An error reported by a template engine.
///
/// `code` identifies the class of failure in the engine's own terms.
pub trait EngineError: std::error::Error + Send + Sync + 'static {
    fn code(&self) -> String;
}

impl EngineError for minijinja::Error {
    fn code(&self) -> String {
        format!("{:?}", self.kind())
    }
}

#[derive(Debug, Serialize)]
pub enum ErrorDetails {
    /// The template engine failed to tokenize, parse, load or render a template.
    TemplateParsing {
        template_name: String,
        message: String,
        code: String,
        #[serde(serialize_with = "serialize_source")]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    Config {
        message: String,
    },
    FileRead {
        message: String,
        file_path: String,
    },
    Observability {
        message: String,
    },
}

impl ErrorDetails {
    /// Wraps an engine failure raised while inspecting `template_name`.
    pub fn template_parsing<E: EngineError>(template_name: &str, err: E) -> Self {
        ErrorDetails::TemplateParsing {
            template_name: template_name.to_string(),
            message: format!("Twig error thrown during inspection of {template_name}: {err}"),
            code: err.code(),
            source: Arc::new(err),
        }
    }

    fn level(&self) -> tracing::Level {
        match self {
            ErrorDetails::TemplateParsing { .. } => tracing::Level::WARN,
            ErrorDetails::Config { .. } => tracing::Level::ERROR,
            ErrorDetails::FileRead { .. } => tracing::Level::ERROR,
            ErrorDetails::Observability { .. } => tracing::Level::ERROR,
        }
    }

    pub fn log_at_level(&self, prefix: &str, level: tracing::Level) {
        match level {
            tracing::Level::ERROR => tracing::error!("{prefix}{self}"),
            tracing::Level::WARN => tracing::warn!("{prefix}{self}"),
            tracing::Level::INFO => tracing::info!("{prefix}{self}"),
            tracing::Level::DEBUG => tracing::debug!("{prefix}{self}"),
            tracing::Level::TRACE => tracing::trace!("{prefix}{self}"),
        }
    }

    pub fn log(&self) {
        self.log_at_level("", self.level());
    }
}

impl Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorDetails::TemplateParsing { message, .. } => write!(f, "{message}"),
            ErrorDetails::Config { message } => write!(f, "Invalid configuration: {message}"),
            ErrorDetails::FileRead { message, file_path } => {
                write!(f, "Error reading file {file_path}: {message}")
            }
            ErrorDetails::Observability { message } => {
                write!(f, "Error setting up logging: {message}")
            }
        }
    }
}

impl std::error::Error for ErrorDetails {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorDetails::TemplateParsing { source, .. } => Some(source.as_ref()),
            ErrorDetails::Config { .. }
            | ErrorDetails::FileRead { .. }
            | ErrorDetails::Observability { .. } => None,
        }
    }
}

fn serialize_source<S>(
    source: &Arc<dyn std::error::Error + Send + Sync>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&source.to_string())
}

/// Renders `err` and every error in its `source()` chain, one per line.
/// Causes whose text already appears in the output are skipped.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut err = err;
    while let Some(next_err) = err.source() {
        let cause = next_err.to_string();
        if !message.contains(&cause) {
            message.push_str(&format!("\nCaused by: {cause}"));
        }
        err = next_err;
    }
    message
}
